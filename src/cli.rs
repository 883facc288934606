//! Locating external programs.
//!
//! IDE hosts are often started from a desktop launcher and do not inherit
//! the user's shell PATH, so a terminal emulator installed under a
//! well-known directory can be invisible to a plain PATH lookup. Probing
//! results are cached for the lifetime of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Directories probed in addition to PATH.
fn search_dirs() -> &'static [PathBuf] {
    static DIRS: OnceLock<Vec<PathBuf>> = OnceLock::new();
    DIRS.get_or_init(|| {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let mut out: Vec<PathBuf> = Vec::new();

        #[cfg(target_os = "macos")]
        {
            out.extend(["/usr/local/bin", "/opt/homebrew/bin"].map(PathBuf::from));
        }

        #[cfg(target_os = "linux")]
        {
            out.extend(
                [
                    "/usr/bin",
                    "/usr/local/bin",
                    "/snap/bin",
                    "/var/lib/flatpak/exports/bin",
                ]
                .map(PathBuf::from),
            );
            out.push(home.join(".local").join("bin"));
        }

        #[cfg(target_os = "windows")]
        {
            let local_app_data = dirs::data_local_dir()
                .unwrap_or_else(|| home.join("AppData").join("Local"));
            let program_files = std::env::var_os("ProgramFiles")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("C:\\Program Files"));
            out.push(local_app_data.join("Microsoft").join("WindowsApps"));
            out.push(program_files.join("PowerShell").join("7"));
            out.push(home.join("scoop").join("shims"));
        }

        #[cfg(not(target_os = "windows"))]
        {
            out.push(home.join(".cargo").join("bin"));
        }

        out.dedup();
        out
    })
}

/// Full path of `name` if it lives in one of the extra search directories,
/// otherwise `name` unchanged so the OS can still try PATH.
pub(crate) fn locate_program(name: &str) -> String {
    static CACHE: OnceLock<parking_lot::Mutex<HashMap<String, String>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| parking_lot::Mutex::new(HashMap::new()));

    if let Some(cached) = cache.lock().get(name) {
        return cached.clone();
    }

    let located = locate_in(search_dirs(), name);
    cache.lock().insert(name.to_string(), located.clone());
    located
}

fn locate_in(dirs: &[PathBuf], name: &str) -> String {
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
        .map(|found| found.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// Whether `name` can be started, via PATH or the extra directories.
pub(crate) fn program_available(name: &str) -> bool {
    let checker = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };
    let on_path = std::process::Command::new(checker)
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    on_path || Path::new(&locate_program(name)).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_dirs_has_no_duplicates_or_blanks() {
        let dirs = search_dirs();
        assert!(!dirs.is_empty());
        let mut seen = std::collections::HashSet::new();
        for dir in dirs {
            assert!(!dir.as_os_str().is_empty());
            assert!(seen.insert(dir), "duplicate search dir {}", dir.display());
        }
    }

    #[test]
    fn missing_program_resolves_to_its_name() {
        assert_eq!(
            locate_program("treetoys_missing_binary_123"),
            "treetoys_missing_binary_123"
        );
        assert!(!program_available("treetoys_missing_binary_123"));
    }

    #[test]
    fn locate_in_prefers_first_directory_with_the_file() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        std::fs::write(second.path().join("term"), "").unwrap();
        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = locate_in(&dirs, "term");
        assert_eq!(Path::new(&found), second.path().join("term"));
    }

    #[test]
    fn locate_program_is_cached() {
        let a = locate_program("treetoys_cached_probe");
        let b = locate_program("treetoys_cached_probe");
        assert_eq!(a, b);
    }
}
