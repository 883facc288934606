use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::host::SendToTarget;

/// Overrides the settings directory; used by tests and portable installs.
pub const CONFIG_DIR_ENV: &str = "TREETOYS_CONFIG_DIR";

pub const SETTINGS_FILE: &str = "settings.json";

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/treetoys/`
/// - Linux: `~/.config/treetoys/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/treetoys/`
///
/// `$TREETOYS_CONFIG_DIR` wins when set and non-empty. Falls back to
/// `~/.treetoys/` if the platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|d| d.join("treetoys"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".treetoys")
        })
}

/// Load a JSON config file from `dir`, returning Default if missing or
/// corrupt. A file that exists but cannot be used is logged so a reset is
/// visible instead of silent.
pub fn load_json_config_in<T: DeserializeOwned + Default>(dir: &Path, filename: &str) -> T {
    let path = dir.join(filename);
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read config");
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt config; using defaults");
            T::default()
        }
    }
}

/// Save a JSON config file into `dir` atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub fn save_json_config_in<T: Serialize>(
    dir: &Path,
    filename: &str,
    config: &T,
) -> Result<(), ConfigError> {
    let io_err = |path: &Path| {
        let path = path.display().to_string();
        move |source| ConfigError::Io { path, source }
    };

    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let json = serde_json::to_string_pretty(config)?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json).map_err(io_err(&temp))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms).map_err(io_err(&temp))?;
    }

    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        io_err(&target)(e)
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// User preferences for the explorer tools.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Program used instead of the platform file manager.
    #[serde(default)]
    pub file_manager: Option<String>,
    /// Program used instead of the platform terminal.
    #[serde(default)]
    pub terminal: Option<String>,
    /// Separator resolved paths are normalised to. Platform default if unset.
    #[serde(default)]
    pub path_separator: Option<char>,
    /// `tracing` filter directive, used when `RUST_LOG` is not set.
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default)]
    pub send_to: Vec<SendToTarget>,
}

impl Settings {
    /// Settings from the default config directory.
    pub fn load() -> Self {
        Self::load_from(&config_dir())
    }

    pub fn load_from(dir: &Path) -> Self {
        load_json_config_in(dir, SETTINGS_FILE)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_dir())
    }

    pub fn save_to(&self, dir: &Path) -> Result<(), ConfigError> {
        save_json_config_in(dir, SETTINGS_FILE, self)?;
        info!(dir = %dir.display(), targets = self.send_to.len(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn sample() -> Settings {
        Settings {
            file_manager: Some("nautilus".to_string()),
            terminal: None,
            path_separator: Some('/'),
            log_filter: Some("treetoys_lib=debug".to_string()),
            send_to: vec![SendToTarget {
                display_name: "Hex Viewer".to_string(),
                program: "hexview".to_string(),
                args: vec!["--readonly".to_string()],
            }],
        }
    }

    #[test]
    fn settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let settings = sample();
        settings.save_to(dir.path()).unwrap();
        assert_eq!(Settings::load_from(dir.path()), settings);
    }

    #[test]
    fn settings_use_camel_case_keys() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(json.contains(r#""fileManager":"nautilus""#));
        assert!(json.contains(r#""pathSeparator":"/""#));
        assert!(json.contains(r#""displayName":"Hex Viewer""#));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let loaded: Settings = serde_json::from_str(r#"{"terminal":"kitty"}"#).unwrap();
        assert_eq!(loaded.terminal.as_deref(), Some("kitty"));
        assert!(loaded.file_manager.is_none());
        assert!(loaded.send_to.is_empty());

        let target: SendToTarget =
            serde_json::from_str(r#"{"displayName":"Diff","program":"meld"}"#).unwrap();
        assert!(target.args.is_empty());
    }

    #[test]
    fn missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Settings::load_from(dir.path()), Settings::default());
    }

    #[test]
    fn corrupt_file_returns_default() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "not valid json!!!").unwrap();
        assert_eq!(Settings::load_from(dir.path()), Settings::default());
    }

    #[test]
    fn save_creates_directory_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        sample().save_to(&nested).unwrap();
        let names: Vec<_> = fs::read_dir(&nested)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, [SETTINGS_FILE]);
    }

    #[cfg(unix)]
    #[test]
    fn save_sets_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        sample().save_to(dir.path()).unwrap();
        let mode = fs::metadata(dir.path().join(SETTINGS_FILE))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "settings should be owner-only (0600)");
    }

    #[test]
    #[serial]
    fn env_override_redirects_config_dir() {
        let dir = TempDir::new().unwrap();
        // SAFETY: #[serial] keeps other env-reading tests from running concurrently.
        unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };
        assert_eq!(config_dir(), dir.path());
        sample().save().unwrap();
        let loaded = Settings::load();
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
        assert_eq!(loaded, sample());
        assert!(dir.path().join(SETTINGS_FILE).exists());
    }

    #[test]
    #[serial]
    fn empty_env_override_is_ignored() {
        unsafe { std::env::set_var(CONFIG_DIR_ENV, "") };
        let dir = config_dir();
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };
        assert!(dir.ends_with("treetoys") || dir.ends_with(".treetoys"));
    }
}
