//! Starting the platform file manager, a terminal, or a send-to program.
//!
//! Commands are built separately from being spawned so the platform choice
//! can be checked without starting anything. Children are detached and never
//! awaited.

use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::cli::{locate_program, program_available};
use crate::config::Settings;
use crate::error::LaunchError;
use crate::host::{ProcessLauncher, SendToTarget};

/// Emulators tried in order on Linux when no terminal is configured.
const LINUX_TERMINALS: [&str; 8] = [
    "x-terminal-emulator",
    "ghostty",
    "wezterm",
    "alacritty",
    "kitty",
    "gnome-terminal",
    "konsole",
    "xterm",
];

/// Placeholder in send-to arguments replaced by the file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    file_manager: Option<String>,
    terminal: Option<String>,
}

impl SystemLauncher {
    pub fn new(file_manager: Option<String>, terminal: Option<String>) -> Self {
        Self {
            file_manager,
            terminal,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.file_manager.clone(), settings.terminal.clone())
    }

    pub fn reveal_command(&self, dir: &str) -> Command {
        let program = match &self.file_manager {
            Some(program) => program.as_str(),
            None if cfg!(target_os = "macos") => "open",
            None if cfg!(target_os = "windows") => "explorer",
            None => "xdg-open",
        };
        let mut c = Command::new(locate_program(program));
        c.arg(dir);
        c
    }

    pub fn terminal_command(&self, dir: &str) -> Result<Command, LaunchError> {
        if let Some(term) = &self.terminal {
            return Ok(terminal_in(term, dir));
        }

        if cfg!(target_os = "macos") {
            let mut c = Command::new("open");
            c.arg("-a").arg("Terminal").arg(dir);
            return Ok(c);
        }
        if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/c", "start", "cmd", "/k", "cd", "/d", dir]);
            return Ok(c);
        }

        LINUX_TERMINALS
            .iter()
            .find(|t| program_available(t))
            .map(|term| terminal_in(term, dir))
            .ok_or(LaunchError::NoTerminal)
    }

    pub fn send_to_command(&self, target: &SendToTarget, file: &str) -> Command {
        let mut c = Command::new(locate_program(&target.program));
        let mut substituted = false;
        for arg in &target.args {
            if arg.contains(FILE_PLACEHOLDER) {
                c.arg(arg.replace(FILE_PLACEHOLDER, file));
                substituted = true;
            } else {
                c.arg(arg);
            }
        }
        if !substituted {
            c.arg(file);
        }
        c
    }
}

/// `term` started with `dir` as its working directory, using the
/// emulator's own flag where it has one.
fn terminal_in(term: &str, dir: &str) -> Command {
    let program = locate_program(term);
    let name = Path::new(term)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(term);
    let mut c = Command::new(program);
    match name {
        "kitty" => {
            c.arg("--directory").arg(dir);
        }
        "wezterm" => {
            c.arg("start").arg("--cwd").arg(dir);
        }
        "alacritty" | "gnome-terminal" => {
            c.arg("--working-directory").arg(dir);
        }
        "konsole" => {
            c.arg("--workdir").arg(dir);
        }
        _ => {}
    }
    c.current_dir(dir);
    c
}

fn spawn_detached(mut cmd: Command) -> Result<(), LaunchError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let args: Vec<_> = cmd.get_args().collect();
    debug!(%program, ?args, "spawning");
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(drop)
        .map_err(|source| LaunchError::Spawn { program, source })
}

impl ProcessLauncher for SystemLauncher {
    fn reveal(&self, dir: &str) -> Result<(), LaunchError> {
        info!(%dir, "revealing folder");
        spawn_detached(self.reveal_command(dir))
    }

    fn open_terminal(&self, dir: &str) -> Result<(), LaunchError> {
        info!(%dir, "opening terminal");
        spawn_detached(self.terminal_command(dir)?)
    }

    fn send_to(&self, target: &SendToTarget, file: &str) -> Result<(), LaunchError> {
        info!(target = %target.display_name, %file, "sending file");
        spawn_detached(self.send_to_command(target, file))
    }
}
