use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use treetoys_lib::fixture::{FixtureDocument, FixtureHost, RecordingCommandHost, RecordingLauncher};
use treetoys_lib::{
    diagnostics, CommandStatus, Extension, PathMode, PathResult, ProcessLauncher, Settings,
    SystemLauncher,
};

#[derive(Parser, Debug)]
#[command(name = "treetoys", version)]
#[command(about = "Drive the explorer power tools against a fixture tree")]
struct Cli {
    /// JSON fixture describing the explorer tree.
    #[arg(long, short)]
    fixture: PathBuf,

    /// Directory holding settings.json.
    #[arg(long, env = "TREETOYS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Replace the fixture's selection (`/`-joined node paths).
    #[arg(long = "select", short)]
    select: Vec<String>,

    /// Record launches instead of starting programs.
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered commands with their current status.
    List,
    /// Print the status of one command.
    Status { name: String },
    /// Execute a command and print the resulting tree.
    Exec { name: String },
    /// Resolve a node's path.
    Resolve {
        node: String,
        /// Resolve the containing folder instead of the full path.
        #[arg(long)]
        folder: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config_dir {
        Some(dir) => Settings::load_from(dir),
        None => Settings::load(),
    };
    diagnostics::init_tracing(settings.log_filter.as_deref());

    let doc = FixtureDocument::load(&cli.fixture).map_err(anyhow::Error::msg)?;
    let host = FixtureHost::from_document(&doc).map_err(anyhow::Error::msg)?;
    if !cli.select.is_empty() {
        let paths: Vec<&str> = cli.select.iter().map(String::as_str).collect();
        host.select(&paths).map_err(anyhow::Error::msg)?;
    }

    let recorder = RecordingLauncher::default();
    let launcher: Box<dyn ProcessLauncher> = if cli.dry_run {
        Box::new(recorder.clone())
    } else {
        Box::new(SystemLauncher::from_settings(&settings))
    };

    let mut commands = RecordingCommandHost::default();
    let ext = Extension::attach(
        host.clone(),
        Box::new(host.clone()),
        launcher,
        &settings,
        &mut commands,
    );

    match cli.command {
        Command::List => {
            for info in ext.commands() {
                let status = ext.query_status(&info.name, CommandStatus::Disabled);
                println!("{:<9} {:<55} {}", status_label(status), info.name, info.caption);
            }
        }
        Command::Status { name } => match ext.status(&name) {
            Some(status) => println!("{}", status_label(status)),
            None => bail!("unknown command: {name}"),
        },
        Command::Exec { name } => {
            let handled = ext.execute(&name);
            print!("{}", host.render());
            for path in host.opened() {
                println!("opened {path}");
            }
            for launch in recorder.calls() {
                println!("launch {launch:?}");
            }
            for entry in ext.recent_diagnostics(0) {
                println!("{:?} {}: {}", entry.level, entry.source, entry.message);
            }
            if !handled {
                bail!("{name} was not handled");
            }
        }
        Command::Resolve { node, folder } => {
            let found = host
                .find(&node)
                .with_context(|| format!("no node at {node}"))?;
            let mode = if folder {
                PathMode::ContainingFolder
            } else {
                PathMode::FullPath
            };
            match ext.resolver().resolve(&found, mode) {
                PathResult::Resolved(path) => println!("{path}"),
                PathResult::Unresolvable => bail!("{node} has no filesystem path"),
            }
        }
    }

    ext.detach(&mut commands);
    Ok(())
}

fn status_label(status: CommandStatus) -> &'static str {
    match status {
        CommandStatus::Enabled => "enabled",
        CommandStatus::Disabled => "disabled",
    }
}
