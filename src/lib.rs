//! Power tools for an IDE's project explorer tree.
//!
//! The host IDE supplies the tree, selection and command table through the
//! traits in [`host`]. [`Extension`] ties them to the command set: path
//! resolution for reveal/terminal/send-to, recursive expand and collapse,
//! and opening every document under a node.

pub mod availability;
pub(crate) mod cli;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod extension;
pub mod fixture;
pub mod handlers;
pub mod host;
pub mod launcher;
pub mod path_resolver;
pub mod registry;
pub mod tree_walker;

pub use availability::{Availability, CommandStatus};
pub use config::Settings;
pub use diagnostics::{DiagnosticEntry, DiagnosticLog, Level};
pub use dispatcher::Dispatcher;
pub use error::{CommandError, ConfigError, HostError, HostResult, LaunchError};
pub use extension::Extension;
pub use host::{
    CommandHost, CommandInfo, DocumentOpener, NativeObject, NodeKind, ProcessLauncher,
    SelectionProvider, SendToTarget, TreeNode, WindowKind,
};
pub use launcher::SystemLauncher;
pub use path_resolver::{PathMode, PathResult, PathResolver};
pub use registry::{Cardinality, CommandRegistry, CommandSpec};
pub use tree_walker::{toggle_recursive, toggle_recursive_expansion, ToggleSummary};
