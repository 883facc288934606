//! Collaborator surfaces the host IDE provides.
//!
//! The host owns every tree node. The core only reads node state through
//! these traits and writes nothing but the expansion flag.

use std::fmt;

use crate::error::{HostResult, LaunchError};
use crate::registry::Cardinality;

/// Identifies a host tool window by its kind string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKind(pub &'static str);

impl WindowKind {
    /// The project-tree explorer panel.
    pub const EXPLORER: WindowKind = WindowKind("explorer");
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Which kind of host object backs a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Project,
    ProjectItem,
    /// Solution folders, reference roots and other containers with no
    /// filesystem counterpart.
    VirtualContainer,
}

/// Capability probes over a node's native payload.
///
/// Each probe answers "does the payload have this property, and what is
/// it?". The defaults report the capability as absent, so an implementor
/// overrides only what its object kind actually exposes.
pub trait NativeObject {
    fn kind(&self) -> NodeKind;

    /// Direct full-path property of a file or folder item.
    fn full_path(&self) -> HostResult<Option<String>> {
        Ok(None)
    }

    /// File names attached to items that have no property bag.
    fn file_names(&self) -> HostResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Canonical full name of a project.
    fn full_name(&self) -> HostResult<Option<String>> {
        Ok(None)
    }

    /// Present only on installer/package projects.
    fn product_name(&self) -> HostResult<Option<String>> {
        Ok(None)
    }

    /// The project's `Name` property.
    fn project_name(&self) -> HostResult<Option<String>> {
        Ok(None)
    }
}

/// A handle to one node of the host's explorer tree.
///
/// Handles are cheap to clone and refer to host-owned state; setting the
/// expansion flag through any clone affects the same node.
pub trait TreeNode: Clone {
    fn name(&self) -> String;

    fn native(&self) -> &dyn NativeObject;

    /// Child nodes, enumerated on demand.
    fn children(&self) -> HostResult<Vec<Self>>;

    fn is_expanded(&self) -> HostResult<bool>;

    fn set_expanded(&self, expanded: bool) -> HostResult<()>;
}

/// Current selection and window state of the host.
pub trait SelectionProvider {
    type Node: TreeNode;

    /// Selected nodes of `window` in selection order.
    fn selection(&self, window: WindowKind) -> HostResult<Vec<Self::Node>>;

    fn window_visible(&self, window: WindowKind) -> HostResult<bool>;
}

/// Opens a tree node's document in an editor and activates it.
pub trait DocumentOpener<N> {
    fn open(&self, node: &N) -> HostResult<()>;
}

/// An external program files can be sent to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToTarget {
    pub display_name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Starts external processes rooted at a path. Fire-and-forget.
pub trait ProcessLauncher {
    /// Show `dir` in the platform file manager.
    fn reveal(&self, dir: &str) -> Result<(), LaunchError>;

    /// Start an interactive shell whose working directory is `dir`.
    fn open_terminal(&self, dir: &str) -> Result<(), LaunchError>;

    /// Hand `file` to a send-to target.
    fn send_to(&self, target: &SendToTarget, file: &str) -> Result<(), LaunchError>;
}

/// What the host needs to know to surface a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// Fully-qualified name (`TreeToys.Connect.<Name>`).
    pub name: String,
    pub caption: String,
    pub description: String,
    pub cardinality: Cardinality,
}

/// Host-side command table.
pub trait CommandHost {
    fn add_named_command(&mut self, info: &CommandInfo) -> HostResult<()>;

    fn remove_command(&mut self, name: &str) -> HostResult<()>;
}
