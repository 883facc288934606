//! In-memory host built from a JSON tree description.
//!
//! Backs the `treetoys` driver binary and the unit tests. Every collaborator
//! trait in [`crate::host`] has an implementation here, including failure
//! injection for per-node host errors and failing document opens.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult, LaunchError};
use crate::host::{
    CommandHost, CommandInfo, DocumentOpener, NativeObject, NodeKind, ProcessLauncher,
    SelectionProvider, SendToTarget, TreeNode, WindowKind,
};

/// Separator used in fixture selection paths (`Solution/App/src/a.cs`).
const SELECTION_PATH_SEPARATOR: char = '/';

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// One node of a fixture tree as written in JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default)]
    pub expanded: bool,
    /// Opening this node's document fails.
    #[serde(default)]
    pub open_fails: bool,
    /// Every payload probe and child enumeration on this node fails.
    #[serde(default)]
    pub host_fails: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

fn default_kind() -> NodeKind {
    NodeKind::ProjectItem
}

impl NodeSpec {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            full_path: None,
            file_names: Vec::new(),
            full_name: None,
            product_name: None,
            project_name: None,
            expanded: false,
            open_fails: false,
            host_fails: false,
            children: Vec::new(),
        }
    }

    pub fn project(name: &str) -> Self {
        Self::new(name, NodeKind::Project)
    }

    pub fn item(name: &str) -> Self {
        Self::new(name, NodeKind::ProjectItem)
    }

    pub fn container(name: &str) -> Self {
        Self::new(name, NodeKind::VirtualContainer)
    }

    pub fn full_path(mut self, path: &str) -> Self {
        self.full_path = Some(path.to_string());
        self
    }

    pub fn file_name(mut self, name: &str) -> Self {
        self.file_names.push(name.to_string());
        self
    }

    pub fn full_name(mut self, name: &str) -> Self {
        self.full_name = Some(name.to_string());
        self
    }

    /// Marks a project as an installer project named `name`.
    pub fn installer(mut self, product: &str, name: &str) -> Self {
        self.product_name = Some(product.to_string());
        self.project_name = Some(name.to_string());
        self
    }

    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn open_fails(mut self) -> Self {
        self.open_fails = true;
        self
    }

    pub fn host_fails(mut self) -> Self {
        self.host_fails = true;
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A complete fixture file: the tree, the selection and window state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureDocument {
    #[serde(default = "default_visible")]
    pub window_visible: bool,
    /// Selected nodes as `/`-joined name paths from a root.
    #[serde(default)]
    pub selection: Vec<String>,
    pub roots: Vec<NodeSpec>,
}

fn default_visible() -> bool {
    true
}

impl FixtureDocument {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read fixture {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse fixture {}: {e}", path.display()))
    }
}

// ---------------------------------------------------------------------------
// Live tree
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Payload {
    kind: NodeKind,
    full_path: Option<String>,
    file_names: Vec<String>,
    full_name: Option<String>,
    product_name: Option<String>,
    project_name: Option<String>,
    host_fails: bool,
}

impl Payload {
    fn probe<T>(&self, value: T) -> HostResult<T> {
        if self.host_fails {
            Err(HostError::new("payload is disconnected"))
        } else {
            Ok(value)
        }
    }
}

impl NativeObject for Payload {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn full_path(&self) -> HostResult<Option<String>> {
        self.probe(self.full_path.clone())
    }

    fn file_names(&self) -> HostResult<Vec<String>> {
        self.probe(self.file_names.clone())
    }

    fn full_name(&self) -> HostResult<Option<String>> {
        self.probe(self.full_name.clone())
    }

    fn product_name(&self) -> HostResult<Option<String>> {
        self.probe(self.product_name.clone())
    }

    fn project_name(&self) -> HostResult<Option<String>> {
        self.probe(self.project_name.clone())
    }
}

#[derive(Debug)]
struct NodeData {
    name: String,
    path: String,
    payload: Payload,
    expanded: Cell<bool>,
    open_fails: bool,
    children: Vec<FixtureNode>,
}

/// Shared handle to a node of a fixture tree.
#[derive(Debug, Clone)]
pub struct FixtureNode(Rc<NodeData>);

impl FixtureNode {
    pub fn build(spec: &NodeSpec) -> Self {
        Self::build_under(spec, None)
    }

    fn build_under(spec: &NodeSpec, parent_path: Option<&str>) -> Self {
        let path = match parent_path {
            Some(parent) => format!("{parent}{SELECTION_PATH_SEPARATOR}{}", spec.name),
            None => spec.name.clone(),
        };
        let children = spec
            .children
            .iter()
            .map(|child| Self::build_under(child, Some(&path)))
            .collect();
        Self(Rc::new(NodeData {
            name: spec.name.clone(),
            path,
            payload: Payload {
                kind: spec.kind,
                full_path: spec.full_path.clone(),
                file_names: spec.file_names.clone(),
                full_name: spec.full_name.clone(),
                product_name: spec.product_name.clone(),
                project_name: spec.project_name.clone(),
                host_fails: spec.host_fails,
            },
            expanded: Cell::new(spec.expanded),
            open_fails: spec.open_fails,
            children,
        }))
    }

    /// `/`-joined name path from the root.
    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn expanded(&self) -> bool {
        self.0.expanded.get()
    }

    /// Finds a descendant (or this node) by its `/`-joined path.
    pub fn find(&self, path: &str) -> Option<FixtureNode> {
        if self.0.path == path {
            return Some(self.clone());
        }
        self.0.children.iter().find_map(|child| child.find(path))
    }

    /// Visits this node and every descendant in pre-order.
    pub fn walk(&self, visit: &mut dyn FnMut(&FixtureNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut dyn FnMut(&FixtureNode, usize)) {
        visit(self, depth);
        for child in &self.0.children {
            child.walk_at(depth + 1, visit);
        }
    }

    pub fn has_children(&self) -> bool {
        !self.0.children.is_empty()
    }
}

impl PartialEq for FixtureNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl TreeNode for FixtureNode {
    fn name(&self) -> String {
        self.0.name.clone()
    }

    fn native(&self) -> &dyn NativeObject {
        &self.0.payload
    }

    fn children(&self) -> HostResult<Vec<Self>> {
        self.0.payload.probe(self.0.children.clone())
    }

    fn is_expanded(&self) -> HostResult<bool> {
        Ok(self.0.expanded.get())
    }

    fn set_expanded(&self, expanded: bool) -> HostResult<()> {
        self.0.expanded.set(expanded);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct HostState {
    roots: Vec<FixtureNode>,
    selection: RefCell<Vec<FixtureNode>>,
    visible: Cell<bool>,
    selection_fails: Cell<bool>,
    opened: RefCell<Vec<String>>,
}

/// Selection provider and document opener over a fixture tree.
///
/// Clones share state, so a test can hand one clone to an
/// [`Extension`](crate::Extension) and keep driving the selection through
/// another.
#[derive(Debug, Clone)]
pub struct FixtureHost(Rc<HostState>);

impl FixtureHost {
    pub fn new(roots: &[NodeSpec]) -> Self {
        Self(Rc::new(HostState {
            roots: roots.iter().map(FixtureNode::build).collect(),
            selection: RefCell::new(Vec::new()),
            visible: Cell::new(true),
            selection_fails: Cell::new(false),
            opened: RefCell::new(Vec::new()),
        }))
    }

    /// Builds the host and applies the document's selection and visibility.
    pub fn from_document(doc: &FixtureDocument) -> Result<Self, String> {
        let host = Self::new(&doc.roots);
        host.set_window_visible(doc.window_visible);
        let paths: Vec<&str> = doc.selection.iter().map(String::as_str).collect();
        host.select(&paths)?;
        Ok(host)
    }

    pub fn roots(&self) -> &[FixtureNode] {
        &self.0.roots
    }

    pub fn find(&self, path: &str) -> Option<FixtureNode> {
        self.0.roots.iter().find_map(|root| root.find(path))
    }

    /// Replaces the selection. Fails on the first unknown path.
    pub fn select(&self, paths: &[&str]) -> Result<(), String> {
        let nodes = paths
            .iter()
            .map(|p| self.find(p).ok_or_else(|| format!("No node at {p}")))
            .collect::<Result<Vec<_>, _>>()?;
        *self.0.selection.borrow_mut() = nodes;
        Ok(())
    }

    pub fn set_window_visible(&self, visible: bool) {
        self.0.visible.set(visible);
    }

    /// Makes every subsequent selection query fail.
    pub fn fail_selection(&self, fails: bool) {
        self.0.selection_fails.set(fails);
    }

    /// Paths of documents opened so far, in open order.
    pub fn opened(&self) -> Vec<String> {
        self.0.opened.borrow().clone()
    }

    /// Renders the tree with expansion markers, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            root.walk(&mut |node, depth| {
                let marker = match (node.has_children(), node.expanded()) {
                    (false, _) => ' ',
                    (true, true) => '-',
                    (true, false) => '+',
                };
                out.push_str(&"  ".repeat(depth));
                out.push(marker);
                out.push(' ');
                out.push_str(&node.0.name);
                out.push('\n');
            });
        }
        out
    }
}

impl SelectionProvider for FixtureHost {
    type Node = FixtureNode;

    fn selection(&self, window: WindowKind) -> HostResult<Vec<FixtureNode>> {
        if self.0.selection_fails.get() {
            return Err(HostError::new(format!("{window} selection unavailable")));
        }
        Ok(self.0.selection.borrow().clone())
    }

    fn window_visible(&self, _window: WindowKind) -> HostResult<bool> {
        Ok(self.0.visible.get())
    }
}

impl DocumentOpener<FixtureNode> for FixtureHost {
    fn open(&self, node: &FixtureNode) -> HostResult<()> {
        if node.0.open_fails {
            return Err(HostError::new(format!("cannot open {}", node.0.name)));
        }
        self.0.opened.borrow_mut().push(node.0.path.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording collaborators
// ---------------------------------------------------------------------------

/// A process launch captured by [`RecordingLauncher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    Reveal(String),
    Terminal(String),
    SendTo { target: String, file: String },
}

/// Launcher that records requests instead of starting processes.
///
/// A path registered with [`fail_on`](Self::fail_on) makes every launch for
/// that directory or file fail as if the program could not be started.
#[derive(Debug, Clone, Default)]
pub struct RecordingLauncher {
    calls: Rc<RefCell<Vec<Launch>>>,
    failing: Rc<RefCell<Option<String>>>,
}

impl RecordingLauncher {
    pub fn calls(&self) -> Vec<Launch> {
        self.calls.borrow().clone()
    }

    pub fn fail_on(&self, path: &str) {
        *self.failing.borrow_mut() = Some(path.to_string());
    }

    fn record(&self, path: &str, launch: Launch) -> Result<(), LaunchError> {
        if self.failing.borrow().as_deref() == Some(path) {
            return Err(LaunchError::Spawn {
                program: "recorded".to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("refusing to launch for {path}"),
                ),
            });
        }
        self.calls.borrow_mut().push(launch);
        Ok(())
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn reveal(&self, dir: &str) -> Result<(), LaunchError> {
        self.record(dir, Launch::Reveal(dir.to_string()))
    }

    fn open_terminal(&self, dir: &str) -> Result<(), LaunchError> {
        self.record(dir, Launch::Terminal(dir.to_string()))
    }

    fn send_to(&self, target: &SendToTarget, file: &str) -> Result<(), LaunchError> {
        self.record(
            file,
            Launch::SendTo {
                target: target.display_name.clone(),
                file: file.to_string(),
            },
        )
    }
}

/// Command table that keeps whatever is registered with it.
#[derive(Debug, Default)]
pub struct RecordingCommandHost {
    pub commands: BTreeMap<String, CommandInfo>,
    /// Registration of any name containing this text is refused.
    pub refuse_matching: Option<String>,
}

impl CommandHost for RecordingCommandHost {
    fn add_named_command(&mut self, info: &CommandInfo) -> HostResult<()> {
        if let Some(pattern) = &self.refuse_matching
            && info.name.contains(pattern.as_str())
        {
            return Err(HostError::new(format!("{} refused", info.name)));
        }
        self.commands.insert(info.name.clone(), info.clone());
        Ok(())
    }

    fn remove_command(&mut self, name: &str) -> HostResult<()> {
        self.commands
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| HostError::new(format!("{name} is not registered")))
    }
}
