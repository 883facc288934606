//! The command table: names, selection requirements and handlers.
//!
//! A registry is built when the extension attaches and dropped when it
//! detaches. Specs never change after registration; send-to commands are
//! replaced wholesale by removing the old ones and registering new ones.

use tracing::warn;

use crate::diagnostics::DiagnosticLog;
use crate::error::CommandError;
use crate::handlers;
use crate::host::{CommandInfo, DocumentOpener, ProcessLauncher, SendToTarget, TreeNode, WindowKind};
use crate::path_resolver::{PathMode, PathResolver};

/// Prefix the host sees on every command name.
pub const COMMAND_PREFIX: &str = "TreeToys.Connect.";

/// Short-name prefix of the generated send-to commands.
pub const SEND_TO_PREFIX: &str = "SendTo";

pub const RECURSE_EXPAND_CONTRACT: &str = "RecurseExpandContract";
pub const TOGGLE_RECURSIVE_EXPANSION: &str = "ToggleRecursiveExpansion";
pub const OPEN_ITEM_CONTAINING_FOLDER: &str = "OpenSelectedItemContainingFolder";
pub const OPEN_PROJECT_CONTAINING_FOLDER: &str = "OpenSelectedProjectContainingFolder";
pub const CMD_IN_ITEM_CONTAINING_FOLDER: &str = "CmdInSelectedItemContainingFolder";
pub const CMD_IN_PROJECT_CONTAINING_FOLDER: &str = "CmdInSelectedProjectContainingFolder";
pub const OPEN_ALL_SUB_ITEMS: &str = "OpenAllSubItems";

/// How many selected nodes a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Selection is ignored; only window visibility matters.
    None,
    ExactlyOne,
    OneOrMore,
}

/// Everything a handler may touch while it runs.
pub struct HandlerContext<'a, N> {
    pub resolver: &'a PathResolver,
    pub opener: &'a dyn DocumentOpener<N>,
    pub launcher: &'a dyn ProcessLauncher,
    pub diagnostics: &'a DiagnosticLog,
}

pub type Handler<N> = Box<dyn Fn(&HandlerContext<'_, N>, &[N]) -> Result<(), CommandError>>;

/// One registered command.
pub struct CommandSpec<N> {
    name: String,
    caption: String,
    description: String,
    window: WindowKind,
    cardinality: Cardinality,
    requirement: Option<PathMode>,
    handler: Handler<N>,
}

impl<N> CommandSpec<N> {
    pub fn new(name: impl Into<String>, cardinality: Cardinality, handler: Handler<N>) -> Self {
        let name = name.into();
        Self {
            caption: name.clone(),
            description: String::new(),
            name,
            window: WindowKind::EXPLORER,
            cardinality,
            requirement: None,
            handler,
        }
    }

    pub fn caption(mut self, caption: &str, description: &str) -> Self {
        self.caption = caption.to_string();
        self.description = description.to_string();
        self
    }

    /// Every selected node must resolve to a path in `mode`.
    pub fn requires(mut self, mode: PathMode) -> Self {
        self.requirement = Some(mode);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{COMMAND_PREFIX}{}", self.name)
    }

    pub fn governing_window(&self) -> WindowKind {
        self.window
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn requirement(&self) -> Option<PathMode> {
        self.requirement
    }

    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.qualified_name(),
            caption: self.caption.clone(),
            description: self.description.clone(),
            cardinality: self.cardinality,
        }
    }

    pub(crate) fn run(&self, ctx: &HandlerContext<'_, N>, selection: &[N]) -> Result<(), CommandError> {
        (self.handler)(ctx, selection)
    }
}

/// Strips [`COMMAND_PREFIX`] when present.
pub fn short_name(name: &str) -> &str {
    name.strip_prefix(COMMAND_PREFIX).unwrap_or(name)
}

pub fn is_send_to(name: &str) -> bool {
    short_name(name)
        .strip_prefix(SEND_TO_PREFIX)
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

/// Ordered set of commands keyed by short name.
pub struct CommandRegistry<N> {
    commands: Vec<CommandSpec<N>>,
}

impl<N> Default for CommandRegistry<N> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<N> CommandRegistry<N> {
    /// Adds `spec`. A name that is already taken keeps its first spec.
    pub fn register(&mut self, spec: CommandSpec<N>) -> bool {
        if self.get(spec.name()).is_some() {
            warn!(command = spec.name(), "command already registered");
            return false;
        }
        self.commands.push(spec);
        true
    }

    /// Looks up by short or fully-qualified name.
    pub fn get(&self, name: &str) -> Option<&CommandSpec<N>> {
        let short = short_name(name);
        self.commands.iter().find(|c| c.name == short)
    }

    /// Removes every command matching `pred`, returning the removed specs.
    pub fn remove_where(&mut self, pred: impl Fn(&CommandSpec<N>) -> bool) -> Vec<CommandSpec<N>> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.commands)
            .into_iter()
            .partition(|c| pred(c));
        self.commands = kept;
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec<N>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<N: TreeNode + 'static> CommandRegistry<N> {
    /// The fixed command set every attached extension starts with.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        let specs = [
            CommandSpec::new(
                RECURSE_EXPAND_CONTRACT,
                Cardinality::None,
                Box::new(handlers::toggle_selection::<N>),
            )
            .caption(
                "Recursive Expand/Contract",
                "Expands or collapses the selected nodes and everything below them.",
            ),
            CommandSpec::new(
                TOGGLE_RECURSIVE_EXPANSION,
                Cardinality::None,
                Box::new(handlers::toggle_selection::<N>),
            )
            .caption(
                "Toggle Recursive Expansion",
                "Flips every selected subtree to the opposite expansion state.",
            ),
            CommandSpec::new(
                OPEN_ITEM_CONTAINING_FOLDER,
                Cardinality::ExactlyOne,
                Box::new(handlers::reveal_containing_folder::<N>),
            )
            .requires(PathMode::ContainingFolder)
            .caption(
                "Open Containing Folder",
                "Shows the folder holding the selected item in the file manager.",
            ),
            CommandSpec::new(
                OPEN_PROJECT_CONTAINING_FOLDER,
                Cardinality::ExactlyOne,
                Box::new(handlers::reveal_containing_folder::<N>),
            )
            .requires(PathMode::ContainingFolder)
            .caption(
                "Open Project Folder",
                "Shows the folder holding the selected project in the file manager.",
            ),
            CommandSpec::new(
                CMD_IN_ITEM_CONTAINING_FOLDER,
                Cardinality::ExactlyOne,
                Box::new(handlers::terminal_in_containing_folder::<N>),
            )
            .requires(PathMode::ContainingFolder)
            .caption(
                "Terminal Here",
                "Opens a shell in the folder holding the selected item.",
            ),
            CommandSpec::new(
                CMD_IN_PROJECT_CONTAINING_FOLDER,
                Cardinality::ExactlyOne,
                Box::new(handlers::terminal_in_containing_folder::<N>),
            )
            .requires(PathMode::ContainingFolder)
            .caption(
                "Terminal in Project Folder",
                "Opens a shell in the folder holding the selected project.",
            ),
            CommandSpec::new(
                OPEN_ALL_SUB_ITEMS,
                Cardinality::OneOrMore,
                Box::new(handlers::open_all_sub_items::<N>),
            )
            .caption(
                "Open All Sub-Items",
                "Opens every document below the selected nodes.",
            ),
        ];
        for spec in specs {
            registry.register(spec);
        }
        registry
    }

    /// Builds the send-to command for target number `index`.
    pub fn send_to_spec(index: usize, target: SendToTarget) -> CommandSpec<N> {
        let caption = target.display_name.clone();
        let description = format!("Sends the selected files to {}", target.display_name);
        CommandSpec::new(
            format!("{SEND_TO_PREFIX}{index}"),
            Cardinality::OneOrMore,
            Box::new(move |ctx, selection| {
                handlers::send_to(ctx, selection, &target)
            }),
        )
        .requires(PathMode::FullPath)
        .caption(&caption, &description)
    }
}
