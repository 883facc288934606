//! Enabled/disabled state of commands for a given selection.

use serde::Serialize;
use tracing::debug;

use crate::host::{TreeNode, WindowKind};
use crate::path_resolver::PathResolver;
use crate::registry::{Cardinality, CommandRegistry, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Enabled,
    Disabled,
}

impl CommandStatus {
    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Answers status queries against one registry.
pub struct Availability<'a, N> {
    registry: &'a CommandRegistry<N>,
    resolver: &'a PathResolver,
}

impl<'a, N: TreeNode> Availability<'a, N> {
    pub fn new(registry: &'a CommandRegistry<N>, resolver: &'a PathResolver) -> Self {
        Self { registry, resolver }
    }

    /// Status of `name`, or `None` when no such command is registered.
    pub fn status(
        &self,
        name: &str,
        selection: &[N],
        window_visible: impl Fn(WindowKind) -> bool,
    ) -> Option<CommandStatus> {
        let Some(spec) = self.registry.get(name) else {
            debug!(command = name, "unhandled status query");
            return None;
        };
        let status = self.status_of(spec, selection, window_visible);
        debug!(command = name, selected = selection.len(), ?status, "status query");
        Some(status)
    }

    pub fn status_of(
        &self,
        spec: &CommandSpec<N>,
        selection: &[N],
        window_visible: impl Fn(WindowKind) -> bool,
    ) -> CommandStatus {
        if !window_visible(spec.governing_window()) {
            return CommandStatus::Disabled;
        }
        let enabled = match spec.cardinality() {
            Cardinality::None => true,
            Cardinality::ExactlyOne => selection.len() == 1 && self.paths_resolve(spec, selection),
            Cardinality::OneOrMore => !selection.is_empty() && self.paths_resolve(spec, selection),
        };
        if enabled {
            CommandStatus::Enabled
        } else {
            CommandStatus::Disabled
        }
    }

    fn paths_resolve(&self, spec: &CommandSpec<N>, selection: &[N]) -> bool {
        match spec.requirement() {
            None => true,
            Some(mode) => selection
                .iter()
                .all(|node| self.resolver.resolve(node, mode).is_resolved()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureHost, FixtureNode, NodeSpec};
    use crate::host::SendToTarget;
    use crate::registry::*;

    fn host() -> FixtureHost {
        FixtureHost::new(&[NodeSpec::container("Solution")
            .child(
                NodeSpec::project("App")
                    .full_name("/w/App/App.csproj")
                    .child(NodeSpec::item("a.rs").full_path("/w/App/a.rs"))
                    .child(NodeSpec::item("Virtual Folder").full_path("Virtual Folder")),
            )
            .child(NodeSpec::item("notes.txt").file_name("/w/notes.txt"))])
    }

    fn registry() -> CommandRegistry<FixtureNode> {
        let mut registry = CommandRegistry::builtin();
        registry.register(CommandRegistry::send_to_spec(
            0,
            SendToTarget {
                display_name: "Viewer".into(),
                program: "view".into(),
                args: vec![],
            },
        ));
        registry
    }

    fn nodes(host: &FixtureHost, paths: &[&str]) -> Vec<FixtureNode> {
        paths.iter().map(|p| host.find(p).expect("node")).collect()
    }

    #[test]
    fn hidden_window_disables_every_command() {
        let host = host();
        let registry = registry();
        let resolver = PathResolver::with_separator('/');
        let availability = Availability::new(&registry, &resolver);
        let selections = [
            vec![],
            nodes(&host, &["Solution/App/a.rs"]),
            nodes(&host, &["Solution/App", "Solution/notes.txt"]),
        ];
        for spec in registry.iter() {
            for selection in &selections {
                assert_eq!(
                    availability.status(spec.name(), selection, |_| false),
                    Some(CommandStatus::Disabled),
                    "{}",
                    spec.name()
                );
            }
        }
    }

    #[test]
    fn toggle_commands_ignore_selection() {
        let registry = registry();
        let resolver = PathResolver::with_separator('/');
        let availability = Availability::new(&registry, &resolver);
        let empty: Vec<FixtureNode> = vec![];
        assert_eq!(
            availability.status(TOGGLE_RECURSIVE_EXPANSION, &empty, |_| true),
            Some(CommandStatus::Enabled)
        );
        assert_eq!(
            availability.status(RECURSE_EXPAND_CONTRACT, &empty, |_| true),
            Some(CommandStatus::Enabled)
        );
    }

    #[test]
    fn containing_folder_needs_exactly_one_resolvable_node() {
        let host = host();
        let registry = registry();
        let resolver = PathResolver::with_separator('/');
        let availability = Availability::new(&registry, &resolver);
        let status = |paths: &[&str]| {
            availability.status(OPEN_ITEM_CONTAINING_FOLDER, &nodes(&host, paths), |_| true)
        };

        assert_eq!(status(&["Solution/App/a.rs"]), Some(CommandStatus::Enabled));
        assert_eq!(status(&["Solution/App"]), Some(CommandStatus::Enabled));
        assert_eq!(status(&[]), Some(CommandStatus::Disabled));
        assert_eq!(
            status(&["Solution/App/a.rs", "Solution/notes.txt"]),
            Some(CommandStatus::Disabled)
        );
        assert_eq!(status(&["Solution"]), Some(CommandStatus::Disabled));
        assert_eq!(
            status(&["Solution/App/Virtual Folder"]),
            Some(CommandStatus::Disabled)
        );
    }

    #[test]
    fn open_all_needs_any_selection_but_no_paths() {
        let host = host();
        let registry = registry();
        let resolver = PathResolver::with_separator('/');
        let availability = Availability::new(&registry, &resolver);
        let empty: Vec<FixtureNode> = vec![];
        assert_eq!(
            availability.status(OPEN_ALL_SUB_ITEMS, &empty, |_| true),
            Some(CommandStatus::Disabled)
        );
        assert_eq!(
            availability.status(OPEN_ALL_SUB_ITEMS, &nodes(&host, &["Solution"]), |_| true),
            Some(CommandStatus::Enabled)
        );
    }

    #[test]
    fn send_to_needs_every_node_to_have_a_file() {
        let host = host();
        let registry = registry();
        let resolver = PathResolver::with_separator('/');
        let availability = Availability::new(&registry, &resolver);
        let both = nodes(&host, &["Solution/App/a.rs", "Solution/notes.txt"]);
        assert_eq!(
            availability.status("SendTo0", &both, |_| true),
            Some(CommandStatus::Enabled)
        );
        let with_virtual = nodes(&host, &["Solution/App/a.rs", "Solution"]);
        assert_eq!(
            availability.status("SendTo0", &with_virtual, |_| true),
            Some(CommandStatus::Disabled)
        );
    }

    #[test]
    fn unknown_command_has_no_status() {
        let registry = registry();
        let resolver = PathResolver::default();
        let availability = Availability::new(&registry, &resolver);
        let empty: Vec<FixtureNode> = vec![];
        assert_eq!(availability.status("Bogus", &empty, |_| true), None);
    }
}
