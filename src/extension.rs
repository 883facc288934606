//! The host-facing entry point.
//!
//! An [`Extension`] exists between attach and detach. It owns the command
//! registry and answers the host's two callbacks, `query_status` and
//! `execute`, reading the current selection from the provider each time.

use tracing::{debug, info, warn};

use crate::availability::{Availability, CommandStatus};
use crate::config::Settings;
use crate::diagnostics::{DiagnosticEntry, DiagnosticLog, Level};
use crate::dispatcher::Dispatcher;
use crate::host::{
    CommandHost, CommandInfo, DocumentOpener, ProcessLauncher, SelectionProvider, SendToTarget,
    WindowKind,
};
use crate::path_resolver::PathResolver;
use crate::registry::{is_send_to, Cardinality, CommandRegistry, CommandSpec, HandlerContext};

pub struct Extension<P: SelectionProvider> {
    provider: P,
    opener: Box<dyn DocumentOpener<P::Node>>,
    launcher: Box<dyn ProcessLauncher>,
    registry: CommandRegistry<P::Node>,
    resolver: PathResolver,
    diagnostics: DiagnosticLog,
}

impl<P> Extension<P>
where
    P: SelectionProvider,
    P::Node: 'static,
{
    /// Builds the command set from `settings` and registers every command
    /// with `host`. Commands the host rejects are logged and dropped; the
    /// extension attaches with whatever the host accepted.
    pub fn attach(
        provider: P,
        opener: Box<dyn DocumentOpener<P::Node>>,
        launcher: Box<dyn ProcessLauncher>,
        settings: &Settings,
        host: &mut dyn CommandHost,
    ) -> Self {
        let resolver = settings
            .path_separator
            .map(PathResolver::with_separator)
            .unwrap_or_default();

        let mut ext = Self {
            provider,
            opener,
            launcher,
            registry: CommandRegistry::builtin(),
            resolver,
            diagnostics: DiagnosticLog::default(),
        };
        for (index, target) in settings.send_to.iter().enumerate() {
            ext.registry
                .register(CommandRegistry::send_to_spec(index, target.clone()));
        }
        let rejected: Vec<String> = ext
            .registry
            .iter()
            .filter(|spec| !ext.announce(spec, host))
            .map(|spec| spec.name().to_string())
            .collect();
        if !rejected.is_empty() {
            ext.registry
                .remove_where(|spec| rejected.iter().any(|name| name == spec.name()));
        }
        info!(commands = ext.registry.len(), "extension attached");
        ext
    }

    /// Removes every registered command from `host`.
    pub fn detach(self, host: &mut dyn CommandHost) {
        for spec in self.registry.iter() {
            let name = spec.qualified_name();
            if let Err(e) = host.remove_command(&name) {
                warn!(command = %name, error = %e, "could not remove command");
            }
        }
        info!("extension detached");
    }

    /// Replaces all send-to commands with one per entry of `targets`.
    pub fn refresh_send_to(&mut self, targets: &[SendToTarget], host: &mut dyn CommandHost) {
        let removed = self.registry.remove_where(|spec| is_send_to(spec.name()));
        for spec in &removed {
            let name = spec.qualified_name();
            if let Err(e) = host.remove_command(&name) {
                warn!(command = %name, error = %e, "could not remove send-to command");
            }
        }

        let mut added = 0;
        for (index, target) in targets.iter().enumerate() {
            let spec = CommandRegistry::send_to_spec(index, target.clone());
            if self.announce(&spec, host) && self.registry.register(spec) {
                added += 1;
            }
        }
        info!(removed = removed.len(), added, "send-to targets refreshed");
    }

    /// Registers `spec` with `host`; `false` if the host refused it.
    fn announce(&self, spec: &CommandSpec<P::Node>, host: &mut dyn CommandHost) -> bool {
        match host.add_named_command(&spec.info()) {
            Ok(()) => true,
            Err(e) => {
                warn!(command = spec.name(), error = %e, "could not register command");
                self.diagnostics
                    .record(Level::Error, spec.name(), format!("registration failed: {e}"));
                false
            }
        }
    }

    /// Host status callback. Unknown names keep `prior`.
    pub fn query_status(&self, name: &str, prior: CommandStatus) -> CommandStatus {
        self.status(name).unwrap_or(prior)
    }

    /// Status of `name` for the current selection, `None` if unknown.
    pub fn status(&self, name: &str) -> Option<CommandStatus> {
        let Some(spec) = self.registry.get(name) else {
            debug!(command = name, "status query for unknown command");
            return None;
        };
        // Selection-free commands depend on window visibility alone.
        let selection = if spec.cardinality() == Cardinality::None {
            Vec::new()
        } else {
            match self.provider.selection(spec.governing_window()) {
                Ok(selection) => selection,
                Err(e) => {
                    warn!(command = name, error = %e, "selection unavailable; disabling");
                    return Some(CommandStatus::Disabled);
                }
            }
        };
        let availability = Availability::new(&self.registry, &self.resolver);
        Some(availability.status_of(spec, &selection, |w| self.window_visible(w)))
    }

    /// Host execute callback. Returns whether the command was handled.
    pub fn execute(&self, name: &str) -> bool {
        let window = self
            .registry
            .get(name)
            .map_or(WindowKind::EXPLORER, |spec| spec.governing_window());
        let selection = match self.provider.selection(window) {
            Ok(selection) => selection,
            Err(e) => {
                warn!(command = name, error = %e, "selection unavailable; not executing");
                self.diagnostics
                    .record(Level::Error, name, format!("selection unavailable: {e}"));
                return false;
            }
        };
        self.dispatcher()
            .execute(name, &selection, |w| self.window_visible(w))
    }

    fn dispatcher(&self) -> Dispatcher<'_, P::Node> {
        Dispatcher::new(
            &self.registry,
            HandlerContext {
                resolver: &self.resolver,
                opener: self.opener.as_ref(),
                launcher: self.launcher.as_ref(),
                diagnostics: &self.diagnostics,
            },
        )
    }

    fn window_visible(&self, window: WindowKind) -> bool {
        self.provider.window_visible(window).unwrap_or_else(|e| {
            warn!(%window, error = %e, "window state unavailable; treating as hidden");
            false
        })
    }

    /// Most recent `limit` diagnostics, oldest first. `0` returns all.
    pub fn recent_diagnostics(&self, limit: usize) -> Vec<DiagnosticEntry> {
        self.diagnostics.recent(limit)
    }

    /// Metadata of every registered command, in registration order.
    pub fn commands(&self) -> Vec<CommandInfo> {
        self.registry.iter().map(CommandSpec::info).collect()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixtureHost, Launch, NodeSpec, RecordingCommandHost, RecordingLauncher};
    use crate::registry::*;

    fn tree() -> Vec<NodeSpec> {
        vec![NodeSpec::container("Solution").child(
            NodeSpec::project("App")
                .full_name("/w/App/App.csproj")
                .child(
                    NodeSpec::item("src")
                        .full_path("/w/App/src/")
                        .child(NodeSpec::item("a.rs").full_path("/w/App/src/a.rs"))
                        .child(NodeSpec::item("b.rs").full_path("/w/App/src/b.rs").open_fails()),
                )
                .child(NodeSpec::item("c.rs").full_path("/w/App/c.rs")),
        )]
    }

    fn target(name: &str) -> SendToTarget {
        SendToTarget {
            display_name: name.to_string(),
            program: name.to_lowercase(),
            args: vec![],
        }
    }

    fn settings() -> Settings {
        Settings {
            path_separator: Some('/'),
            send_to: vec![target("Viewer"), target("Printer")],
            ..Settings::default()
        }
    }

    struct Setup {
        host: FixtureHost,
        launcher: RecordingLauncher,
        commands: RecordingCommandHost,
        ext: Extension<FixtureHost>,
    }

    fn setup() -> Setup {
        let host = FixtureHost::new(&tree());
        let launcher = RecordingLauncher::default();
        let mut commands = RecordingCommandHost::default();
        let ext = Extension::attach(
            host.clone(),
            Box::new(host.clone()),
            Box::new(launcher.clone()),
            &settings(),
            &mut commands,
        );
        Setup {
            host,
            launcher,
            commands,
            ext,
        }
    }

    #[test]
    fn attach_registers_qualified_names() {
        let s = setup();
        assert_eq!(s.commands.commands.len(), 9);
        assert!(s
            .commands
            .commands
            .contains_key("TreeToys.Connect.OpenAllSubItems"));
        let send_to = &s.commands.commands["TreeToys.Connect.SendTo1"];
        assert_eq!(send_to.caption, "Printer");
        assert_eq!(send_to.cardinality, Cardinality::OneOrMore);
        assert_eq!(s.ext.commands().len(), 9);
    }

    #[test]
    fn detach_removes_everything() {
        let mut s = setup();
        s.ext.detach(&mut s.commands);
        assert!(s.commands.commands.is_empty());
    }

    #[test]
    fn refresh_replaces_send_to_commands() {
        let mut s = setup();
        s.ext.refresh_send_to(&[target("Diff")], &mut s.commands);
        let names: Vec<_> = s
            .commands
            .commands
            .keys()
            .filter(|name| is_send_to(name))
            .cloned()
            .collect();
        assert_eq!(names, ["TreeToys.Connect.SendTo0"]);
        assert_eq!(s.commands.commands["TreeToys.Connect.SendTo0"].caption, "Diff");
        assert_eq!(s.ext.commands().len(), 8);
    }

    #[test]
    fn rejected_commands_are_not_kept() {
        let host = FixtureHost::new(&tree());
        let launcher = RecordingLauncher::default();
        let mut commands = RecordingCommandHost {
            refuse_matching: Some("SendTo1".into()),
            ..RecordingCommandHost::default()
        };
        let ext = Extension::attach(
            host.clone(),
            Box::new(host.clone()),
            Box::new(launcher.clone()),
            &settings(),
            &mut commands,
        );
        assert_eq!(ext.commands().len(), 8);
        assert_eq!(ext.status("SendTo1"), None);
        assert!(ext.status("SendTo0").is_some());

        host.select(&["Solution/App/c.rs"]).unwrap();
        assert!(!ext.execute("SendTo1"));
        assert!(launcher.calls().is_empty());
        let entries = ext.recent_diagnostics(0);
        assert_eq!(entries[0].level, Level::Error);
        assert!(entries[0].message.contains("registration failed"));
    }

    #[test]
    fn refresh_keeps_only_accepted_send_to_commands() {
        let mut s = setup();
        s.commands.refuse_matching = Some(SEND_TO_PREFIX.into());
        s.ext.refresh_send_to(&[target("Viewer")], &mut s.commands);
        assert!(!s.commands.commands.keys().any(|name| is_send_to(name)));
        assert_eq!(s.ext.status("SendTo0"), None);

        s.host.select(&["Solution/App/c.rs"]).unwrap();
        assert!(!s.ext.execute("SendTo0"));
        assert!(s.launcher.calls().is_empty());
        assert!(s
            .ext
            .recent_diagnostics(0)
            .iter()
            .any(|entry| entry.source == "SendTo0" && entry.level == Level::Error));
    }

    #[test]
    fn unknown_command_keeps_prior_status() {
        let s = setup();
        assert_eq!(s.ext.status("Bogus"), None);
        assert_eq!(
            s.ext.query_status("Bogus", CommandStatus::Enabled),
            CommandStatus::Enabled
        );
        assert!(!s.ext.execute("Bogus"));
    }

    #[test]
    fn status_follows_the_live_selection() {
        let s = setup();
        assert_eq!(
            s.ext.status(OPEN_ITEM_CONTAINING_FOLDER),
            Some(CommandStatus::Disabled)
        );
        s.host.select(&["Solution/App/c.rs"]).unwrap();
        assert_eq!(
            s.ext.status(OPEN_ITEM_CONTAINING_FOLDER),
            Some(CommandStatus::Enabled)
        );
        s.host.set_window_visible(false);
        assert_eq!(
            s.ext.query_status(OPEN_ITEM_CONTAINING_FOLDER, CommandStatus::Enabled),
            CommandStatus::Disabled
        );
    }

    #[test]
    fn selection_failure_fails_closed() {
        let s = setup();
        s.host.select(&["Solution/App/c.rs"]).unwrap();
        s.host.fail_selection(true);
        assert_eq!(
            s.ext.status(OPEN_ITEM_CONTAINING_FOLDER),
            Some(CommandStatus::Disabled)
        );
        assert!(!s.ext.execute(OPEN_ITEM_CONTAINING_FOLDER));
        assert!(s.launcher.calls().is_empty());
        assert_eq!(s.ext.recent_diagnostics(0)[0].level, Level::Error);
    }

    #[test]
    fn toggle_status_ignores_selection_failure() {
        let s = setup();
        s.host.fail_selection(true);
        assert_eq!(
            s.ext.status(TOGGLE_RECURSIVE_EXPANSION),
            Some(CommandStatus::Enabled)
        );
        assert_eq!(
            s.ext.status(CMD_IN_ITEM_CONTAINING_FOLDER),
            Some(CommandStatus::Disabled)
        );
        s.host.set_window_visible(false);
        assert_eq!(
            s.ext.status(TOGGLE_RECURSIVE_EXPANSION),
            Some(CommandStatus::Disabled)
        );
    }

    #[test]
    fn execute_toggles_the_selected_subtree() {
        let s = setup();
        s.host.select(&["Solution/App"]).unwrap();
        assert!(s.ext.execute(TOGGLE_RECURSIVE_EXPANSION));
        assert!(s.host.find("Solution/App").unwrap().expanded());
        assert!(s.host.find("Solution/App/src").unwrap().expanded());

        assert!(s.ext.execute("TreeToys.Connect.RecurseExpandContract"));
        assert!(!s.host.find("Solution/App").unwrap().expanded());
        assert!(!s.host.find("Solution/App/src").unwrap().expanded());
    }

    #[test]
    fn execute_sends_files_in_selection_order() {
        let s = setup();
        s.host
            .select(&["Solution/App/c.rs", "Solution/App/src/a.rs"])
            .unwrap();
        assert!(s.ext.execute("SendTo1"));
        assert_eq!(
            s.launcher.calls(),
            [
                Launch::SendTo {
                    target: "Printer".into(),
                    file: "/w/App/c.rs".into()
                },
                Launch::SendTo {
                    target: "Printer".into(),
                    file: "/w/App/src/a.rs".into()
                },
            ]
        );
    }

    #[test]
    fn open_all_failures_surface_as_diagnostics() {
        let s = setup();
        s.host.select(&["Solution/App"]).unwrap();
        assert!(s.ext.execute(OPEN_ALL_SUB_ITEMS));
        assert_eq!(
            s.host.opened(),
            ["Solution/App/src/a.rs", "Solution/App/src", "Solution/App/c.rs"]
        );
        let diagnostics = s.ext.recent_diagnostics(10);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].source, OPEN_ALL_SUB_ITEMS);
        assert!(diagnostics[0].message.contains("b.rs"));
    }

    #[test]
    fn separator_setting_reaches_the_resolver() {
        let s = setup();
        assert_eq!(s.ext.resolver().separator(), '/');
        s.host.select(&["Solution/App"]).unwrap();
        assert!(s.ext.execute(CMD_IN_PROJECT_CONTAINING_FOLDER));
        assert_eq!(s.launcher.calls(), [Launch::Terminal("/w/App/".into())]);
    }
}
