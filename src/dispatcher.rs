//! Routes command invocations to handlers.
//!
//! Execution re-derives availability with the same predicate status queries
//! use, so a command the host would show as disabled never runs.

use tracing::{debug, info, warn};

use crate::availability::Availability;
use crate::diagnostics::Level;
use crate::error::CommandError;
use crate::host::{TreeNode, WindowKind};
use crate::registry::{CommandRegistry, HandlerContext};

pub struct Dispatcher<'a, N> {
    registry: &'a CommandRegistry<N>,
    context: HandlerContext<'a, N>,
}

impl<'a, N: TreeNode> Dispatcher<'a, N> {
    pub fn new(registry: &'a CommandRegistry<N>, context: HandlerContext<'a, N>) -> Self {
        Self { registry, context }
    }

    /// Runs `name` against `selection`. Returns whether the command was
    /// handled; unknown and currently disabled commands are not.
    pub fn execute(
        &self,
        name: &str,
        selection: &[N],
        window_visible: impl Fn(WindowKind) -> bool,
    ) -> bool {
        match self.try_execute(name, selection, window_visible) {
            Ok(()) => true,
            Err(e @ CommandError::UnknownCommand { .. }) => {
                warn!(command = name, "unhandled command");
                self.context.diagnostics.record(Level::Warn, name, e.to_string());
                false
            }
            Err(CommandError::Disabled { .. }) => {
                debug!(command = name, "command not available; skipped");
                false
            }
            Err(e) => {
                warn!(command = name, error = %e, "command failed");
                self.context.diagnostics.record(Level::Error, name, e.to_string());
                true
            }
        }
    }

    pub fn try_execute(
        &self,
        name: &str,
        selection: &[N],
        window_visible: impl Fn(WindowKind) -> bool,
    ) -> Result<(), CommandError> {
        let spec = self
            .registry
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand {
                name: name.to_string(),
            })?;
        let availability = Availability::new(self.registry, self.context.resolver);
        if !availability
            .status_of(spec, selection, window_visible)
            .is_enabled()
        {
            return Err(CommandError::Disabled {
                name: spec.name().to_string(),
            });
        }
        info!(command = spec.name(), selected = selection.len(), "handling command");
        spec.run(&self.context, selection)
    }
}
