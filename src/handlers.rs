//! Command implementations.
//!
//! Handlers assume the dispatcher already checked availability, but still
//! degrade gracefully when handed a selection they cannot use. Failures on
//! individual nodes are logged and recorded; they never abort the batch.

use tracing::{debug, info, warn};

use crate::diagnostics::Level;
use crate::error::CommandError;
use crate::host::{NodeKind, SendToTarget, TreeNode};
use crate::path_resolver::PathMode;
use crate::registry::{HandlerContext, OPEN_ALL_SUB_ITEMS};
use crate::tree_walker::toggle_recursive_expansion;

/// Flips each selected subtree to the opposite of its own state.
pub fn toggle_selection<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
) -> Result<(), CommandError> {
    let summary = toggle_recursive_expansion(selection);
    debug!(
        visited = summary.visited,
        flipped = summary.flipped,
        failures = summary.failures,
        "recursive toggle finished"
    );
    if summary.failures > 0 {
        ctx.diagnostics.record(
            Level::Warn,
            "toggle",
            format!("{} node(s) could not be expanded or collapsed", summary.failures),
        );
    }
    Ok(())
}

pub fn reveal_containing_folder<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
) -> Result<(), CommandError> {
    let dir = single_containing_folder(ctx, selection)?;
    ctx.launcher.reveal(&dir)?;
    Ok(())
}

pub fn terminal_in_containing_folder<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
) -> Result<(), CommandError> {
    let dir = single_containing_folder(ctx, selection)?;
    ctx.launcher.open_terminal(&dir)?;
    Ok(())
}

fn single_containing_folder<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
) -> Result<String, CommandError> {
    let [node] = selection else {
        return Err(CommandError::Unresolvable {
            node: format!("{} selected nodes", selection.len()),
        });
    };
    ctx.resolver
        .resolve(node, PathMode::ContainingFolder)
        .into_option()
        .ok_or_else(|| CommandError::Unresolvable { node: node.name() })
}

/// Tally of one open-all run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpenReport {
    pub opened: usize,
    pub failed: usize,
}

/// Opens every document below each selected project or project item.
pub fn open_all_sub_items<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
) -> Result<(), CommandError> {
    let mut report = OpenReport::default();
    for node in selection {
        if node.native().kind() == NodeKind::VirtualContainer {
            debug!(node = %node.name(), "neither a project nor an item; nothing to open");
            continue;
        }
        match node.children() {
            Ok(children) => open_recursive(ctx, &children, &mut report),
            Err(e) => record_open_failure(ctx, &node.name(), &e.to_string(), &mut report),
        }
    }
    info!(opened = report.opened, failed = report.failed, "open all sub-items finished");
    Ok(())
}

/// Children first, then the item itself.
fn open_recursive<N: TreeNode>(ctx: &HandlerContext<'_, N>, items: &[N], report: &mut OpenReport) {
    for item in items {
        match item.children() {
            Ok(children) => open_recursive(ctx, &children, report),
            Err(e) => record_open_failure(ctx, &item.name(), &e.to_string(), report),
        }
        match ctx.opener.open(item) {
            Ok(()) => {
                debug!(item = %item.name(), "opened item");
                report.opened += 1;
            }
            Err(e) => record_open_failure(ctx, &item.name(), &e.to_string(), report),
        }
    }
}

fn record_open_failure<N>(ctx: &HandlerContext<'_, N>, name: &str, error: &str, report: &mut OpenReport) {
    warn!(item = %name, %error, "error opening item");
    ctx.diagnostics.record(
        Level::Warn,
        OPEN_ALL_SUB_ITEMS,
        format!("error opening {name}: {error}"),
    );
    report.failed += 1;
}

/// Hands each selected file to `target`, in selection order.
pub fn send_to<N: TreeNode>(
    ctx: &HandlerContext<'_, N>,
    selection: &[N],
    target: &SendToTarget,
) -> Result<(), CommandError> {
    for node in selection {
        let Some(file) = ctx.resolver.resolve(node, PathMode::FullPath).into_option() else {
            debug!(node = %node.name(), "no file to send");
            continue;
        };
        if let Err(e) = ctx.launcher.send_to(target, &file) {
            warn!(target = %target.display_name, %file, error = %e, "send to failed");
            ctx.diagnostics.record(
                Level::Error,
                &target.display_name,
                format!("cannot send {file}: {e}"),
            );
        }
    }
    Ok(())
}
