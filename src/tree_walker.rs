//! Recursive expand/contract of explorer subtrees.

use tracing::{debug, warn};

use crate::host::TreeNode;

/// Counters from one recursive toggle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleSummary {
    /// Nodes with children that were reached.
    pub visited: usize,
    /// Nodes whose flag actually changed.
    pub flipped: usize,
    /// Nodes a host call failed on.
    pub failures: usize,
}

impl ToggleSummary {
    fn absorb(&mut self, other: ToggleSummary) {
        self.visited += other.visited;
        self.flipped += other.flipped;
        self.failures += other.failures;
    }
}

/// Sets `root` and every descendant with children to `expand`.
///
/// Post-order: children settle before their parent, so an expanded node
/// never shows collapsed descendants and contraction runs leaves-up. Leaves
/// are left alone. A host failure on one node is counted and skipped.
pub fn toggle_recursive<N: TreeNode>(root: &N, expand: bool) -> ToggleSummary {
    match root.children() {
        Ok(children) => toggle_listed(root, &children, expand),
        Err(e) => {
            warn!(node = %root.name(), error = %e, "cannot enumerate children");
            ToggleSummary {
                failures: 1,
                ..ToggleSummary::default()
            }
        }
    }
}

/// [`toggle_recursive`] for a root whose children are already enumerated.
fn toggle_listed<N: TreeNode>(root: &N, children: &[N], expand: bool) -> ToggleSummary {
    let mut summary = ToggleSummary::default();
    if children.is_empty() {
        return summary;
    }

    for child in children {
        summary.absorb(toggle_recursive(child, expand));
    }

    summary.visited += 1;
    match root.is_expanded() {
        Ok(current) if current == expand => {}
        _ => match root.set_expanded(expand) {
            Ok(()) => summary.flipped += 1,
            Err(e) => {
                warn!(node = %root.name(), error = %e, "cannot set expansion");
                summary.failures += 1;
            }
        },
    }
    summary
}

/// Toggles each selected subtree on its own: every node moves to the
/// opposite of its own current state.
pub fn toggle_recursive_expansion<N: TreeNode>(selection: &[N]) -> ToggleSummary {
    let mut summary = ToggleSummary::default();
    for node in selection {
        let children = match node.children() {
            Ok(children) => children,
            Err(e) => {
                warn!(node = %node.name(), error = %e, "cannot enumerate children");
                summary.failures += 1;
                continue;
            }
        };
        if children.is_empty() {
            continue;
        }
        let expand = match node.is_expanded() {
            Ok(expanded) => !expanded,
            Err(e) => {
                warn!(node = %node.name(), error = %e, "cannot read expansion");
                summary.failures += 1;
                continue;
            }
        };
        debug!(node = %node.name(), expand, "toggling subtree");
        summary.absorb(toggle_listed(node, &children, expand));
    }
    summary
}
