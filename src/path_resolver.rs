//! Filesystem path resolution for explorer nodes.
//!
//! Host objects share no common path property. A file item exposes a
//! `FullPath`, a solution-level item only carries file names, a project
//! knows its full name, and installer projects report a full name that has
//! no file behind it. Resolution probes those capabilities in a fixed order
//! and takes the first answer.

use tracing::debug;

use crate::error::HostResult;
use crate::host::{NativeObject, NodeKind, TreeNode};

/// What part of a node's path the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    FullPath,
    /// The directory holding the node, with a trailing separator.
    ContainingFolder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathResult {
    Resolved(String),
    Unresolvable,
}

impl PathResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Unresolvable => None,
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            Self::Resolved(path) => Some(path),
            Self::Unresolvable => None,
        }
    }
}

/// Resolves nodes to paths using one canonical directory separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResolver {
    separator: char,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            separator: std::path::MAIN_SEPARATOR,
        }
    }
}

impl PathResolver {
    pub fn with_separator(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Best-effort path for `node`. Probe failures are logged and reported
    /// as [`PathResult::Unresolvable`].
    pub fn resolve<N: TreeNode>(&self, node: &N, mode: PathMode) -> PathResult {
        let name = node.name();
        match raw_path(node.native(), mode) {
            Ok(Some(raw)) => self.finish(&name, &raw, mode),
            Ok(None) => {
                debug!(node = %name, ?mode, "node exposes no path");
                PathResult::Unresolvable
            }
            Err(e) => {
                debug!(node = %name, error = %e, "path probe failed");
                PathResult::Unresolvable
            }
        }
    }

    fn finish(&self, name: &str, raw: &str, mode: PathMode) -> PathResult {
        let sep = self.separator;
        let mut path: String = raw
            .chars()
            .map(|c| if is_separator(c) { sep } else { c })
            .collect();

        // No separator at all: a virtual folder that only exists in the project.
        let Some(last) = path.rfind(sep) else {
            debug!(node = %name, path = %raw, "path has no directory separator");
            return PathResult::Unresolvable;
        };

        if mode == PathMode::ContainingFolder && !path.ends_with(sep) {
            path.truncate(last + sep.len_utf8());
        }
        debug!(node = %name, ?mode, %path, "resolved path");
        PathResult::Resolved(path)
    }
}

fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// First path-like string the payload offers, before normalization.
fn raw_path(native: &dyn NativeObject, mode: PathMode) -> HostResult<Option<String>> {
    if let Some(path) = native.full_path()? {
        return Ok(Some(path));
    }
    if let Some(first) = native.file_names()?.into_iter().next() {
        return Ok(Some(first));
    }
    if native.kind() != NodeKind::Project {
        return Ok(None);
    }
    let Some(full_name) = native.full_name()? else {
        return Ok(None);
    };
    if !is_installer_project(native) {
        return Ok(Some(full_name));
    }
    match mode {
        // The full name of an installer project names no file on disk.
        PathMode::FullPath => Ok(None),
        PathMode::ContainingFolder => {
            let project_name = native.project_name()?.unwrap_or_default();
            Ok(Some(strip_trailing_name(full_name, &project_name)))
        }
    }
}

/// Installer projects are the only ones with a product name. A probe that
/// fails counts as "not an installer".
fn is_installer_project(native: &dyn NativeObject) -> bool {
    matches!(native.product_name(), Ok(Some(_)))
}

/// Removes the last occurrence of `name` and any separators it leaves
/// dangling at the end.
fn strip_trailing_name(mut full_name: String, name: &str) -> String {
    if name.is_empty() {
        return full_name;
    }
    if let Some(idx) = full_name.rfind(name) {
        full_name.replace_range(idx..idx + name.len(), "");
        let kept = full_name.trim_end_matches(is_separator).len();
        full_name.truncate(kept);
    }
    full_name
}
