//! Operation managers.
//!
//! Every call authenticates its session handle first (an unknown handle is
//! `InvalidSession` before any path is looked at), then resolves paths,
//! checks access, and mutates the tree in place.

mod dir;
mod file;
mod meta;
mod user;

use omnifs_types::NodeId;

use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};
use crate::tree::path;

/// Split `path` into its parent path and a storable final name.
pub(crate) fn split_target(target: &str) -> FsResult<(&str, &str)> {
    if !target.starts_with('/') {
        return Err(FsError::invalid_operation(format!(
            "path must be absolute: {:?}",
            target
        )));
    }
    let (parent, name) = path::split_parent(target)
        .ok_or_else(|| FsError::invalid_operation(format!("malformed path {:?}", target)))?;
    path::validate_name(name)?;
    Ok((parent, name))
}

impl StorageEngine {
    pub(crate) fn resolve_existing(&self, target: &str) -> FsResult<NodeId> {
        self.tree
            .resolve(target)
            .ok_or_else(|| FsError::not_found(target))
    }

    /// Resolve a would-be parent. Missing parents and non-directories are
    /// both `NotFound`.
    pub(crate) fn resolve_parent_dir(&self, parent: &str) -> FsResult<NodeId> {
        self.tree
            .resolve(parent)
            .filter(|&id| self.tree.get(id).is_some_and(|n| n.is_dir()))
            .ok_or_else(|| FsError::not_found(format!("directory {}", parent)))
    }
}
