//! Directory operations.

use omnifs_types::{DirEntry, Mode, SessionHandle, unix_now};

use super::split_target;
use crate::access;
use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};
use crate::tree::Node;

impl StorageEngine {
    /// Create an empty directory owned by the caller.
    pub fn dir_create(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let (parent_path, name) = split_target(path)?;
        let parent = self.resolve_parent_dir(parent_path)?;

        if !access::check(Some(&caller), self.tree.entry(parent), Mode::WRITE) {
            return Err(FsError::permission_denied(parent_path));
        }
        if self.tree.find_child(parent, name).is_some() {
            return Err(FsError::file_exists(path));
        }

        let inode = self.allocate_inode();
        let entry = DirEntry::directory(name, caller.username(), inode, unix_now());
        self.tree.add_child(parent, Node::new(entry))?;
        tracing::debug!(%path, user = %caller.username(), inode, "directory created");
        Ok(())
    }

    /// Entries of a directory's immediate children, in insertion order.
    pub fn dir_list(&mut self, session: SessionHandle, path: &str) -> FsResult<Vec<DirEntry>> {
        let caller = self.authenticate(session)?;
        let id = self.resolve_existing(path)?;
        let node = self
            .tree
            .get(id)
            .ok_or_else(|| FsError::not_found(path))?;
        if !node.is_dir() {
            return Err(FsError::invalid_operation(format!("{} is not a directory", path)));
        }
        if !access::check(Some(&caller), Some(&node.entry), Mode::READ) {
            return Err(FsError::permission_denied(path));
        }
        Ok(node
            .children()
            .iter()
            .filter_map(|&c| self.tree.entry(c).cloned())
            .collect())
    }

    /// Remove an empty, non-root directory.
    pub fn dir_delete(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        if path == "/" {
            return Err(FsError::invalid_operation("cannot delete the root directory"));
        }
        let id = self.resolve_existing(path)?;
        let node = self
            .tree
            .get(id)
            .ok_or_else(|| FsError::not_found(path))?;
        if !node.is_dir() {
            return Err(FsError::invalid_operation(format!("{} is not a directory", path)));
        }
        let parent = node
            .parent()
            .ok_or_else(|| FsError::invalid_operation("cannot delete the root directory"))?;
        if !access::check(Some(&caller), self.tree.entry(parent), Mode::WRITE) {
            return Err(FsError::permission_denied(path));
        }
        if !node.children().is_empty() {
            return Err(FsError::directory_not_empty(path));
        }

        let name = node.entry.name.clone();
        self.tree.remove_child(parent, &name);
        tracing::debug!(%path, user = %caller.username(), "directory deleted");
        Ok(())
    }

    /// `Ok` for a directory, `InvalidOperation` for a file, `NotFound`
    /// otherwise.
    pub fn dir_exists(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        self.authenticate(session)?;
        let id = self.resolve_existing(path)?;
        match self.tree.get(id) {
            Some(n) if n.is_dir() => Ok(()),
            Some(_) => Err(FsError::invalid_operation(format!("{} is a file", path))),
            None => Err(FsError::not_found(path)),
        }
    }
}
