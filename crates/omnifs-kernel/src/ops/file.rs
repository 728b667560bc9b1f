//! File operations.
//!
//! Creation is gated on WRITE access to the parent directory. Once a file
//! exists, mutating it (edit, truncate, delete, rename) is gated on
//! ownership alone; its mode bits are not consulted. Edit, truncate and
//! delete answer `PermissionDenied` for a path that does not resolve.
//! Reads are ungated.

use omnifs_types::{DirEntry, Mode, SessionHandle, unix_now};

use super::split_target;
use crate::access;
use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};
use crate::tree::Node;

impl StorageEngine {
    /// Create a file owned by the caller holding `data`.
    pub fn file_create(&mut self, session: SessionHandle, path: &str, data: &[u8]) -> FsResult<()> {
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
        let entry = DirEntry::file(name, caller.username(), inode, data.len() as u64, unix_now());
        self.tree.add_child(parent, Node::with_data(entry, data.to_vec()))?;
        tracing::debug!(%path, user = %caller.username(), size = data.len(), "file created");
        Ok(())
    }

    /// Copy of a file's payload.
    pub fn file_read(&mut self, session: SessionHandle, path: &str) -> FsResult<Vec<u8>> {
        self.authenticate(session)?;
        self.tree
            .resolve(path)
            .and_then(|id| self.tree.get(id))
            .filter(|n| !n.is_dir())
            .map(|n| n.data.clone())
            .ok_or_else(|| FsError::not_found(path))
    }

    /// Overwrite `data.len()` bytes at `offset`, growing the file as needed.
    /// `offset` may equal the current length (append) but not exceed it.
    pub fn file_edit(
        &mut self,
        session: SessionHandle,
        path: &str,
        data: &[u8],
        offset: u64,
    ) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let node = self.owned_file_mut(&caller, path)?;

        let len = node.data.len() as u64;
        if offset > len {
            return Err(FsError::invalid_operation(format!(
                "offset {} is past the end of {} ({} bytes)",
                offset, path, len
            )));
        }
        let start = offset as usize;
        let end = start + data.len();
        if end > node.data.len() {
            node.data.resize(end, 0);
        }
        node.data[start..end].copy_from_slice(data);
        node.entry.size = node.data.len() as u64;
        node.entry.modified_at = unix_now();
        tracing::debug!(%path, offset, len = data.len(), "file edited");
        Ok(())
    }

    /// Drop a file's payload.
    pub fn file_truncate(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let node = self.owned_file_mut(&caller, path)?;
        node.data.clear();
        node.entry.size = 0;
        node.entry.modified_at = unix_now();
        tracing::debug!(%path, "file truncated");
        Ok(())
    }

    pub fn file_delete(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let node = self
            .tree
            .resolve(path)
            .and_then(|id| self.tree.get(id))
            .filter(|n| access::owns_or_admin(&caller, &n.entry))
            .ok_or_else(|| FsError::permission_denied(path))?;
        let parent = node
            .parent()
            .ok_or_else(|| FsError::invalid_operation("cannot delete the root directory"))?;
        if node.is_dir() {
            return Err(FsError::invalid_operation(format!(
                "{} is a directory, use dir_delete",
                path
            )));
        }
        let name = node.entry.name.clone();
        self.tree.remove_child(parent, &name);
        tracing::debug!(%path, user = %caller.username(), "file deleted");
        Ok(())
    }

    /// `Ok` if anything exists at `path`.
    pub fn file_exists(&mut self, session: SessionHandle, path: &str) -> FsResult<()> {
        self.authenticate(session)?;
        self.resolve_existing(path).map(|_| ())
    }

    /// Move and/or rename a node. The target name must be free in the new
    /// parent; a node cannot be moved beneath itself.
    pub fn file_rename(&mut self, session: SessionHandle, old: &str, new: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let id = self.resolve_existing(old)?;
        let node = self.tree.get(id).ok_or_else(|| FsError::not_found(old))?;
        if !access::owns_or_admin(&caller, &node.entry) {
            return Err(FsError::permission_denied(old));
        }
        let old_parent = node
            .parent()
            .ok_or_else(|| FsError::invalid_operation("cannot rename the root directory"))?;
        let old_name = node.entry.name.clone();

        let (new_parent_path, new_name) = split_target(new)?;
        let new_parent = self.resolve_parent_dir(new_parent_path)?;
        if self.tree.find_child(new_parent, new_name).is_some() {
            return Err(FsError::file_exists(new));
        }
        if self.tree.is_ancestor(id, new_parent) {
            return Err(FsError::invalid_operation(format!(
                "cannot move {} beneath itself",
                old
            )));
        }

        self.tree.detach_child(old_parent, &old_name);
        self.set_name(id, new_name);
        if let Err(e) = self.tree.attach(new_parent, id) {
            self.set_name(id, &old_name);
            self.tree.attach(old_parent, id)?;
            return Err(e);
        }
        tracing::debug!(%old, %new, user = %caller.username(), "renamed");
        Ok(())
    }

    fn set_name(&mut self, id: omnifs_types::NodeId, name: &str) {
        if let Some(n) = self.tree.get_mut(id) {
            n.entry.name = name.to_string();
        }
    }

    /// A file node the caller owns (or may touch as admin). A missing path
    /// is refused the same way as someone else's file.
    fn owned_file_mut(
        &mut self,
        caller: &omnifs_types::SessionInfo,
        path: &str,
    ) -> FsResult<&mut Node> {
        let node = self
            .tree
            .resolve(path)
            .and_then(|id| self.tree.get_mut(id))
            .filter(|n| access::owns_or_admin(caller, &n.entry))
            .ok_or_else(|| FsError::permission_denied(path))?;
        if node.is_dir() {
            return Err(FsError::invalid_operation(format!("{} is a directory", path)));
        }
        Ok(node)
    }
}
