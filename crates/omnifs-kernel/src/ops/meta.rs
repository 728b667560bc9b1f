//! Metadata queries and attribute changes.

use omnifs_types::{FileMetadata, FsStats, Mode, SessionHandle};

use crate::engine::StorageEngine;
use crate::error::{FsError, FsResult};

impl StorageEngine {
    pub fn get_metadata(&mut self, session: SessionHandle, path: &str) -> FsResult<FileMetadata> {
        self.authenticate(session)?;
        let id = self.resolve_existing(path)?;
        let entry = self
            .tree
            .entry(id)
            .cloned()
            .ok_or_else(|| FsError::not_found(path))?;
        let block_size = self.block_size();
        let blocks_used = entry.size.div_ceil(block_size);
        Ok(FileMetadata {
            path: path.to_string(),
            entry,
            blocks_used,
            actual_size: blocks_used * block_size,
        })
    }

    /// Overwrite a node's mode bits.
    ///
    /// Any authenticated session may do this; only path resolution is
    /// checked. Every other mutation requires ownership or write access.
    pub fn set_permissions(&mut self, session: SessionHandle, path: &str, bits: u32) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        let id = self.resolve_existing(path)?;
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| FsError::not_found(path))?;
        node.entry.mode = Mode::from_bits_retain(bits);
        tracing::debug!(%path, mode = %format!("{:o}", bits), user = %caller.username(), "permissions set");
        Ok(())
    }

    /// Hand a node to another active user. Administrators only.
    pub fn set_owner(&mut self, session: SessionHandle, path: &str, new_owner: &str) -> FsResult<()> {
        let caller = self.authenticate(session)?;
        if !caller.is_admin() {
            return Err(FsError::permission_denied(format!(
                "{} may not change owners",
                caller.username()
            )));
        }
        let id = self.resolve_existing(path)?;
        if self.identity.user(new_owner).is_none() {
            return Err(FsError::not_found(format!("user {}", new_owner)));
        }
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| FsError::not_found(path))?;
        node.entry.owner = new_owner.to_string();
        tracing::debug!(%path, owner = %new_owner, "owner set");
        Ok(())
    }

    /// Aggregate counters.
    ///
    /// `used_space` sums the sizes of files directly under `/` only; file
    /// and directory counts walk the whole tree.
    pub fn get_stats(&mut self, session: SessionHandle) -> FsResult<FsStats> {
        self.authenticate(session)?;
        let root = self.tree.root();
        let used_space = self
            .tree
            .get(root)
            .map(|r| {
                r.children()
                    .iter()
                    .filter_map(|&c| self.tree.entry(c))
                    .filter(|e| e.is_file())
                    .map(|e| e.size)
                    .sum::<u64>()
            })
            .unwrap_or(0);
        let total_size = self.header.total_size;
        let (total_files, total_directories) = self.tree.count_kinds();
        let used_blocks = self.ledger.used_count();

        Ok(FsStats {
            total_size,
            used_space,
            free_space: total_size.saturating_sub(used_space),
            total_files,
            total_directories,
            total_users: self.identity.active_user_count() as u32,
            active_sessions: self.identity.active_session_count() as u32,
            total_blocks: self.ledger.total_blocks(),
            used_blocks,
            free_blocks: self.ledger.total_blocks() - used_blocks,
            fragmentation: 0.0,
        })
    }
}
