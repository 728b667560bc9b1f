//! The storage engine: one owner for the tree, identity store, and ledger.
//!
//! Operation managers are `impl StorageEngine` blocks under [`crate::ops`];
//! they all take `&mut self`, so exclusive access is the caller's problem.
//! In a server that caller is the [`crate::worker::Worker`].

use std::path::{Path, PathBuf};

use omnifs_types::{DirEntry, SessionHandle, SessionInfo, unix_now};

use crate::codec::header::ContainerHeader;
use crate::config::ContainerConfig;
use crate::error::FsResult;
use crate::identity::IdentityStore;
use crate::ledger::FreeBlockLedger;
use crate::tree::NamespaceTree;

/// Name of the root entry.
pub const ROOT_NAME: &str = "/";

#[derive(Debug)]
pub struct StorageEngine {
    pub(crate) header: ContainerHeader,
    pub(crate) tree: NamespaceTree,
    pub(crate) identity: IdentityStore,
    pub(crate) ledger: FreeBlockLedger,
    next_inode: u32,
    container_path: Option<PathBuf>,
}

impl StorageEngine {
    /// A freshly formatted, unbound engine: seeded administrator, empty root,
    /// metadata blocks marked used. Fails with `InvalidConfig` if `config`
    /// does not validate.
    pub fn new(config: &ContainerConfig) -> FsResult<Self> {
        config.validate()?;
        let header = ContainerHeader::from_config(config);
        let mut identity = IdentityStore::new(config.max_users);
        identity.seed_admin(&config.admin_username, &config.admin_password);

        let root = DirEntry::directory(ROOT_NAME, config.admin_username.as_str(), 0, unix_now());
        let tree = NamespaceTree::new(root);

        let mut ledger = FreeBlockLedger::new(config.total_blocks());
        for block in 0..config.metadata_bytes().div_ceil(config.block_size) {
            ledger.mark_used(block);
        }

        Ok(Self::from_parts(header, tree, identity, ledger))
    }

    pub(crate) fn from_parts(
        header: ContainerHeader,
        tree: NamespaceTree,
        identity: IdentityStore,
        ledger: FreeBlockLedger,
    ) -> Self {
        let next_inode = tree.max_inode().saturating_add(1);
        Self {
            header,
            tree,
            identity,
            ledger,
            next_inode,
            container_path: None,
        }
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn ledger(&self) -> &FreeBlockLedger {
        &self.ledger
    }

    pub fn block_size(&self) -> u64 {
        self.header.block_size
    }

    /// Container file that `Command::Sync` and shutdown write to.
    pub fn container_path(&self) -> Option<&Path> {
        self.container_path.as_deref()
    }

    pub fn bind(&mut self, path: impl Into<PathBuf>) {
        self.container_path = Some(path.into());
    }

    pub(crate) fn allocate_inode(&mut self) -> u32 {
        let inode = self.next_inode;
        self.next_inode = self.next_inode.saturating_add(1);
        inode
    }

    /// Validate a session handle and count the operation against it.
    pub(crate) fn authenticate(&mut self, handle: SessionHandle) -> FsResult<SessionInfo> {
        self.identity.touch(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_engine() {
        let config = ContainerConfig::default();
        let mut e = StorageEngine::new(&config).unwrap();
        let root = e.tree().entry(e.tree().root()).unwrap().clone();
        assert_eq!(root.name, "/");
        assert_eq!(root.owner, "admin");
        assert_eq!(root.mode.bits(), 0o755);
        assert_eq!(root.inode, 0);
        assert_eq!(e.identity().active_user_count(), 1);
        assert_eq!(e.allocate_inode(), 1);
        assert_eq!(e.allocate_inode(), 2);
        assert!(e.container_path().is_none());
    }

    #[test]
    fn test_metadata_blocks_marked() {
        let config = ContainerConfig::default();
        let e = StorageEngine::new(&config).unwrap();
        // 512 + 1024 * 128 + 416 bytes span 33 blocks of 4 KiB
        assert_eq!(e.ledger().used_count(), 33);
        assert!(!e.ledger().is_free(32));
        assert!(e.ledger().is_free(33));
        assert_eq!(e.ledger().total_blocks(), 12800);
    }

    #[test]
    fn test_rejects_unusable_config() {
        let zero_blocks = ContainerConfig {
            block_size: 0,
            ..ContainerConfig::default()
        };
        let err = StorageEngine::new(&zero_blocks).unwrap_err();
        assert_eq!(err.code(), omnifs_types::ErrorCode::InvalidConfig);

        let no_users = ContainerConfig {
            max_users: 0,
            ..ContainerConfig::default()
        };
        assert!(StorageEngine::new(&no_users).is_err());
    }
}
