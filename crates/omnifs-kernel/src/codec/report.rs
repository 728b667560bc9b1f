//! Offline size and usage report for a container file.
//!
//! Reads the header, the user table, and the trailing bitmap directly; the
//! namespace tree is measured but not decoded.

use std::path::Path;

use omnifs_types::UserRecord;
use serde::Serialize;

use super::Regions;
use super::header::ContainerHeader;
use super::layout::{HEADER_SIZE, USER_SLOT_SIZE};
use super::records;
use crate::error::FsResult;
use crate::ledger::FreeBlockLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerReport {
    pub header: ContainerHeader,
    pub file_size: u64,
    pub header_bytes: u64,
    pub user_table_bytes: u64,
    pub user_slots: u32,
    pub tree_bytes: u64,
    pub bitmap_bytes: u64,
    /// Active users in slot order.
    pub active_users: Vec<UserRecord>,
    pub total_blocks: u64,
    pub used_blocks: u64,
    pub free_blocks: u64,
    /// `used_blocks * block_size`.
    pub used_space: u64,
    pub free_space: u64,
    /// Percentage of `total_size` covered by used blocks.
    pub utilization: f64,
}

impl ContainerReport {
    pub fn read(path: impl AsRef<Path>) -> FsResult<Self> {
        let image = std::fs::read(path.as_ref())?;
        Self::from_image(&image)
    }

    pub fn from_image(image: &[u8]) -> FsResult<Self> {
        let header = ContainerHeader::decode(image)?;
        header.check_fits(image.len())?;
        let regions = Regions::locate(&header, image.len());

        let active_users = image[regions.user_table.clone()]
            .chunks_exact(USER_SLOT_SIZE)
            .map(records::decode_user)
            .filter(|u| u.active)
            .collect();

        let total_blocks = header.total_blocks();
        let ledger = match &regions.bitmap {
            Some(range) => FreeBlockLedger::from_bytes(total_blocks, &image[range.clone()]),
            None => FreeBlockLedger::new(total_blocks),
        };
        let used_blocks = ledger.used_count();
        let used_space = used_blocks * header.block_size;
        let utilization = if header.total_size == 0 {
            0.0
        } else {
            100.0 * used_space as f64 / header.total_size as f64
        };

        Ok(Self {
            file_size: image.len() as u64,
            header_bytes: HEADER_SIZE as u64,
            user_table_bytes: (header.max_users as usize * USER_SLOT_SIZE) as u64,
            user_slots: header.max_users,
            tree_bytes: regions.tree.len() as u64,
            bitmap_bytes: regions.bitmap.as_ref().map_or(0, |r| r.len() as u64),
            active_users,
            total_blocks,
            used_blocks,
            free_blocks: total_blocks - used_blocks,
            used_space,
            free_space: header.total_size.saturating_sub(used_space),
            utilization,
            header,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerConfig;
    use crate::engine::StorageEngine;

    #[test]
    fn test_fresh_container_report() {
        let config = ContainerConfig::default();
        let image = crate::codec::encode(&StorageEngine::new(&config).unwrap());
        let r = ContainerReport::from_image(&image).unwrap();

        assert_eq!(r.header_bytes, 512);
        assert_eq!(r.user_slots, 1024);
        assert_eq!(r.user_table_bytes, 1024 * 128);
        assert_eq!(r.tree_bytes, 420);
        assert_eq!(r.bitmap_bytes, 1600);
        assert_eq!(r.file_size, 512 + 1024 * 128 + 420 + 1600);
        assert_eq!(r.active_users.len(), 1);
        assert_eq!(r.active_users[0].username, "admin");
        assert_eq!(r.used_blocks, 33);
        assert_eq!(r.free_blocks, 12800 - 33);
        assert_eq!(r.used_space, 33 * 4096);
        assert!(r.utilization > 0.25 && r.utilization < 0.26);
    }

    #[test]
    fn test_read_missing_file() {
        let err = ContainerReport::read("/nonexistent/c.omni").unwrap_err();
        assert_eq!(err.code(), omnifs_types::ErrorCode::IoError);
    }
}
