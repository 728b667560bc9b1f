//! Aggregate container statistics.

use serde::{Deserialize, Serialize};

/// Result of `get_stats`.
///
/// `used_space` sums only the files directly under `/`; the file and
/// directory counts cover the whole tree. Block counts come from the
/// free-block ledger and describe the metadata region, not file payloads.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FsStats {
    pub total_size: u64,
    pub used_space: u64,
    pub free_space: u64,
    pub total_files: u32,
    /// Includes the root directory.
    pub total_directories: u32,
    /// Active users only.
    pub total_users: u32,
    pub active_sessions: u32,
    pub total_blocks: u64,
    pub used_blocks: u64,
    pub free_blocks: u64,
    /// Always 0.0; payloads are not block-mapped.
    pub fragmentation: f64,
}
