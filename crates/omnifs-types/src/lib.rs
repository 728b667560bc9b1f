//! Shared records, handles, and error codes for omnifs.
//!
//! This is the leaf crate of the workspace: it has **no internal omnifs
//! dependencies**. Everything that crosses the storage engine boundary is
//! defined here so the protocol layer can depend on it without pulling in
//! the engine.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------------|
//! | Type              | Purpose                                            |
//! |-------------------|----------------------------------------------------|
//! | [`ErrorCode`]     | Flat, stable integer result taxonomy               |
//! | [`SessionHandle`] | Generational handle into the session registry      |
//! | [`NodeId`]        | Generational index into the namespace arena        |
//! | [`ConnectionId`]  | Opaque id of the client connection that enqueued   |
//! | [`UserRecord`]    | One credential/role entry of the user table        |
//! | [`SessionInfo`]   | Snapshot of a live session                         |
//! | [`DirEntry`]      | Metadata of one namespace node                     |
//! | [`Mode`]          | Owner/group/others permission bits                 |
//! | [`FsStats`]       | Aggregate container statistics                     |
//! |-------------------|----------------------------------------------------|

pub mod entry;
pub mod error;
pub mod ids;
pub mod stats;
pub mod user;

pub use entry::{DirEntry, EntryKind, FileMetadata, Mode};
pub use error::ErrorCode;
pub use ids::{ConnectionId, NodeId, SessionHandle};
pub use stats::FsStats;
pub use user::{SessionInfo, UserRecord, UserRole};

/// Current time as Unix seconds. Used for every on-disk timestamp.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
