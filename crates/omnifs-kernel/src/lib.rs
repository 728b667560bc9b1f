//! # omnifs-kernel
//!
//! Storage engine for the omnifs single-file container.
//!
//! A container is one flat binary file: a header, a fixed-size user table,
//! a pre-order encoding of the namespace tree, and a free-block bitmap.
//! The engine:
//! - Loads the whole container into memory and writes it back in one piece
//! - Resolves absolute paths over an arena-backed namespace tree
//! - Authenticates users and hands out generational session handles
//! - Checks owner/others permission bits, with administrators exempt
//! - Runs every operation on one writer thread fed by a FIFO queue

pub mod access;
pub mod codec;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod ops;
pub mod queue;
pub mod tree;
pub mod worker;

pub use codec::report::ContainerReport;
pub use codec::{format, load, save};
pub use command::{Command, Reply};
pub use config::ContainerConfig;
pub use engine::StorageEngine;
pub use error::{FsError, FsResult, result_code};
pub use identity::{IdentityStore, hash_credential};
pub use ledger::FreeBlockLedger;
pub use queue::{Request, RequestQueue};
pub use tree::{NamespaceTree, Node};
pub use worker::{CommandQueue, Worker};

pub use omnifs_types::{
    ConnectionId, DirEntry, EntryKind, ErrorCode, FileMetadata, FsStats, Mode, NodeId,
    SessionHandle, SessionInfo, UserRecord, UserRole,
};
