//! Namespace entry metadata and permission bits.

use serde::{Deserialize, Serialize};

/// Maximum entry name length in bytes (256-byte on-disk field, NUL terminated).
pub const MAX_NAME_LEN: usize = 255;

/// Default mode of newly created directories.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Default mode of newly created files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Kind of a namespace node. Persisted as a single byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EntryKind {
    File = 0,
    Directory = 1,
}

impl EntryKind {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::File),
            1 => Some(Self::Directory),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

bitflags::bitflags! {
    /// UNIX-style permission bits.
    ///
    /// Stored verbatim; bits outside the nine defined flags are retained.
    /// Group bits are persisted but never evaluated.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Mode: u32 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXECUTE = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXECUTE = 0o010;
        const OTHERS_READ = 0o004;
        const OTHERS_WRITE = 0o002;
        const OTHERS_EXECUTE = 0o001;
    }
}

impl Mode {
    /// Rights requests are expressed in owner bits.
    pub const READ: Mode = Mode::OWNER_READ;
    pub const WRITE: Mode = Mode::OWNER_WRITE;
    pub const EXECUTE: Mode = Mode::OWNER_EXECUTE;

    /// The owner-bit subset of this mask.
    pub fn owner_part(self) -> Mode {
        self & (Mode::OWNER_READ | Mode::OWNER_WRITE | Mode::OWNER_EXECUTE)
    }

    /// The owner bits of this mask shifted onto the others positions.
    pub fn as_others(self) -> Mode {
        Mode::from_bits_retain(self.owner_part().bits() >> 6)
    }
}

/// Metadata of one namespace node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not the full path).
    pub name: String,
    pub kind: EntryKind,
    /// Payload length in bytes, 0 for directories.
    pub size: u64,
    pub mode: Mode,
    /// Creation time (Unix seconds).
    pub created_at: u64,
    /// Last modification time (Unix seconds).
    pub modified_at: u64,
    /// Username of the owner.
    pub owner: String,
    pub inode: u32,
}

impl DirEntry {
    /// Entry for a new directory with the default mode.
    pub fn directory(name: impl Into<String>, owner: impl Into<String>, inode: u32, now: u64) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            size: 0,
            mode: Mode::from_bits_retain(DEFAULT_DIR_MODE),
            created_at: now,
            modified_at: now,
            owner: owner.into(),
            inode,
        }
    }

    /// Entry for a new file of `size` bytes with the default mode.
    pub fn file(
        name: impl Into<String>,
        owner: impl Into<String>,
        inode: u32,
        size: u64,
        now: u64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            size,
            mode: Mode::from_bits_retain(DEFAULT_FILE_MODE),
            created_at: now,
            modified_at: now,
            owner: owner.into(),
            inode,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }
}

/// Extended metadata returned by `get_metadata`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Full path the entry was resolved from.
    pub path: String,
    pub entry: DirEntry,
    /// Blocks a payload of this size occupies.
    pub blocks_used: u64,
    /// `blocks_used * block_size`.
    pub actual_size: u64,
}

// ============================================================================
// Tests
// ============================================================================
