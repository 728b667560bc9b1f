//! User and session records.
//!
//! A `UserRecord` is one slot of the container's user table. A `SessionInfo`
//! is the snapshot handed out by the session registry; it carries a copy of
//! the user record taken at login, so role changes made later do not leak
//! into an existing session.

use serde::{Deserialize, Serialize};

use crate::ids::SessionHandle;

/// Maximum username length in bytes (32-byte on-disk field, NUL terminated).
pub const MAX_USERNAME_LEN: usize = 31;

/// Role of a user. Values are persisted as `u32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum UserRole {
    #[default]
    Normal = 0,
    Admin = 1,
}

impl UserRole {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Decode a persisted role. Unknown values are treated as `Normal`.
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            1 => Self::Admin,
            _ => Self::Normal,
        }
    }

    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => f.write_str("NORMAL"),
            Self::Admin => f.write_str("ADMIN"),
        }
    }
}

/// One credential/role entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique login name, at most [`MAX_USERNAME_LEN`] bytes.
    pub username: String,
    /// Hex-encoded credential digest. Plaintext secrets are never stored.
    pub password_digest: String,
    pub role: UserRole,
    /// Account creation time (Unix seconds).
    pub created_at: u64,
    /// Last successful login (Unix seconds), 0 if never.
    pub last_login: u64,
    /// Cleared by soft delete.
    pub active: bool,
}

impl UserRecord {
    pub fn new(
        username: impl Into<String>,
        password_digest: impl Into<String>,
        role: UserRole,
        created_at: u64,
    ) -> Self {
        Self {
            username: username.into(),
            password_digest: password_digest.into(),
            role,
            created_at,
            last_login: 0,
            active: true,
        }
    }
}

/// Snapshot of a live session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub handle: SessionHandle,
    /// The user record as it was at login.
    pub user: UserRecord,
    pub login_time: u64,
    pub last_activity: u64,
    pub operations_count: u32,
}

impl SessionInfo {
    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }
}

// ============================================================================
// Tests
// ============================================================================
