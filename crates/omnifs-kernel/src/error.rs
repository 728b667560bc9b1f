//! Storage engine error type.

use std::io;

use omnifs_types::ErrorCode;
use thiserror::Error;

/// Error returned by every fallible engine call.
///
/// Each variant maps onto exactly one [`ErrorCode`]; the string payload is
/// context for logs and is not part of the wire contract.
#[derive(Debug, Error)]
pub enum FsError {
    /// Path, user, or node not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks the required rights.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Container file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Path or name does not fit the container format.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Name or username already taken.
    #[error("already exists: {0}")]
    FileExists(String),

    /// A fixed-size table is full.
    #[error("no space: {0}")]
    NoSpace(String),

    /// Configuration or container header is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Container uses a format this build does not understand.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Session handle is unknown or expired.
    #[error("invalid session")]
    InvalidSession,

    /// Directory still has children.
    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Operation not allowed on this target.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl FsError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn permission_denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }

    pub fn invalid_path(what: impl Into<String>) -> Self {
        Self::InvalidPath(what.into())
    }

    pub fn file_exists(what: impl Into<String>) -> Self {
        Self::FileExists(what.into())
    }

    pub fn no_space(what: impl Into<String>) -> Self {
        Self::NoSpace(what.into())
    }

    pub fn invalid_config(what: impl Into<String>) -> Self {
        Self::InvalidConfig(what.into())
    }

    pub fn directory_not_empty(what: impl Into<String>) -> Self {
        Self::DirectoryNotEmpty(what.into())
    }

    pub fn invalid_operation(what: impl Into<String>) -> Self {
        Self::InvalidOperation(what.into())
    }

    /// The wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Io(_) => ErrorCode::IoError,
            Self::InvalidPath(_) => ErrorCode::InvalidPath,
            Self::FileExists(_) => ErrorCode::FileExists,
            Self::NoSpace(_) => ErrorCode::NoSpace,
            Self::InvalidConfig(_) => ErrorCode::InvalidConfig,
            Self::NotImplemented(_) => ErrorCode::NotImplemented,
            Self::InvalidSession => ErrorCode::InvalidSession,
            Self::DirectoryNotEmpty(_) => ErrorCode::DirectoryNotEmpty,
            Self::InvalidOperation(_) => ErrorCode::InvalidOperation,
        }
    }
}

impl From<toml::de::Error> for FsError {
    fn from(e: toml::de::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

/// Collapse a result into its wire code.
pub fn result_code<T>(result: &FsResult<T>) -> ErrorCode {
    match result {
        Ok(_) => ErrorCode::Success,
        Err(e) => e.code(),
    }
}

/// Engine result type.
pub type FsResult<T> = Result<T, FsError>;
