//! The flat result taxonomy shared with the protocol layer.
//!
//! Numeric values are part of the external contract and must never change.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Result code of every core operation.
///
/// `Display` and `FromStr` use the stable `ERROR_*` text that clients see.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[repr(i32)]
pub enum ErrorCode {
    #[strum(serialize = "SUCCESS")]
    Success = 0,
    #[strum(serialize = "ERROR_NOT_FOUND")]
    NotFound = -1,
    #[strum(serialize = "ERROR_PERMISSION_DENIED")]
    PermissionDenied = -2,
    #[strum(serialize = "ERROR_IO_ERROR")]
    IoError = -3,
    #[strum(serialize = "ERROR_INVALID_PATH")]
    InvalidPath = -4,
    #[strum(serialize = "ERROR_FILE_EXISTS")]
    FileExists = -5,
    #[strum(serialize = "ERROR_NO_SPACE")]
    NoSpace = -6,
    #[strum(serialize = "ERROR_INVALID_CONFIG")]
    InvalidConfig = -7,
    #[strum(serialize = "ERROR_NOT_IMPLEMENTED")]
    NotImplemented = -8,
    #[strum(serialize = "ERROR_INVALID_SESSION")]
    InvalidSession = -9,
    #[strum(serialize = "ERROR_DIRECTORY_NOT_EMPTY")]
    DirectoryNotEmpty = -10,
    #[strum(serialize = "ERROR_INVALID_OPERATION")]
    InvalidOperation = -11,
}

impl ErrorCode {
    /// The wire integer for this code.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Look up a code by its wire integer.
    pub fn from_code(code: i32) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|c| c.code() == code)
    }

    /// Stable user-facing text, e.g. `ERROR_NOT_FOUND`.
    pub fn message(self) -> &'static str {
        self.into()
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

// ============================================================================
// Tests
// ============================================================================
