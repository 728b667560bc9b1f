//! Container configuration.
//!
//! Read from a TOML file:
//!
//! ```toml
//! total_size = 52428800
//! block_size = 4096
//! max_users = 1024
//! admin_username = "admin"
//! admin_password = "admin123"
//! creator_id = "ops-team"
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::codec::layout::{ENTRY_SIZE, HEADER_SIZE, USER_SLOT_SIZE};
use crate::error::{FsError, FsResult};

pub const DEFAULT_TOTAL_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_BLOCK_SIZE: u64 = 4096;
pub const DEFAULT_MAX_USERS: u32 = 1024;
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Parameters used to format a new container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Configured container capacity in bytes.
    pub total_size: u64,
    pub block_size: u64,
    /// Number of slots in the user table.
    pub max_users: u32,
    /// Administrator seeded into slot 0.
    pub admin_username: String,
    pub admin_password: String,
    /// Free-form creator tag stored in the header (at most 31 bytes kept).
    pub creator_id: String,

    /// SHA-256 hex of the config file text, empty when built in code.
    #[serde(skip)]
    pub config_hash: String,
    /// When the config was read (Unix seconds), 0 when built in code.
    #[serde(skip)]
    pub config_timestamp: u64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            total_size: DEFAULT_TOTAL_SIZE,
            block_size: DEFAULT_BLOCK_SIZE,
            max_users: DEFAULT_MAX_USERS,
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            creator_id: String::new(),
            config_hash: String::new(),
            config_timestamp: 0,
        }
    }
}

impl ContainerConfig {
    /// Parse TOML text, stamping the text's fingerprint into the config.
    pub fn from_toml_str(text: &str) -> FsResult<Self> {
        let mut config: ContainerConfig = toml::from_str(text)?;
        config.config_hash = hex::encode(Sha256::digest(text.as_bytes()));
        config.config_timestamp = omnifs_types::unix_now();
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> FsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FsError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded container config");
        Ok(config)
    }

    /// Number of blocks in the container grid, rounded up.
    pub fn total_blocks(&self) -> u64 {
        self.total_size.div_ceil(self.block_size)
    }

    /// Bytes of the fixed metadata region: header, user table, root entry.
    pub fn metadata_bytes(&self) -> u64 {
        (HEADER_SIZE + self.max_users as usize * USER_SLOT_SIZE + ENTRY_SIZE) as u64
    }

    pub fn validate(&self) -> FsResult<()> {
        if self.block_size == 0 {
            return Err(FsError::invalid_config("block_size must be non-zero"));
        }
        if self.total_size < self.block_size {
            return Err(FsError::invalid_config(format!(
                "total_size {} is smaller than block_size {}",
                self.total_size, self.block_size
            )));
        }
        if self.max_users == 0 {
            return Err(FsError::invalid_config("max_users must be at least 1"));
        }
        if self.admin_username.is_empty()
            || self.admin_username.len() > omnifs_types::user::MAX_USERNAME_LEN
        {
            return Err(FsError::invalid_config(format!(
                "admin_username must be 1..={} bytes",
                omnifs_types::user::MAX_USERNAME_LEN
            )));
        }
        if self.metadata_bytes() > self.total_size {
            return Err(FsError::invalid_config(format!(
                "metadata region ({} bytes) exceeds total_size {}",
                self.metadata_bytes(),
                self.total_size
            )));
        }
        Ok(())
    }
}
