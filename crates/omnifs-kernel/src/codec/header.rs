//! Container superblock.

use std::io;

use bytes::{Buf, BufMut};
use serde::Serialize;

use super::layout::{
    CONFIG_HASH_LEN, CREATED_ON_LEN, CREATOR_ID_LEN, FORMAT_VERSION, HEADER_SIZE, MAGIC,
    USER_SLOT_SIZE, get_fixed_str, pad_record, put_fixed_str,
};
use crate::config::ContainerConfig;
use crate::error::{FsError, FsResult};

/// The 512-byte header at offset 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub magic: [u8; 8],
    pub format_version: u32,
    pub total_size: u64,
    pub header_size: u64,
    pub block_size: u64,
    pub creator_id: String,
    /// Creation date, `YYYY-MM-DD`.
    pub created_on: String,
    pub config_hash: String,
    pub config_timestamp: u64,
    pub user_table_offset: u32,
    pub max_users: u32,
    /// Reserved for a future file-state region; always 0 today.
    pub file_state_storage_offset: u32,
    /// Reserved for a future change log; always 0 today.
    pub change_log_offset: u32,
}

impl ContainerHeader {
    /// Header for a container freshly formatted with `config`.
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            total_size: config.total_size,
            header_size: HEADER_SIZE as u64,
            block_size: config.block_size,
            creator_id: config.creator_id.clone(),
            created_on: chrono::Utc::now().format("%Y-%m-%d").to_string(),
            config_hash: config.config_hash.clone(),
            config_timestamp: if config.config_timestamp > 0 {
                config.config_timestamp
            } else {
                omnifs_types::unix_now()
            },
            user_table_offset: HEADER_SIZE as u32,
            max_users: config.max_users,
            file_state_storage_offset: 0,
            change_log_offset: 0,
        }
    }

    /// Number of blocks in the container grid, rounded up.
    pub fn total_blocks(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        self.total_size.div_ceil(self.block_size)
    }

    /// End of the user table region.
    pub fn user_table_end(&self) -> u64 {
        self.user_table_offset as u64 + self.max_users as u64 * USER_SLOT_SIZE as u64
    }

    /// Reject geometry the image cannot back: the user table must lie
    /// inside the image, and so must a bitmap of the declared block count.
    pub fn check_fits(&self, image_len: usize) -> FsResult<()> {
        let image_len = image_len as u64;
        if self.user_table_end() > image_len {
            return Err(FsError::invalid_config(format!(
                "user table of {} slots ends at {}, past the {}-byte image",
                self.max_users,
                self.user_table_end(),
                image_len
            )));
        }
        let bitmap = self.total_blocks().div_ceil(8);
        if bitmap > image_len {
            return Err(FsError::invalid_config(format!(
                "{} blocks need a {}-byte bitmap, image is {} bytes",
                self.total_blocks(),
                bitmap,
                image_len
            )));
        }
        Ok(())
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.put_slice(&self.magic);
        out.put_u32_le(self.format_version);
        out.put_u64_le(self.total_size);
        out.put_u64_le(self.header_size);
        out.put_u64_le(self.block_size);
        put_fixed_str(out, &self.creator_id, CREATOR_ID_LEN);
        put_fixed_str(out, &self.created_on, CREATED_ON_LEN);
        // 64 hex chars fill the field exactly, no terminator
        let hash = self.config_hash.as_bytes();
        let n = hash.len().min(CONFIG_HASH_LEN);
        out.put_slice(&hash[..n]);
        out.put_bytes(0, CONFIG_HASH_LEN - n);
        out.put_u64_le(self.config_timestamp);
        out.put_u32_le(self.user_table_offset);
        out.put_u32_le(self.max_users);
        out.put_u32_le(self.file_state_storage_offset);
        out.put_u32_le(self.change_log_offset);
        pad_record(out, start, HEADER_SIZE);
    }

    /// Decode and sanity-check a header.
    ///
    /// Fails with `Io` when fewer than 512 bytes are available,
    /// `InvalidConfig` on a bad magic or unusable geometry, and
    /// `NotImplemented` for a newer major format version.
    pub fn decode(bytes: &[u8]) -> FsResult<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("container header needs {} bytes, found {}", HEADER_SIZE, bytes.len()),
            )));
        }
        let mut buf = &bytes[..HEADER_SIZE];

        let mut magic = [0u8; 8];
        buf.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(FsError::invalid_config(format!(
                "bad magic {:?}",
                String::from_utf8_lossy(&magic)
            )));
        }

        let format_version = buf.get_u32_le();
        if format_version >> 16 > FORMAT_VERSION >> 16 {
            return Err(FsError::NotImplemented(format!(
                "container format version {:#010x}",
                format_version
            )));
        }

        let total_size = buf.get_u64_le();
        let header_size = buf.get_u64_le();
        let block_size = buf.get_u64_le();
        let creator_id = get_fixed_str(&mut buf, CREATOR_ID_LEN);
        let created_on = get_fixed_str(&mut buf, CREATED_ON_LEN);
        let mut hash = [0u8; CONFIG_HASH_LEN];
        buf.copy_to_slice(&mut hash);
        let hash_end = hash.iter().position(|&b| b == 0).unwrap_or(CONFIG_HASH_LEN);
        let config_hash = String::from_utf8_lossy(&hash[..hash_end]).into_owned();
        let config_timestamp = buf.get_u64_le();
        let user_table_offset = buf.get_u32_le();
        let max_users = buf.get_u32_le();
        let file_state_storage_offset = buf.get_u32_le();
        let change_log_offset = buf.get_u32_le();

        if block_size == 0 {
            return Err(FsError::invalid_config("header block_size is 0"));
        }
        if total_size < block_size {
            return Err(FsError::invalid_config(format!(
                "header total_size {} is smaller than block_size {}",
                total_size, block_size
            )));
        }
        if (user_table_offset as usize) < HEADER_SIZE {
            return Err(FsError::invalid_config(format!(
                "user table offset {} overlaps the header",
                user_table_offset
            )));
        }

        Ok(Self {
            magic,
            format_version,
            total_size,
            header_size,
            block_size,
            creator_id,
            created_on,
            config_hash,
            config_timestamp,
            user_table_offset,
            max_users,
            file_state_storage_offset,
            change_log_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnifs_types::ErrorCode;

    fn sample() -> ContainerHeader {
        let mut config = ContainerConfig::default();
        config.creator_id = "ops".into();
        config.config_hash = "ab".repeat(32);
        ContainerHeader::from_config(&config)
    }

    #[test]
    fn test_encoded_width_and_field_offsets() {
        let h = sample();
        let mut out = Vec::new();
        h.encode(&mut out);
        assert_eq!(out.len(), HEADER_SIZE);
        assert_eq!(&out[0..8], b"OMNIFS01");
        assert_eq!(&out[8..12], &FORMAT_VERSION.to_le_bytes());
        assert_eq!(&out[12..20], &h.total_size.to_le_bytes());
        assert_eq!(&out[28..36], &4096u64.to_le_bytes());
        assert_eq!(&out[36..39], b"ops");
        // user_table_offset follows the 8-byte config timestamp
        assert_eq!(&out[156..160], &(HEADER_SIZE as u32).to_le_bytes());
        assert!(out[172..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decode_restores_fields() {
        let h = sample();
        let mut out = Vec::new();
        h.encode(&mut out);
        assert_eq!(ContainerHeader::decode(&out).unwrap(), h);
    }

    #[test]
    fn test_bad_magic() {
        let mut out = Vec::new();
        sample().encode(&mut out);
        out[0] = b'X';
        let err = ContainerHeader::decode(&out).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_short_header() {
        let err = ContainerHeader::decode(&[0u8; 100]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::IoError);
    }

    #[test]
    fn test_future_major_version() {
        let mut h = sample();
        h.format_version = 0x0002_0000;
        let mut out = Vec::new();
        h.encode(&mut out);
        let err = ContainerHeader::decode(&out).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotImplemented);
    }

    #[test]
    fn test_total_size_below_block_size() {
        let mut h = sample();
        h.total_size = 100;
        let mut out = Vec::new();
        h.encode(&mut out);
        let err = ContainerHeader::decode(&out).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_check_fits() {
        let mut h = sample();
        h.max_users = 4;
        h.total_size = 1024 * 1024;
        // 512 + 4 * 128 bytes of table, 32 bytes of bitmap
        assert!(h.check_fits(1024).is_ok());
        assert_eq!(h.check_fits(1023).unwrap_err().code(), ErrorCode::InvalidConfig);

        h.max_users = u32::MAX;
        assert_eq!(h.check_fits(1 << 20).unwrap_err().code(), ErrorCode::InvalidConfig);

        h.max_users = 4;
        h.total_size = 1 << 50;
        h.block_size = 1;
        assert_eq!(h.check_fits(1 << 20).unwrap_err().code(), ErrorCode::InvalidConfig);
    }
}
