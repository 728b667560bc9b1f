//! Fixed region sizes and field codecs of the container image.
//!
//! ```text
//! ┌──────────────────────────────┐ 0
//! │ Header (512)                 │
//! ├──────────────────────────────┤ user_table_offset
//! │ User table (max_users × 128) │
//! ├──────────────────────────────┤
//! │ Namespace tree (pre-order)   │
//! │   entry (416)                │
//! │   child_count: u32           │
//! │   payload (files: size bytes)│
//! │   ...children...             │
//! ├──────────────────────────────┤ file_len - bitmap_len
//! │ Free-block bitmap            │
//! └──────────────────────────────┘ file_len
//! ```
//!
//! Integers are little-endian and fields are packed in declared order with
//! no alignment padding. Each record is zero-filled up to its fixed width.
//! Strings are NUL-terminated inside their field; at most `width - 1`
//! bytes are kept.

use bytes::{Buf, BufMut};

pub const MAGIC: [u8; 8] = *b"OMNIFS01";

/// Version 1.0: major in the high 16 bits.
pub const FORMAT_VERSION: u32 = 0x0001_0000;

pub const HEADER_SIZE: usize = 512;
pub const USER_SLOT_SIZE: usize = 128;
pub const ENTRY_SIZE: usize = 416;
pub const CHILD_COUNT_SIZE: usize = 4;

// Header field widths.
pub const CREATOR_ID_LEN: usize = 32;
pub const CREATED_ON_LEN: usize = 16;
pub const CONFIG_HASH_LEN: usize = 64;

// User slot field widths.
pub const USERNAME_LEN: usize = 32;
pub const DIGEST_LEN: usize = 64;

// Entry field widths.
pub const NAME_LEN: usize = 256;
pub const OWNER_LEN: usize = 32;

/// Bytes needed for a bitmap over `total_blocks` blocks.
pub fn bitmap_len(total_blocks: u64) -> usize {
    total_blocks.div_ceil(8) as usize
}

/// Write `s` into a `width`-byte NUL-terminated field.
pub(crate) fn put_fixed_str(buf: &mut impl BufMut, s: &str, width: usize) {
    let bytes = s.as_bytes();
    let n = bytes.len().min(width - 1);
    buf.put_slice(&bytes[..n]);
    buf.put_bytes(0, width - n);
}

/// Read a `width`-byte NUL-terminated field.
pub(crate) fn get_fixed_str(buf: &mut impl Buf, width: usize) -> String {
    let mut field = vec![0u8; width];
    buf.copy_to_slice(&mut field);
    let end = field.iter().position(|&b| b == 0).unwrap_or(width);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Zero-fill `out` from `start` up to a record of `width` bytes.
pub(crate) fn pad_record(out: &mut Vec<u8>, start: usize, width: usize) {
    debug_assert!(out.len() - start <= width, "record overflows its slot");
    out.resize(start + width, 0);
}
