//! Fixed-width user slot and namespace entry records.

use bytes::{Buf, BufMut};
use omnifs_types::{DirEntry, EntryKind, Mode, UserRecord, UserRole};

use super::layout::{
    DIGEST_LEN, ENTRY_SIZE, NAME_LEN, OWNER_LEN, USERNAME_LEN, USER_SLOT_SIZE, get_fixed_str,
    pad_record, put_fixed_str,
};

// ── User slots ──────────────────────────────────────────────────────────────

pub fn encode_user(user: &UserRecord, out: &mut Vec<u8>) {
    let start = out.len();
    put_fixed_str(out, &user.username, USERNAME_LEN);
    put_fixed_str(out, &user.password_digest, DIGEST_LEN);
    out.put_u32_le(user.role.as_u32());
    out.put_u64_le(user.created_at);
    out.put_u64_le(user.last_login);
    out.put_u8(u8::from(user.active));
    pad_record(out, start, USER_SLOT_SIZE);
}

/// An unused slot: all zeroes, decodes as an inactive record.
pub fn encode_empty_user(out: &mut Vec<u8>) {
    out.put_bytes(0, USER_SLOT_SIZE);
}

/// Decode one slot. `slot` must hold at least [`USER_SLOT_SIZE`] bytes.
pub fn decode_user(slot: &[u8]) -> UserRecord {
    let mut buf = &slot[..USER_SLOT_SIZE];
    let username = get_fixed_str(&mut buf, USERNAME_LEN);
    let password_digest = get_fixed_str(&mut buf, DIGEST_LEN);
    let role = UserRole::from_u32(buf.get_u32_le());
    let created_at = buf.get_u64_le();
    let last_login = buf.get_u64_le();
    let active = buf.get_u8() != 0;
    UserRecord {
        username,
        password_digest,
        role,
        created_at,
        last_login,
        active,
    }
}

// ── Namespace entries ───────────────────────────────────────────────────────

pub fn encode_entry(entry: &DirEntry, out: &mut Vec<u8>) {
    let start = out.len();
    put_fixed_str(out, &entry.name, NAME_LEN);
    out.put_u8(entry.kind.as_u8());
    out.put_u64_le(entry.size);
    out.put_u32_le(entry.mode.bits());
    out.put_u64_le(entry.created_at);
    out.put_u64_le(entry.modified_at);
    put_fixed_str(out, &entry.owner, OWNER_LEN);
    out.put_u32_le(entry.inode);
    pad_record(out, start, ENTRY_SIZE);
}

/// Decode one entry record. Returns `None` if the record is too short or
/// its kind byte is not a known kind.
pub fn decode_entry(record: &[u8]) -> Option<DirEntry> {
    if record.len() < ENTRY_SIZE {
        return None;
    }
    let mut buf = &record[..ENTRY_SIZE];
    let name = get_fixed_str(&mut buf, NAME_LEN);
    let kind = EntryKind::from_u8(buf.get_u8())?;
    let size = buf.get_u64_le();
    let mode = Mode::from_bits_retain(buf.get_u32_le());
    let created_at = buf.get_u64_le();
    let modified_at = buf.get_u64_le();
    let owner = get_fixed_str(&mut buf, OWNER_LEN);
    let inode = buf.get_u32_le();
    Some(DirEntry {
        name,
        kind,
        size,
        mode,
        created_at,
        modified_at,
        owner,
        inode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_slot_layout() {
        let mut u = UserRecord::new("alice", "ff".repeat(31), UserRole::Admin, 1_700_000_000);
        u.last_login = 1_700_000_100;
        let mut out = Vec::new();
        encode_user(&u, &mut out);
        assert_eq!(out.len(), USER_SLOT_SIZE);
        assert_eq!(&out[0..5], b"alice");
        assert_eq!(out[5], 0);
        assert_eq!(&out[96..100], &1u32.to_le_bytes());
        assert_eq!(out[116], 1);
        assert!(out[117..].iter().all(|&b| b == 0));
        assert_eq!(decode_user(&out), u);
    }

    #[test]
    fn test_empty_slot_is_inactive() {
        let mut out = Vec::new();
        encode_empty_user(&mut out);
        let u = decode_user(&out);
        assert!(!u.active);
        assert!(u.username.is_empty());
    }

    #[test]
    fn test_entry_layout() {
        let mut e = DirEntry::file("a.txt", "bob", 9, 2, 1_700_000_000);
        e.mode = Mode::from_bits_retain(0o600);
        let mut out = Vec::new();
        encode_entry(&e, &mut out);
        assert_eq!(out.len(), ENTRY_SIZE);
        assert_eq!(out[256], EntryKind::File.as_u8());
        assert_eq!(&out[257..265], &2u64.to_le_bytes());
        assert_eq!(&out[265..269], &0o600u32.to_le_bytes());
        assert_eq!(&out[285..288], b"bob");
        assert_eq!(&out[317..321], &9u32.to_le_bytes());
        assert_eq!(decode_entry(&out), Some(e));
    }

    #[test]
    fn test_bad_kind_is_rejected() {
        let e = DirEntry::directory("d", "admin", 1, 0);
        let mut out = Vec::new();
        encode_entry(&e, &mut out);
        out[256] = 7;
        assert_eq!(decode_entry(&out), None);
        assert_eq!(decode_entry(&out[..100]), None);
    }
}
