//! Owner/others permission evaluation.
//!
//! Administrators always pass. The owner is checked against the owner bits
//! of the node's mode, everyone else against the others bits. Group bits are
//! stored but never consulted.

use omnifs_types::{DirEntry, Mode, SessionInfo};

/// Does `session` hold `required` on `entry`? A missing session or entry
/// is a denial.
pub fn check(session: Option<&SessionInfo>, entry: Option<&DirEntry>, required: Mode) -> bool {
    let (Some(session), Some(entry)) = (session, entry) else {
        return false;
    };
    if session.is_admin() {
        return true;
    }
    if session.username() == entry.owner {
        entry.mode.contains(required.owner_part())
    } else {
        entry.mode.contains(required.as_others())
    }
}

/// True for the entry's owner or an administrator, regardless of mode bits.
pub fn owns_or_admin(session: &SessionInfo, entry: &DirEntry) -> bool {
    session.is_admin() || session.username() == entry.owner
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnifs_types::{SessionHandle, UserRecord, UserRole};

    fn session(name: &str, role: UserRole) -> SessionInfo {
        SessionInfo {
            handle: SessionHandle::new(0, 0),
            user: UserRecord::new(name, "d", role, 0),
            login_time: 0,
            last_activity: 0,
            operations_count: 0,
        }
    }

    fn entry(owner: &str, mode: u32) -> DirEntry {
        let mut e = DirEntry::file("f", owner, 1, 0, 0);
        e.mode = Mode::from_bits_retain(mode);
        e
    }

    #[test]
    fn test_owner_and_others() {
        let alice = session("alice", UserRole::Normal);
        let bob = session("bob", UserRole::Normal);
        let e = entry("alice", 0o640);

        assert!(check(Some(&alice), Some(&e), Mode::READ | Mode::WRITE));
        assert!(!check(Some(&alice), Some(&e), Mode::EXECUTE));
        // group read is set but bob is judged on others bits
        assert!(!check(Some(&bob), Some(&e), Mode::READ));

        let open = entry("alice", 0o604);
        assert!(check(Some(&bob), Some(&open), Mode::READ));
        assert!(!check(Some(&bob), Some(&open), Mode::WRITE));
    }

    #[test]
    fn test_admin_always_passes() {
        let root = session("root", UserRole::Admin);
        for mode in [0, 0o700, 0o007, 0o777] {
            let e = entry("alice", mode);
            assert!(check(Some(&root), Some(&e), Mode::READ | Mode::WRITE | Mode::EXECUTE));
        }
    }

    #[test]
    fn test_missing_inputs_deny() {
        let alice = session("alice", UserRole::Normal);
        let e = entry("alice", 0o777);
        assert!(!check(None, Some(&e), Mode::READ));
        assert!(!check(Some(&alice), None, Mode::READ));
    }

    #[test]
    fn test_non_owner_never_passes_owner_only_bits() {
        let bob = session("bob", UserRole::Normal);
        for owner_bits in 0..8u32 {
            let e = entry("alice", owner_bits << 6);
            for req in 1..8u32 {
                let required = Mode::from_bits_retain(req << 6);
                assert!(!check(Some(&bob), Some(&e), required));
            }
        }
    }

    #[test]
    fn test_owns_or_admin() {
        let e = entry("alice", 0);
        assert!(owns_or_admin(&session("alice", UserRole::Normal), &e));
        assert!(owns_or_admin(&session("x", UserRole::Admin), &e));
        assert!(!owns_or_admin(&session("bob", UserRole::Normal), &e));
    }
}
