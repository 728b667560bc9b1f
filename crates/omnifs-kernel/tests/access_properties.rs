//! Exhaustive checks over small input spaces: permission masks and path
//! spellings.

use omnifs_kernel::access::check;
use omnifs_kernel::tree::{NamespaceTree, Node};
use omnifs_kernel::{DirEntry, Mode, SessionHandle, SessionInfo, UserRecord, UserRole};

fn session(name: &str, role: UserRole) -> SessionInfo {
    SessionInfo {
        handle: SessionHandle::new(0, 0),
        user: UserRecord::new(name, "", role, 0),
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
fn test_admin_check_never_fails() {
    let admin = session("root", UserRole::Admin);
    for mode in 0..0o1000u32 {
        for req in 0..8u32 {
            let required = Mode::from_bits_retain(req << 6);
            assert!(check(Some(&admin), Some(&entry("alice", mode)), required));
        }
    }
}

#[test]
fn test_non_owner_reads_only_others_bits() {
    let bob = session("bob", UserRole::Normal);
    for mode in 0..0o1000u32 {
        let e = entry("alice", mode);
        for req in 1..8u32 {
            let granted = check(Some(&bob), Some(&e), Mode::from_bits_retain(req << 6));
            assert_eq!(granted, mode & req == req, "mode {:o} req {:o}", mode, req);
        }
    }
}

#[test]
fn test_owner_reads_only_owner_bits() {
    let alice = session("alice", UserRole::Normal);
    for mode in 0..0o1000u32 {
        let e = entry("alice", mode);
        for req in 1..8u32 {
            let granted = check(Some(&alice), Some(&e), Mode::from_bits_retain(req << 6));
            assert_eq!(granted, (mode >> 6) & req == req, "mode {:o} req {:o}", mode, req);
        }
    }
}

#[test]
fn test_path_spellings() {
    let mut t = NamespaceTree::new(DirEntry::directory("/", "admin", 0, 0));
    let root = t.root();
    let a = t
        .add_child(root, Node::new(DirEntry::directory("a", "admin", 1, 0)))
        .unwrap();
    let b = t
        .add_child(a, Node::new(DirEntry::directory("b", "admin", 2, 0)))
        .unwrap();

    for p in ["/", "//", "///"] {
        assert_eq!(t.resolve(p), Some(root), "{}", p);
    }
    for p in ["/a/b", "//a//b", "/a/b/", "//a/b//"] {
        assert_eq!(t.resolve(p), Some(b), "{}", p);
    }
    for p in ["", "a", "a/b", "/b", "/a/c", "/A/b", "/a/b/c", "/a /b"] {
        assert_eq!(t.resolve(p), None, "{}", p);
    }
}
