//! Live session registry.
//!
//! Sessions sit in a generational slot table. Closing a session bumps its
//! slot's generation, so a handle kept after logout is rejected even once
//! the slot has been handed to a new login.

use omnifs_types::{SessionHandle, SessionInfo, UserRecord};

#[derive(Debug, Default)]
struct SessionSlot {
    generation: u32,
    session: Option<SessionInfo>,
}

/// Handle-keyed table of authenticated sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: Vec<SessionSlot>,
    free: Vec<u32>,
    live: usize,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session bound to a snapshot of `user`.
    pub fn open(&mut self, user: UserRecord, now: u64) -> SessionHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(SessionSlot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let handle = SessionHandle::new(index, slot.generation);
        slot.session = Some(SessionInfo {
            handle,
            user,
            login_time: now,
            last_activity: now,
            operations_count: 0,
        });
        self.live += 1;
        handle
    }

    /// Deregister a session, returning its final state.
    pub fn close(&mut self, handle: SessionHandle) -> Option<SessionInfo> {
        let slot = self.slot_mut(handle)?;
        let session = slot.session.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.live -= 1;
        Some(session)
    }

    pub fn get(&self, handle: SessionHandle) -> Option<&SessionInfo> {
        let slot = self.slots.get(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.session.as_ref()
    }

    /// Record one operation on the session.
    pub fn touch(&mut self, handle: SessionHandle, now: u64) -> Option<&SessionInfo> {
        let session = self.slot_mut(handle)?.session.as_mut()?;
        session.last_activity = now;
        session.operations_count = session.operations_count.saturating_add(1);
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionInfo> {
        self.slots.iter().filter_map(|s| s.session.as_ref())
    }

    fn slot_mut(&mut self, handle: SessionHandle) -> Option<&mut SessionSlot> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        (slot.generation == handle.generation()).then_some(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnifs_types::UserRole;

    fn user(name: &str) -> UserRecord {
        UserRecord::new(name, "digest", UserRole::Normal, 0)
    }

    #[test]
    fn test_open_get_close() {
        let mut r = SessionRegistry::new();
        let h = r.open(user("alice"), 10);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(h).unwrap().username(), "alice");
        assert_eq!(r.get(h).unwrap().login_time, 10);

        let closed = r.close(h).unwrap();
        assert_eq!(closed.handle, h);
        assert!(r.get(h).is_none());
        assert!(r.close(h).is_none());
        assert!(r.is_empty());
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut r = SessionRegistry::new();
        let old = r.open(user("alice"), 0);
        r.close(old);
        let new = r.open(user("bob"), 0);
        assert_eq!(old.index(), new.index());
        assert!(r.get(old).is_none());
        assert!(r.touch(old, 5).is_none());
        assert_eq!(r.get(new).unwrap().username(), "bob");
    }

    #[test]
    fn test_touch_counts_operations() {
        let mut r = SessionRegistry::new();
        let h = r.open(user("alice"), 0);
        r.touch(h, 7);
        let s = r.touch(h, 9).unwrap();
        assert_eq!(s.operations_count, 2);
        assert_eq!(s.last_activity, 9);
    }
}
