//! Typed handles for sessions, namespace nodes, and connections.
//!
//! `SessionHandle` and `NodeId` are generational: an `(index, generation)`
//! pair into a slot arena. When a slot is freed its generation is bumped, so
//! a handle that outlives its target fails lookup instead of aliasing the
//! next occupant of the slot.
//!
//! Handles display as `index:generation` for logging. The packed `u64` form
//! (`generation << 32 | index`) is what the protocol layer hands to clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A session handle issued by the session registry on login.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SessionHandle {
    index: u32,
    generation: u32,
}

/// A node handle into the namespace tree arena.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_generational_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Build a handle from its slot index and generation.
            pub const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }

            /// Slot index in the owning arena.
            pub const fn index(&self) -> u32 {
                self.index
            }

            /// Generation the slot had when this handle was issued.
            pub const fn generation(&self) -> u32 {
                self.generation
            }

            /// Pack into a single `u64` (generation in the high half).
            pub const fn to_u64(&self) -> u64 {
                ((self.generation as u64) << 32) | self.index as u64
            }

            /// Unpack from the `u64` produced by [`Self::to_u64`].
            pub const fn from_u64(raw: u64) -> Self {
                Self {
                    index: raw as u32,
                    generation: (raw >> 32) as u32,
                }
            }
        }

        impl From<$T> for u64 {
            fn from(id: $T) -> u64 {
                id.to_u64()
            }
        }

        impl From<u64> for $T {
            fn from(raw: u64) -> Self {
                Self::from_u64(raw)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", self.index, self.generation)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}:{})", $name, self.index, self.generation)
            }
        }
    };
}

impl_generational_id!(SessionHandle, "SessionHandle");
impl_generational_id!(NodeId, "NodeId");

/// Identifier of the client connection a request arrived on.
///
/// Assigned by the connection layer; the core only carries it through the
/// request queue so replies can be routed back.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_form_survives() {
        let h = SessionHandle::new(7, 3);
        let raw: u64 = h.into();
        assert_eq!(raw, (3u64 << 32) | 7);
        assert_eq!(SessionHandle::from(raw), h);
    }

    #[test]
    fn test_generation_distinguishes_reused_slot() {
        let old = NodeId::new(4, 1);
        let new = NodeId::new(4, 2);
        assert_ne!(old, new);
        assert_eq!(old.index(), new.index());
    }

    #[test]
    fn test_display_and_debug() {
        let h = SessionHandle::new(2, 9);
        assert_eq!(h.to_string(), "2:9");
        assert_eq!(format!("{:?}", h), "SessionHandle(2:9)");
        assert_eq!(ConnectionId(12).to_string(), "conn-12");
    }
}
