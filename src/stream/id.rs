//! Identity types for stream nodes and listeners.
//!
//! IDs are newtypes over integers handed out by process-wide counters. They
//! name nodes in logs and chain views; they are never used for lookup.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a stream node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Allocate a fresh id.
    pub fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle returned by listener registration, used to remove the listener.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl ListenerId {
    pub fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}
