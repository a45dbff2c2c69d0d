//! Request handles and their allocator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier correlating an asynchronous request with its completion.
///
/// [`RequestHandle::NONE`] means no callback was requested for the call.
/// Realtime requests use the handle number as the envelope `cid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestHandle(pub u64);

impl RequestHandle {
    /// Sentinel for fire-and-forget calls.
    pub const NONE: RequestHandle = RequestHandle(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Parses a realtime `cid` string back into a handle.
    pub fn from_cid(cid: &str) -> Option<Self> {
        cid.parse().ok().map(Self).filter(|h: &RequestHandle| !h.is_none())
    }

    pub fn as_cid(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Produces handles for one client instance.
///
/// Takes `&mut self`: the allocator belongs to the client and is only used
/// from the thread that owns it and calls `tick()`, so no locking is needed.
/// The counter wraps and skips [`RequestHandle::NONE`]; exhausting 2^64 - 1
/// in-flight handles is not a supported scenario.
#[derive(Debug)]
pub struct HandleAllocator {
    current: u64,
}

impl HandleAllocator {
    /// Create a new allocator whose first handle is 1.
    pub fn new() -> Self {
        Self { current: 0 }
    }

    /// Starts the counter at an arbitrary value. Used to exercise wraparound.
    pub fn starting_at(current: u64) -> Self {
        Self { current }
    }

    /// Generate the next handle, never equal to [`RequestHandle::NONE`].
    pub fn next_handle(&mut self) -> RequestHandle {
        self.current = self.current.wrapping_add(1);
        if self.current == RequestHandle::NONE.0 {
            self.current = self.current.wrapping_add(1);
        }
        RequestHandle(self.current)
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
