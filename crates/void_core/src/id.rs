//! Identifier generation
//!
//! Entities, lights and render targets are addressed by opaque 64-bit ids.
//! Ids are handed out by an [`IdGenerator`], which is safe to share between
//! the main thread and worker threads that build entities ahead of time.

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// An opaque identifier
///
/// The lower 32 bits hold a sequence index, the upper 32 bits a generation
/// that callers may bump when an index is recycled.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u64);

impl Id {
    /// Sentinel for "no id"
    pub const NULL: Self = Self(u64::MAX);

    /// Build an id from an index and a generation
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | index as u64)
    }

    /// Sequence index
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Generation counter
    #[inline]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw bit pattern
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Rebuild from a raw bit pattern
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Id(null)")
        } else {
            write!(f, "Id({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null")
        } else {
            write!(f, "{}v{}", self.index(), self.generation())
        }
    }
}

/// Thread-safe, monotonically increasing id source
#[derive(Debug)]
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Start counting at `first` (useful to keep id ranges apart)
    pub const fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU64::new(first as u64),
        }
    }

    /// Generate the next id
    pub fn next(&self) -> Id {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        Id::new(index as u32, 0)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
