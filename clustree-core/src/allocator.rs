//! Monotonic allocation of synthetic cluster identifiers.
//!
//! Both assemblers seed an [`IdAllocator`] with the largest original leaf or
//! member identifier of the run. Every identifier it hands out is strictly
//! greater than that floor and strictly greater than every identifier handed
//! out before it, so synthetic clusters can never collide with input nodes or
//! with each other.

use std::ops::Range;

use crate::{AssemblyError, Result};

/// Hands out synthetic cluster identifiers strictly above a floor.
///
/// # Examples
/// ```
/// use clustree_core::IdAllocator;
///
/// let mut ids = IdAllocator::above(10);
/// assert_eq!(ids.allocate().expect("ids remain"), 11);
/// assert_eq!(ids.allocate_block(2).expect("ids remain"), 12..14);
/// assert!(ids.is_synthetic(13));
/// assert!(!ids.is_synthetic(10));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    floor: u64,
    last: u64,
}

impl IdAllocator {
    /// Creates an allocator whose first identifier is `floor + 1`.
    #[must_use]
    pub const fn above(floor: u64) -> Self {
        Self { floor, last: floor }
    }

    /// Allocates the next identifier.
    ///
    /// # Errors
    /// Returns [`AssemblyError::IdentifierOverflow`] once `u64::MAX` has been
    /// handed out.
    pub fn allocate(&mut self) -> Result<u64> {
        let next = self
            .last
            .checked_add(1)
            .ok_or(AssemblyError::IdentifierOverflow { last: self.last })?;
        self.last = next;
        Ok(next)
    }

    /// Allocates `count` consecutive identifiers and returns them as a
    /// half-open range. An empty request returns an empty range and leaves
    /// the allocator untouched.
    ///
    /// # Errors
    /// Returns [`AssemblyError::IdentifierOverflow`] when the exclusive end of
    /// a non-empty block does not fit in a `u64`.
    pub fn allocate_block(&mut self, count: usize) -> Result<Range<u64>> {
        if count == 0 {
            return Ok(self.last..self.last);
        }
        let overflow = AssemblyError::IdentifierOverflow { last: self.last };
        let end = u64::try_from(count)
            .ok()
            .and_then(|count| self.last.checked_add(count))
            .and_then(|last| last.checked_add(1))
            .ok_or(overflow)?;
        let start = self.last + 1;
        self.last = end - 1;
        Ok(start..end)
    }

    /// Returns the floor the allocator was seeded with.
    #[must_use]
    pub const fn floor(&self) -> u64 {
        self.floor
    }

    /// Returns the most recently allocated identifier, or the floor when
    /// nothing has been allocated yet.
    #[must_use]
    pub const fn last(&self) -> u64 {
        self.last
    }

    /// Returns how many identifiers have been handed out.
    #[must_use]
    pub const fn allocated(&self) -> u64 {
        self.last - self.floor
    }

    /// Reports whether `id` was handed out by this allocator.
    #[must_use]
    pub const fn is_synthetic(&self, id: u64) -> bool {
        id > self.floor && id <= self.last
    }
}
