// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference counting for shared session handles.
//!
//! Every holder of a usable handle pairs one [`RefCount::acquire`] with
//! exactly one [`RefCount::release`]. The release that reports
//! [`Release::Last`] obliges the caller to destroy the object; after that
//! the counter reports [`Release::Stale`] and never `Last` again.

/// Outcome of releasing one reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other holders remain.
    Alive(u32),
    /// This was the final reference: destroy the object.
    Last,
    /// The count was already zero; the release is a caller bug and is ignored.
    Stale,
}

/// Opaque reference counter. Starts at one, held by the creator.
#[derive(Debug)]
pub struct RefCount {
    count: u32,
}

impl RefCount {
    pub fn new() -> Self {
        Self { count: 1 }
    }

    /// Take one more reference and return the new count.
    pub fn acquire(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    pub fn release(&mut self) -> Release {
        match self.count {
            0 => Release::Stale,
            1 => {
                self.count = 0;
                Release::Last
            }
            n => {
                self.count = n - 1;
                Release::Alive(self.count)
            }
        }
    }

    pub fn get(&self) -> u32 {
        self.count
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "refcount_tests.rs"]
mod tests;
