//! Surrogate Key Allocation
//!
//! Claim records need an integer identifier, but document stores offer no
//! atomic sequence. Allocators here hand out positive 31-bit keys.
//!
//! A key from [`SurrogateKeyAllocator::allocate`] is only *advisory*
//! unique: the allocator does not know which keys are already persisted.
//! Write paths must either go through [`allocate_unique`] or tolerate a
//! duplicate-key rejection and retry via [`insert_with_fresh_key`].

use std::future::Future;
use std::sync::atomic::{AtomicI32, Ordering};

use rand::Rng;
use ic_config::KeyAllocatorKind;

use crate::shared::error::{IdentityError, Result};

/// Source of surrogate keys for claim records.
pub trait SurrogateKeyAllocator: Send + Sync {
    /// Returns a key in `1..=i32::MAX`.
    fn allocate(&self) -> i32;
}

/// Uniform random keys from the thread-local OS-seeded generator.
///
/// With 2^31 - 1 possible values the birthday bound reaches 1% around
/// 6,500 records, so callers must still check for collisions.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomKeyAllocator;

impl SurrogateKeyAllocator for RandomKeyAllocator {
    fn allocate(&self) -> i32 {
        rand::rng().random_range(1..=i32::MAX)
    }
}

/// Monotonic keys from an in-process counter.
///
/// Only unique within one process unless primed with the highest persisted
/// key at startup via [`SequentialKeyAllocator::starting_after`].
#[derive(Debug)]
pub struct SequentialKeyAllocator {
    next: AtomicI32,
}

impl SequentialKeyAllocator {
    pub fn new() -> Self {
        Self::starting_after(0)
    }

    pub fn starting_after(highest_issued: i32) -> Self {
        Self {
            next: AtomicI32::new(highest_issued.max(0)),
        }
    }
}

impl Default for SequentialKeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SurrogateKeyAllocator for SequentialKeyAllocator {
    fn allocate(&self) -> i32 {
        // Wraps back to 1 instead of going negative.
        let previous = self
            .next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(if n == i32::MAX { 1 } else { n + 1 })
            })
            .unwrap_or(0);
        if previous == i32::MAX { 1 } else { previous + 1 }
    }
}

/// Build the allocator selected in configuration.
pub fn allocator_for(kind: KeyAllocatorKind, highest_issued: i32) -> Box<dyn SurrogateKeyAllocator> {
    match kind {
        KeyAllocatorKind::Random => Box::new(RandomKeyAllocator),
        KeyAllocatorKind::Sequential => Box::new(SequentialKeyAllocator::starting_after(highest_issued)),
    }
}

/// Draw keys until one is not taken, giving up after `max_attempts`.
pub fn allocate_unique<F>(
    allocator: &dyn SurrogateKeyAllocator,
    is_taken: F,
    max_attempts: u32,
) -> Result<i32>
where
    F: Fn(i32) -> bool,
{
    for attempt in 1..=max_attempts {
        let key = allocator.allocate();
        if !is_taken(key) {
            return Ok(key);
        }
        tracing::debug!(key, attempt, "Surrogate key collision, retrying");
    }
    Err(keys_exhausted(max_attempts))
}

/// Outcome of one keyed insert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedInsert {
    Stored,
    /// The store rejected the write because the key is already used.
    KeyTaken,
}

/// Insert with freshly drawn keys until the store accepts one.
///
/// For stores that only learn about a collision from the write itself.
/// An error from `insert` ends the loop and is returned as is.
pub async fn insert_with_fresh_key<F, Fut>(
    allocator: &dyn SurrogateKeyAllocator,
    max_attempts: u32,
    mut insert: F,
) -> Result<i32>
where
    F: FnMut(i32) -> Fut,
    Fut: Future<Output = Result<KeyedInsert>>,
{
    for attempt in 1..=max_attempts {
        let key = allocator.allocate();
        match insert(key).await? {
            KeyedInsert::Stored => return Ok(key),
            KeyedInsert::KeyTaken => {
                tracing::warn!(key, attempt, "Surrogate key collision, retrying");
            }
        }
    }
    Err(keys_exhausted(max_attempts))
}

fn keys_exhausted(max_attempts: u32) -> IdentityError {
    IdentityError::internal(format!("No free surrogate key after {} attempts", max_attempts))
}
