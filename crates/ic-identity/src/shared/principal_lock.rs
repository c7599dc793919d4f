//! Per-principal serialization of reconcile calls.
//!
//! Reconciliation reads current state, diffs and applies. Two calls for the
//! same principal can interleave and undo each other's changes. When enabled,
//! [`PrincipalLocks`] holds an async mutex per principal id across the whole
//! read-diff-apply window. The guard is in-process only; separate server
//! instances still race.
//!
//! Entries live only while someone holds or waits on them. The last guard to
//! drop removes its entry from the map.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct PrincipalLocks {
    enabled: bool,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held for the duration of one reconcile call. Holds nothing when locking is off.
pub struct PrincipalGuard<'a> {
    held: Option<(&'a PrincipalLocks, String, OwnedMutexGuard<()>)>,
}

impl PrincipalLocks {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locks: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn acquire(&self, principal_id: &str) -> PrincipalGuard<'_> {
        if !self.enabled {
            return PrincipalGuard { held: None };
        }
        let lock = self
            .locks
            .entry(principal_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock_owned().await;
        PrincipalGuard {
            held: Some((self, principal_id.to_string(), guard)),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for PrincipalGuard<'_> {
    fn drop(&mut self) {
        if let Some((locks, principal_id, guard)) = self.held.take() {
            drop(guard);
            // Only the map's own reference left: nobody holds or waits.
            locks
                .locks
                .remove_if(&principal_id, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_locks_do_not_block() {
        let locks = PrincipalLocks::new(false);
        let _a = locks.acquire("u-1").await;
        let _b = locks.acquire("u-1").await;
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_principal_is_serialized() {
        let locks = Arc::new(PrincipalLocks::new(true));
        let guard = locks.acquire("u-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("u-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_principals_do_not_block() {
        let locks = PrincipalLocks::new(true);
        let _a = locks.acquire("u-1").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("u-2")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_entry_removed_when_last_guard_drops() {
        let locks = PrincipalLocks::new(true);
        {
            let _a = locks.acquire("u-1").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_kept_while_a_waiter_remains() {
        let locks = Arc::new(PrincipalLocks::new(true));
        let guard = locks.acquire("u-1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire("u-1").await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(locks.len(), 1);

        waiter.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_many_principals_leave_no_entries() {
        let locks = PrincipalLocks::new(true);
        for i in 0..500 {
            let _g = locks.acquire(&format!("u-{}", i)).await;
        }
        assert!(locks.is_empty());
    }
}
