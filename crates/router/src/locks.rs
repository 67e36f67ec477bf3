//! Per-session advisory lock table. Enforces turn-to-turn ordering within a
//! session by rejecting a second concurrent turn rather than queuing it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct SessionLocks {
    table: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self { table: DashMap::new() }
    }

    /// `None` means a turn for this session is already in flight.
    pub fn try_acquire(&self, session_id: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = self
            .table
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.try_lock_owned().ok()
    }
}

impl Default for SessionLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_on_same_session_fails_while_first_held() {
        let locks = SessionLocks::new();
        let first = locks.try_acquire("s1");
        assert!(first.is_some());
        assert!(locks.try_acquire("s1").is_none());
        drop(first);
        assert!(locks.try_acquire("s1").is_some());
    }

    #[test]
    fn distinct_sessions_do_not_contend() {
        let locks = SessionLocks::new();
        let a = locks.try_acquire("a");
        let b = locks.try_acquire("b");
        assert!(a.is_some());
        assert!(b.is_some());
    }
}
