use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-key async mutex registry. Mutations against a single candidate
/// (and batches against a single interviewer) must be serialized; work
/// on different keys proceeds in parallel.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("lock registry poisoned");
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serializes_same_key() {
        let registry = LockRegistry::new();
        let key = Uuid::new_v4();
        let guard = registry.acquire(key).await;

        let registry2 = registry.clone();
        let handle = tokio::spawn(async move {
            let _g = registry2.acquire(key).await;
        });

        // The second acquire cannot finish while the guard is held.
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        drop(guard);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let registry = LockRegistry::new();
        let _a = registry.acquire(Uuid::new_v4()).await;
        let _b = registry.acquire(Uuid::new_v4()).await;
    }
}
