use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes writers touching the same subscription.
#[derive(Default)]
pub struct SubscriptionLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl SubscriptionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, subscription_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Entries only referenced by the map have no holder or waiter.
            map.retain(|id, l| *id == subscription_id || Arc::strong_count(l) > 1);
            map.entry(subscription_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_subscription_is_exclusive() {
        let locks = Arc::new(SubscriptionLocks::new());
        let guard = locks.acquire(1).await;

        let l2 = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = l2.acquire(1).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn different_subscriptions_do_not_block() {
        let locks = SubscriptionLocks::new();
        let _a = locks.acquire(1).await;
        let b = tokio::time::timeout(Duration::from_millis(200), locks.acquire(2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn idle_entries_are_pruned() {
        let locks = SubscriptionLocks::new();
        drop(locks.acquire(1).await);
        drop(locks.acquire(2).await);
        drop(locks.acquire(3).await);
        assert_eq!(locks.tracked().await, 1);
    }
}
