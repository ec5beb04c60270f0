//! Cross-worker mutual exclusion with expiring locks.
//!
//! A lock is one row keyed by `lock_key` holding the owner's worker id and an
//! expiry. Acquisition only succeeds when no unexpired row exists. Release
//! re-reads the owner and deletes only its own row, so a worker whose lock
//! expired can never release the lock another worker took over.
//!
//! A job that runs longer than the TTL can overlap with a run on another
//! worker. The TTL must be longer than the slowest expected run.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

/// Lock key for a site's scrape job.
pub fn lock_key(site: &str) -> String {
    format!("job:lock:{}", site)
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock store query failed: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

/// Shared store of expiring locks.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Take `key` for `owner` unless someone holds an unexpired lock on it.
    ///
    /// Returns `true` only if this call created the lock.
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, LockError>;

    /// Release `key` if `owner` still holds it. Absent or foreign locks are left alone.
    async fn release(&self, key: &str, owner: &str) -> Result<(), LockError>;
}

/// Lock store backed by the `job_locks` table.
#[derive(Clone)]
pub struct PostgresLockStore {
    pool: PgPool,
}

impl PostgresLockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for PostgresLockStore {
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, LockError> {
        // The conflict branch only fires on an expired row, so a live lock
        // makes the statement return no rows.
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO job_locks (lock_key, owner_id, expires_at)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (lock_key) DO UPDATE
                SET owner_id = EXCLUDED.owner_id,
                    expires_at = EXCLUDED.expires_at
                WHERE job_locks.expires_at <= NOW()
            RETURNING lock_key
            "#,
        )
        .bind(key)
        .bind(owner)
        .bind(ttl.as_secs_f64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn release(&self, key: &str, owner: &str) -> Result<(), LockError> {
        let current: Option<(String,)> = sqlx::query_as(
            "SELECT owner_id FROM job_locks WHERE lock_key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match current {
            None => {
                debug!(lock_key = %key, "Lock already released");
            }
            Some((holder,)) if holder != owner => {
                debug!(lock_key = %key, holder = %holder, "Lock held by another worker, not releasing");
            }
            Some(_) => {
                sqlx::query("DELETE FROM job_locks WHERE lock_key = $1 AND owner_id = $2")
                    .bind(key)
                    .bind(owner)
                    .execute(&self.pool)
                    .await?;
            }
        }

        Ok(())
    }
}

struct MemoryLock {
    owner: String,
    expires_at: Instant,
}

/// In-process lock store for tests and single-worker runs.
#[derive(Default)]
pub struct MemoryLockStore {
    locks: Mutex<HashMap<String, MemoryLock>>,
    unavailable: Mutex<Option<String>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage; `None` restores service.
    pub fn set_unavailable(&self, reason: Option<&str>) {
        *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) = reason.map(str::to_string);
    }

    /// Current unexpired owner of `key`.
    pub fn owner(&self, key: &str) -> Option<String> {
        let locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .get(key)
            .filter(|l| l.expires_at > Instant::now())
            .map(|l| l.owner.clone())
    }

    fn check_available(&self) -> Result<(), LockError> {
        match &*self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(reason) => Err(LockError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool, LockError> {
        self.check_available()?;

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if locks.get(key).is_some_and(|l| l.expires_at > now) {
            return Ok(false);
        }

        locks.insert(
            key.to_string(),
            MemoryLock {
                owner: owner.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, key: &str, owner: &str) -> Result<(), LockError> {
        self.check_available()?;

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let owned = locks
            .get(key)
            .is_some_and(|l| l.expires_at > now && l.owner == owner);
        if owned {
            locks.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn test_lock_key_format() {
        assert_eq!(lock_key("rumah123"), "job:lock:rumah123");
    }

    #[tokio::test]
    async fn test_acquire_is_exclusive() {
        let store = MemoryLockStore::new();
        let key = lock_key("rumah123");

        assert!(store.try_acquire(&key, "worker-a", TTL).await.unwrap());
        assert!(!store.try_acquire(&key, "worker-b", TTL).await.unwrap());
        assert!(!store.try_acquire(&key, "worker-a", TTL).await.unwrap());
        assert_eq!(store.owner(&key).as_deref(), Some("worker-a"));
    }

    #[tokio::test]
    async fn test_release_then_reacquire() {
        let store = MemoryLockStore::new();
        let key = lock_key("rumah123");

        assert!(store.try_acquire(&key, "worker-a", TTL).await.unwrap());
        store.release(&key, "worker-a").await.unwrap();
        assert!(store.try_acquire(&key, "worker-b", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn test_release_absent_is_noop() {
        let store = MemoryLockStore::new();
        assert_ok!(store.release(&lock_key("nobody"), "worker-a").await);
    }

    #[tokio::test]
    async fn test_release_by_other_owner_is_noop() {
        let store = MemoryLockStore::new();
        let key = lock_key("rumah123");

        assert!(store.try_acquire(&key, "worker-a", TTL).await.unwrap());
        store.release(&key, "worker-b").await.unwrap();
        assert_eq!(store.owner(&key).as_deref(), Some("worker-a"));
    }

    #[tokio::test]
    async fn test_expired_lock_can_be_taken_over() {
        let store = MemoryLockStore::new();
        let key = lock_key("rumah123");

        assert!(store
            .try_acquire(&key, "worker-a", Duration::from_millis(20))
            .await
            .unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(store.try_acquire(&key, "worker-b", TTL).await.unwrap());

        // The stale owner must not release the new owner's lock.
        store.release(&key, "worker-a").await.unwrap();
        assert_eq!(store.owner(&key).as_deref(), Some("worker-b"));
    }

    #[tokio::test]
    async fn test_unavailable_backend_errors() {
        let store = MemoryLockStore::new();
        store.set_unavailable(Some("connection refused"));

        let err = assert_err!(
            store
                .try_acquire(&lock_key("rumah123"), "worker-a", TTL)
                .await
        );
        assert!(matches!(err, LockError::Unavailable(_)));
        assert_err!(store.release(&lock_key("rumah123"), "worker-a").await);

        store.set_unavailable(None);
        assert!(store
            .try_acquire(&lock_key("rumah123"), "worker-a", TTL)
            .await
            .unwrap());
    }
}
