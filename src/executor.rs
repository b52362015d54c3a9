//! Query executor: the single path to the relational store for reads and
//! standalone statements, with bounded retry for connectivity failures.

use std::future::Future;
use std::time::Duration;

use sea_orm::{ConnectionTrait, DatabaseConnection, QueryResult, Statement};

use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based): base * 2^attempt, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Clone)]
pub struct QueryExecutor {
    conn: DatabaseConnection,
    policy: RetryPolicy,
}

impl QueryExecutor {
    pub fn new(conn: DatabaseConnection, policy: RetryPolicy) -> Self {
        Self { conn, policy }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Runs a raw statement and returns its rows.
    pub async fn execute(&self, statement: Statement) -> Result<Vec<QueryResult>, StoreError> {
        let conn = &self.conn;
        self.run("raw_statement", move || conn.query_all(statement.clone()))
            .await
    }

    /// Runs `op` against the pool, retrying connectivity failures only.
    ///
    /// `op` must build a fresh future per attempt.
    pub async fn run<T, E, F, Fut>(&self, label: &'static str, op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<StoreError>,
    {
        with_retry(self.policy, label, op).await
    }
}

pub async fn with_retry<T, E, F, Fut>(
    policy: RetryPolicy,
    label: &'static str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    let mut attempt = 0;
    loop {
        match op().await.map_err(Into::into) {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(query = label, attempt = attempt + 1, "query recovered after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    query = label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient store failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::debug!(query = label, kind = %err.kind(), error = %err, "query failed");
                return Err(err);
            }
        }
    }
}

/// Single attempt with classification. Used inside a transaction, where a
/// dropped connection has already lost the transaction and cannot be retried.
pub async fn once<T, E, Fut>(label: &'static str, fut: Fut) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<StoreError>,
{
    fut.await.map_err(|err| {
        let err = err.into();
        tracing::debug!(query = label, kind = %err.kind(), error = %err, "statement failed");
        err
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use sea_orm::DbErr;
    use sea_orm::error::ConnAcquireErr;

    use super::*;
    use crate::store::StoreErrorKind;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    fn connectivity() -> StoreError {
        StoreError::from(DbErr::ConnectionAcquire(ConnAcquireErr::ConnectionClosed))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(500));
        assert_eq!(policy.delay_for(40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn transient_failure_then_success_is_not_surfaced() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(fast_policy(), "test", move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(connectivity())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_the_retry_bound() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), StoreError> = with_retry(fast_policy(), "test", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(connectivity())
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Connectivity);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_connectivity_errors_are_never_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), StoreError> = with_retry(fast_policy(), "test", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DbErr::Custom("duplicate key".into()))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), StoreErrorKind::Other);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn once_classifies_without_retrying() {
        let err = once("insert", async { Err::<(), _>(connectivity()) })
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
