use std::future::Future;
use std::pin::Pin;

use sea_orm::{DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait};

use crate::{
    error::{AppError, AppResult},
    executor::{RetryPolicy, with_retry},
};

pub type UnitOfWork<'c, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>;

/// Runs a unit of work on one pooled connection under READ COMMITTED.
///
/// The transaction owns its connection; committing, rolling back or dropping it
/// hands the connection back to the pool. A unit of work only sees the
/// transaction, so it cannot open a nested one through the coordinator.
#[derive(Clone)]
pub struct TransactionCoordinator {
    conn: DatabaseConnection,
    begin_policy: RetryPolicy,
}

impl TransactionCoordinator {
    pub fn new(conn: DatabaseConnection, begin_policy: RetryPolicy) -> Self {
        Self { conn, begin_policy }
    }

    pub async fn run<T, F>(&self, label: &'static str, work: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> UnitOfWork<'c, T> + Send,
    {
        // Nothing has been written yet, so acquiring the connection may be retried.
        let conn = &self.conn;
        let txn = with_retry(self.begin_policy, label, move || {
            conn.begin_with_config(Some(IsolationLevel::ReadCommitted), None)
        })
        .await?;

        tracing::debug!(unit = label, "transaction started");

        match work(&txn).await {
            Ok(value) => {
                txn.commit().await.map_err(|err| {
                    tracing::error!(unit = label, error = %err, "commit failed");
                    AppError::Persistence(err.into())
                })?;
                tracing::debug!(unit = label, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!(unit = label, error = %rollback_err, "rollback failed");
                }
                tracing::warn!(unit = label, error = %err, "transaction rolled back");
                Err(match err {
                    // the transaction is gone with its connection; not retryable here
                    AppError::TransientStore(store_err) => AppError::Persistence(store_err),
                    other => other,
                })
            }
        }
    }
}
