use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    cache::ListingCache,
    config::AppConfig,
    executor::QueryExecutor,
    notifications::{HttpNotifier, LogNotifier, NotificationDispatcher, Notifier},
    transaction::TransactionCoordinator,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub executor: QueryExecutor,
    pub coordinator: TransactionCoordinator,
    pub cache: ListingCache,
    pub notifications: NotificationDispatcher,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let executor = QueryExecutor::new(orm.clone(), config.retry);
        Self {
            coordinator: TransactionCoordinator::new(orm.clone(), config.retry),
            cache: ListingCache::new(config.listing_cache_ttl),
            notifications: NotificationDispatcher::new(notifier, executor.clone()),
            executor,
            orm,
        }
    }

    /// Picks the HTTP notifier when a URL is configured, the log notifier otherwise.
    pub fn from_config(orm: DatabaseConnection, config: &AppConfig) -> anyhow::Result<Self> {
        let notifier: Arc<dyn Notifier> = match &config.notifier.url {
            Some(url) => {
                tracing::info!(
                    url = %url,
                    timeout_ms = config.notifier.timeout.as_millis() as u64,
                    "using HTTP notifier"
                );
                Arc::new(HttpNotifier::new(
                    url.clone(),
                    config.notifier.api_key.clone(),
                    config.notifier.from.clone(),
                    config.notifier.timeout,
                )?)
            }
            None => {
                tracing::warn!("NOTIFIER_URL not set, emails will only be logged");
                Arc::new(LogNotifier)
            }
        };
        Ok(Self::new(orm, config, notifier))
    }
}
