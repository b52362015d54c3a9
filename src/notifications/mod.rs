//! Notification dispatcher.
//!
//! Renders a notification, hands it to the [`Notifier`] and appends one
//! `subscription_emails` row per attempt whatever the send outcome. There is no
//! pre-send dedupe check: a re-drive of the same event sends and logs again.

pub mod notifier;
pub mod templates;

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::subscription_emails::{
        ActiveModel as EmailActive, Column as EmailCol, Entity as SubscriptionEmails,
    },
    error::{AppError, AppResult},
    executor::QueryExecutor,
    models::NotificationKind,
};

pub use notifier::{HttpNotifier, LogNotifier, Notifier, NotifierError};
pub use templates::{Notification, RenderedMessage};

/// What an audit row is attached to.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationTarget {
    pub subscription_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
}

impl NotificationTarget {
    pub fn subscription(id: Uuid) -> Self {
        Self {
            subscription_id: Some(id),
            order_id: None,
        }
    }

    pub fn order(id: Uuid) -> Self {
        Self {
            subscription_id: None,
            order_id: Some(id),
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    executor: QueryExecutor,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, executor: QueryExecutor) -> Self {
        Self { notifier, executor }
    }

    pub async fn notify(
        &self,
        target: NotificationTarget,
        recipient: &str,
        notification: &Notification,
    ) -> AppResult<()> {
        let kind = notification.kind();
        let message = notification.render();
        let outcome = self
            .notifier
            .send(recipient, &message.subject, &message.html)
            .await;

        let (status, error) = match &outcome {
            Ok(()) => ("sent", None),
            Err(err) => ("failed", Some(err.to_string())),
        };

        let row = EmailActive {
            id: Set(Uuid::new_v4()),
            subscription_id: Set(target.subscription_id),
            order_id: Set(target.order_id),
            kind: Set(kind.as_str().to_string()),
            recipient: Set(recipient.to_string()),
            status: Set(status.to_string()),
            error: Set(error),
            payload: Set(notification.payload()),
            sent_at: Set(Utc::now().into()),
        };
        let conn = self.executor.conn();
        if let Err(err) = self
            .executor
            .run("subscription_emails.insert", || {
                SubscriptionEmails::insert(row.clone()).exec_without_returning(conn)
            })
            .await
        {
            tracing::warn!(kind = %kind, error = %err, "notification audit log failed");
        }

        match outcome {
            Ok(()) => {
                tracing::info!(kind = %kind, recipient, "notification sent");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(kind = %kind, recipient, error = %err, "notification failed");
                Err(AppError::Notification(err.to_string()))
            }
        }
    }

    /// Number of logged attempts of `kind` for a subscription.
    pub async fn attempts(&self, subscription_id: Uuid, kind: NotificationKind) -> AppResult<u64> {
        let conn = self.executor.conn();
        let count = self
            .executor
            .run("subscription_emails.count", || {
                SubscriptionEmails::find()
                    .filter(EmailCol::SubscriptionId.eq(subscription_id))
                    .filter(EmailCol::Kind.eq(kind.as_str()))
                    .count(conn)
            })
            .await?;
        Ok(count)
    }
}
