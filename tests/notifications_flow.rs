mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{
    create_farm, create_product, create_user, database_url, dec, setup_state, setup_state_with,
    unique_email,
};
use farmshare_api::{
    dto::orders::{CreateOrderRequest, DeliveryAddressInput, OrderItemInput},
    entity::{Orders, SubscriptionEmails, subscription_emails::Column as EmailCol},
    models::Role,
    notifications::{
        Notification, NotificationTarget, Notifier, NotifierError,
        templates::PaymentFailedNotice,
    },
    services::order_service,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

struct UnreachableRelay;

#[async_trait]
impl Notifier for UnreachableRelay {
    async fn send(&self, _to: &str, _subject: &str, _html: &str) -> Result<(), NotifierError> {
        Err(NotifierError::Transport("smtp relay unreachable".into()))
    }
}

fn order_request(email: &str, product_id: Uuid) -> CreateOrderRequest {
    CreateOrderRequest {
        email: Some(email.to_string()),
        name: Some("Sam Guest".into()),
        phone: None,
        delivery_address: Some(DeliveryAddressInput {
            street: Some("2 Mill Road".into()),
            city: Some("York".into()),
            postcode: Some("YO1 7HH".into()),
            instructions: None,
        }),
        items: vec![OrderItemInput {
            product_id: Some(product_id),
            quantity: Some(2),
            price: Some(dec("2.50")),
        }],
    }
}

#[tokio::test]
async fn failed_confirmation_keeps_the_order_and_logs_the_attempt() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state_with(&url, Arc::new(UnreachableRelay)).await?;

    let farmer = create_user(&state, Role::Farmer, &unique_email("farmer")).await?;
    let farm_id = create_farm(&state, &farmer).await?;
    let apples = create_product(&state, farm_id, "Apples", "3.00").await?;

    let email = unique_email("guest");
    let resp = order_service::create_order(&state, None, order_request(&email, apples)).await?;
    let created = resp.data.expect("order data");
    assert!(!created.confirmation_sent);
    assert!(Orders::find_by_id(created.order_id).one(&state.orm).await?.is_some());

    let rows = SubscriptionEmails::find()
        .filter(EmailCol::OrderId.eq(created.order_id))
        .all(&state.orm)
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, "order_confirmation");
    assert_eq!(rows[0].status, "failed");
    assert_eq!(rows[0].recipient, email);
    assert!(
        rows[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("smtp relay unreachable"))
    );

    Ok(())
}

#[tokio::test]
async fn every_dispatch_appends_an_audit_row() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;

    let farmer = create_user(&state, Role::Farmer, &unique_email("farmer")).await?;
    let farm_id = create_farm(&state, &farmer).await?;
    let apples = create_product(&state, farm_id, "Apples", "3.00").await?;

    let email = unique_email("guest");
    let resp = order_service::create_order(&state, None, order_request(&email, apples)).await?;
    let order_id = resp.data.expect("order data").order_id;

    let notice = Notification::PaymentFailed(PaymentFailedNotice {
        subscription_id: Uuid::new_v4(),
        customer_name: "Sam Guest".into(),
        amount: dec("5.00"),
    });
    for _ in 0..2 {
        state
            .notifications
            .notify(NotificationTarget::order(order_id), &email, &notice)
            .await?;
    }

    let rows = SubscriptionEmails::find()
        .filter(EmailCol::OrderId.eq(order_id))
        .order_by_asc(EmailCol::SentAt)
        .all(&state.orm)
        .await?;
    let kinds: Vec<&str> = rows.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, ["order_confirmation", "payment_failed", "payment_failed"]);
    assert!(rows.iter().all(|r| r.status == "sent" && r.error.is_none()));
    assert_eq!(rows[1].payload["amount"], "5.00");

    Ok(())
}
