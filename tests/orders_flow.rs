mod common;

use common::{create_farm, create_product, create_user, database_url, dec, setup_state, unique_email};
use farmshare_api::{
    dto::orders::{CreateOrderRequest, DeliveryAddressInput, OrderItemInput},
    entity::{
        Orders, OrderItems, SubscriptionEmails,
        order_items::Column as OrderItemCol,
        subscription_emails::Column as EmailCol,
    },
    models::Role,
    routes::params::OrderListQuery,
    services::order_service::{self, OrderLine, OrderRecord, ValidatedOrder},
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

fn order_request(email: &str, lines: &[(Uuid, i32, &str)]) -> CreateOrderRequest {
    CreateOrderRequest {
        email: Some(email.to_string()),
        name: Some("Sam Guest".into()),
        phone: Some("0123".into()),
        delivery_address: Some(DeliveryAddressInput {
            street: Some("2 Mill Road".into()),
            city: Some("York".into()),
            postcode: Some("YO1 7HH".into()),
            instructions: Some("Leave by the gate".into()),
        }),
        items: lines
            .iter()
            .map(|(product_id, quantity, price)| OrderItemInput {
                product_id: Some(*product_id),
                quantity: Some(*quantity),
                price: Some(dec(price)),
            })
            .collect(),
    }
}

#[tokio::test]
async fn guest_order_is_created_without_an_account() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;

    let farmer = create_user(&state, Role::Farmer, &unique_email("farmer")).await?;
    let farm_id = create_farm(&state, &farmer).await?;
    let apples = create_product(&state, farm_id, "Apples", "3.00").await?;
    let eggs = create_product(&state, farm_id, "Eggs", "1.20").await?;

    let email = unique_email("guest");
    let resp = order_service::create_order(
        &state,
        None,
        order_request(&email, &[(apples, 2, "2.50"), (eggs, 3, "1.00")]),
    )
    .await?;
    let created = resp.data.expect("order data");
    assert_eq!(created.total, dec("8.00"));
    assert!(created.confirmation_sent);

    let order = Orders::find_by_id(created.order_id)
        .one(&state.orm)
        .await?
        .expect("order row");
    assert_eq!(order.user_id, None);
    assert_eq!(order.email, email);
    assert_eq!(order.status, "pending");

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(created.order_id))
        .all(&state.orm)
        .await?;
    assert_eq!(items.len(), 2);
    // frozen at order time, not the catalog price
    assert!(items.iter().any(|i| i.product_id == apples && i.price == dec("2.50")));

    let logged = SubscriptionEmails::find()
        .filter(EmailCol::OrderId.eq(created.order_id))
        .all(&state.orm)
        .await?;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, "order_confirmation");
    assert_eq!(logged[0].status, "sent");

    // the farmer sees the order through their product
    let farmer_orders =
        order_service::list_farmer_orders(&state, &farmer, OrderListQuery::default()).await?;
    let farmer_orders = farmer_orders.data.expect("orders");
    assert!(farmer_orders.items.iter().any(|o| o.id == created.order_id));

    Ok(())
}

#[tokio::test]
async fn order_for_a_registered_email_is_linked_to_the_account() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;

    let farmer = create_user(&state, Role::Farmer, &unique_email("farmer")).await?;
    let farm_id = create_farm(&state, &farmer).await?;
    let honey = create_product(&state, farm_id, "Honey", "6.00").await?;

    let email = unique_email("customer");
    let customer = create_user(&state, Role::Customer, &email).await?;

    let resp =
        order_service::create_order(&state, None, order_request(&email, &[(honey, 1, "6.00")]))
            .await?;
    let order_id = resp.data.expect("order data").order_id;

    let detail = order_service::get_order(&state, &customer, order_id).await?;
    let detail = detail.data.expect("order detail");
    assert_eq!(detail.order.user_id, Some(customer.user_id));
    assert_eq!(detail.items.len(), 1);

    let listed = order_service::list_orders(&state, &customer, OrderListQuery::default()).await?;
    assert_eq!(listed.meta.expect("meta").total, Some(1));

    Ok(())
}

#[tokio::test]
async fn unknown_product_is_not_found_and_nothing_is_written() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;

    let email = unique_email("ghost");
    let missing = Uuid::new_v4();
    let err = order_service::create_order(&state, None, order_request(&email, &[(missing, 1, "1.00")]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
    assert!(err.to_string().contains(&missing.to_string()));

    let count = Orders::find()
        .filter(farmshare_api::entity::orders::Column::Email.eq(email))
        .count(&state.orm)
        .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[tokio::test]
async fn failed_item_insert_rolls_back_the_header() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };
    let state = setup_state(&url).await?;

    let farmer = create_user(&state, Role::Farmer, &unique_email("farmer")).await?;
    let farm_id = create_farm(&state, &farmer).await?;
    let real = create_product(&state, farm_id, "Kale", "2.00").await?;

    let order_id = Uuid::new_v4();
    let record = OrderRecord {
        id: order_id,
        user_id: None,
        total: dec("3.00"),
        order: ValidatedOrder {
            email: unique_email("atomic"),
            name: "Atomic".into(),
            phone: None,
            street: "1 Lane".into(),
            city: "Hull".into(),
            postcode: "HU1".into(),
            instructions: None,
            lines: vec![
                OrderLine {
                    product_id: real,
                    quantity: 1,
                    price: dec("2.00"),
                },
                // violates the product foreign key after the header is written
                OrderLine {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                    price: dec("1.00"),
                },
            ],
        },
    };

    let err = state
        .coordinator
        .run("orders.create", move |txn| {
            Box::pin(order_service::persist_order(txn, record))
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "persistence");

    assert!(Orders::find_by_id(order_id).one(&state.orm).await?.is_none());
    let orphans = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orphans, 0);

    Ok(())
}
