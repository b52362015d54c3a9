//! One-off order pipeline: Validated -> Priced -> Persisted -> Notified.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
    ActiveValue::NotSet,
    sea_query::Query,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        orders::{CreateOrderRequest, CreateOrderResponse, OrderList, OrderWithItems},
        MAX_MONEY, require,
    },
    entity::{
        farms::Column as FarmCol,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::{Column as ProdCol, Model as ProductModel},
        users::Column as UserCol,
        Farms, OrderItems, Orders, Products, Users,
    },
    error::{AppError, AppResult},
    executor::{QueryExecutor, once},
    middleware::auth::{AuthUser, ensure_customer, ensure_farmer},
    models::{Order, OrderStatus},
    notifications::{
        Notification, NotificationTarget,
        templates::{OrderConfirmation, OrderConfirmationLine},
    },
    pricing::{money, order_total},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        catalog_service::products_by_id,
        convert::{order_from_entity, order_item_from_entity},
    },
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Frozen unit price submitted with the order.
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct ValidatedOrder {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub instructions: Option<String>,
    pub lines: Vec<OrderLine>,
}

impl ValidatedOrder {
    fn address_line(&self) -> String {
        format!("{}, {} {}", self.street, self.city, self.postcode)
    }
}

/// Everything one unit of work needs to write an order.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub total: Decimal,
    pub order: ValidatedOrder,
}

/// Collects every violation before failing.
pub fn validate_order(payload: CreateOrderRequest) -> AppResult<ValidatedOrder> {
    payload.validate()?;

    let address = require(payload.delivery_address, "delivery_address")?;
    let lines = payload
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Ok(OrderLine {
                product_id: require(item.product_id, &format!("items[{index}].product_id"))?,
                quantity: require(item.quantity, &format!("items[{index}].quantity"))?,
                price: money(require(item.price, &format!("items[{index}].price"))?),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ValidatedOrder {
        email: require(payload.email, "email")?.trim().to_string(),
        name: require(payload.name, "name")?.trim().to_string(),
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
        street: require(address.street, "delivery_address.street")?,
        city: require(address.city, "delivery_address.city")?,
        postcode: require(address.postcode, "delivery_address.postcode")?,
        instructions: address.instructions.filter(|i| !i.trim().is_empty()),
        lines,
    })
}

/// The authenticated account, else an account registered under `email`, else a guest.
pub async fn resolve_account(
    executor: &QueryExecutor,
    user: Option<&AuthUser>,
    email: &str,
) -> AppResult<Option<Uuid>> {
    if let Some(user) = user {
        return Ok(Some(user.user_id));
    }
    let conn = executor.conn();
    let account = executor
        .run("users.find_by_email", || {
            Users::find().filter(UserCol::Email.eq(email)).one(conn)
        })
        .await?;
    Ok(account.map(|u| u.id))
}

/// Inserts the header then every item. Any failure aborts the unit of work.
pub async fn persist_order(txn: &DatabaseTransaction, record: OrderRecord) -> AppResult<OrderModel> {
    let order = record.order;
    let header = OrderActive {
        id: Set(record.id),
        user_id: Set(record.user_id),
        email: Set(order.email),
        name: Set(order.name),
        phone: Set(order.phone),
        total: Set(record.total),
        street: Set(order.street),
        city: Set(order.city),
        postcode: Set(order.postcode),
        instructions: Set(order.instructions),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let header = once("orders.insert", header.insert(txn)).await?;

    for line in order.lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(header.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price),
            created_at: NotSet,
        };
        once("order_items.insert", item.insert(txn)).await?;
    }

    Ok(header)
}

fn confirmation(
    order_id: Uuid,
    order: &ValidatedOrder,
    products: &HashMap<Uuid, ProductModel>,
    total: Decimal,
) -> Notification {
    let items = order
        .lines
        .iter()
        .map(|line| OrderConfirmationLine {
            name: products
                .get(&line.product_id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| line.product_id.to_string()),
            quantity: line.quantity,
            unit_price: line.price,
            line_total: money(line.price * Decimal::from(line.quantity)),
        })
        .collect();

    Notification::OrderConfirmation(OrderConfirmation {
        order_id,
        customer_name: order.name.clone(),
        delivery_address: order.address_line(),
        items,
        total,
    })
}

/// Sum of frozen line prices; must fit the `orders.total` column.
pub fn price_order(order: &ValidatedOrder) -> AppResult<Decimal> {
    order_total(order.lines.iter().map(|l| (l.price, l.quantity)))
        .ok()
        .filter(|total| *total <= MAX_MONEY)
        .ok_or_else(|| AppError::invalid_field("items", "order total must be at most 9999999999.99"))
}

pub async fn create_order(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CreateOrderResponse>> {
    let order = validate_order(payload)?;

    let product_ids: Vec<Uuid> = order.lines.iter().map(|l| l.product_id).collect();
    let products = products_by_id(&state.executor, &product_ids).await?;
    if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(id)) {
        return Err(AppError::not_found(format!("Product {missing}")));
    }
    let total = price_order(&order)?;

    let user_id = resolve_account(&state.executor, user, &order.email).await?;
    let record = OrderRecord {
        id: Uuid::new_v4(),
        user_id,
        total,
        order: order.clone(),
    };
    let header = state
        .coordinator
        .run("orders.create", move |txn| Box::pin(persist_order(txn, record)))
        .await?;

    tracing::info!(
        order_id = %header.id,
        total = %header.total,
        guest = header.user_id.is_none(),
        items = order.lines.len(),
        "order created"
    );

    let confirmation_sent = state
        .notifications
        .notify(
            NotificationTarget::order(header.id),
            &order.email,
            &confirmation(header.id, &order, &products, total),
        )
        .await
        .is_ok();

    Ok(ApiResponse::success(
        "Order created",
        CreateOrderResponse {
            order_id: header.id,
            total: header.total,
            confirmation_sent,
        },
        Some(Meta::empty()),
    ))
}

async fn paginate_orders(
    executor: &QueryExecutor,
    finder: Select<Orders>,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut finder = match &query.status {
        Some(status) => finder.filter(OrderCol::Status.eq(status.as_str())),
        None => finder,
    };
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let conn = executor.conn();
    let total = executor
        .run("orders.count", || finder.clone().count(conn))
        .await? as i64;

    let rows = executor
        .run("orders.list", || {
            finder
                .clone()
                .limit(limit as u64)
                .offset(offset as u64)
                .all(conn)
        })
        .await?;
    let items = rows
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<Order>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_customer(user)?;
    let finder = Orders::find().filter(OrderCol::UserId.eq(user.user_id));
    paginate_orders(&state.executor, finder, &query).await
}

/// Orders that contain at least one product from a farm the farmer owns.
pub async fn list_farmer_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_farmer(user)?;

    let farm_ids = Query::select()
        .column(FarmCol::Id)
        .from(Farms)
        .and_where(FarmCol::OwnerId.eq(user.user_id))
        .to_owned();
    let product_ids = Query::select()
        .column(ProdCol::Id)
        .from(Products)
        .and_where(ProdCol::FarmId.in_subquery(farm_ids))
        .to_owned();
    let order_ids = Query::select()
        .column(OrderItemCol::OrderId)
        .from(OrderItems)
        .and_where(OrderItemCol::ProductId.in_subquery(product_ids))
        .to_owned();

    let finder = Orders::find().filter(OrderCol::Id.in_subquery(order_ids));
    paginate_orders(&state.executor, finder, &query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_customer(user)?;
    let conn = state.executor.conn();

    let order = state
        .executor
        .run("orders.find", || {
            Orders::find()
                .filter(
                    Condition::all()
                        .add(OrderCol::UserId.eq(user.user_id))
                        .add(OrderCol::Id.eq(id)),
                )
                .one(conn)
        })
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let items = state
        .executor
        .run("order_items.list", || {
            OrderItems::find()
                .filter(OrderItemCol::OrderId.eq(order.id))
                .order_by_asc(OrderItemCol::CreatedAt)
                .all(conn)
        })
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order)?,
            items,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::{DeliveryAddressInput, OrderItemInput};

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            email: Some("guest@example.com".into()),
            name: Some("Guest Buyer".into()),
            phone: None,
            delivery_address: Some(DeliveryAddressInput {
                street: Some("1 Farm Lane".into()),
                city: Some("Leeds".into()),
                postcode: Some("LS1 1AA".into()),
                instructions: Some("  ".into()),
            }),
            items: vec![
                OrderItemInput {
                    product_id: Some(Uuid::new_v4()),
                    quantity: Some(2),
                    price: Some(dec("2.50")),
                },
                OrderItemInput {
                    product_id: Some(Uuid::new_v4()),
                    quantity: Some(3),
                    price: Some(dec("1.00")),
                },
            ],
        }
    }

    #[test]
    fn valid_order_totals_frozen_prices() {
        let order = validate_order(request()).unwrap();
        assert_eq!(order.instructions, None);
        let total = price_order(&order).unwrap();
        assert_eq!(total.to_string(), "8.00");
    }

    #[test]
    fn unbounded_prices_are_validation_errors() {
        let mut payload = request();
        payload.items[0].price = Some(Decimal::MAX);
        payload.items[1].quantity = Some(20_000);

        let Err(AppError::Validation(fields)) = validate_order(payload) else {
            panic!("expected a validation error");
        };
        assert_eq!(fields["items[0].price"], vec!["amount must be at most 9999999999.99"]);
        assert_eq!(fields["items[1].quantity"], vec!["quantity must be between 1 and 10000"]);
    }

    #[test]
    fn totals_beyond_the_column_are_rejected_before_persisting() {
        let mut payload = request();
        for item in &mut payload.items {
            item.price = Some(dec("9999999999.99"));
            item.quantity = Some(10_000);
        }
        let order = validate_order(payload).unwrap();

        let Err(AppError::Validation(fields)) = price_order(&order) else {
            panic!("expected a validation error");
        };
        assert_eq!(fields["items"], vec!["order total must be at most 9999999999.99"]);
    }

    #[test]
    fn every_missing_field_is_reported() {
        let mut payload = request();
        payload.email = Some("not-an-email".into());
        payload.name = None;
        payload.delivery_address = Some(DeliveryAddressInput::default());
        payload.items[1].quantity = Some(0);
        payload.items[0].price = Some(dec("-1"));

        let Err(AppError::Validation(fields)) = validate_order(payload) else {
            panic!("expected a validation error");
        };
        for key in [
            "email",
            "name",
            "delivery_address.street",
            "delivery_address.city",
            "delivery_address.postcode",
            "items[1].quantity",
            "items[0].price",
        ] {
            assert!(fields.contains_key(key), "missing {key} in {fields:?}");
        }
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let mut payload = request();
        payload.items.clear();
        let Err(AppError::Validation(fields)) = validate_order(payload) else {
            panic!("expected a validation error");
        };
        assert!(fields.contains_key("items"));
    }
}
