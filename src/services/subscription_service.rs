//! Recurring subscriptions: enrollment pipeline, detail view and
//! out-of-band notification re-drive.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    ActiveValue::NotSet,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        MAX_MONEY, parse_date, parse_money_value, require,
        subscriptions::{
            CreateSubscriptionRequest, CreateSubscriptionResponse, RedriveNotificationRequest,
            RedriveNotificationResponse, SubscriptionDetail, SubscriptionList,
        },
    },
    entity::{
        delivery_details::{ActiveModel as DeliveryActive, Column as DeliveryCol},
        farms::Column as FarmCol,
        subscription_items::{ActiveModel as SubscriptionItemActive, Column as SubscriptionItemCol},
        subscriptions::{ActiveModel as SubscriptionActive, Column as SubscriptionCol},
        DeliveryDetails, Farms, SubscriptionItems, Subscriptions,
    },
    error::{AppError, AppResult, FieldErrors, flatten_validation_errors},
    executor::{QueryExecutor, once},
    middleware::auth::{AuthUser, ensure_customer},
    models::{
        Cadence, DeliveryDetail, NotificationKind, PackageType, PremadePackage, Role,
        Subscription, SubscriptionItem, SubscriptionStatus,
    },
    notifications::{
        Notification, NotificationTarget,
        templates::{DeliveryNotice, PaymentFailedNotice, RenewalNotice, SubscriptionConfirmation},
    },
    pricing::{
        CustomLine, PremadeLine, PricingError, PricingInput, PricingSummary, money,
        parse_quantity, price_package,
    },
    response::{ApiResponse, Meta},
    services::{
        catalog_service::{find_package, products_by_id},
        convert::{delivery_from_entity, subscription_from_entity, subscription_item_from_entity},
        order_service::resolve_account,
    },
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct ValidatedItem {
    pub product_id: Option<Uuid>,
    pub name: Option<String>,
    pub quantity: i32,
    pub unit: String,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct ValidatedSubscription {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub cadence: Cadence,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub instructions: Option<String>,
    /// Ascending, without duplicates.
    pub delivery_dates: Vec<NaiveDate>,
    pub items: Vec<ValidatedItem>,
    pub price: Decimal,
    pub package_type: PackageType,
    pub package_id: Option<Uuid>,
}

impl ValidatedSubscription {
    fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    fn address_line(&self) -> String {
        format!("{}, {} {}", self.address, self.city, self.postcode)
    }
}

/// Frozen per-item snapshot written to `subscription_items`.
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub subscription: ValidatedSubscription,
    pub items: Vec<ItemSnapshot>,
}

fn push(fields: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    fields.entry(field.into()).or_default().push(message.into());
}

/// Derive rules plus the cross-field ones; all violations are reported together.
pub fn validate_subscription(
    payload: CreateSubscriptionRequest,
    today: NaiveDate,
) -> AppResult<ValidatedSubscription> {
    let mut fields = match payload.validate() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => flatten_validation_errors(&errors),
    };

    let mut delivery_dates = Vec::with_capacity(payload.delivery_dates.len());
    for (index, raw) in payload.delivery_dates.iter().enumerate() {
        match parse_date(raw) {
            Some(date) if date < today => push(
                &mut fields,
                format!("delivery_dates[{index}]"),
                "delivery date must not be in the past",
            ),
            Some(date) => delivery_dates.push(date),
            None => push(
                &mut fields,
                format!("delivery_dates[{index}]"),
                "delivery date must be a date like 2030-01-07",
            ),
        }
    }

    let price = payload.total_price.as_ref().and_then(|raw| {
        match parse_money_value(raw) {
            Some(value) if value.is_sign_negative() && !value.is_zero() => {
                push(&mut fields, "total_price", "total_price must not be negative");
                None
            }
            Some(value) if value > MAX_MONEY => {
                push(&mut fields, "total_price", "total_price must be at most 9999999999.99");
                None
            }
            Some(value) => Some(money(value)),
            None => {
                push(&mut fields, "total_price", "total_price must be a number");
                None
            }
        }
    });

    let cadence = payload.subscription_type.as_deref().and_then(Cadence::parse);
    let package_type = payload.package_type.as_deref().and_then(PackageType::parse);
    match package_type {
        Some(PackageType::Custom) => {
            for (index, item) in payload.items.iter().enumerate() {
                if item.product_id.is_none() {
                    push(
                        &mut fields,
                        format!("items[{index}].product_id"),
                        "product_id is required for custom packages",
                    );
                }
                if item.price.is_none() {
                    push(
                        &mut fields,
                        format!("items[{index}].price"),
                        "price is required for custom packages",
                    );
                }
            }
        }
        Some(PackageType::Premade) if payload.package.is_none() => {
            push(&mut fields, "package", "package is required for premade packages");
        }
        _ => {}
    }

    if !fields.is_empty() {
        return Err(AppError::Validation(fields));
    }

    let items = payload
        .items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let parsed = parse_quantity(&item.quantity).map_err(|err| {
                AppError::invalid_field(format!("items[{index}].quantity"), err.to_string())
            })?;
            Ok(ValidatedItem {
                product_id: item.product_id,
                name: item.name.filter(|n| !n.trim().is_empty()),
                quantity: parsed.quantity,
                unit: parsed.unit,
                price: item.price.map(money),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    delivery_dates.sort_unstable();
    delivery_dates.dedup();

    Ok(ValidatedSubscription {
        first_name: require(payload.first_name, "first_name")?.trim().to_string(),
        last_name: require(payload.last_name, "last_name")?.trim().to_string(),
        email: require(payload.email, "email")?.trim().to_string(),
        phone: payload.phone.filter(|p| !p.trim().is_empty()),
        cadence: require(cadence, "subscription_type")?,
        address: require(payload.delivery_address, "delivery_address")?,
        city: require(payload.city, "city")?,
        postcode: require(payload.postcode, "postcode")?,
        instructions: payload.delivery_instructions.filter(|i| !i.trim().is_empty()),
        delivery_dates,
        items,
        price: require(price, "total_price")?,
        package_type: require(package_type, "package_type")?,
        package_id: payload.package,
    })
}

fn items_out_of_range(err: PricingError) -> AppError {
    AppError::invalid_field("items", err.to_string())
}

/// Priced enrollment: the pricing breakdown plus the rows to freeze.
struct Priced {
    pricing: PricingSummary,
    snapshots: Vec<ItemSnapshot>,
    package: Option<PremadePackage>,
}

async fn price_subscription(
    executor: &QueryExecutor,
    subscription: &ValidatedSubscription,
) -> AppResult<Priced> {
    let product_ids: Vec<Uuid> = subscription
        .items
        .iter()
        .filter_map(|item| item.product_id)
        .collect();
    let products = products_by_id(executor, &product_ids).await?;
    if let Some(missing) = product_ids.iter().find(|id| !products.contains_key(id)) {
        return Err(AppError::not_found(format!("Product {missing}")));
    }

    match subscription.package_type {
        PackageType::Custom => {
            let mut lines = Vec::with_capacity(subscription.items.len());
            for (index, item) in subscription.items.iter().enumerate() {
                let product_id = require(item.product_id, &format!("items[{index}].product_id"))?;
                let price = require(item.price, &format!("items[{index}].price"))?;
                let product = products
                    .get(&product_id)
                    .ok_or_else(|| AppError::not_found(format!("Product {product_id}")))?;
                lines.push(CustomLine {
                    product_id,
                    name: item.name.clone().unwrap_or_else(|| product.name.clone()),
                    quantity: item.quantity,
                    unit: if item.unit.is_empty() {
                        product.unit.clone()
                    } else {
                        item.unit.clone()
                    },
                    catalog_price: product.price,
                    subscription_price: price,
                });
            }
            let snapshots = lines
                .iter()
                .map(|line| ItemSnapshot {
                    product_id: Some(line.product_id),
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    price: money(line.subscription_price),
                })
                .collect();
            Ok(Priced {
                pricing: price_package(PricingInput::Custom(&lines)).map_err(items_out_of_range)?,
                snapshots,
                package: None,
            })
        }
        PackageType::Premade => {
            let package_id = require(subscription.package_id, "package")?;
            let package = find_package(executor, package_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Package {package_id}")))?;
            if package.cadence != subscription.cadence {
                tracing::warn!(
                    package_id = %package.id,
                    package_cadence = %package.cadence,
                    cadence = %subscription.cadence,
                    "subscription cadence differs from the package's offered cadence"
                );
            }

            let lines: Vec<PremadeLine> = subscription
                .items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let product = item.product_id.and_then(|id| products.get(&id));
                    PremadeLine {
                        product_id: item.product_id,
                        name: item
                            .name
                            .clone()
                            .or_else(|| product.map(|p| p.name.clone()))
                            .unwrap_or_else(|| format!("Item {}", index + 1)),
                        quantity: item.quantity,
                        unit: item.unit.clone(),
                        price: item
                            .price
                            .or_else(|| product.map(|p| p.price))
                            .unwrap_or(Decimal::ZERO),
                    }
                })
                .collect();
            let snapshots = lines
                .iter()
                .map(|line| ItemSnapshot {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    price: money(line.price),
                })
                .collect();
            let pricing = price_package(PricingInput::Premade {
                retail_value: package.retail_value,
                subscription_price: subscription.price,
                lines: &lines,
            })
            .map_err(items_out_of_range)?;
            Ok(Priced {
                pricing,
                snapshots,
                package: Some(package),
            })
        }
    }
}

/// Header, delivery detail, then every item row, on one transaction.
pub async fn persist_subscription(
    txn: &DatabaseTransaction,
    record: SubscriptionRecord,
) -> AppResult<Uuid> {
    let sub = record.subscription;
    let header = SubscriptionActive {
        id: Set(record.id),
        user_id: Set(record.user_id),
        cadence: Set(sub.cadence.as_str().to_string()),
        package_type: Set(sub.package_type.as_str().to_string()),
        status: Set(SubscriptionStatus::Active.as_str().to_string()),
        price: Set(sub.price),
        premade_package_id: Set(sub.package_id),
        created_at: NotSet,
        updated_at: NotSet,
    };
    once("subscriptions.insert", header.insert(txn)).await?;

    let dates = serde_json::to_value(&sub.delivery_dates).map_err(anyhow::Error::from)?;
    let delivery = DeliveryActive {
        id: Set(Uuid::new_v4()),
        subscription_id: Set(record.id),
        address: Set(sub.address),
        city: Set(sub.city),
        postcode: Set(sub.postcode),
        instructions: Set(sub.instructions),
        delivery_dates: Set(dates),
        first_name: Set(sub.first_name),
        last_name: Set(sub.last_name),
        email: Set(sub.email),
        phone: Set(sub.phone),
        created_at: NotSet,
    };
    once("delivery_details.insert", delivery.insert(txn)).await?;

    for item in record.items {
        let row = SubscriptionItemActive {
            id: Set(Uuid::new_v4()),
            subscription_id: Set(record.id),
            product_id: Set(item.product_id),
            name: Set(item.name),
            quantity: Set(item.quantity),
            unit: Set(item.unit),
            price: Set(item.price),
            created_at: NotSet,
        };
        once("subscription_items.insert", row.insert(txn)).await?;
    }

    Ok(record.id)
}

pub async fn create_subscription(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: CreateSubscriptionRequest,
) -> AppResult<ApiResponse<CreateSubscriptionResponse>> {
    let subscription = validate_subscription(payload, Utc::now().date_naive())?;
    let priced = price_subscription(&state.executor, &subscription).await?;

    let user_id = resolve_account(&state.executor, user, &subscription.email).await?;
    let record = SubscriptionRecord {
        id: Uuid::new_v4(),
        user_id,
        subscription: subscription.clone(),
        items: priced.snapshots,
    };
    let subscription_id = state
        .coordinator
        .run("subscriptions.create", move |txn| {
            Box::pin(persist_subscription(txn, record))
        })
        .await?;

    tracing::info!(
        subscription_id = %subscription_id,
        package_type = %subscription.package_type,
        cadence = %subscription.cadence,
        price = %subscription.price,
        savings = %priced.pricing.savings,
        guest = user_id.is_none(),
        "subscription created"
    );

    let confirmation = Notification::SubscriptionConfirmation(SubscriptionConfirmation {
        subscription_id,
        customer_name: subscription.customer_name(),
        cadence: subscription.cadence,
        package_type: subscription.package_type,
        package_name: priced.package.map(|p| p.name),
        delivery_address: subscription.address_line(),
        delivery_dates: subscription.delivery_dates.clone(),
        pricing: priced.pricing,
    });
    let confirmation_sent = state
        .notifications
        .notify(
            NotificationTarget::subscription(subscription_id),
            &subscription.email,
            &confirmation,
        )
        .await
        .is_ok();

    Ok(ApiResponse::success(
        "Subscription created",
        CreateSubscriptionResponse {
            subscription_id,
            confirmation_sent,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_subscriptions(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SubscriptionList>> {
    ensure_customer(user)?;
    let conn = state.executor.conn();
    let items = state
        .executor
        .run("subscriptions.list", || {
            Subscriptions::find()
                .filter(SubscriptionCol::UserId.eq(user.user_id))
                .order_by_desc(SubscriptionCol::CreatedAt)
                .all(conn)
        })
        .await?
        .into_iter()
        .map(subscription_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    let total = items.len();
    Ok(ApiResponse::listing("Ok", SubscriptionList { items }, total))
}

/// Splits at `today`: earlier dates are past, the rest upcoming, both ascending.
pub fn group_delivery_dates(
    dates: &[NaiveDate],
    today: NaiveDate,
) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    let (past, upcoming): (Vec<_>, Vec<_>) = sorted.into_iter().partition(|d| *d < today);
    (upcoming, past)
}

/// Read-side pricing from the stored snapshot. A product or package that has
/// since been deleted prices at the frozen figure, so it shows no savings.
pub async fn price_stored(
    executor: &QueryExecutor,
    subscription: &Subscription,
    items: &[SubscriptionItem],
    package: Option<&PremadePackage>,
) -> AppResult<PricingSummary> {
    match subscription.package_type {
        PackageType::Custom => {
            let ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
            let products = products_by_id(executor, &ids).await?;
            let lines: Vec<CustomLine> = items
                .iter()
                .map(|item| {
                    let catalog_price = item
                        .product_id
                        .and_then(|id| products.get(&id))
                        .map(|p| p.price)
                        .unwrap_or(item.price);
                    CustomLine {
                        product_id: item.product_id.unwrap_or_default(),
                        name: item.name.clone(),
                        quantity: item.quantity,
                        unit: item.unit.clone(),
                        catalog_price,
                        subscription_price: item.price,
                    }
                })
                .collect();
            Ok(price_package(PricingInput::Custom(&lines)).map_err(anyhow::Error::from)?)
        }
        PackageType::Premade => {
            let lines: Vec<PremadeLine> = items
                .iter()
                .map(|item| PremadeLine {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit: item.unit.clone(),
                    price: item.price,
                })
                .collect();
            Ok(price_package(PricingInput::Premade {
                retail_value: package.map_or(subscription.price, |p| p.retail_value),
                subscription_price: subscription.price,
                lines: &lines,
            })
            .map_err(anyhow::Error::from)?)
        }
    }
}

struct LoadedSubscription {
    subscription: Subscription,
    delivery: Option<DeliveryDetail>,
    items: Vec<SubscriptionItem>,
    package: Option<PremadePackage>,
}

async fn farmer_can_view(
    executor: &QueryExecutor,
    user: &AuthUser,
    items: &[SubscriptionItem],
    package: Option<&PremadePackage>,
) -> AppResult<bool> {
    let conn = executor.conn();
    let owned: HashSet<Uuid> = executor
        .run("farms.by_owner", || {
            Farms::find().filter(FarmCol::OwnerId.eq(user.user_id)).all(conn)
        })
        .await?
        .into_iter()
        .map(|farm| farm.id)
        .collect();
    if owned.is_empty() {
        return Ok(false);
    }
    if package.is_some_and(|p| owned.contains(&p.farm_id)) {
        return Ok(true);
    }

    let ids: Vec<Uuid> = items.iter().filter_map(|i| i.product_id).collect();
    let products = products_by_id(executor, &ids).await?;
    Ok(products.values().any(|p| owned.contains(&p.farm_id)))
}

/// Customers see their own subscriptions; farmers see those sourced from their farms.
async fn load_subscription(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<LoadedSubscription> {
    let executor = &state.executor;
    let conn = executor.conn();

    let subscription = executor
        .run("subscriptions.find", || Subscriptions::find_by_id(id).one(conn))
        .await?
        .ok_or_else(|| AppError::not_found("Subscription"))?;
    let subscription = subscription_from_entity(subscription)?;

    if user.role == Role::Customer && subscription.user_id != Some(user.user_id) {
        return Err(AppError::not_found("Subscription"));
    }

    let delivery = executor
        .run("delivery_details.find", || {
            DeliveryDetails::find()
                .filter(DeliveryCol::SubscriptionId.eq(id))
                .one(conn)
        })
        .await?
        .map(delivery_from_entity)
        .transpose()?;

    let items: Vec<SubscriptionItem> = executor
        .run("subscription_items.list", || {
            SubscriptionItems::find()
                .filter(SubscriptionItemCol::SubscriptionId.eq(id))
                .order_by_asc(SubscriptionItemCol::CreatedAt)
                .all(conn)
        })
        .await?
        .into_iter()
        .map(subscription_item_from_entity)
        .collect();

    let package = match subscription.premade_package_id {
        Some(package_id) => find_package(executor, package_id).await?,
        None => None,
    };

    if user.role == Role::Farmer
        && !farmer_can_view(executor, user, &items, package.as_ref()).await?
    {
        return Err(AppError::Forbidden);
    }

    Ok(LoadedSubscription {
        subscription,
        delivery,
        items,
        package,
    })
}

pub async fn get_subscription(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SubscriptionDetail>> {
    let loaded = load_subscription(state, user, id).await?;
    let pricing = price_stored(
        &state.executor,
        &loaded.subscription,
        &loaded.items,
        loaded.package.as_ref(),
    )
    .await?;

    let dates = loaded
        .delivery
        .as_ref()
        .map(|d| d.delivery_dates.clone())
        .unwrap_or_default();
    let (upcoming_deliveries, past_deliveries) =
        group_delivery_dates(&dates, Utc::now().date_naive());

    Ok(ApiResponse::success(
        "OK",
        SubscriptionDetail {
            subscription: loaded.subscription,
            delivery: loaded.delivery,
            items: loaded.items,
            package: loaded.package,
            pricing,
            upcoming_deliveries,
            past_deliveries,
        },
        Some(Meta::empty()),
    ))
}

/// Builds the message for `kind` from stored data. Dates are picked relative to `today`.
pub fn build_notification(
    kind: NotificationKind,
    subscription: &Subscription,
    delivery: &DeliveryDetail,
    package: Option<&PremadePackage>,
    pricing: PricingSummary,
    today: NaiveDate,
) -> AppResult<Notification> {
    let customer_name = format!("{} {}", delivery.first_name, delivery.last_name);
    let address = format!("{}, {} {}", delivery.address, delivery.city, delivery.postcode);
    let (upcoming, past) = group_delivery_dates(&delivery.delivery_dates, today);

    let notice = |date: Option<&NaiveDate>, missing: &str| -> AppResult<DeliveryNotice> {
        let date = date.ok_or_else(|| AppError::BadRequest(missing.to_string()))?;
        Ok(DeliveryNotice {
            subscription_id: subscription.id,
            customer_name: customer_name.clone(),
            delivery_date: *date,
            delivery_address: address.clone(),
        })
    };

    let notification = match kind {
        NotificationKind::SubscriptionConfirmation => {
            Notification::SubscriptionConfirmation(SubscriptionConfirmation {
                subscription_id: subscription.id,
                customer_name: customer_name.clone(),
                cadence: subscription.cadence,
                package_type: subscription.package_type,
                package_name: package.map(|p| p.name.clone()),
                delivery_address: address.clone(),
                delivery_dates: delivery.delivery_dates.clone(),
                pricing,
            })
        }
        NotificationKind::OrderConfirmation => {
            return Err(AppError::BadRequest(
                "order_confirmation is not sent for subscriptions".into(),
            ));
        }
        NotificationKind::DeliveryReminder => Notification::DeliveryReminder(notice(
            upcoming.first(),
            "subscription has no upcoming delivery",
        )?),
        NotificationKind::DeliveryComplete => Notification::DeliveryComplete(notice(
            past.last(),
            "subscription has no past delivery",
        )?),
        NotificationKind::RenewalReminder => {
            let last_delivery = upcoming
                .last()
                .or(past.last())
                .copied()
                .ok_or_else(|| AppError::BadRequest("subscription has no delivery dates".into()))?;
            Notification::RenewalReminder(RenewalNotice {
                subscription_id: subscription.id,
                customer_name: customer_name.clone(),
                cadence: subscription.cadence,
                last_delivery,
                price: subscription.price,
            })
        }
        NotificationKind::PaymentFailed => Notification::PaymentFailed(PaymentFailedNotice {
            subscription_id: subscription.id,
            customer_name: customer_name.clone(),
            amount: subscription.price,
        }),
    };
    Ok(notification)
}

/// Sends `kind` again. Every attempt is logged, so the response reports how
/// many were already on record.
pub async fn redrive_notification(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RedriveNotificationRequest,
) -> AppResult<ApiResponse<RedriveNotificationResponse>> {
    let loaded = load_subscription(state, user, id).await?;
    let delivery = loaded
        .delivery
        .as_ref()
        .ok_or_else(|| AppError::not_found("Delivery details"))?;

    let pricing = price_stored(
        &state.executor,
        &loaded.subscription,
        &loaded.items,
        loaded.package.as_ref(),
    )
    .await?;
    let notification = build_notification(
        payload.kind,
        &loaded.subscription,
        delivery,
        loaded.package.as_ref(),
        pricing,
        Utc::now().date_naive(),
    )?;

    let previous_attempts = state.notifications.attempts(id, payload.kind).await?;
    if previous_attempts > 0 {
        tracing::info!(
            subscription_id = %id,
            kind = %payload.kind,
            previous_attempts,
            "re-sending notification that was already attempted"
        );
    }

    let sent = state
        .notifications
        .notify(
            NotificationTarget::subscription(id),
            &delivery.email,
            &notification,
        )
        .await
        .is_ok();

    Ok(ApiResponse::success(
        if sent { "Notification sent" } else { "Notification failed" },
        RedriveNotificationResponse {
            kind: payload.kind,
            sent,
            previous_attempts,
        },
        Some(Meta::empty()),
    ))
}
