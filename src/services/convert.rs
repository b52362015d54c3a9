//! Entity rows to API models. Stored enum text and JSON columns are checked
//! here; a row that does not decode is an internal error.

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use sea_orm::prelude::Json;

use crate::{
    entity::{
        delivery_details::Model as DeliveryModel, farms::Model as FarmModel,
        order_items::Model as OrderItemModel, orders::Model as OrderModel,
        premade_packages::Model as PackageModel, products::Model as ProductModel,
        subscription_items::Model as SubscriptionItemModel,
        subscriptions::Model as SubscriptionModel,
    },
    error::{AppError, AppResult},
    models::{
        Cadence, DeliveryDetail, Farm, Order, OrderItem, OrderStatus, PackageLine, PackageType,
        PremadePackage, Product, Subscription, SubscriptionItem, SubscriptionStatus,
    },
};

fn stored<T>(value: Option<T>, column: &str, raw: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Internal(anyhow!("unexpected {column} value {raw:?}")))
}

fn json_column<T: serde::de::DeserializeOwned>(value: Json, column: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|err| AppError::Internal(anyhow!("malformed {column} column: {err}")))
}

pub fn farm_from_entity(model: FarmModel) -> Farm {
    Farm {
        id: model.id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        location: model.location,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        farm_id: model.farm_id,
        name: model.name,
        description: model.description,
        price: model.price,
        unit: model.unit,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn package_from_entity(model: PackageModel) -> AppResult<PremadePackage> {
    Ok(PremadePackage {
        id: model.id,
        farm_id: model.farm_id,
        name: model.name,
        description: model.description,
        retail_value: model.retail_value,
        cadence: stored(Cadence::parse(&model.cadence), "cadence", &model.cadence)?,
        items: json_column::<Vec<PackageLine>>(model.items, "premade_packages.items")?,
        tags: json_column::<Vec<String>>(model.tags, "premade_packages.tags")?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

pub fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        email: model.email,
        name: model.name,
        phone: model.phone,
        total: model.total,
        street: model.street,
        city: model.city,
        postcode: model.postcode,
        instructions: model.instructions,
        status: stored(OrderStatus::parse(&model.status), "status", &model.status)?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn subscription_from_entity(model: SubscriptionModel) -> AppResult<Subscription> {
    Ok(Subscription {
        id: model.id,
        user_id: model.user_id,
        cadence: stored(Cadence::parse(&model.cadence), "cadence", &model.cadence)?,
        package_type: stored(
            PackageType::parse(&model.package_type),
            "package_type",
            &model.package_type,
        )?,
        status: stored(
            SubscriptionStatus::parse(&model.status),
            "status",
            &model.status,
        )?,
        price: model.price,
        premade_package_id: model.premade_package_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub fn delivery_from_entity(model: DeliveryModel) -> AppResult<DeliveryDetail> {
    Ok(DeliveryDetail {
        id: model.id,
        subscription_id: model.subscription_id,
        address: model.address,
        city: model.city,
        postcode: model.postcode,
        instructions: model.instructions,
        delivery_dates: json_column::<Vec<NaiveDate>>(
            model.delivery_dates,
            "delivery_details.delivery_dates",
        )?,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
    })
}

pub fn subscription_item_from_entity(model: SubscriptionItemModel) -> SubscriptionItem {
    SubscriptionItem {
        id: model.id,
        subscription_id: model.subscription_id,
        product_id: model.product_id,
        name: model.name,
        quantity: model.quantity,
        unit: model.unit,
        price: model.price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;
    use uuid::Uuid;

    fn package(cadence: &str, items: Json) -> PackageModel {
        PackageModel {
            id: Uuid::new_v4(),
            farm_id: Uuid::new_v4(),
            name: "Veg Box".into(),
            description: None,
            retail_value: Decimal::new(3000, 2),
            cadence: cadence.into(),
            items,
            tags: json!(["seasonal"]),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn package_lines_decode_from_json() {
        let model = package("weekly", json!([{ "name": "Carrots", "quantity": "2 kg" }]));
        let decoded = package_from_entity(model).unwrap();
        assert_eq!(decoded.cadence, Cadence::Weekly);
        assert_eq!(
            decoded.items,
            vec![PackageLine {
                name: "Carrots".into(),
                quantity: "2 kg".into()
            }]
        );
        assert_eq!(decoded.tags, vec!["seasonal".to_string()]);
    }

    #[test]
    fn unknown_stored_values_are_internal_errors() {
        let err = package_from_entity(package("daily", json!([]))).unwrap_err();
        assert_eq!(err.kind(), "internal");

        let err = package_from_entity(package("weekly", json!({ "oops": true }))).unwrap_err();
        assert_eq!(err.kind(), "internal");
    }
}
