use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        quantity_text, validate_cadence, validate_money, validate_package_type,
        validate_quantity,
    },
    models::{
        DeliveryDetail, NotificationKind, PremadePackage, Subscription, SubscriptionItem,
    },
    pricing::PricingSummary,
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubscriptionItemInput {
    /// Required for custom packages.
    pub product_id: Option<Uuid>,
    /// Display name for premade lines without a catalog product.
    pub name: Option<String>,
    /// Combined quantity and unit, e.g. `"2 kg"`. A bare number is accepted.
    #[serde(default, deserialize_with = "quantity_text")]
    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "2 kg")]
    pub quantity: String,
    /// Frozen price per unit. Required for custom packages.
    #[validate(custom(function = "validate_money"))]
    #[schema(value_type = Option<String>, example = "2.50")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateSubscriptionRequest {
    #[validate(
        required(message = "first_name is required"),
        length(min = 1, message = "first_name is required")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "last_name is required"),
        length(min = 1, message = "last_name is required")
    )]
    pub last_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid address")
    )]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// `weekly`, `biweekly` or `monthly`.
    #[validate(
        required(message = "subscription_type is required"),
        custom(function = "validate_cadence")
    )]
    #[schema(example = "weekly")]
    pub subscription_type: Option<String>,
    #[validate(
        required(message = "delivery_address is required"),
        length(min = 1, message = "delivery_address is required")
    )]
    pub delivery_address: Option<String>,
    #[validate(
        required(message = "city is required"),
        length(min = 1, message = "city is required")
    )]
    pub city: Option<String>,
    #[validate(
        required(message = "postcode is required"),
        length(min = 1, message = "postcode is required")
    )]
    pub postcode: Option<String>,
    pub delivery_instructions: Option<String>,
    #[serde(default)]
    /// `YYYY-MM-DD`, none in the past.
    #[validate(length(min = 1, message = "at least one delivery date is required"))]
    #[schema(example = json!(["2030-01-07", "2030-01-14"]))]
    pub delivery_dates: Vec<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<SubscriptionItemInput>,
    /// Recurring charge, as a string or a number.
    #[validate(required(message = "total_price is required"))]
    #[schema(value_type = Option<String>, example = "22.50")]
    pub total_price: Option<serde_json::Value>,
    /// `custom` or `premade`.
    #[validate(
        required(message = "package_type is required"),
        custom(function = "validate_package_type")
    )]
    #[schema(example = "custom")]
    pub package_type: Option<String>,
    /// Premade package id. Required when `package_type` is `premade`.
    pub package: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: Uuid,
    pub confirmation_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionDetail {
    pub subscription: Subscription,
    pub delivery: Option<DeliveryDetail>,
    pub items: Vec<SubscriptionItem>,
    pub package: Option<PremadePackage>,
    pub pricing: PricingSummary,
    pub upcoming_deliveries: Vec<NaiveDate>,
    pub past_deliveries: Vec<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionList {
    pub items: Vec<Subscription>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedriveNotificationRequest {
    pub kind: NotificationKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedriveNotificationResponse {
    pub kind: NotificationKind,
    pub sent: bool,
    /// Attempts of this kind logged before this one.
    pub previous_attempts: u64,
}
