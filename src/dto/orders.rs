use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::{MAX_QUANTITY, validate_money};
use crate::models::{Order, OrderItem};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeliveryAddressInput {
    #[validate(
        required(message = "street is required"),
        length(min = 1, message = "street is required")
    )]
    pub street: Option<String>,
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
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    #[validate(required(message = "product_id is required"))]
    pub product_id: Option<Uuid>,
    #[validate(
        required(message = "quantity is required"),
        range(min = 1, max = MAX_QUANTITY, message = "quantity must be between 1 and 10000")
    )]
    pub quantity: Option<i32>,
    /// Unit price captured at order time.
    #[validate(
        required(message = "price is required"),
        custom(function = "validate_money")
    )]
    #[schema(value_type = Option<String>, example = "2.50")]
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name is required")
    )]
    pub name: Option<String>,
    pub phone: Option<String>,
    #[validate(required(message = "delivery_address is required"), nested)]
    pub delivery_address: Option<DeliveryAddressInput>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub order_id: Uuid,
    pub total: Decimal,
    pub confirmation_sent: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
