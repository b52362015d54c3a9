use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Farmer,
}

string_enum!(Role { Customer => "customer", Farmer => "farmer" });

/// Recurrence interval of a subscription or premade package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Weekly,
    Biweekly,
    Monthly,
}

string_enum!(Cadence { Weekly => "weekly", Biweekly => "biweekly", Monthly => "monthly" });

/// Decides which pricing formula applies. Set at enrollment, never flipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Custom,
    Premade,
}

string_enum!(PackageType { Custom => "custom", Premade => "premade" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

string_enum!(OrderStatus { Pending => "pending", Completed => "completed", Cancelled => "cancelled" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

string_enum!(SubscriptionStatus { Active => "active", Paused => "paused", Cancelled => "cancelled" });

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Farm {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

/// One `{name, quantity}` line of a premade package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackageLine {
    pub name: String,
    pub quantity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PremadePackage {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub retail_value: Decimal,
    pub cadence: Cadence,
    pub items: Vec<PackageLine>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub total: Decimal,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub instructions: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub cadence: Cadence,
    pub package_type: PackageType,
    pub status: SubscriptionStatus,
    pub price: Decimal,
    pub premade_package_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeliveryDetail {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub address: String,
    pub city: String,
    pub postcode: String,
    pub instructions: Option<String>,
    pub delivery_dates: Vec<NaiveDate>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionItem {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub product_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SubscriptionConfirmation,
    OrderConfirmation,
    DeliveryReminder,
    DeliveryComplete,
    RenewalReminder,
    PaymentFailed,
}

string_enum!(NotificationKind {
    SubscriptionConfirmation => "subscription_confirmation",
    OrderConfirmation => "order_confirmation",
    DeliveryReminder => "delivery_reminder",
    DeliveryComplete => "delivery_complete",
    RenewalReminder => "renewal_reminder",
    PaymentFailed => "payment_failed",
});
