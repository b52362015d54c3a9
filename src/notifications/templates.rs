use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Cadence, NotificationKind, PackageType},
    pricing::PricingSummary,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubscriptionConfirmation {
    pub subscription_id: Uuid,
    pub customer_name: String,
    pub cadence: Cadence,
    pub package_type: PackageType,
    pub package_name: Option<String>,
    pub delivery_address: String,
    pub delivery_dates: Vec<NaiveDate>,
    pub pricing: PricingSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderConfirmationLine {
    pub name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub customer_name: String,
    pub delivery_address: String,
    pub items: Vec<OrderConfirmationLine>,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryNotice {
    pub subscription_id: Uuid,
    pub customer_name: String,
    pub delivery_date: NaiveDate,
    pub delivery_address: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalNotice {
    pub subscription_id: Uuid,
    pub customer_name: String,
    pub cadence: Cadence,
    pub last_delivery: NaiveDate,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentFailedNotice {
    pub subscription_id: Uuid,
    pub customer_name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub enum Notification {
    SubscriptionConfirmation(SubscriptionConfirmation),
    OrderConfirmation(OrderConfirmation),
    DeliveryReminder(DeliveryNotice),
    DeliveryComplete(DeliveryNotice),
    RenewalReminder(RenewalNotice),
    PaymentFailed(PaymentFailedNotice),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::SubscriptionConfirmation(_) => NotificationKind::SubscriptionConfirmation,
            Notification::OrderConfirmation(_) => NotificationKind::OrderConfirmation,
            Notification::DeliveryReminder(_) => NotificationKind::DeliveryReminder,
            Notification::DeliveryComplete(_) => NotificationKind::DeliveryComplete,
            Notification::RenewalReminder(_) => NotificationKind::RenewalReminder,
            Notification::PaymentFailed(_) => NotificationKind::PaymentFailed,
        }
    }

    /// The data the template was rendered from, as stored in the audit row.
    pub fn payload(&self) -> serde_json::Value {
        let value = match self {
            Notification::SubscriptionConfirmation(data) => serde_json::to_value(data),
            Notification::OrderConfirmation(data) => serde_json::to_value(data),
            Notification::DeliveryReminder(data) | Notification::DeliveryComplete(data) => {
                serde_json::to_value(data)
            }
            Notification::RenewalReminder(data) => serde_json::to_value(data),
            Notification::PaymentFailed(data) => serde_json::to_value(data),
        };
        value.unwrap_or_default()
    }

    pub fn render(&self) -> RenderedMessage {
        match self {
            Notification::SubscriptionConfirmation(data) => render_subscription_confirmation(data),
            Notification::OrderConfirmation(data) => render_order_confirmation(data),
            Notification::DeliveryReminder(data) => RenderedMessage {
                subject: format!("Your delivery is coming on {}", data.delivery_date),
                html: layout(
                    &data.customer_name,
                    &format!(
                        "<p>Your next box arrives on <strong>{}</strong> at {}.</p>",
                        data.delivery_date,
                        escape_html(&data.delivery_address)
                    ),
                ),
            },
            Notification::DeliveryComplete(data) => RenderedMessage {
                subject: "Your box has been delivered".to_string(),
                html: layout(
                    &data.customer_name,
                    &format!(
                        "<p>Your box for {} was delivered to {}. Enjoy!</p>",
                        data.delivery_date,
                        escape_html(&data.delivery_address)
                    ),
                ),
            },
            Notification::RenewalReminder(data) => RenderedMessage {
                subject: "Your subscription is up for renewal".to_string(),
                html: layout(
                    &data.customer_name,
                    &format!(
                        "<p>Your {} subscription's last scheduled delivery is on {}. \
                         It renews at {} per delivery.</p>",
                        data.cadence, data.last_delivery, data.price
                    ),
                ),
            },
            Notification::PaymentFailed(data) => RenderedMessage {
                subject: "We could not process your payment".to_string(),
                html: layout(
                    &data.customer_name,
                    &format!(
                        "<p>The payment of {} for subscription {} failed. \
                         Please update your payment details.</p>",
                        data.amount, data.subscription_id
                    ),
                ),
            },
        }
    }
}

fn render_subscription_confirmation(data: &SubscriptionConfirmation) -> RenderedMessage {
    let mut rows = String::new();
    for item in &data.pricing.items {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{} {}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&item.name),
            item.quantity,
            escape_html(&item.unit),
            item.original_price,
            item.discounted_price
        ));
    }

    let dates = data
        .delivery_dates
        .iter()
        .map(|d| format!("<li>{d}</li>"))
        .collect::<String>();

    let package = match &data.package_name {
        Some(name) => format!("{} ({})", escape_html(name), data.package_type),
        None => data.package_type.to_string(),
    };

    let body = format!(
        "<p>Thanks for subscribing! Your {cadence} {package} box is confirmed.</p>\
         <table><tr><th>Item</th><th>Quantity</th><th>Retail</th><th>Your price</th></tr>{rows}</table>\
         <p>Retail value: {original}<br>Your price: {discounted}<br>You save: {savings}</p>\
         <p>Deliveries to {address}:</p><ul>{dates}</ul>",
        cadence = data.cadence,
        original = data.pricing.original_total,
        discounted = data.pricing.discounted_total,
        savings = data.pricing.savings,
        address = escape_html(&data.delivery_address),
    );

    RenderedMessage {
        subject: format!("Subscription confirmed ({})", data.subscription_id),
        html: layout(&data.customer_name, &body),
    }
}

fn render_order_confirmation(data: &OrderConfirmation) -> RenderedMessage {
    let rows = data
        .items
        .iter()
        .map(|line| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&line.name),
                line.quantity,
                line.unit_price,
                line.line_total
            )
        })
        .collect::<String>();

    let body = format!(
        "<p>We received your order.</p>\
         <table><tr><th>Item</th><th>Qty</th><th>Price</th><th>Total</th></tr>{rows}</table>\
         <p>Order total: {total}</p><p>Delivering to {address}.</p>",
        total = data.total,
        address = escape_html(&data.delivery_address),
    );

    RenderedMessage {
        subject: format!("Order confirmed ({})", data.order_id),
        html: layout(&data.customer_name, &body),
    }
}

fn layout(customer_name: &str, body: &str) -> String {
    format!(
        "<html><body><p>Hi {},</p>{}<p>From the farm, with care.</p></body></html>",
        escape_html(customer_name),
        body
    )
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price_premade;

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn confirmation_carries_aggregate_pricing() {
        let data = SubscriptionConfirmation {
            subscription_id: Uuid::new_v4(),
            customer_name: "Ada <Admin>".into(),
            cadence: Cadence::Weekly,
            package_type: PackageType::Premade,
            package_name: Some("Veg Box".into()),
            delivery_address: "1 Farm Lane, Leeds LS1".into(),
            delivery_dates: vec![NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()],
            pricing: price_premade(dec("30.00"), dec("22.50"), &[]).unwrap(),
        };
        let notification = Notification::SubscriptionConfirmation(data);
        let message = notification.render();

        assert!(message.subject.starts_with("Subscription confirmed"));
        assert!(message.html.contains("Retail value: 30.00"));
        assert!(message.html.contains("You save: 7.50"));
        assert!(message.html.contains("2030-01-07"));
        assert!(message.html.contains("Ada &lt;Admin&gt;"));
        assert_eq!(notification.kind(), NotificationKind::SubscriptionConfirmation);
        assert_eq!(notification.payload()["pricing"]["savings"], "7.50");
    }

    #[test]
    fn order_confirmation_lists_lines() {
        let notification = Notification::OrderConfirmation(OrderConfirmation {
            order_id: Uuid::new_v4(),
            customer_name: "Sam".into(),
            delivery_address: "2 Mill Road".into(),
            items: vec![OrderConfirmationLine {
                name: "Apples".into(),
                quantity: 2,
                unit_price: dec("2.50"),
                line_total: dec("5.00"),
            }],
            total: dec("5.00"),
        });
        let message = notification.render();
        assert!(message.html.contains("<td>Apples</td><td>2</td><td>2.50</td><td>5.00</td>"));
        assert!(message.html.contains("Order total: 5.00"));
    }

    #[test]
    fn every_kind_renders_a_subject() {
        let id = Uuid::new_v4();
        let date = NaiveDate::from_ymd_opt(2030, 2, 1).unwrap();
        let notice = DeliveryNotice {
            subscription_id: id,
            customer_name: "Lee".into(),
            delivery_date: date,
            delivery_address: "3 Orchard Way".into(),
        };
        let all = [
            Notification::DeliveryReminder(notice.clone()),
            Notification::DeliveryComplete(notice),
            Notification::RenewalReminder(RenewalNotice {
                subscription_id: id,
                customer_name: "Lee".into(),
                cadence: Cadence::Monthly,
                last_delivery: date,
                price: dec("19.99"),
            }),
            Notification::PaymentFailed(PaymentFailedNotice {
                subscription_id: id,
                customer_name: "Lee".into(),
                amount: dec("19.99"),
            }),
        ];
        for notification in all {
            let message = notification.render();
            assert!(!message.subject.is_empty());
            assert!(message.html.contains("Hi Lee,"));
        }
    }
}
