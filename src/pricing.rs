//! Pricing calculator for orders and subscription packages.
//!
//! All arithmetic is done in `Decimal` and every emitted amount is rounded
//! half-away-from-zero to two places with a fixed scale of two, so identical
//! inputs always yield identical output.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::PackageType;

const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error("malformed quantity '{0}': expected a leading whole number such as \"3 kg\"")]
    MalformedQuantity(String),

    #[error("amount out of range")]
    AmountOverflow,
}

/// Rounds to cents and pins the scale, so `8` renders as `8.00`.
pub fn money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `price * quantity`, rounded to cents.
pub fn line_total(price: Decimal, quantity: i32) -> Result<Decimal, PricingError> {
    price
        .checked_mul(Decimal::from(quantity))
        .map(money)
        .ok_or(PricingError::AmountOverflow)
}

fn checked_sum<I>(values: I) -> Result<Decimal, PricingError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .map(money)
        .ok_or(PricingError::AmountOverflow)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ParsedQuantity {
    pub quantity: i32,
    pub unit: String,
}

/// Splits `"3 kg"` into `3` and `"kg"`. The leading digit run is mandatory.
pub fn parse_quantity(raw: &str) -> Result<ParsedQuantity, PricingError> {
    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return Err(PricingError::MalformedQuantity(raw.to_string()));
    }

    let quantity = trimmed[..digits_end]
        .parse::<i32>()
        .map_err(|_| PricingError::MalformedQuantity(raw.to_string()))?;

    Ok(ParsedQuantity {
        quantity,
        unit: trimmed[digits_end..].trim().to_string(),
    })
}

/// A custom-package line: live catalog price vs the price frozen on the subscription.
#[derive(Debug, Clone)]
pub struct CustomLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub catalog_price: Decimal,
    pub subscription_price: Decimal,
}

/// A premade-package line snapshot. Its price does not feed the aggregate.
#[derive(Debug, Clone)]
pub struct PremadeLine {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PricedItem {
    pub product_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub unit: String,
    pub original_unit_price: Decimal,
    pub discounted_unit_price: Decimal,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub savings: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PricingSummary {
    pub package_type: PackageType,
    pub items: Vec<PricedItem>,
    pub original_total: Decimal,
    pub discounted_total: Decimal,
    pub savings: Decimal,
}

pub enum PricingInput<'a> {
    Custom(&'a [CustomLine]),
    Premade {
        retail_value: Decimal,
        subscription_price: Decimal,
        lines: &'a [PremadeLine],
    },
}

pub fn price_package(input: PricingInput<'_>) -> Result<PricingSummary, PricingError> {
    match input {
        PricingInput::Custom(lines) => price_custom(lines),
        PricingInput::Premade {
            retail_value,
            subscription_price,
            lines,
        } => price_premade(retail_value, subscription_price, lines),
    }
}

pub fn price_custom(lines: &[CustomLine]) -> Result<PricingSummary, PricingError> {
    let items = lines
        .iter()
        .map(|line| {
            let original_price = line_total(line.catalog_price, line.quantity)?;
            let discounted_price = line_total(line.subscription_price, line.quantity)?;
            let savings = original_price
                .checked_sub(discounted_price)
                .ok_or(PricingError::AmountOverflow)?;
            Ok(PricedItem {
                product_id: Some(line.product_id),
                name: line.name.clone(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                original_unit_price: money(line.catalog_price),
                discounted_unit_price: money(line.subscription_price),
                original_price,
                discounted_price,
                savings: money(savings),
            })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;

    let original_total = checked_sum(items.iter().map(|i| i.original_price))?;
    let discounted_total = checked_sum(items.iter().map(|i| i.discounted_price))?;

    summarize(PackageType::Custom, items, original_total, discounted_total)
}

/// The retail value is an author-supplied figure; it is not reconciled with
/// the line items.
pub fn price_premade(
    retail_value: Decimal,
    subscription_price: Decimal,
    lines: &[PremadeLine],
) -> Result<PricingSummary, PricingError> {
    let items = lines
        .iter()
        .map(|line| {
            let unit_price = money(line.price);
            let line_total = line_total(line.price, line.quantity)?;
            Ok(PricedItem {
                product_id: line.product_id,
                name: line.name.clone(),
                quantity: line.quantity,
                unit: line.unit.clone(),
                original_unit_price: unit_price,
                discounted_unit_price: unit_price,
                original_price: line_total,
                discounted_price: line_total,
                savings: money(Decimal::ZERO),
            })
        })
        .collect::<Result<Vec<_>, PricingError>>()?;

    summarize(
        PackageType::Premade,
        items,
        money(retail_value),
        money(subscription_price),
    )
}

fn summarize(
    package_type: PackageType,
    items: Vec<PricedItem>,
    original_total: Decimal,
    discounted_total: Decimal,
) -> Result<PricingSummary, PricingError> {
    let savings = original_total
        .checked_sub(discounted_total)
        .map(money)
        .ok_or(PricingError::AmountOverflow)?;
    if savings.is_sign_negative() && !savings.is_zero() {
        tracing::warn!(
            package_type = %package_type,
            original_total = %original_total,
            discounted_total = %discounted_total,
            savings = %savings,
            "negative savings: discounted total exceeds original total"
        );
    }

    Ok(PricingSummary {
        package_type,
        items,
        original_total,
        discounted_total,
        savings,
    })
}

/// One-off order total from frozen unit prices.
pub fn order_total<I>(lines: I) -> Result<Decimal, PricingError>
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let totals = lines
        .into_iter()
        .map(|(price, quantity)| line_total(price, quantity))
        .collect::<Result<Vec<_>, PricingError>>()?;
    checked_sum(totals)
}
