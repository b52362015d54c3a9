pub mod catalog;
pub mod orders;
pub mod subscriptions;

use std::borrow::Cow;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

use crate::error::{AppError, AppResult};
use crate::models::{Cadence, PackageType};
use crate::pricing::parse_quantity;

/// Largest amount a `NUMERIC(12,2)` column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(
    ((1_000_000_000_000u64 - 1) & 0xFFFF_FFFF) as u32,
    ((1_000_000_000_000u64 - 1) >> 32) as u32,
    0,
    false,
    2,
);

/// Upper bound on a line quantity.
pub const MAX_QUANTITY: i32 = 10_000;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

/// Quantity strings need a positive leading whole number, e.g. `"2 kg"`.
pub fn validate_quantity(value: &str) -> Result<(), ValidationError> {
    match parse_quantity(value) {
        Ok(parsed) if parsed.quantity > MAX_QUANTITY => Err(invalid(
            "quantity_too_large",
            "quantity must be at most 10000",
        )),
        Ok(parsed) if parsed.quantity > 0 => Ok(()),
        Ok(_) => Err(invalid("quantity_not_positive", "quantity must be at least 1")),
        Err(_) => Err(invalid(
            "malformed_quantity",
            "quantity must start with a whole number, e.g. \"2 kg\"",
        )),
    }
}

pub fn validate_cadence(value: &str) -> Result<(), ValidationError> {
    match Cadence::parse(value) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "unknown_cadence",
            "must be one of weekly, biweekly, monthly",
        )),
    }
}

pub fn validate_package_type(value: &str) -> Result<(), ValidationError> {
    match PackageType::parse(value) {
        Some(_) => Ok(()),
        None => Err(invalid("unknown_package_type", "must be one of custom, premade")),
    }
}

/// `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityText {
    Text(String),
    Count(i64),
}

/// Takes `"2 kg"` or a bare `2`; the text rules run in validation.
pub fn quantity_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match QuantityText::deserialize(deserializer)? {
        QuantityText::Text(text) => text,
        QuantityText::Count(count) => count.to_string(),
    })
}

/// Non-negative and small enough for a money column.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid("negative_amount", "amount must not be negative"));
    }
    if *value > MAX_MONEY {
        return Err(invalid(
            "amount_too_large",
            "amount must be at most 9999999999.99",
        ));
    }
    Ok(())
}

/// Takes a field that derive validation has already checked as present.
pub fn require<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::invalid_field(field, format!("{field} is required")))
}

/// Accepts `"22.50"` as well as `22.5`.
pub fn parse_money_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_rules() {
        assert!(validate_quantity("3 kg").is_ok());
        assert_eq!(validate_quantity("kg").unwrap_err().code, "malformed_quantity");
        assert_eq!(validate_quantity("0 kg").unwrap_err().code, "quantity_not_positive");
        assert!(validate_quantity("10000 g").is_ok());
        assert_eq!(validate_quantity("10001 g").unwrap_err().code, "quantity_too_large");
    }

    #[test]
    fn money_must_fit_the_column() {
        assert_eq!(MAX_MONEY.to_string(), "9999999999.99");
        assert!(validate_money(&MAX_MONEY).is_ok());
        assert!(validate_money(&Decimal::ZERO).is_ok());
        assert_eq!(
            validate_money(&Decimal::new(-1, 2)).unwrap_err().code,
            "negative_amount"
        );
        assert_eq!(
            validate_money(&Decimal::new(1_000_000_000_000, 2)).unwrap_err().code,
            "amount_too_large"
        );
        assert_eq!(validate_money(&Decimal::MAX).unwrap_err().code, "amount_too_large");
    }

    #[test]
    fn enum_and_date_text_is_checked() {
        assert!(validate_cadence("biweekly").is_ok());
        assert_eq!(validate_cadence("daily").unwrap_err().code, "unknown_cadence");
        assert!(validate_package_type("premade").is_ok());
        assert_eq!(
            validate_package_type("bundle").unwrap_err().code,
            "unknown_package_type"
        );
        assert_eq!(parse_date(" 2030-01-07 "), NaiveDate::from_ymd_opt(2030, 1, 7));
        assert_eq!(parse_date("2025-13-40"), None);
    }

    #[test]
    fn quantities_accept_text_or_whole_numbers() {
        #[derive(Deserialize)]
        struct Line {
            #[serde(default, deserialize_with = "quantity_text")]
            quantity: String,
        }

        let text: Line = serde_json::from_value(json!({"quantity": "2 kg"})).unwrap();
        assert_eq!(text.quantity, "2 kg");
        let count: Line = serde_json::from_value(json!({"quantity": 3})).unwrap();
        assert_eq!(count.quantity, "3");
        let missing: Line = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.quantity, "");
    }

    #[test]
    fn money_values_parse_from_strings_and_numbers() {
        assert_eq!(parse_money_value(&json!("22.50")), Some(Decimal::new(2250, 2)));
        assert_eq!(parse_money_value(&json!(22.5)), Some(Decimal::new(225, 1)));
        assert_eq!(parse_money_value(&json!(8)), Some(Decimal::from(8)));
        assert_eq!(parse_money_value(&json!("twenty")), None);
        assert_eq!(parse_money_value(&json!(null)), None);
    }
}
