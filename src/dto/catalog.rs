use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{quantity_text, validate_cadence, validate_money, validate_quantity},
    models::{Farm, PremadePackage, Product},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct FarmList {
    pub items: Vec<Farm>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FarmDetail {
    pub farm: Farm,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PackageList {
    pub items: Vec<PremadePackage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PackageLineInput {
    #[validate(
        required(message = "name is required"),
        length(min = 1, message = "name is required")
    )]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "quantity_text")]
    #[validate(custom(function = "validate_quantity"))]
    #[schema(example = "2 kg")]
    pub quantity: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreatePackageRequest {
    #[validate(required(message = "farm_id is required"))]
    pub farm_id: Option<Uuid>,
    #[validate(
        required(message = "name is required"),
        length(min = 1, max = 120, message = "name must be 1 to 120 characters")
    )]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(
        required(message = "retail_value is required"),
        custom(function = "validate_money")
    )]
    #[schema(value_type = Option<String>, example = "30.00")]
    pub retail_value: Option<Decimal>,
    #[validate(
        required(message = "cadence is required"),
        custom(function = "validate_cadence")
    )]
    #[schema(example = "weekly")]
    pub cadence: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "at least one item is required"), nested)]
    pub items: Vec<PackageLineInput>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::flatten_validation_errors;

    #[test]
    fn package_requests_report_every_bad_field() {
        let request: CreatePackageRequest = serde_json::from_value(json!({
            "farm_id": Uuid::nil(),
            "name": "Veg Box",
            "retail_value": "10000000000.00",
            "cadence": "daily",
            "items": [{"name": "Kale", "quantity": 2}, {"name": "Eggs", "quantity": "dozen"}]
        }))
        .unwrap();
        assert_eq!(request.items[0].quantity, "2");

        let fields = flatten_validation_errors(&request.validate().unwrap_err());
        assert_eq!(fields["cadence"], vec!["must be one of weekly, biweekly, monthly"]);
        assert_eq!(fields["retail_value"], vec!["amount must be at most 9999999999.99"]);
        assert!(fields.contains_key("items[1].quantity"));
        assert!(!fields.contains_key("items[0].quantity"));
    }
}
