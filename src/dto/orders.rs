use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_QUANTITY: i32 = i16::MAX as i32;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ShippingAddressInput {
    pub full_name: String,
    pub street: String,
    pub zip_code: String,
    pub city: String,
    /// ISO 3166-1 alpha-2 code, case-insensitive.
    #[serde(alias = "country")]
    pub country_code: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineItemInput {
    pub product_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub shipping_address: ShippingAddressInput,
    pub items: Vec<LineItemInput>,
}

impl PlaceOrderRequest {
    /// Check field limits and canonicalize the country code.
    pub fn validate(mut self) -> Result<Self, AppError> {
        if self.items.is_empty() {
            return Err(AppError::Validation("order must contain at least one item".into()));
        }
        if let Some(item) = self
            .items
            .iter()
            .find(|item| !(1..=MAX_QUANTITY).contains(&item.quantity))
        {
            return Err(AppError::Validation(format!(
                "quantity for product {} must be between 1 and {MAX_QUANTITY}",
                item.product_id
            )));
        }

        let address = &mut self.shipping_address;
        check_length("full_name", &address.full_name, 100)?;
        check_length("street", &address.street, 100)?;
        check_length("zip_code", &address.zip_code, 10)?;
        check_length("city", &address.city, 100)?;

        let country_code = address.country_code.trim().to_ascii_uppercase();
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(
                "country_code must be a two-letter ISO code".into(),
            ));
        }
        address.country_code = country_code;

        Ok(self)
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    let length = value.chars().count();
    if value.trim().is_empty() || length > max {
        return Err(AppError::Validation(format!(
            "{field} must be between 1 and {max} characters"
        )));
    }
    Ok(())
}

/// The only data echoed back after a successful placement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPlaced {
    #[schema(value_type = String, example = "25.00")]
    pub total_price: Decimal,
    pub payment_deadline: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(items: Vec<LineItemInput>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            shipping_address: ShippingAddressInput {
                full_name: "Jan Kowalski".into(),
                street: "Marszalkowska 1".into(),
                zip_code: "00-001".into(),
                city: "Warszawa".into(),
                country_code: "pl".into(),
            },
            items,
        }
    }

    fn item(quantity: i32) -> LineItemInput {
        LineItemInput {
            product_id: Uuid::new_v4(),
            quantity,
        }
    }

    #[test]
    fn country_code_is_uppercased() {
        let validated = request(vec![item(1)]).validate().unwrap();
        assert_eq!(validated.shipping_address.country_code, "PL");
    }

    #[test]
    fn empty_order_is_rejected() {
        assert!(matches!(
            request(vec![]).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(request(vec![item(1), item(0)]).validate().is_err());
        assert!(request(vec![item(MAX_QUANTITY + 1)]).validate().is_err());
    }

    #[test]
    fn quantity_defaults_to_one() {
        let json = serde_json::json!({ "product_id": Uuid::new_v4() });
        let parsed: LineItemInput = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.quantity, 1);
    }

    #[test]
    fn long_zip_code_is_rejected() {
        let mut order = request(vec![item(1)]);
        order.shipping_address.zip_code = "12345678901".into();
        assert!(order.validate().is_err());
    }
}
