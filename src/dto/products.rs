use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, models::Product};

/// Largest price a product can carry (`NUMERIC(6, 2)`).
pub const MAX_PRICE: Decimal = Decimal::from_parts(999_999, 0, 0, false, 2);

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub category_id: Uuid,
}

impl ProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Body of `PATCH /products/{id}`; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
}

impl PatchProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

fn validate_name(name: &str) -> Result<(), AppError> {
    let length = name.trim().chars().count();
    if length == 0 || length > 100 {
        return Err(AppError::Validation(
            "name must be between 1 and 100 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::Validation("price must not be negative".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::Validation(format!(
            "price must not exceed {MAX_PRICE}"
        )));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "price must have at most 2 decimal places".into(),
        ));
    }
    Ok(())
}
