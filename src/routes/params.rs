use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

/// Product listings are served in pages of this many items.
pub const PRODUCT_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
}

impl Pagination {
    /// Returns `(page, per_page, offset)`. The offset saturates for absurd pages,
    /// which then simply lie past the end of any result.
    pub fn normalize(&self, per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrder {
    Name,
    Category,
    Price,
}

/// Filters for `GET /products`. Every filter is optional and they combine with AND.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    /// Case-insensitive exact category name.
    pub category: Option<String>,
    /// Case-insensitive substring of the description.
    pub desc: Option<String>,
    /// Exact price.
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<Decimal>,
    /// Ascending sort key, applied after filtering.
    pub order: Option<ProductOrder>,
    pub page: Option<i64>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination { page: self.page }
    }
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
pub fn like_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(Pagination::default().normalize(10), (1, 10, 0));
        assert_eq!(Pagination { page: Some(0) }.normalize(10), (1, 10, 0));
        assert_eq!(Pagination { page: Some(3) }.normalize(10), (3, 10, 20));
    }

    #[test]
    fn huge_page_saturates_the_offset() {
        let (page, per_page, offset) =
            Pagination { page: Some(i64::MAX) }.normalize(PRODUCT_PAGE_SIZE);
        assert_eq!(page, i64::MAX);
        assert_eq!(per_page, PRODUCT_PAGE_SIZE);
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("laptop"), "laptop");
    }
}
