use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone, PartialEq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
    /// Next page number, absent on the last page or past the end.
    pub next: Option<i64>,
    /// Previous page number, absent on the first page or past the end.
    pub previous: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let last_page = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        let in_range = page <= last_page;
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
            next: (in_range && page < last_page).then(|| page + 1),
            previous: (in_range && page > 1).then(|| page - 1),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
            next: None,
            previous: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
