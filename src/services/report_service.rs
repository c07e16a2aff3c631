use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    dto::reports::{PopularProductList, PopularProductsQuery, ReportWindow},
    error::AppResult,
    middleware::auth::{AuthUser, ensure_seller},
    models::{Category, PopularProduct, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Debug, FromRow)]
struct PopularityRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    created_at: DateTime<Utc>,
    category_id: Uuid,
    category_name: String,
    order_item_count: i64,
}

impl From<PopularityRow> for PopularProduct {
    fn from(row: PopularityRow) -> Self {
        Self {
            product: Product {
                id: row.id,
                name: row.name,
                description: row.description,
                price: row.price,
                category: Category {
                    id: row.category_id,
                    name: row.category_name,
                },
                created_at: row.created_at,
            },
            order_item_count: row.order_item_count,
        }
    }
}

/// Build the ranking query. Every product appears, with a zero count when no
/// order inside the window contains it. The window bounds go into the join so
/// the outer join keeps those products.
fn popularity_query(window: &ReportWindow) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        r#"
        SELECT p.id, p.name, p.description, p.price, p.created_at,
               c.id AS category_id, c.name AS category_name,
               COUNT(o.id) AS order_item_count
        FROM products p
        JOIN categories c ON c.id = p.category_id
        LEFT JOIN (order_items oi JOIN orders o ON o.id = oi.order_id"#,
    );
    if let Some(from) = window.from {
        qb.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(until) = window.until {
        qb.push(" AND o.created_at < ").push_bind(until);
    }
    qb.push(
        r#") ON oi.product_id = p.id
        GROUP BY p.id, c.id
        ORDER BY order_item_count DESC, p.id ASC"#,
    );
    if let Some(limit) = window.limit {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    qb
}

pub async fn popular_products(
    state: &AppState,
    user: &AuthUser,
    query: PopularProductsQuery,
) -> AppResult<ApiResponse<PopularProductList>> {
    ensure_seller(user)?;
    let window = query.window()?;

    let mut qb = popularity_query(&window);
    let rows = qb
        .build_query_as::<PopularityRow>()
        .fetch_all(&state.pool)
        .await?;

    let items: Vec<PopularProduct> = rows.into_iter().map(PopularProduct::from).collect();
    tracing::debug!(
        from = ?window.from,
        until = ?window.until,
        returned = items.len(),
        "popularity report"
    );

    Ok(ApiResponse::success(
        "Popular products",
        PopularProductList { items },
        Some(Meta::empty()),
    ))
}
