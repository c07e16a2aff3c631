use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    dto::reports::{PopularProductList, PopularProductsQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::report_service,
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/popular",
    params(
        ("date_from" = Option<String>, Query, description = "First day counted, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Last day counted (inclusive), YYYY-MM-DD"),
        ("n" = Option<u64>, Query, description = "Return only the first n products"),
    ),
    responses(
        (status = 200, description = "Products ranked by order item count", body = ApiResponse<PopularProductList>),
        (status = 400, description = "Invalid date window"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn popular_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<PopularProductsQuery>,
) -> AppResult<Json<ApiResponse<PopularProductList>>> {
    let resp = report_service::popular_products(&state, &user, query).await?;
    Ok(Json(resp))
}
