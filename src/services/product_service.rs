use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::products::{PatchProductRequest, ProductList, ProductRequest},
    entity::{
        categories::{self, Column as CategoryCol, Entity as Categories},
        products::{self, ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{PRODUCT_PAGE_SIZE, ProductOrder, ProductQuery, like_escape},
    state::AppState,
};

fn filter_condition(query: &ProductQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(name) = query.name.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", like_escape(name));
        condition = condition.add(Expr::col((Products, Column::Name)).ilike(pattern));
    }

    if let Some(desc) = query.desc.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", like_escape(desc));
        condition = condition.add(Expr::col((Products, Column::Description)).ilike(pattern));
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col((Categories, CategoryCol::Name)).ilike(like_escape(category)));
    }

    if let Some(price) = query.price {
        condition = condition.add(Column::Price.eq(price));
    }

    condition
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize(PRODUCT_PAGE_SIZE);
    let condition = filter_condition(&query);

    let total = Products::find()
        .join(JoinType::InnerJoin, products::Relation::Categories.def())
        .filter(condition.clone())
        .count(&state.orm)
        .await? as i64;

    let mut finder = Products::find()
        .find_also_related(Categories)
        .filter(condition);
    finder = match query.order {
        Some(ProductOrder::Name) => finder.order_by_asc(Column::Name),
        Some(ProductOrder::Category) => finder.order_by_asc(CategoryCol::Name),
        Some(ProductOrder::Price) => finder.order_by_asc(Column::Price),
        None => finder,
    };
    // Stable tail so pages never overlap.
    finder = finder
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id);

    let items = if offset >= total {
        Vec::new()
    } else {
        finder
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|(product, category)| with_category(product, category))
            .collect::<AppResult<Vec<_>>>()?
    };

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = load_product(state, id).await?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    payload.validate()?;
    let category = existing_category(&state.orm, payload.category_id).await?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        category_id: Set(category.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from_parts(product, category),
        Some(Meta::empty()),
    ))
}

/// `PUT`: every writable field is replaced, an absent description clears it.
pub async fn replace_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    payload.validate()?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = existing_category(&state.orm, payload.category_id).await?;

    let mut active: ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.category_id = Set(category.id);
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id, "mode": "replace" }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from_parts(product, category),
        Some(Meta::empty()),
    ))
}

/// `PATCH`: only the fields present in the body change.
pub async fn patch_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PatchProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_seller(user)?;
    payload.validate()?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let category_id = payload.category_id.unwrap_or(existing.category_id);
    let category = existing_category(&state.orm, category_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if payload.category_id.is_some() {
        active.category_id = Set(category.id);
    }
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id, "mode": "patch" }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from_parts(product, category),
        Some(Meta::empty()),
    ))
}

/// Removes the product together with every order item that references it.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_seller(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn load_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    let (product, category) = Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    with_category(product, category)
}

async fn existing_category<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Unknown category_id {id}")))
}

fn with_category(
    product: products::Model,
    category: Option<categories::Model>,
) -> AppResult<Product> {
    let category = category.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("product {} has no category", product.id))
    })?;
    Ok(Product::from_parts(product, category))
}
