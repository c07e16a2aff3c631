use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::orders::{OrderPlaced, PlaceOrderRequest},
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::ActiveModel as OrderActive,
        products::{Column as ProductCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    notifications::{EmailMessage, EmailTemplate, OrderEmailContext},
    order_policy::{OrderLine, OrderPolicy, compute_total, order_reference},
    repository,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Place an order for the calling customer.
///
/// Address, order and items are written in one transaction; any error before
/// the commit drops the transaction and nothing is persisted. The two order
/// emails are scheduled after the commit and a scheduling failure only logs.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderPlaced>> {
    ensure_customer(user)?;
    let payload = payload.validate()?;

    let txn = state.orm.begin().await?;

    let customer = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let mut product_ids: Vec<Uuid> = payload.items.iter().map(|item| item.product_id).collect();
    product_ids.sort();
    product_ids.dedup();

    let prices: HashMap<Uuid, Decimal> = repository::lock_products(&txn, &product_ids)
        .await?
        .into_iter()
        .map(|product| (product.id, product.price))
        .collect();

    let unknown: Vec<String> = product_ids
        .iter()
        .filter(|id| !prices.contains_key(id))
        .map(Uuid::to_string)
        .collect();
    if !unknown.is_empty() {
        return Err(AppError::Validation(format!(
            "Unknown product id(s): {}",
            unknown.join(", ")
        )));
    }

    let address =
        repository::find_or_create_address(&txn, customer.id, &payload.shipping_address).await?;

    let created_at = OrderPolicy::creation_time(Utc::now());
    let payment_deadline = state.orders.payment_deadline(created_at);

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(customer.id),
        shipping_address_id: Set(address.id),
        created_at: Set(created_at.into()),
        payment_deadline: Set(payment_deadline.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let unit_price = prices
            .get(&line.product_id)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("Unknown product id {}", line.product_id)))?;
        items.push(OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(unit_price),
        });
    }
    repository::bulk_insert_items(&txn, items).await?;

    txn.commit().await?;

    let lines = order_lines(&state.orm, order.id).await?;
    let total_price = compute_total(&lines);

    tracing::info!(
        order_id = %order.id,
        user_id = %customer.id,
        items = lines.len(),
        total = %total_price,
        "order placed"
    );

    audit::record(
        &state.pool,
        Some(customer.id),
        AuditAction::OrderPlace,
        serde_json::json!({ "order_id": order.id, "total_price": total_price }),
    )
    .await;

    let context = OrderEmailContext::new(
        order_reference(order.id, created_at),
        &lines,
        total_price,
        payment_deadline,
    );
    schedule_order_emails(state, order.id, customer.email, context).await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderPlaced {
            total_price,
            payment_deadline,
        },
        Some(Meta::empty()),
    ))
}

async fn schedule_order_emails(
    state: &AppState,
    order_id: Uuid,
    recipient: String,
    context: OrderEmailContext,
) {
    let payment_deadline = context.payment_deadline;

    let confirmation = EmailMessage {
        template: EmailTemplate::OrderConfirmation,
        recipients: vec![recipient.clone()],
        context: context.clone(),
    };
    if let Err(err) = state.scheduler.schedule_now(confirmation).await {
        tracing::warn!(order_id = %order_id, error = %err, "order confirmation not scheduled");
    }

    let reminder = EmailMessage {
        template: EmailTemplate::PaymentReminder,
        recipients: vec![recipient],
        context,
    };
    let remind_at = state.orders.reminder_time(payment_deadline);
    if let Err(err) = state.scheduler.schedule_at(reminder, remind_at).await {
        tracing::warn!(order_id = %order_id, error = %err, "payment reminder not scheduled");
    }
}

/// The persisted lines of an order with the unit prices recorded at placement.
pub async fn order_lines<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderLine>> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .find_also_related(Products)
        .order_by_asc(ProductCol::Name)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;

    rows.into_iter()
        .map(|(item, product)| {
            let product = product.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("order item {} has no product", item.id))
            })?;
            Ok(OrderLine {
                product_id: product.id,
                name: product.name,
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
        })
        .collect()
}

/// Total price of a stored order, always derived from its lines.
pub async fn order_total<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Decimal> {
    let lines = order_lines(conn, order_id).await?;
    Ok(compute_total(&lines))
}
