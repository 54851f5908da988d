use std::str::FromStr;

use chrono::Utc;
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    entity::{
        CartItems, OrderItems, Orders, Products,
        cart_items::Column as CartItemCol,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_customer},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        cart_service::{find_cart, line_amount, sum_amounts},
        catalog_service::decrement_stock,
    },
    state::AppState,
};

const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// `ORD{unix_seconds}{100..=999}`
pub fn generate_order_number() -> String {
    let suffix = OsRng.next_u32() % 900 + 100;
    format!("ORD{}{}", Utc::now().timestamp(), suffix)
}

async fn unique_order_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number();
        let taken = Orders::find()
            .filter(OrderCol::OrderNumber.eq(candidate.as_str()))
            .count(conn)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
        tracing::debug!(order_number = %candidate, "order number collision, retrying");
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}

/// Turns the caller's cart into an order.
///
/// Every step runs in one transaction: a stock shortfall on any line rolls
/// back the order, its items, earlier decrements and leaves the cart intact.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_customer(user)?;
    let payload = payload.trimmed();
    payload.validate()?;
    let payment_method = PaymentMethod::from_str(&payload.payment_method)
        .map_err(|_| AppError::Validation("unsupported payment method".into()))?;

    let txn = state.orm.begin().await?;

    let cart = find_cart(&txn, user.user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest("Your cart is empty".into()))?;

    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::CreatedAt)
        .all(&txn)
        .await?;

    let lines: Vec<_> = lines
        .into_iter()
        .filter_map(|(line, product)| product.map(|p| (line, p)))
        .collect();
    if lines.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let amounts = lines
        .iter()
        .map(|(line, product)| line_amount(product.price, line.quantity))
        .collect::<AppResult<Vec<_>>>()?;
    let total_amount = sum_amounts(amounts)?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_number: Set(unique_order_number(&txn).await?),
        total_amount: Set(total_amount),
        status: Set(OrderStatus::Pending),
        payment_method: Set(payment_method),
        payment_status: Set(PaymentStatus::Pending),
        shipping_address: Set(payload.shipping_address),
        phone: Set(payload.phone),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            product_name: Set(product.name.clone()),
            quantity: Set(line.quantity),
            price: Set(product.price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));

        decrement_stock(&txn, product.id, line.quantity).await?;
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        user_id = %user.user_id,
        total_amount,
        lines = items.len(),
        "order placed"
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Order placed successfully! Order number: {}", order.order_number),
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

async fn paged_orders(
    state: &AppState,
    owner: Option<Uuid>,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if let Some(owner) = owner {
        condition = condition.add(OrderCol::UserId.eq(owner));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let finder = Orders::find().filter(condition);
    let finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// The caller's own orders, newest first.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    paged_orders(state, Some(user.user_id), query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    paged_orders(state, None, query).await
}

async fn load_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect())
}

/// Admins see any order. Everyone else gets `NotFound` for orders they do
/// not own, so other users' order ids are not disclosed.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let mut finder = Orders::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(OrderCol::UserId.eq(user.user_id));
    }
    let order = finder.one(&state.orm).await?.ok_or(AppError::NotFound)?;
    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Values outside the fixed enums are ignored, not rejected.
pub async fn update_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order: OrderModel = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let status = OrderStatus::from_str(payload.status.trim()).ok();
    let payment_status = payload
        .payment_status
        .as_deref()
        .and_then(|value| PaymentStatus::from_str(value.trim()).ok());

    if status.is_none() {
        tracing::debug!(order_id = %id, value = %payload.status, "ignoring unknown order status");
    }

    let mut active: OrderActive = order.clone().into();
    if let Some(status) = status {
        active.status = Set(status);
    }
    if let Some(payment_status) = payment_status {
        active.payment_status = Set(payment_status);
    }

    let order = if active.is_changed() {
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&state.orm).await?;
        tracing::info!(
            order_id = %updated.id,
            status = ?updated.status,
            payment_status = ?updated.payment_status,
            "order status changed"
        );
        audit::record(
            &state.orm,
            Some(user.user_id),
            "order_status_update",
            "orders",
            serde_json::json!({
                "order_id": updated.id,
                "status": updated.status,
                "payment_status": updated.payment_status,
            }),
        )
        .await;
        updated
    } else {
        order
    };

    let items = load_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "Order status updated",
        OrderWithItems {
            order: order.into(),
            items,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_has_prefix_timestamp_and_three_digit_suffix() {
        let before = Utc::now().timestamp();
        let number = generate_order_number();
        let after = Utc::now().timestamp();

        let digits = number.strip_prefix("ORD").expect("prefix");
        assert!(digits.chars().all(|c| c.is_ascii_digit()));

        let (secs, suffix) = digits.split_at(digits.len() - 3);
        let secs: i64 = secs.parse().expect("timestamp");
        let suffix: u32 = suffix.parse().expect("suffix");
        assert!((before..=after).contains(&secs));
        assert!((100..=999).contains(&suffix));
    }
}
