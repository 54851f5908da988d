use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{
        AddToCartOutcome, AddToCartRequest, CartLine, CartLineUpdate, CartView,
        UpdateCartItemRequest,
    },
    entity::{
        CartItems, Carts, Products,
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Model as CartModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    models::Product,
    response::{ApiResponse, Meta},
    services::catalog_service::find_product,
    state::AppState,
};

pub(crate) async fn find_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?)
}

async fn find_or_create_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(conn, user_id).await? {
        return Ok(cart);
    }

    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    tracing::debug!(%user_id, cart_id = %cart.id, "cart created");
    Ok(cart)
}

/// Looks up a line that belongs to the caller's cart.
async fn find_own_line<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    item_id: Uuid,
) -> AppResult<CartItemModel> {
    let cart = find_cart(conn, user_id).await?.ok_or(AppError::NotFound)?;
    CartItems::find_by_id(item_id)
        .filter(CartItemCol::CartId.eq(cart.id))
        .one(conn)
        .await?
        .ok_or(AppError::NotFound)
}

/// Stock checks here are advisory; checkout re-checks atomically.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<AddToCartOutcome>> {
    ensure_customer(user)?;
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = find_product(&txn, payload.product_id).await?;
    if product.stock <= 0 {
        return Err(AppError::StockLimitExceeded { available: 0 });
    }

    let cart = find_or_create_cart(&txn, user.user_id).await?;
    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    let (item, capped) = match existing {
        Some(line) => {
            let wanted = line
                .quantity
                .checked_add(payload.quantity)
                .filter(|wanted| *wanted <= product.stock)
                .ok_or(AppError::StockLimitExceeded {
                    available: product.stock,
                })?;
            let mut active: CartItemActive = line.into();
            active.quantity = Set(wanted);
            (active.update(&txn).await?, false)
        }
        None => {
            let quantity = payload.quantity.min(product.stock);
            let line = CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
            (line, quantity < payload.quantity)
        }
    };

    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": item.quantity }),
    )
    .await;

    let message = if capped {
        format!("Stock limit reached. Added {} only.", item.quantity)
    } else {
        "Product added to cart!".to_string()
    };

    Ok(ApiResponse::success(
        message,
        AddToCartOutcome {
            item: item.into(),
            capped,
        },
        Some(Meta::empty()),
    ))
}

/// A quantity of zero or less removes the line.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartLineUpdate>> {
    ensure_customer(user)?;
    let txn = state.orm.begin().await?;
    let line = find_own_line(&txn, user.user_id, item_id).await?;

    if payload.quantity <= 0 {
        CartItems::delete_by_id(line.id).exec(&txn).await?;
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Item removed from cart",
            CartLineUpdate {
                item: None,
                removed: true,
            },
            Some(Meta::empty()),
        ));
    }

    let stock = find_product(&txn, line.product_id).await?.stock;
    if payload.quantity > stock {
        return Err(AppError::StockLimitExceeded { available: stock });
    }

    let mut active: CartItemActive = line.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Cart updated",
        CartLineUpdate {
            item: Some(item.into()),
            removed: false,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_customer(user)?;
    let line = find_own_line(&state.orm, user.user_id, item_id).await?;
    CartItems::delete_by_id(line.id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": line.product_id }),
    )
    .await;

    Ok(ApiResponse::done("Item removed from cart"))
}

fn amount_out_of_range() -> AppError {
    AppError::Validation("amount is out of range".into())
}

/// `price * quantity` in minor units, refusing to overflow.
pub(crate) fn line_amount(price: i64, quantity: i32) -> AppResult<i64> {
    price
        .checked_mul(i64::from(quantity))
        .ok_or_else(amount_out_of_range)
}

pub(crate) fn sum_amounts(amounts: impl IntoIterator<Item = i64>) -> AppResult<i64> {
    amounts
        .into_iter()
        .try_fold(0i64, |acc, amount| acc.checked_add(amount))
        .ok_or_else(amount_out_of_range)
}

/// Current-price total of the user's cart; zero when there is none.
pub async fn cart_total<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<i64> {
    let lines = load_lines(conn, user_id).await?;
    sum_amounts(lines.iter().map(|line| line.line_total))
}

async fn load_lines<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Vec<CartLine>> {
    let Some(cart) = find_cart(conn, user_id).await? else {
        return Ok(Vec::new());
    };

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?;

    rows.into_iter()
        .filter_map(|(line, product)| product.map(|product| (line, product)))
        .map(|(line, product)| {
            Ok(CartLine {
                id: line.id,
                line_total: line_amount(product.price, line.quantity)?,
                product: Product::from(product),
                quantity: line.quantity,
            })
        })
        .collect()
}

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    ensure_customer(user)?;
    let items = load_lines(&state.orm, user.user_id).await?;
    let total = sum_amounts(items.iter().map(|line| line.line_total))?;

    Ok(ApiResponse::success(
        "Cart",
        CartView { items, total },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_refuse_to_overflow() {
        assert_eq!(line_amount(1_999, 3).unwrap(), 5_997);
        assert!(matches!(
            line_amount(i64::MAX / 2, 3),
            Err(AppError::Validation(_))
        ));
        assert_eq!(sum_amounts([100, 250]).unwrap(), 350);
        assert!(sum_amounts([i64::MAX, 1]).is_err());
    }
}
