use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::wishlist::{AddWishlistRequest, Wishlist},
    entity::{
        Products, Wishlists,
        wishlists::{ActiveModel as WishlistActive, Column as WishlistCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::WishlistItem,
    response::{ApiResponse, Meta},
    services::catalog_service::find_product,
    state::AppState,
};

pub async fn list_wishlist(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Wishlist>> {
    let items = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user.user_id))
        .find_also_related(Products)
        .order_by_desc(WishlistCol::AddedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| WishlistItem::from_parts(item, p)))
        .collect();

    Ok(ApiResponse::success(
        "Wishlist",
        Wishlist { items },
        Some(Meta::empty()),
    ))
}

/// Adding a product twice keeps the first entry.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<WishlistItem>> {
    let product = find_product(&state.orm, payload.product_id).await?;

    let existing = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user.user_id))
        .filter(WishlistCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;

    if let Some(item) = existing {
        return Ok(ApiResponse::success(
            format!("{} is already in your wishlist", product.name),
            WishlistItem::from_parts(item, product),
            Some(Meta::empty()),
        ));
    }

    let item = WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product.id),
        added_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "wishlist_add",
        "wishlists",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("{} added to wishlist", product.name),
        WishlistItem::from_parts(item, product),
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Wishlists::delete_many()
        .filter(WishlistCol::Id.eq(id))
        .filter(WishlistCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::done("Removed from wishlist"))
}
