use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use validator::Validate;

use crate::{
    dto::profile::{CustomerDashboard, UpdateProfileRequest},
    entity::{
        Orders, UserProfiles, Users, Wishlists,
        orders::Column as OrderCol,
        user_profiles::{ActiveModel as ProfileActive, Column as ProfileCol},
        users::ActiveModel as UserActive,
        wishlists::Column as WishlistCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_customer},
    models::{Order, Profile, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

const DASHBOARD_ORDERS: u64 = 5;

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let account = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let profile = UserProfiles::find()
        .filter(ProfileCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "Profile",
        Profile {
            phone: profile.phone.clone(),
            address: profile.address.clone(),
            user: User::from_parts(account, Some(&profile)),
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    payload.validate()?;
    let txn = state.orm.begin().await?;

    let account = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let profile = UserProfiles::find()
        .filter(ProfileCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut account_active: UserActive = account.clone().into();
    if let Some(first_name) = payload.first_name {
        account_active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        account_active.last_name = Set(last_name);
    }
    let account = if account_active.is_changed() {
        account_active.update(&txn).await?
    } else {
        account
    };

    let mut profile_active: ProfileActive = profile.clone().into();
    if let Some(phone) = payload.phone {
        profile_active.phone = Set(phone);
    }
    if let Some(address) = payload.address {
        profile_active.address = Set(address);
    }
    let profile = if profile_active.is_changed() {
        profile_active.update(&txn).await?
    } else {
        profile
    };

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Profile updated successfully!",
        Profile {
            phone: profile.phone.clone(),
            address: profile.address.clone(),
            user: User::from_parts(account, Some(&profile)),
        },
        Some(Meta::empty()),
    ))
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerDashboard>> {
    ensure_customer(user)?;

    let recent_orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(DASHBOARD_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();
    let wishlist_count = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Dashboard",
        CustomerDashboard {
            recent_orders,
            wishlist_count,
        },
        Some(Meta::empty()),
    ))
}
