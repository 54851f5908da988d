use sea_orm::sea_query::{Alias, Expr, Func, SimpleExpr};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::admin::{DashboardStats, UserList},
    entity::{
        Categories, Orders, Products, UserProfiles, Users,
        orders::Column as OrderCol,
        sea_orm_active_enums::{OrderStatus, Role},
        users::Column as UserCol,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, User},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const RECENT_ORDERS: u64 = 10;

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardStats>> {
    ensure_admin(user)?;

    let total_products = Products::find().count(&state.orm).await?;
    let total_orders = Orders::find().count(&state.orm).await?;
    let total_users = Users::find().count(&state.orm).await?;
    let total_categories = Categories::find().count(&state.orm).await?;
    let pending_orders = Orders::find()
        .filter(OrderCol::Status.eq(OrderStatus::Pending))
        .count(&state.orm)
        .await?;

    // SUM over BIGINT is NUMERIC on Postgres; cast back so it decodes as i64.
    let revenue = SimpleExpr::from(Func::cast_as(
        Expr::col(OrderCol::TotalAmount).sum(),
        Alias::new("BIGINT"),
    ));
    let total_revenue = Orders::find()
        .select_only()
        .column_as(revenue, "revenue")
        .filter(OrderCol::Status.is_in([OrderStatus::Shipped, OrderStatus::Delivered]))
        .into_tuple::<Option<i64>>()
        .one(&state.orm)
        .await?
        .flatten()
        .unwrap_or(0);

    let recent_orders = Orders::find()
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardStats {
            total_products,
            total_orders,
            total_users,
            total_categories,
            pending_orders,
            total_revenue,
            recent_orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let total = Users::find().count(&state.orm).await? as i64;

    let items = Users::find()
        .find_also_related(UserProfiles)
        .order_by_desc(UserCol::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(account, profile)| User::from_parts(account, profile.as_ref()))
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Removes a customer account with everything it owns. Admin accounts are protected.
pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let (account, profile) = Users::find_by_id(id)
        .find_also_related(UserProfiles)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if profile.is_some_and(|p| p.role == Role::Admin) {
        return Err(AppError::Forbidden);
    }

    Users::delete_by_id(account.id).exec(&state.orm).await?;

    tracing::info!(user_id = %account.id, email = %account.email, "user deleted");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_delete",
        "users",
        serde_json::json!({ "user_id": account.id }),
    )
    .await;

    Ok(ApiResponse::done("User deleted successfully"))
}
