use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::coupons::{CouponCheck, CouponList, CreateCouponRequest},
    entity::{
        Coupons,
        coupons::{ActiveModel as CouponActive, Column as CouponCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Coupon,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;
    payload.validate()?;
    if payload.valid_from > payload.valid_to {
        return Err(AppError::Validation(
            "valid_from must not be after valid_to".into(),
        ));
    }

    let code = normalize_code(&payload.code);
    let exists = Coupons::find()
        .filter(CouponCol::Code.eq(code.as_str()))
        .one(&state.orm)
        .await?
        .is_some();
    if exists {
        return Err(AppError::BadRequest(format!("coupon {code} already exists")));
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_basis_points: Set(payload.discount_basis_points),
        valid_from: Set(payload.valid_from.into()),
        valid_to: Set(payload.valid_to.into()),
        active: Set(payload.active),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "coupon_create",
        "coupons",
        serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon created",
        coupon.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_coupons(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(user)?;
    let items = Coupons::find()
        .order_by_desc(CouponCol::ValidTo)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::empty()),
    ))
}

/// Reports whether `code` can be redeemed right now.
pub async fn check_coupon(state: &AppState, code: &str) -> AppResult<ApiResponse<CouponCheck>> {
    let coupon = Coupons::find()
        .filter(CouponCol::Code.eq(normalize_code(code)))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let valid = coupon.is_valid(Utc::now());
    Ok(ApiResponse::success(
        if valid { "Coupon is valid" } else { "Coupon is not valid" },
        CouponCheck {
            code: coupon.code,
            discount_basis_points: coupon.discount_basis_points,
            valid,
        },
        None,
    ))
}
