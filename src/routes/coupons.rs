use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::coupons::CouponCheck, error::AppResult, response::ApiResponse,
    services::coupon_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{code}", get(check_coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons/{code}",
    params(
        ("code" = String, Path, description = "Coupon code")
    ),
    responses(
        (status = 200, description = "Coupon validity right now", body = ApiResponse<CouponCheck>),
        (status = 404, description = "Unknown coupon")
    ),
    tag = "Coupons"
)]
pub async fn check_coupon(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<CouponCheck>>> {
    let resp = coupon_service::check_coupon(&state, &code).await?;
    Ok(Json(resp))
}
