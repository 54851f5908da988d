use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 1, max = 20))]
    pub code: String,
    #[validate(range(min = 1, max = 10000))]
    pub discount_basis_points: i32,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponCheck {
    pub code: String,
    pub discount_basis_points: i32,
    pub valid: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}
