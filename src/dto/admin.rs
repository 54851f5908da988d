use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_users: u64,
    pub total_categories: u64,
    pub pending_orders: u64,
    /// Sum of shipped and delivered order totals, minor units
    pub total_revenue: i64,
    pub recent_orders: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}
