use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "shipping address is required"))]
    pub shipping_address: String,
    #[validate(length(min = 1, max = 20, message = "phone must be 1 to 20 characters"))]
    pub phone: String,
    /// Only `cod` is accepted
    pub payment_method: String,
}

impl CheckoutRequest {
    /// Surrounding whitespace does not count towards the required fields.
    pub fn trimmed(self) -> Self {
        Self {
            shipping_address: self.shipping_address.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            payment_method: self.payment_method.trim().to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
    pub payment_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
