use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Minor units, at most 99,999,999.99
    #[validate(range(min = 0, max = 9_999_999_999i64))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub stock: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0, max = 9_999_999_999i64))]
    pub price: Option<i64>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Category,
    pub related: Vec<Product>,
    /// Created within the last 7 days
    pub is_new: bool,
    pub in_wishlist: bool,
    pub wishlist_item_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreStats {
    pub total_products: u64,
    pub total_orders: u64,
    pub total_users: u64,
    pub total_categories: u64,
}

/// Landing page payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct HomeView {
    /// Newest in-stock products, at most 8
    pub featured_products: Vec<Product>,
    /// At most 6
    pub categories: Vec<Category>,
    pub stats: StoreStats,
}
