use axum::{Router, routing::get};

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod messages;
pub mod orders;
pub mod pages;
pub mod params;
pub mod products;
pub mod profile;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/home", get(products::home))
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        .nest("/products", products::router())
        .nest("/categories", products::category_router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/wishlist", wishlist::router())
        .nest("/messages", messages::router())
        .nest("/coupons", coupons::router())
        .nest("/pages", pages::router())
        .nest("/admin", admin::router())
}
