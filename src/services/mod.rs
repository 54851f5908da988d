pub mod admin_service;
pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod coupon_service;
pub mod message_service;
pub mod order_service;
pub mod page_service;
pub mod profile_service;
pub mod wishlist_service;
