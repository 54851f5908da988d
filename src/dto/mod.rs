pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod messages;
pub mod orders;
pub mod pages;
pub mod products;
pub mod profile;
pub mod wishlist;
