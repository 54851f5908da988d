pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod contact_messages;
pub mod coupons;
pub mod message_replies;
pub mod order_items;
pub mod orders;
pub mod pages;
pub mod products;
pub mod sea_orm_active_enums;
pub mod user_profiles;
pub mod users;
pub mod wishlists;

pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use contact_messages::Entity as ContactMessages;
pub use coupons::Entity as Coupons;
pub use message_replies::Entity as MessageReplies;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pages::Entity as Pages;
pub use products::Entity as Products;
pub use user_profiles::Entity as UserProfiles;
pub use users::Entity as Users;
pub use wishlists::Entity as Wishlists;
