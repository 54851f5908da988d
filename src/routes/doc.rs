use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{DashboardStats, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{
            AddToCartOutcome, AddToCartRequest, CartLine, CartLineUpdate, CartView,
            UpdateCartItemRequest,
        },
        coupons::{CouponCheck, CouponList, CreateCouponRequest},
        messages::{ChatReplies, ChatReply, ContactRequest, MessageList, MessageThread, ReplyRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        pages::{CreatePageRequest, PageList, UpdatePageRequest},
        products::{
            CategoryList, CreateCategoryRequest, CreateProductRequest, HomeView, ProductDetail,
            ProductList, StoreStats, UpdateCategoryRequest, UpdateProductRequest,
        },
        profile::{CustomerDashboard, UpdateProfileRequest},
        wishlist::{AddWishlistRequest, Wishlist},
    },
    entity::sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    models::{
        CartItem, Category, ContactMessage, Coupon, MessageReply, Order, OrderItem, Page, Product,
        Profile, User, WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, cart, coupons, health, messages, orders, pages, params, products, profile,
        wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        profile::get_profile,
        profile::update_profile,
        profile::dashboard,
        products::home,
        products::list_products,
        products::get_product,
        products::list_categories,
        products::get_category,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_item,
        cart::remove_item,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        messages::create_contact,
        messages::list_own_messages,
        messages::get_thread,
        messages::reply,
        messages::chat,
        coupons::check_coupon,
        pages::get_page,
        admin::dashboard,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_users,
        admin::delete_user,
        admin::list_messages,
        admin::reply_message,
        admin::list_coupons,
        admin::create_coupon,
        admin::list_pages,
        admin::create_page,
        admin::update_page,
        admin::delete_page
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            User,
            Profile,
            Category,
            Product,
            CartItem,
            Order,
            OrderItem,
            WishlistItem,
            Coupon,
            ContactMessage,
            MessageReply,
            Page,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            CustomerDashboard,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CategoryList,
            ProductDetail,
            StoreStats,
            HomeView,
            AddToCartRequest,
            UpdateCartItemRequest,
            AddToCartOutcome,
            CartLineUpdate,
            CartLine,
            CartView,
            CheckoutRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            AddWishlistRequest,
            Wishlist,
            ContactRequest,
            ReplyRequest,
            MessageThread,
            MessageList,
            ChatReply,
            ChatReplies,
            CreateCouponRequest,
            CouponCheck,
            CouponList,
            CreatePageRequest,
            UpdatePageRequest,
            PageList,
            DashboardStats,
            UserList,
            params::Pagination,
            params::ProductSort,
            params::SortOrder,
            params::ProductQuery,
            params::OrderListQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "Profile", description = "Current user's profile"),
        (name = "Products", description = "Catalog browsing"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Wishlist", description = "Saved products"),
        (name = "Messages", description = "Support messaging"),
        (name = "Coupons", description = "Coupon lookup"),
        (name = "Pages", description = "Content pages"),
        (name = "Admin", description = "Back-office endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
