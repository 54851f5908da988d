mod common;

use storefront::{
    dto::{cart::AddToCartRequest, orders::CheckoutRequest, wishlist::AddWishlistRequest},
    entity::sea_orm_active_enums::Role,
    error::AppError,
    services::{cart_service, catalog_service, order_service, profile_service, wishlist_service},
};

#[tokio::test]
async fn home_lists_featured_stock_and_store_counts() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let mut categories = Vec::new();
    for name in ["A", "B", "C", "D", "E", "F", "G"] {
        categories.push(common::create_category(&state, name).await?);
    }
    for i in 0..9 {
        common::create_product(&state, categories[0], &format!("Item {i}"), 100, 1).await?;
    }
    let sold_out = common::create_product(&state, categories[1], "Gone", 100, 0).await?;

    let home = catalog_service::home(&state).await?.data.expect("home");
    assert_eq!(home.featured_products.len(), 8);
    assert!(home.featured_products.iter().all(|p| p.id != sold_out.id));
    assert_eq!(home.categories.len(), 6);
    assert_eq!(home.stats.total_products, 10);
    assert_eq!(home.stats.total_categories, 7);
    assert_eq!(home.stats.total_users, 1);
    assert_eq!(home.stats.total_orders, 0);
    Ok(())
}

#[tokio::test]
async fn customer_dashboard_shows_recent_orders_and_wishlist_size() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let category = common::create_category(&state, "Garden").await?;
    let seeds = common::create_product(&state, category, "Seeds", 250, 100).await?;
    let rake = common::create_product(&state, category, "Rake", 1800, 3).await?;

    for _ in 0..6 {
        cart_service::add_item(
            &state,
            &customer,
            AddToCartRequest {
                product_id: seeds.id,
                quantity: 1,
            },
        )
        .await?;
        order_service::checkout(
            &state,
            &customer,
            CheckoutRequest {
                shipping_address: "4 Orchard Lane".into(),
                phone: "5550123".into(),
                payment_method: "cod".into(),
            },
        )
        .await?;
    }
    wishlist_service::add_to_wishlist(&state, &customer, AddWishlistRequest { product_id: rake.id })
        .await?;

    let dashboard = profile_service::dashboard(&state, &customer)
        .await?
        .data
        .expect("dashboard");
    assert_eq!(dashboard.recent_orders.len(), 5);
    assert!(dashboard.recent_orders.iter().all(|o| o.user_id == customer.user_id));
    assert!(
        dashboard
            .recent_orders
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
    );
    assert_eq!(dashboard.wishlist_count, 1);

    let err = profile_service::dashboard(&state, &admin).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    Ok(())
}
