mod common;

use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use storefront::{
    dto::{cart::AddToCartRequest, orders::CheckoutRequest, products::UpdateProductRequest},
    entity::{
        OrderItems, Orders, Products, products,
        sea_orm_active_enums::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{cart_service, catalog_service, order_service},
    state::AppState,
};
use uuid::Uuid;

fn checkout_form(payment_method: &str) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "12 Market Street".into(),
        phone: "5550100".into(),
        payment_method: payment_method.into(),
    }
}

async fn add(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<()> {
    cart_service::add_item(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

async fn stock_of(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    Ok(catalog_service::stock_of(&state.orm, id).await?)
}

#[tokio::test]
async fn checkout_creates_pending_cod_order_and_clears_cart() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let kettle = common::create_product(&state, category, "Kettle", 3500, 10).await?;
    let spoon = common::create_product(&state, category, "Spoon", 250, 50).await?;
    add(&state, &customer, kettle.id, 1).await?;
    add(&state, &customer, spoon.id, 4).await?;

    let placed = order_service::checkout(&state, &customer, checkout_form("cod"))
        .await?
        .data
        .expect("order");

    let order = &placed.order;
    assert!(order.order_number.starts_with("ORD"));
    assert_eq!(order.total_amount, 3500 + 4 * 250);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.user_id, customer.user_id);

    let item_sum: i64 = placed.items.iter().map(|i| i.line_total()).sum();
    assert_eq!(item_sum, order.total_amount);

    assert_eq!(stock_of(&state, kettle.id).await?, 9);
    assert_eq!(stock_of(&state, spoon.id).await?, 46);

    let cart = cart_service::view_cart(&state, &customer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_rolls_back_everything() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let pan = common::create_product(&state, category, "Pan", 4000, 5).await?;
    let pot = common::create_product(&state, category, "Pot", 6000, 5).await?;
    add(&state, &customer, pan.id, 2).await?;
    add(&state, &customer, pot.id, 3).await?;

    // Stock drops after the items went into the cart.
    let mut active: products::ActiveModel = pot.clone().into();
    active.stock = Set(1);
    active.update(&state.orm).await?;

    let err = order_service::checkout(&state, &customer, checkout_form("cod"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { product_id } if product_id == pot.id));

    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    assert_eq!(OrderItems::find().count(&state.orm).await?, 0);
    assert_eq!(stock_of(&state, pan.id).await?, 5);
    assert_eq!(stock_of(&state, pot.id).await?, 1);
    assert_eq!(
        cart_service::cart_total(&state.orm, customer.user_id).await?,
        2 * 4000 + 3 * 6000
    );
    Ok(())
}

#[tokio::test]
async fn order_keeps_its_prices_after_catalog_edits() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let knife = common::create_product(&state, category, "Knife", 2000, 8).await?;
    let board = common::create_product(&state, category, "Board", 1500, 8).await?;
    add(&state, &customer, knife.id, 2).await?;
    add(&state, &customer, board.id, 1).await?;

    let placed = order_service::checkout(&state, &customer, checkout_form("cod"))
        .await?
        .data
        .expect("order");

    catalog_service::update_product(
        &state,
        &admin,
        knife.id,
        UpdateProductRequest {
            price: Some(9900),
            ..Default::default()
        },
    )
    .await?;
    catalog_service::delete_product(&state, &admin, board.id).await?;

    let fetched = order_service::get_order(&state, &customer, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.order.total_amount, 2 * 2000 + 1500);

    let knife_line = fetched
        .items
        .iter()
        .find(|i| i.product_name == "Knife")
        .expect("knife line");
    assert_eq!(knife_line.price, 2000);
    assert_eq!(knife_line.product_id, Some(knife.id));

    let board_line = fetched
        .items
        .iter()
        .find(|i| i.product_name == "Board")
        .expect("board line");
    assert_eq!(board_line.product_id, None);
    assert_eq!(board_line.price, 1500);
    Ok(())
}

#[tokio::test]
async fn checkout_preconditions() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;

    let err = order_service::checkout(&state, &admin, checkout_form("cod"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = order_service::checkout(&state, &customer, checkout_form("cod"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Your cart is empty"));

    let category = common::create_category(&state, "Kitchen").await?;
    let jar = common::create_product(&state, category, "Jar", 700, 3).await?;
    add(&state, &customer, jar.id, 1).await?;

    let err = order_service::checkout(&state, &customer, checkout_form("card"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    for (address, phone) in [("", "5550100"), ("   ", "5550100"), ("12 Market Street", " \t ")] {
        let mut form = checkout_form("cod");
        form.shipping_address = address.into();
        form.phone = phone.into();
        let err = order_service::checkout(&state, &customer, form)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    assert_eq!(stock_of(&state, jar.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn checkout_stores_trimmed_contact_details() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let jar = common::create_product(&state, category, "Jar", 700, 3).await?;
    add(&state, &customer, jar.id, 1).await?;

    let form = CheckoutRequest {
        shipping_address: "  12 Market Street \n".into(),
        phone: " 5550100 ".into(),
        payment_method: " cod ".into(),
    };
    let placed = order_service::checkout(&state, &customer, form)
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.shipping_address, "12 Market Street");
    assert_eq!(placed.order.phone, "5550100");
    Ok(())
}

#[tokio::test]
async fn conditional_decrement_never_goes_negative() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let cup = common::create_product(&state, category, "Cup", 500, 3).await?;

    catalog_service::decrement_stock(&state.orm, cup.id, 2).await?;
    assert_eq!(stock_of(&state, cup.id).await?, 1);

    let err = catalog_service::decrement_stock(&state.orm, cup.id, 2)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(stock_of(&state, cup.id).await?, 1);

    let err = catalog_service::decrement_stock(&state.orm, cup.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = catalog_service::decrement_stock(&state.orm, Uuid::new_v4(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    catalog_service::decrement_stock(&state.orm, cup.id, 1).await?;
    let cup = Products::find_by_id(cup.id).one(&state.orm).await?.expect("cup");
    assert_eq!(cup.stock, 0);
    Ok(())
}

#[tokio::test]
async fn schema_rejects_negative_stock() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let category = common::create_category(&state, "Kitchen").await?;
    let cup = common::create_product(&state, category, "Cup", 500, 3).await?;

    let mut active: products::ActiveModel = cup.clone().into();
    active.stock = Set(-1);
    assert!(active.update(&state.orm).await.is_err());
    assert_eq!(stock_of(&state, cup.id).await?, 3);
    Ok(())
}
