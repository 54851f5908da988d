mod common;

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use storefront::{
    dto::{
        products::{CreateCategoryRequest, CreateProductRequest},
        wishlist::AddWishlistRequest,
    },
    entity::{Products, products, sea_orm_active_enums::Role},
    error::AppError,
    routes::params::{ProductQuery, ProductSort},
    services::{catalog_service, wishlist_service},
};
use uuid::Uuid;

#[tokio::test]
async fn shop_listing_hides_sold_out_and_filters() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let lighting = common::create_category(&state, "Lighting").await?;
    let textiles = common::create_category(&state, "Textiles").await?;
    common::create_product(&state, lighting, "Desk Lamp", 3500, 4).await?;
    common::create_product(&state, lighting, "Floor Lamp", 8900, 2).await?;
    common::create_product(&state, lighting, "Pendant", 12000, 0).await?;
    common::create_product(&state, textiles, "Throw", 4200, 7).await?;

    let all = catalog_service::list_products(&state, ProductQuery::default()).await?;
    let meta = all.meta.clone().expect("meta");
    assert_eq!(meta.total, Some(3));
    assert_eq!(meta.per_page, Some(12));
    let names: Vec<_> = all.data.expect("products").items.into_iter().map(|p| p.name).collect();
    assert_eq!(names, ["Desk Lamp", "Floor Lamp", "Throw"]);

    let lamps = catalog_service::list_products(
        &state,
        ProductQuery {
            q: Some("LAMP".into()),
            sort: Some(ProductSort::PriceHigh),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    assert_eq!(lamps.len(), 2);
    assert_eq!(lamps[0].name, "Floor Lamp");

    let in_category = catalog_service::list_products(
        &state,
        ProductQuery {
            category: Some(textiles),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    assert_eq!(in_category.len(), 1);
    assert_eq!(in_category[0].name, "Throw");

    let mid_range = catalog_service::list_products(
        &state,
        ProductQuery {
            min_price: Some(4000),
            max_price: Some(9000),
            sort: Some(ProductSort::PriceLow),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("products")
    .items;
    let prices: Vec<_> = mid_range.iter().map(|p| p.price).collect();
    assert_eq!(prices, [4200, 8900]);
    Ok(())
}

#[tokio::test]
async fn detail_includes_related_and_new_flag() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let category = common::create_category(&state, "Lighting").await?;
    let main = common::create_product(&state, category, "Desk Lamp", 3500, 4).await?;
    for i in 0..5 {
        common::create_product(&state, category, &format!("Bulb {i}"), 300, 10).await?;
    }

    let detail = catalog_service::get_product(&state, None, main.id)
        .await?
        .data
        .expect("detail");
    assert_eq!(detail.product.id, main.id);
    assert_eq!(detail.category.id, category);
    assert_eq!(detail.related.len(), 4);
    assert!(detail.related.iter().all(|p| p.id != main.id));
    assert!(detail.is_new);

    let mut old: products::ActiveModel = main.into();
    old.created_at = Set((Utc::now() - Duration::days(30)).into());
    let old = old.update(&state.orm).await?;
    let detail = catalog_service::get_product(&state, None, old.id)
        .await?
        .data
        .expect("detail");
    assert!(!detail.is_new);

    let err = catalog_service::get_product(&state, None, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn detail_reports_the_viewers_wishlist_entry() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let fan = common::create_user(&state, "fan@example.com", Role::Customer).await?;
    let other = common::create_user(&state, "other@example.com", Role::Customer).await?;
    let category = common::create_category(&state, "Lighting").await?;
    let lamp = common::create_product(&state, category, "Floor Lamp", 9900, 2).await?;

    let entry = wishlist_service::add_to_wishlist(
        &state,
        &fan,
        AddWishlistRequest {
            product_id: lamp.id,
        },
    )
    .await?
    .data
    .expect("entry");

    let seen_by_fan = catalog_service::get_product(&state, Some(&fan), lamp.id)
        .await?
        .data
        .expect("detail");
    assert!(seen_by_fan.in_wishlist);
    assert_eq!(seen_by_fan.wishlist_item_id, Some(entry.id));

    for viewer in [Some(&other), None] {
        let detail = catalog_service::get_product(&state, viewer, lamp.id)
            .await?
            .data
            .expect("detail");
        assert!(!detail.in_wishlist);
        assert_eq!(detail.wishlist_item_id, None);
    }
    Ok(())
}

#[tokio::test]
async fn admin_manages_catalog_and_category_delete_cascades() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;

    let category_request = || CreateCategoryRequest {
        name: "Outdoor".into(),
        description: "Garden and patio".into(),
        image_url: None,
    };
    let err = catalog_service::create_category(&state, &customer, category_request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let category = catalog_service::create_category(&state, &admin, category_request())
        .await?
        .data
        .expect("category");

    let product_request = |category_id| CreateProductRequest {
        category_id,
        name: "Bench".into(),
        description: "Teak bench".into(),
        price: 25000,
        stock: 3,
        image_url: None,
    };
    let err = catalog_service::create_product(&state, &admin, product_request(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    for price in [-1, 10_000_000_000] {
        let mut bad_price = product_request(category.id);
        bad_price.price = price;
        let err = catalog_service::create_product(&state, &admin, bad_price)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    let bench = catalog_service::create_product(&state, &admin, product_request(category.id))
        .await?
        .data
        .expect("product");
    assert_eq!(bench.stock, 3);

    catalog_service::delete_category(&state, &admin, category.id).await?;
    assert_eq!(Products::find().count(&state.orm).await?, 0);

    let err = catalog_service::delete_category(&state, &admin, category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
