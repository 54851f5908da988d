mod common;

use storefront::{
    dto::pages::{CreatePageRequest, UpdatePageRequest},
    entity::sea_orm_active_enums::Role,
    error::AppError,
    services::page_service,
};

fn page(title: &str, slug: &str) -> CreatePageRequest {
    CreatePageRequest {
        title: title.into(),
        slug: slug.into(),
        content: format!("{title} body"),
        is_active: true,
    }
}

#[tokio::test]
async fn active_pages_are_served_by_slug() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;

    let about = page_service::create_page(&state, &admin, page("About Us", "About-Us"))
        .await?
        .data
        .expect("page");
    assert_eq!(about.slug, "about-us");

    let served = page_service::get_page(&state, "about-us")
        .await?
        .data
        .expect("page");
    assert_eq!(served.title, "About Us");
    assert_eq!(served.content, "About Us body");

    page_service::update_page(
        &state,
        &admin,
        about.id,
        UpdatePageRequest {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    let err = page_service::get_page(&state, "about-us").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let listed = page_service::list_pages(&state, &admin)
        .await?
        .data
        .expect("pages");
    assert_eq!(listed.items.len(), 1);
    assert!(!listed.items[0].is_active);

    let err = page_service::get_page(&state, "missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn slugs_are_unique_and_admin_only() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "buyer@example.com", Role::Customer).await?;

    let err = page_service::create_page(&state, &customer, page("Terms", "terms"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let terms = page_service::create_page(&state, &admin, page("Terms", "terms"))
        .await?
        .data
        .expect("page");
    let faq = page_service::create_page(&state, &admin, page("FAQ", "faq"))
        .await?
        .data
        .expect("page");

    let err = page_service::create_page(&state, &admin, page("Terms again", "TERMS"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = page_service::create_page(&state, &admin, page("Bad", "no spaces"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = page_service::update_page(
        &state,
        &admin,
        faq.id,
        UpdatePageRequest {
            slug: Some("terms".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    page_service::delete_page(&state, &admin, terms.id).await?;
    let err = page_service::delete_page(&state, &admin, terms.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}
