use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::pages::{CreatePageRequest, PageList, UpdatePageRequest},
    entity::{
        Pages,
        pages::{ActiveModel as PageActive, Column as PageCol},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Page,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Lowercases and checks the slug alphabet: ascii letters, digits, `-`, `_`.
fn normalize_slug(slug: &str) -> AppResult<String> {
    let slug = slug.trim().to_ascii_lowercase();
    let allowed = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if slug.is_empty() || !slug.chars().all(allowed) {
        return Err(AppError::Validation(
            "slug may only contain letters, digits, hyphens and underscores".into(),
        ));
    }
    Ok(slug)
}

async fn ensure_slug_free(state: &AppState, slug: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Pages::find().filter(PageCol::Slug.eq(slug));
    if let Some(id) = except {
        finder = finder.filter(PageCol::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::BadRequest(format!("page {slug} already exists")));
    }
    Ok(())
}

/// Public lookup; inactive pages are reported as missing.
pub async fn get_page(state: &AppState, slug: &str) -> AppResult<ApiResponse<Page>> {
    let page = Pages::find()
        .filter(PageCol::Slug.eq(slug.trim().to_ascii_lowercase()))
        .filter(PageCol::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Page", page.into(), None))
}

pub async fn list_pages(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<PageList>> {
    ensure_admin(user)?;
    let items = Pages::find()
        .order_by_asc(PageCol::Title)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Page::from)
        .collect();

    Ok(ApiResponse::success(
        "Pages",
        PageList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_page(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePageRequest,
) -> AppResult<ApiResponse<Page>> {
    ensure_admin(user)?;
    payload.validate()?;
    let slug = normalize_slug(&payload.slug)?;
    ensure_slug_free(state, &slug, None).await?;

    let page = PageActive {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        slug: Set(slug),
        content: Set(payload.content),
        is_active: Set(payload.is_active),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "page_create",
        "pages",
        serde_json::json!({ "page_id": page.id, "slug": page.slug }),
    )
    .await;

    Ok(ApiResponse::success(
        "Page created successfully!",
        page.into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_page(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePageRequest,
) -> AppResult<ApiResponse<Page>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Pages::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: PageActive = existing.clone().into();
    if let Some(slug) = payload.slug {
        let slug = normalize_slug(&slug)?;
        ensure_slug_free(state, &slug, Some(id)).await?;
        active.slug = Set(slug);
    }
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(content) = payload.content {
        active.content = Set(content);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let page = if active.is_changed() {
        active.update(&state.orm).await?
    } else {
        existing
    };

    audit::record(
        &state.orm,
        Some(user.user_id),
        "page_update",
        "pages",
        serde_json::json!({ "page_id": page.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Page updated successfully!",
        page.into(),
        Some(Meta::empty()),
    ))
}

pub async fn delete_page(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Pages::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "page_delete",
        "pages",
        serde_json::json!({ "page_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Page deleted successfully!"))
}
