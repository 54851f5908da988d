use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    error::AppResult, models::Page, response::ApiResponse, services::page_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{slug}", get(get_page))
}

#[utoipa::path(
    get,
    path = "/api/pages/{slug}",
    params(
        ("slug" = String, Path, description = "Page slug")
    ),
    responses(
        (status = 200, description = "Active content page", body = ApiResponse<Page>),
        (status = 404, description = "Unknown or inactive page")
    ),
    tag = "Pages"
)]
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Page>>> {
    let resp = page_service::get_page(&state, &slug).await?;
    Ok(Json(resp))
}
