use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::messages::{ChatReplies, ContactRequest, MessageList, MessageThread, ReplyRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{ContactMessage, MessageReply},
    response::ApiResponse,
    services::message_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_own_messages).post(create_contact))
        .route("/{id}", get(get_thread))
        .route("/{id}/replies", post(reply))
        .route("/{id}/chat", get(chat))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message received", body = ApiResponse<ContactMessage>),
        (status = 422, description = "Invalid input")
    ),
    tag = "Messages"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    let resp = message_service::create_contact(&state, user.as_ref(), payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    responses(
        (status = 200, description = "Own support threads", body = ApiResponse<MessageList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn list_own_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<MessageList>>> {
    let resp = message_service::list_own_messages(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Thread with replies", body = ApiResponse<MessageThread>),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn get_thread(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MessageThread>>> {
    let resp = message_service::get_thread(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/messages/{id}/replies",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    request_body = ReplyRequest,
    responses(
        (status = 200, description = "Reply added", body = ApiResponse<MessageReply>),
        (status = 404, description = "Message not found"),
        (status = 422, description = "Empty reply")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn reply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReplyRequest>,
) -> AppResult<Json<ApiResponse<MessageReply>>> {
    let resp = message_service::customer_reply(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

/// Polled by the chat widget; not wrapped in the response envelope.
#[utoipa::path(
    get,
    path = "/api/messages/{id}/chat",
    params(
        ("id" = Uuid, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Replies, oldest first", body = ChatReplies),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ChatReplies>> {
    let resp = message_service::chat_replies(&state, &user, id).await?;
    Ok(Json(resp))
}
