use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ContactMessage, MessageReply};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageThread {
    pub message: ContactMessage,
    pub replies: Vec<MessageReply>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct MessageList {
    #[schema(value_type = Vec<ContactMessage>)]
    pub items: Vec<ContactMessage>,
}

/// One entry of the chat poll payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReply {
    pub user: String,
    pub content: String,
    pub is_admin: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatReplies {
    pub replies: Vec<ChatReply>,
}
