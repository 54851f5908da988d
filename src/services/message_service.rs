use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::messages::{
        ChatReplies, ChatReply, ContactRequest, MessageList, MessageThread, ReplyRequest,
    },
    entity::{
        ContactMessages, MessageReplies, Users,
        contact_messages::{
            ActiveModel as MessageActive, Column as MessageCol, Model as MessageModel,
        },
        message_replies::{ActiveModel as ReplyActive, Column as ReplyCol, Model as ReplyModel},
        users::Model as UserModel,
    },
    error::{AppError, AppResult},
    mail::{self, OutgoingMail},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ContactMessage, MessageReply},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

const SUPPORT_LABEL: &str = "Support Team";
const CHAT_TIME_FORMAT: &str = "%b %d, %Y %I:%M %p";

fn require_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::Validation(
            "Reply content cannot be empty.".into(),
        ));
    }
    Ok(content)
}

/// Admins reach any thread, everyone else only their own.
async fn find_visible<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<MessageModel> {
    let mut finder = ContactMessages::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(MessageCol::UserId.eq(user.user_id));
    }
    finder.one(conn).await?.ok_or(AppError::NotFound)
}

async fn replies_of<C: ConnectionTrait>(
    conn: &C,
    message_id: Uuid,
) -> AppResult<Vec<(ReplyModel, Option<UserModel>)>> {
    Ok(MessageReplies::find()
        .filter(ReplyCol::MessageId.eq(message_id))
        .find_also_related(Users)
        .order_by_asc(ReplyCol::CreatedAt)
        .all(conn)
        .await?)
}

/// Display name on a chat bubble.
pub fn reply_author(reply: &ReplyModel, author: Option<&UserModel>) -> String {
    if reply.is_admin {
        return SUPPORT_LABEL.to_string();
    }
    match author {
        Some(user) if !user.first_name.trim().is_empty() => user.first_name.clone(),
        Some(user) if !user.email.is_empty() => user.email.clone(),
        _ => "Unknown".to_string(),
    }
}

/// Public contact form; the sender is attached when signed in.
pub async fn create_contact(
    state: &AppState,
    user: Option<&AuthUser>,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    payload.validate()?;

    let message = MessageActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.map(|u| u.user_id)),
        name: Set(payload.name),
        email: Set(payload.email),
        subject: Set(payload.subject),
        message: Set(payload.message),
        is_replied: Set(false),
        created_at: Set(Utc::now().into()),
        replied_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        user.map(|u| u.user_id),
        "contact_create",
        "contact_messages",
        serde_json::json!({ "message_id": message.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Your message has been sent successfully! We will get back to you soon.",
        message.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_own_messages(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<MessageList>> {
    let items = ContactMessages::find()
        .filter(MessageCol::UserId.eq(user.user_id))
        .order_by_desc(MessageCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ContactMessage::from)
        .collect();

    Ok(ApiResponse::success(
        "Messages",
        MessageList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_thread(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<MessageThread>> {
    let message = find_visible(&state.orm, user, id).await?;
    let replies = replies_of(&state.orm, message.id)
        .await?
        .into_iter()
        .map(|(reply, _)| MessageReply::from(reply))
        .collect();

    Ok(ApiResponse::success(
        "Message",
        MessageThread {
            message: message.into(),
            replies,
        },
        Some(Meta::empty()),
    ))
}

/// A customer follow-up puts the thread back into the unreplied queue.
pub async fn customer_reply(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReplyRequest,
) -> AppResult<ApiResponse<MessageReply>> {
    let content = require_content(&payload.content)?.to_owned();

    let txn = state.orm.begin().await?;
    let message = ContactMessages::find_by_id(id)
        .filter(MessageCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let reply = ReplyActive {
        id: Set(Uuid::new_v4()),
        message_id: Set(message.id),
        user_id: Set(Some(user.user_id)),
        content: Set(content),
        is_admin: Set(false),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let mut active: MessageActive = message.into();
    active.is_replied = Set(false);
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Reply sent!",
        reply.into(),
        Some(Meta::empty()),
    ))
}

pub async fn list_messages(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<MessageList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = ContactMessages::find().order_by_desc(MessageCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ContactMessage::from)
        .collect();

    Ok(ApiResponse::success(
        "Messages",
        MessageList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Records the reply and marks the thread answered, then notifies the sender.
///
/// The notification is fire-and-forget: a mail failure never undoes the reply.
pub async fn admin_reply(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ReplyRequest,
) -> AppResult<ApiResponse<MessageReply>> {
    ensure_admin(user)?;
    let content = require_content(&payload.content)?.to_owned();

    let txn = state.orm.begin().await?;
    let message = ContactMessages::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let now = Utc::now();
    let reply = ReplyActive {
        id: Set(Uuid::new_v4()),
        message_id: Set(message.id),
        user_id: Set(Some(user.user_id)),
        content: Set(content.clone()),
        is_admin: Set(true),
        created_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let recipient = message.email.clone();
    let subject = format!("Reply to your message: {}", message.subject);

    let mut active: MessageActive = message.into();
    active.is_replied = Set(true);
    active.replied_at = Set(Some(now.into()));
    active.update(&txn).await?;
    txn.commit().await?;

    mail::dispatch(
        state.mailer.clone(),
        OutgoingMail {
            from: state.config.mail_from.clone(),
            to: recipient,
            subject,
            body: content,
        },
    );

    audit::record(
        &state.orm,
        Some(user.user_id),
        "message_reply",
        "message_replies",
        serde_json::json!({ "message_id": id, "reply_id": reply.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Reply sent successfully!",
        reply.into(),
        Some(Meta::empty()),
    ))
}

/// Payload for the chat poller, oldest reply first.
pub async fn chat_replies(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ChatReplies> {
    let message = find_visible(&state.orm, user, id).await?;
    let replies = replies_of(&state.orm, message.id)
        .await?
        .into_iter()
        .map(|(reply, author)| ChatReply {
            user: reply_author(&reply, author.as_ref()),
            created_at: reply.created_at.format(CHAT_TIME_FORMAT).to_string(),
            is_admin: reply.is_admin,
            content: reply.content,
        })
        .collect();

    Ok(ChatReplies { replies })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(is_admin: bool) -> ReplyModel {
        ReplyModel {
            id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            user_id: None,
            content: "hello".into(),
            is_admin,
            created_at: Utc::now().into(),
        }
    }

    fn author(first_name: &str, email: &str) -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: String::new(),
            first_name: first_name.into(),
            last_name: String::new(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn admin_replies_are_labelled_support() {
        let user = author("Dana", "dana@example.com");
        assert_eq!(reply_author(&reply(true), Some(&user)), "Support Team");
    }

    #[test]
    fn customer_label_falls_back_to_email_then_unknown() {
        let named = author("Dana", "dana@example.com");
        assert_eq!(reply_author(&reply(false), Some(&named)), "Dana");

        let unnamed = author("", "dana@example.com");
        assert_eq!(reply_author(&reply(false), Some(&unnamed)), "dana@example.com");

        assert_eq!(reply_author(&reply(false), None), "Unknown");
    }
}
