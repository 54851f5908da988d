mod common;

use std::sync::Arc;

use storefront::{
    dto::messages::{ContactRequest, ReplyRequest},
    entity::sea_orm_active_enums::Role,
    error::AppError,
    middleware::auth::AuthUser,
    services::message_service,
    state::AppState,
};
use uuid::Uuid;

fn contact_form(email: &str) -> ContactRequest {
    ContactRequest {
        name: "Robin".into(),
        email: email.into(),
        subject: "Late delivery".into(),
        message: "Where is my parcel?".into(),
    }
}

fn reply(content: &str) -> ReplyRequest {
    ReplyRequest {
        content: content.into(),
    }
}

async fn open_thread(state: &AppState, customer: &AuthUser) -> anyhow::Result<Uuid> {
    let created =
        message_service::create_contact(state, Some(customer), contact_form("robin@example.com"))
            .await?;
    Ok(created.data.expect("message").id)
}

#[tokio::test]
async fn admin_reply_marks_thread_and_sends_mail() -> anyhow::Result<()> {
    let mailer = Arc::new(common::RecordingMailer::default());
    let state = common::test_state_with(mailer.clone()).await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer =
        common::create_named_user(&state, "robin@example.com", "Robin", Role::Customer).await?;
    let id = open_thread(&state, &customer).await?;

    message_service::admin_reply(&state, &admin, id, reply("It ships tomorrow.")).await?;

    let thread = message_service::get_thread(&state, &customer, id)
        .await?
        .data
        .expect("thread");
    assert!(thread.message.is_replied);
    assert!(thread.message.replied_at.is_some());
    assert_eq!(thread.replies.len(), 1);
    assert!(thread.replies[0].is_admin);

    let sent = mailer.wait_for(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "robin@example.com");
    assert_eq!(sent[0].from, "noreply@luxshop.com");
    assert_eq!(sent[0].subject, "Reply to your message: Late delivery");
    assert_eq!(sent[0].body, "It ships tomorrow.");
    Ok(())
}

#[tokio::test]
async fn mail_failure_does_not_undo_the_reply() -> anyhow::Result<()> {
    let state = common::test_state_with(Arc::new(common::FailingMailer)).await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "robin@example.com", Role::Customer).await?;
    let id = open_thread(&state, &customer).await?;

    let resp = message_service::admin_reply(&state, &admin, id, reply("On its way.")).await?;
    assert_eq!(resp.message, "Reply sent successfully!");

    let thread = message_service::get_thread(&state, &admin, id)
        .await?
        .data
        .expect("thread");
    assert!(thread.message.is_replied);
    assert_eq!(thread.replies.len(), 1);
    Ok(())
}

#[tokio::test]
async fn customer_follow_up_reopens_the_thread() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer = common::create_user(&state, "robin@example.com", Role::Customer).await?;
    let id = open_thread(&state, &customer).await?;

    message_service::admin_reply(&state, &admin, id, reply("Checking.")).await?;
    message_service::customer_reply(&state, &customer, id, reply("Thanks!")).await?;

    let thread = message_service::get_thread(&state, &customer, id)
        .await?
        .data
        .expect("thread");
    assert!(!thread.message.is_replied);
    assert_eq!(thread.replies.len(), 2);
    Ok(())
}

#[tokio::test]
async fn chat_payload_labels_authors_oldest_first() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let customer =
        common::create_named_user(&state, "robin@example.com", "Robin", Role::Customer).await?;
    let id = open_thread(&state, &customer).await?;

    message_service::customer_reply(&state, &customer, id, reply("Any news?")).await?;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    message_service::admin_reply(&state, &admin, id, reply("Yes, shipped.")).await?;

    let chat = message_service::chat_replies(&state, &customer, id).await?;
    assert_eq!(chat.replies.len(), 2);
    assert_eq!(chat.replies[0].user, "Robin");
    assert!(!chat.replies[0].is_admin);
    assert_eq!(chat.replies[1].user, "Support Team");
    assert!(chat.replies[1].is_admin);

    let json = serde_json::to_value(&chat)?;
    let first = &json["replies"][0];
    assert_eq!(first["content"], "Any news?");
    assert!(first["created_at"].as_str().is_some_and(|s| s.ends_with("AM") || s.ends_with("PM")));

    let admin_view = message_service::chat_replies(&state, &admin, id).await?;
    assert_eq!(admin_view.replies.len(), 2);
    Ok(())
}

#[tokio::test]
async fn threads_are_private_and_replies_need_content() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let owner = common::create_user(&state, "robin@example.com", Role::Customer).await?;
    let stranger = common::create_user(&state, "kim@example.com", Role::Customer).await?;
    let id = open_thread(&state, &owner).await?;

    let err = message_service::chat_replies(&state, &stranger, id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = message_service::customer_reply(&state, &stranger, id, reply("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = message_service::admin_reply(&state, &admin, id, reply("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = message_service::admin_reply(&state, &owner, id, reply("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let own = message_service::list_own_messages(&state, &stranger)
        .await?
        .data
        .expect("messages");
    assert!(own.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn anonymous_contact_is_accepted() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;

    let created = message_service::create_contact(&state, None, contact_form("guest@example.com"))
        .await?
        .data
        .expect("message");
    assert!(created.user_id.is_none());
    assert!(!created.is_replied);

    let err = message_service::create_contact(&state, None, contact_form("not-an-email"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let inbox = message_service::list_messages(&state, &admin, Default::default())
        .await?
        .data
        .expect("messages");
    assert_eq!(inbox.items.len(), 1);
    Ok(())
}
