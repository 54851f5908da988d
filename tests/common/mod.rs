#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use storefront::{
    config::AppConfig,
    db,
    entity::{
        categories, products,
        sea_orm_active_enums::Role,
        user_profiles, users,
    },
    mail::{LogMailer, Mailer, OutgoingMail},
    middleware::auth::AuthUser,
    state::AppState,
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        jwt_ttl_hours: 1,
        db_max_connections: 1,
        mail_from: "noreply@luxshop.com".into(),
    }
}

/// A fresh in-memory database on a single connection.
pub async fn test_state_with(mailer: Arc<dyn Mailer>) -> anyhow::Result<AppState> {
    let config = test_config();
    let orm = db::connect(&config.database_url, 1).await?;
    db::create_schema(&orm).await?;
    Ok(AppState::new(orm, config, mailer))
}

pub async fn test_state() -> anyhow::Result<AppState> {
    test_state_with(Arc::new(LogMailer)).await
}

pub async fn create_user(state: &AppState, email: &str, role: Role) -> anyhow::Result<AuthUser> {
    create_named_user(state, email, "Test", role).await
}

pub async fn create_named_user(
    state: &AppState,
    email: &str,
    first_name: &str,
    role: Role,
) -> anyhow::Result<AuthUser> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".into()),
        first_name: Set(first_name.to_string()),
        last_name: Set("User".into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    user_profiles::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        role: Set(role),
        phone: Set(String::new()),
        address: Set(String::new()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

pub async fn create_category(state: &AppState, name: &str) -> anyhow::Result<Uuid> {
    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(String::new()),
        image_url: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(category.id)
}

pub async fn create_product(
    state: &AppState,
    category_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let now = Utc::now();
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(name.to_string()),
        description: Set(format!("{name} description")),
        price: Set(price),
        stock: Set(stock),
        image_url: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

/// Keeps every mail handed to it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("mailer lock").clone()
    }

    /// Delivery happens on the blocking pool; give it a moment.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMail> {
        for _ in 0..50 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, mail: &OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().expect("mailer lock").push(mail.clone());
        Ok(())
    }
}

pub struct FailingMailer;

impl Mailer for FailingMailer {
    fn send(&self, _mail: &OutgoingMail) -> anyhow::Result<()> {
        anyhow::bail!("smtp unavailable")
    }
}
