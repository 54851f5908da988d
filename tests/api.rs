mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront::{app, entity::sea_orm_active_enums::Role};
use tower::ServiceExt;

async fn send(app: &Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get(uri: &str, token: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    Ok(builder.body(Body::empty())?)
}

#[tokio::test]
async fn health_and_unknown_routes() -> anyhow::Result<()> {
    let app = app(common::test_state().await?);

    let response = app.clone().oneshot(get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (status, body) = send(&app, get("/api/nowhere", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/nowhere");

    let (status, body) = send(&app, get("/api/home", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stats"]["total_products"], 0);

    let (status, _) = send(&app, get("/api/pages/about-us", None)?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn register_login_and_shop() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let category = common::create_category(&state, "Stationery").await?;
    let pen = common::create_product(&state, category, "Fountain Pen", 4500, 3).await?;
    let app = app(state);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "Avery@Example.com",
                "password": "hunter22",
                "first_name": "Avery",
                "last_name": "Quinn"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["email"], "avery@example.com");
    assert_eq!(body["data"]["role"], "customer");

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "avery@example.com", "password": "wrong-one" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "avery@example.com", "password": "hunter22" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let token = body["data"]["token"].as_str().expect("token").to_string();
    assert!(token.starts_with("Bearer "));

    let (status, _) = send(&app, get("/api/cart", None)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cart",
            Some(&token),
            json!({ "product_id": pen.id, "quantity": 5 }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Stock limit reached. Added 3 only.");
    assert_eq!(body["data"]["capped"], true);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cart",
            Some(&token),
            json!({ "product_id": pen.id }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Stock limit exceeded, only 3 available");

    let (status, body) = send(&app, get("/api/cart", Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 13500);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/orders/checkout",
            Some(&token),
            json!({ "shipping_address": "9 Elm Row", "phone": "5550111", "payment_method": "cod" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["order"]["total_amount"], 13500);
    assert_eq!(body["data"]["order"]["status"], "pending");
    assert_eq!(body["data"]["order"]["payment_method"], "cod");

    let (status, body) = send(&app, get("/api/products", None)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn chat_endpoint_returns_bare_replies() -> anyhow::Result<()> {
    let state = common::test_state().await?;
    let admin = common::create_user(&state, "admin@example.com", Role::Admin).await?;
    let token = format!(
        "Bearer {}",
        storefront::services::auth_service::issue_token(
            admin.user_id,
            admin.role,
            common::JWT_SECRET,
            1
        )?
    );
    let app = app(state);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/messages",
            None,
            json!({
                "name": "Guest",
                "email": "guest@example.com",
                "subject": "Sizes",
                "message": "Do you stock XL?"
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/admin/messages/{id}/reply"),
            Some(&token),
            json!({ "content": "Yes, all sizes." }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get(&format!("/api/messages/{id}/chat"), Some(&token))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("message").is_none());
    let replies = body["replies"].as_array().expect("replies");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["user"], "Support Team");
    assert_eq!(replies[0]["is_admin"], true);
    assert_eq!(replies[0]["content"], "Yes, all sizes.");
    Ok(())
}
