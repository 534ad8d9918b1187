//! Shared helpers: an app over an in-memory database and request shortcuts.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRef,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use userbase::{
    admin::session::{SessionKeys, SESSION_COOKIE},
    build_app,
    config::{AppConfig, SessionConfig},
    db::create_pool,
    AppState,
};

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
        session: SessionConfig {
            secret: "test-session-secret".into(),
            issuer: "userbase".into(),
            audience: "userbase-admin".into(),
            ttl_minutes: 5,
            secure_cookie: false,
        },
        admin_seed: None,
    }
}

pub async fn build() -> (Router, AppState) {
    let config = test_config();
    let db = create_pool(&config.database_url, config.max_connections)
        .await
        .expect("Failed to create in-memory SQLite pool");
    let state = AppState::from_parts(db, Arc::new(config));
    (build_app(state.clone()), state)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Send a JSON body and decode the JSON reply.
pub async fn call_json(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let response = send(app, builder.body(Body::from(serde_json::to_vec(&body).unwrap())).unwrap()).await;
    let status = response.status();
    (status, body_json(response).await)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call_json(app, "POST", uri, None, body).await
}

/// A valid admin session cookie for `user_id`, skipping the login form.
pub fn session_cookie_for(state: &AppState, user_id: i64) -> String {
    let token = SessionKeys::from_ref(state).sign(user_id).unwrap();
    format!("{SESSION_COOKIE}={token}")
}

pub fn get_page(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` part of the first Set-Cookie header.
pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}
