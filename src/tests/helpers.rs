use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tower::ServiceExt;

use crate::config::Config;

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        access_token_secret: "test-access-secret".to_string(),
        refresh_token_secret: "test-refresh-secret".to_string(),
        access_token_ttl_seconds: 15 * 60,
        refresh_token_ttl_seconds: 7 * 24 * 60 * 60,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        // Tests talk plain HTTP; a Secure cookie would never come back.
        cookie_secure: false,
    }
}

pub async fn setup_test_db() -> SqlitePool {
    // A single held-open connection, or every checkout would see a brand-new
    // empty in-memory database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

pub fn create_test_app(pool: SqlitePool) -> Router {
    crate::create_router(pool, &test_config())
}

pub fn create_test_app_with_config(pool: SqlitePool, config: &Config) -> Router {
    crate::create_router(pool, config)
}

/// Serve a router on an ephemeral port for tests that need a real socket
/// (the client keeps its refresh cookie in a reqwest cookie jar).
pub async fn spawn_test_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    format!("http://{addr}")
}

pub async fn test_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: Option<HeaderMap>,
) -> (StatusCode, String, HeaderMap) {
    let body = if let Some(json) = body {
        Body::from(serde_json::to_string(&json).unwrap())
    } else {
        Body::empty()
    };

    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");

    if let Some(custom_headers) = headers {
        for (key, value) in custom_headers.iter() {
            request = request.header(key, value);
        }
    }

    let request = request.body(body).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = String::from_utf8(
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();

    (status, body, headers)
}

/// Pull the `refreshToken=...` pair out of a login response's Set-Cookie
/// header, ready to send back in a `cookie` header.
pub fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers.get_all("set-cookie").iter().find_map(|value| {
        let cookie = value.to_str().ok()?;
        if cookie.starts_with("refreshToken=") {
            cookie.split(';').next().map(|pair| pair.to_string())
        } else {
            None
        }
    })
}

/// Register a user and log in, returning the access token and the refresh
/// cookie pair.
pub async fn register_and_login(
    app: &Router,
    name: &str,
    email: &str,
    password: &str,
) -> (String, String) {
    let (status, _, _) = test_request(
        app.clone(),
        "POST",
        "/register",
        Some(serde_json::json!({ "name": name, "email": email, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body, headers) = test_request(
        app.clone(),
        "POST",
        "/login",
        Some(serde_json::json!({ "email": email, "password": password })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let response: Value = serde_json::from_str(&body).unwrap();
    let access_token = response["accessToken"].as_str().unwrap().to_string();
    let cookie = extract_refresh_cookie(&headers).expect("login sets refresh cookie");

    (access_token, cookie)
}

pub fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Authorization", format!("Bearer {token}").parse().unwrap());
    headers
}

pub fn cookie_headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("cookie", cookie.parse().unwrap());
    headers
}
