use axum::{
    Json, Router,
    http::{HeaderValue, Method, header},
    routing::{get, post, put},
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod services;
#[cfg(test)]
mod tests;

use config::Config;
use services::{cookie_service::CookieService, jwt_service::JwtService};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: JwtService,
    pub cookies: CookieService,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

async fn hello_world() -> Json<Message> {
    Json(Message {
        message: "Backend running successfully".to_string(),
    })
}

pub fn create_router(pool: SqlitePool, config: &Config) -> Router {
    let state = AppState {
        pool,
        jwt: JwtService::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_seconds,
            config.refresh_token_ttl_seconds,
        ),
        cookies: CookieService::new(config.cookie_secure, config.refresh_token_ttl_seconds),
    };

    // Frontend and backend live on different origins, so the refresh cookie
    // only works with concrete origins and credentials enabled.
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let protected = Router::new()
        .route("/me", get(api::user::get_current_user))
        .route(
            "/tasks",
            get(api::task::list_tasks).post(api::task::create_task),
        )
        .route(
            "/tasks/:id",
            put(api::task::update_task).delete(api::task::delete_task),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    Router::new()
        .route("/", get(hello_world))
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/refresh-token", post(api::auth::refresh_token))
        .route("/logout", post(api::auth::logout))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
