use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    errors::ApiError,
    services::{
        auth_service::AuthService,
        cookie_service::CookieService,
    },
};

#[derive(Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    id: i64,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    access_token: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    message: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let id = auth_service
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(Json(RegisterResponse { id }))
}

/// The refresh token travels only in the Set-Cookie header; the JSON body
/// carries nothing but the access token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AccessTokenResponse>), ApiError> {
    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let tokens = auth_service.login(&payload.email, &payload.password).await?;

    let headers = state.cookies.set_refresh_cookie(&tokens.refresh_token);

    Ok((
        headers,
        Json(AccessTokenResponse {
            access_token: tokens.access_token,
        }),
    ))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let cookie_token =
        CookieService::extract_refresh_token(&headers).ok_or(ApiError::MissingRefreshToken)?;

    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let access_token = auth_service.refresh(&cookie_token).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<MessageResponse>), ApiError> {
    let cookie_token = CookieService::extract_refresh_token(&headers);

    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    auth_service.logout(cookie_token.as_deref()).await?;

    Ok((
        state.cookies.clear_refresh_cookie(),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}
