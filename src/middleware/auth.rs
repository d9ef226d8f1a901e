use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, errors::ApiError, services::auth_service::AuthService};

/// Authenticated user id, injected into request extensions for handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

/// Rejections carry a machine-readable `code` (NO_TOKEN, TOKEN_EXPIRED,
/// INVALID_TOKEN); clients refresh-and-retry only on TOKEN_EXPIRED.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::NoToken)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::NoToken)?;

    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let user_id = auth_service.verify_access(token)?;

    request.extensions_mut().insert(AuthUser(user_id));

    Ok(next.run(request).await)
}
