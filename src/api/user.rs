use axum::{
    Json,
    extract::{Extension, State},
};
use serde::Serialize;

use crate::{
    AppState,
    errors::ApiError,
    middleware::auth::AuthUser,
    services::auth_service::AuthService,
};

#[derive(Serialize)]
pub struct UserResponse {
    id: i64,
    name: String,
    email: String,
}

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<UserResponse>, ApiError> {
    let auth_service = AuthService::new(state.pool.clone(), state.jwt.clone());
    let user = auth_service.current_user(user_id).await?;

    Ok(Json(UserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}
