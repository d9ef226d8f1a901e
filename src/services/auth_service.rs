use bcrypt::{DEFAULT_COST, hash, verify};
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use crate::errors::ApiError;
use crate::models::jwt::TokenPair;
use crate::models::user::User;
use crate::services::jwt_service::{JwtService, TokenError};

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(pool: SqlitePool, jwt: JwtService) -> Self {
        Self { pool, jwt }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, ApiError> {
        let name = name.trim();
        let email = email.trim().to_lowercase();

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "name, email and password are required".to_string(),
            ));
        }

        if User::find_by_email(&self.pool, &email).await?.is_some() {
            return Err(ApiError::EmailTaken);
        }

        let password_hash =
            hash(password, DEFAULT_COST).map_err(|_| ApiError::PasswordHashError)?;

        let user = User::create(&self.pool, name, &email, &password_hash).await?;
        info!(user_id = user.id, "registered new user");

        Ok(user.id)
    }

    /// Issue both tokens and persist the refresh token into the user's slot,
    /// superseding any refresh token from an earlier login.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let user = User::find_by_email(&self.pool, &email.trim().to_lowercase())
            .await?
            .ok_or(ApiError::UserNotFound)?;

        let password_matches =
            verify(password, &user.password_hash).map_err(|_| ApiError::PasswordHashError)?;

        if !password_matches {
            return Err(ApiError::InvalidCredentials);
        }

        let access_token = self.jwt.issue_access_token(user.id)?;
        let refresh_token = self.jwt.issue_refresh_token(user.id)?;

        User::set_refresh_token(&self.pool, user.id, Some(&refresh_token)).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh cookie for a new access token. The refresh token
    /// itself is not rotated; the slot changes only on login and logout.
    #[instrument(skip(self, cookie_token))]
    pub async fn refresh(&self, cookie_token: &str) -> Result<String, ApiError> {
        let claims = self
            .jwt
            .verify_refresh_token(cookie_token)
            .map_err(|_| ApiError::InvalidRefreshToken)?;

        let user = User::find_by_id(&self.pool, claims.sub)
            .await?
            .ok_or(ApiError::InvalidRefreshToken)?;

        // A cryptographically valid token is still rejected unless it is
        // byte-for-byte the one stored for this user. Anything superseded by
        // a later login, or cleared by logout, dies here.
        if user.refresh_token.as_deref() != Some(cookie_token) {
            warn!(user_id = user.id, "refresh token mismatch");
            return Err(ApiError::TokenMismatch);
        }

        Ok(self.jwt.issue_access_token(user.id)?)
    }

    /// Clear the refresh-token slot. Idempotent: an absent or invalid cookie
    /// is treated as already logged out.
    pub async fn logout(&self, cookie_token: Option<&str>) -> Result<(), ApiError> {
        if let Some(token) = cookie_token {
            if let Ok(claims) = self.jwt.verify_refresh_token(token) {
                User::set_refresh_token(&self.pool, claims.sub, None).await?;
                info!(user_id = claims.sub, "logged out");
            }
        }

        Ok(())
    }

    /// Validate a bearer access token for the request middleware.
    pub fn verify_access(&self, token: &str) -> Result<i64, ApiError> {
        match self.jwt.verify_access_token(token) {
            Ok(claims) => Ok(claims.sub),
            Err(TokenError::Expired) => Err(ApiError::TokenExpired),
            Err(TokenError::Invalid) => Err(ApiError::InvalidToken),
        }
    }

    pub async fn current_user(&self, user_id: i64) -> Result<User, ApiError> {
        User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(ApiError::UserNotFound)
    }
}
