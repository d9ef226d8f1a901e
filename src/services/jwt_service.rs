// src/services/jwt_service.rs
use crate::models::jwt::{AccessClaims, RefreshClaims};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::Error as JwtError, errors::ErrorKind,
};
use tracing::instrument;
use uuid::Uuid;

/// Why verification failed. `Expired` is the only recoverable case: the
/// client reacts to it by exchanging its refresh cookie, every other failure
/// ends the session.
#[derive(Debug, PartialEq, Eq)]
pub enum TokenError {
    Expired,
    Invalid,
}

impl From<JwtError> for TokenError {
    fn from(e: JwtError) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// Signs and verifies both token classes. Access and refresh tokens use
/// independent secrets, so leaking one never compromises the other class.
#[derive(Clone)]
pub struct JwtService {
    access_enc: EncodingKey,
    access_dec: DecodingKey,
    refresh_enc: EncodingKey,
    refresh_dec: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl JwtService {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access_enc: EncodingKey::from_secret(access_secret.as_bytes()),
            access_dec: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_enc: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_dec: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /* ---------- PUBLIC API ---------- */

    /// Sign a short-lived access token. No side effects, nothing persisted.
    #[instrument(skip(self))]
    pub fn issue_access_token(&self, user_id: i64) -> Result<String, JwtError> {
        let claims = AccessClaims::new(user_id, self.access_ttl_seconds);
        encode(&Header::default(), &claims, &self.access_enc)
    }

    /// Sign a refresh token with a fresh `jti`. The caller is responsible
    /// for persisting it into the user's slot and delivering it via cookie.
    #[instrument(skip(self))]
    pub fn issue_refresh_token(&self, user_id: i64) -> Result<String, JwtError> {
        let jti = Uuid::new_v4().to_string();
        let claims = RefreshClaims::new(user_id, jti, self.refresh_ttl_seconds);
        encode(&Header::default(), &claims, &self.refresh_enc)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode_jwt(token, &self.access_dec)?;
        if claims.token_type != "access" {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode_jwt(token, &self.refresh_dec)?;
        if claims.token_type != "refresh" {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /* ---------- PRIVATE HELPERS ---------- */

    fn decode_jwt<T: serde::de::DeserializeOwned>(
        &self,
        token: &str,
        key: &DecodingKey,
    ) -> Result<T, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // The expired/invalid distinction drives the client's retry logic;
        // the default 60s leeway would blur that boundary.
        validation.leeway = 0;

        decode::<T>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(TokenError::from)
    }
}
