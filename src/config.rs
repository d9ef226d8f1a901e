use dotenv::dotenv;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,

    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,

    /// Frontend and backend run on different origins, so the CORS layer
    /// must echo a concrete origin and allow credentials.
    pub allowed_origins: Vec<String>,

    /// The refresh cookie is Secure in production; plain-HTTP dev and test
    /// servers need this off or the cookie is never sent back.
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:taskdeck.db".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").expect("ACCESS_TOKEN_SECRET must be set");
        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").expect("REFRESH_TOKEN_SECRET must be set");

        let access_token_ttl_seconds = env::var("ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15 * 60);

        let refresh_token_ttl_seconds = env::var("REFRESH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 60 * 60);

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let cookie_secure = env::var("COOKIE_SECURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true);

        Self {
            database_url,
            port,
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            allowed_origins,
            cookie_secure,
        }
    }
}
