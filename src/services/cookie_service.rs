use axum::http::{HeaderMap, HeaderValue, header::SET_COOKIE};
use cookie::{Cookie, SameSite};
use time::Duration;

pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Builds and reads the refresh cookie. HttpOnly keeps the token away from
/// client-side script; SameSite=None because the frontend is served from a
/// different origin than the API.
#[derive(Clone)]
pub struct CookieService {
    secure: bool,
    max_age_seconds: i64,
}

impl CookieService {
    pub fn new(secure: bool, max_age_seconds: i64) -> Self {
        Self {
            secure,
            max_age_seconds,
        }
    }

    pub fn set_refresh_cookie(&self, refresh_token: &str) -> HeaderMap {
        let cookie = self.build_cookie(refresh_token, Duration::seconds(self.max_age_seconds));

        let mut headers = HeaderMap::new();
        headers.insert(
            SET_COOKIE,
            HeaderValue::from_str(&cookie.to_string()).expect("cookie is valid header value"),
        );
        headers
    }

    pub fn clear_refresh_cookie(&self) -> HeaderMap {
        // An already-expired cookie tells the browser to drop its copy.
        let cookie = self.build_cookie("", Duration::seconds(0));

        let mut headers = HeaderMap::new();
        headers.insert(
            SET_COOKIE,
            HeaderValue::from_str(&cookie.to_string()).expect("cookie is valid header value"),
        );
        headers
    }

    pub fn extract_refresh_token(headers: &HeaderMap) -> Option<String> {
        headers.get_all(axum::http::header::COOKIE).iter().find_map(|value| {
            let raw = value.to_str().ok()?;
            Cookie::split_parse(raw)
                .filter_map(|c| c.ok())
                .find(|c| c.name() == REFRESH_TOKEN_COOKIE)
                .map(|c| c.value().to_string())
        })
    }

    fn build_cookie(&self, value: &str, max_age: Duration) -> Cookie<'static> {
        Cookie::build((REFRESH_TOKEN_COOKIE, value.to_string()))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::None)
            .path("/")
            .max_age(max_age)
            .build()
    }
}
