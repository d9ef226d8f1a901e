//! HTTP client for the taskdeck API with transparent session continuity.
//!
//! The client keeps the access token in memory and the refresh token in its
//! cookie jar (the server sets it HttpOnly). When a request is rejected with
//! `TOKEN_EXPIRED`, the client performs a single refresh exchange and replays
//! the request with the new token. Concurrent expiries coalesce: the first
//! caller drives the exchange, everyone else queues on it and replays with
//! the same token once it lands.

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, DNS, body decode).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-auth error status.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The session could not be continued: refresh failed, or the server
    /// rejected the credentials outright. The caller must log in again.
    #[error("session expired")]
    SessionExpired,
}

/// Mutable session state behind one lock. `waiters` holds the continuations
/// of requests that hit expiry while a refresh exchange was already running;
/// they are resolved (or rejected) in order when the exchange settles.
struct Session {
    access_token: Option<String>,
    refresh_in_flight: bool,
    waiters: Vec<oneshot::Sender<Result<String, ()>>>,
}

impl Session {
    fn new() -> Self {
        Self {
            access_token: None,
            refresh_in_flight: false,
            waiters: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<Mutex<Session>>,
    on_session_expired: Option<Arc<dyn Fn() + Send + Sync>>,
}

pub struct ApiClientBuilder {
    base_url: Option<String>,
    on_session_expired: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl ApiClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            on_session_expired: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Called once whenever the session ends for good (failed refresh or a
    /// non-recoverable 401). The UI layer hangs its navigate-to-login here.
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<ApiClient, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(ApiClient {
            base_url: self.base_url.unwrap_or_else(|| "http://localhost:3000".to_string()),
            http,
            session: Arc::new(Mutex::new(Session::new())),
            on_session_expired: self.on_session_expired,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /* ---------- SESSION ---------- */

    pub async fn login(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/login", self.base_url))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: AccessTokenResponse = Self::into_json(response).await?;
        self.session.lock().await.access_token = Some(body.access_token);
        Ok(())
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/register", self.base_url))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;

        Self::into_json::<Value>(response).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self
            .http
            .post(format!("{}/logout", self.base_url))
            .send()
            .await?;

        self.session.lock().await.access_token = None;
        Self::into_json::<Value>(response).await?;
        Ok(())
    }

    pub async fn access_token(&self) -> Option<String> {
        self.session.lock().await.access_token.clone()
    }

    pub async fn set_access_token(&self, token: Option<String>) {
        self.session.lock().await.access_token = token;
    }

    /* ---------- API SURFACE ---------- */

    pub async fn me(&self) -> Result<UserInfo, ClientError> {
        self.request(Method::GET, "/me", None).await
    }

    pub async fn tasks(&self) -> Result<Vec<TaskItem>, ClientError> {
        self.request(Method::GET, "/tasks", None).await
    }

    pub async fn create_task(&self, title: &str) -> Result<TaskItem, ClientError> {
        self.request(Method::POST, "/tasks", Some(json!({ "title": title })))
            .await
    }

    pub async fn update_task(
        &self,
        id: i64,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> Result<TaskItem, ClientError> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".to_string(), json!(title));
        }
        if let Some(completed) = completed {
            body.insert("completed".to_string(), json!(completed));
        }

        self.request(Method::PUT, &format!("/tasks/{id}"), Some(Value::Object(body)))
            .await
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), ClientError> {
        self.request::<Value>(Method::DELETE, &format!("/tasks/{id}"), None)
            .await?;
        Ok(())
    }

    /* ---------- CORE ---------- */

    /// Send a request with the current bearer token, refreshing and retrying
    /// once when the server reports the access token expired. Any other 401
    /// ends the session without a refresh attempt.
    async fn request<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let token = self.access_token().await;
        let response = self.send(&method, path, body.as_ref(), token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Self::into_json(response).await;
        }

        let code = Self::unauthorized_code(response).await;
        if code.as_deref() != Some("TOKEN_EXPIRED") {
            self.expire_session().await;
            return Err(ClientError::SessionExpired);
        }

        debug!(path, "access token expired, refreshing");
        let new_token = self.refresh_access_token().await?;

        // One retry only. If the server still says 401 with the fresh token,
        // the session is beyond saving.
        let retry = self
            .send(&method, path, body.as_ref(), Some(&new_token))
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            self.expire_session().await;
            return Err(ClientError::SessionExpired);
        }

        Self::into_json(retry).await
    }

    /// Single-flight refresh exchange. The caller that flips
    /// `refresh_in_flight` performs the HTTP call; every concurrent caller
    /// parks on a oneshot and is handed the same new token (or the failure).
    async fn refresh_access_token(&self) -> Result<String, ClientError> {
        let pending = {
            let mut session = self.session.lock().await;
            if session.refresh_in_flight {
                let (tx, rx) = oneshot::channel();
                session.waiters.push(tx);
                Some(rx)
            } else {
                session.refresh_in_flight = true;
                None
            }
        };

        if let Some(rx) = pending {
            return match rx.await {
                Ok(Ok(token)) => Ok(token),
                _ => Err(ClientError::SessionExpired),
            };
        }

        let result = self.exchange_refresh_token().await;

        // The flag clears whichever way the exchange settled.
        let mut session = self.session.lock().await;
        session.refresh_in_flight = false;

        match result {
            Ok(token) => {
                session.access_token = Some(token.clone());
                for waiter in session.waiters.drain(..) {
                    let _ = waiter.send(Ok(token.clone()));
                }
                Ok(token)
            }
            Err(err) => {
                warn!(error = %err, "refresh exchange failed");
                session.access_token = None;
                for waiter in session.waiters.drain(..) {
                    let _ = waiter.send(Err(()));
                }
                drop(session);
                self.fire_session_expired();
                Err(err)
            }
        }
    }

    /// POST /refresh-token. The cookie jar supplies the HttpOnly refresh
    /// cookie; the response body carries the new access token.
    async fn exchange_refresh_token(&self) -> Result<String, ClientError> {
        let response = self
            .http
            .post(format!("{}/refresh-token", self.base_url))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::SessionExpired);
        }

        let body: AccessTokenResponse = response.json().await?;
        Ok(body.access_token)
    }

    async fn send(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    async fn expire_session(&self) {
        self.session.lock().await.access_token = None;
        self.fire_session_expired();
    }

    fn fire_session_expired(&self) {
        if let Some(hook) = &self.on_session_expired {
            hook();
        }
    }

    async fn unauthorized_code(response: reqwest::Response) -> Option<String> {
        let body: Value = response.json().await.ok()?;
        body.get("code")
            .and_then(|c| c.as_str())
            .map(|c| c.to_string())
    }

    async fn into_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.as_str())
                    .map(|e| e.to_string())
            })
            .unwrap_or_else(|| status.to_string());

        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
