use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::{
    config,
    error::AuthError,
    types::{AccessToken, Credentials, TokenResponse},
};

const DEFAULT_EXPIRES_IN: u64 = 3600;

/// What the manager does when a caller asks for a bearer token and the
/// current one has expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Reject with [`AuthError::Expired`]; the caller decides when to refresh.
    #[default]
    Manual,
    /// Call [`TokenManager::refresh`] once and hand out the new token.
    OnExpiry,
}

pub struct TokenManager {
    credentials: Credentials,
    token_url: String,
    http: Client,
    policy: RefreshPolicy,
    token: RwLock<Option<AccessToken>>,
    /// Held while an expired token is being renewed by `bearer`.
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(credentials: Credentials, token_url: impl Into<String>, http: Client) -> Self {
        TokenManager {
            credentials,
            token_url: token_url.into(),
            http,
            policy: RefreshPolicy::default(),
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Builds a manager from the environment: credentials, token endpoint and
    /// request timeout.
    pub fn from_config() -> Result<Self, String> {
        let http = Client::builder()
            .timeout(config::request_timeout())
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self::new(
            config::credentials()?,
            config::spotify_apitoken_url(),
            http,
        ))
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_token(self, token: AccessToken) -> Self {
        TokenManager {
            token: RwLock::new(Some(token)),
            ..self
        }
    }

    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    pub async fn client_credentials_token(&self) -> Result<AccessToken, AuthError> {
        let token = self
            .token_request(&[("grant_type", "client_credentials")], None)
            .await?;
        self.replace(token.clone()).await;
        Ok(token)
    }

    pub async fn authorization_code_token(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<AccessToken, AuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        let token = self.token_request(&params, None).await?;
        self.replace(token.clone()).await;
        Ok(token)
    }

    /// Renews the current token. Uses the refresh-token grant when the
    /// current token carries one. An app token is renewed by repeating the
    /// client-credentials grant; a user token without a refresh token fails
    /// with [`AuthError::RefreshUnavailable`].
    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        let (refresh_token, user_token) = match self.token.read().await.as_ref() {
            Some(t) => (t.refresh_token.clone(), t.scope.is_some()),
            None => (None, false),
        };

        let token = match refresh_token {
            None if user_token => return Err(AuthError::RefreshUnavailable),
            Some(refresh) => {
                let params = [
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh.as_str()),
                ];
                // Spotify doesn't always rotate the refresh token
                self.token_request(&params, Some(refresh.clone())).await?
            }
            None => {
                self.token_request(&[("grant_type", "client_credentials")], None)
                    .await?
            }
        };

        self.replace(token.clone()).await;
        Ok(token)
    }

    pub async fn current_token(&self) -> Result<AccessToken, AuthError> {
        self.token.read().await.clone().ok_or(AuthError::NoToken)
    }

    /// The value to put behind `Bearer`. Never returns an expired token.
    /// Concurrent callers that find the token expired share one refresh.
    pub async fn bearer(&self) -> Result<String, AuthError> {
        let token = self.current_token().await?;
        if !token.is_expired() {
            return Ok(token.value);
        }
        if self.policy == RefreshPolicy::Manual {
            return Err(AuthError::Expired);
        }

        let _refreshing = self.refresh_lock.lock().await;
        // another caller may have renewed it while we waited
        let token = self.current_token().await?;
        if !token.is_expired() {
            return Ok(token.value);
        }
        Ok(self.refresh().await?.value)
    }

    pub async fn persist(&self, path: &Path) -> Result<(), String> {
        let token = self.current_token().await.map_err(|e| e.to_string())?;
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&token).map_err(|e| e.to_string())?;
        async_fs::write(path, json)
            .await
            .map_err(|e| e.to_string())
    }

    pub async fn restore(&self, path: &Path) -> Result<AccessToken, String> {
        let content = async_fs::read_to_string(path)
            .await
            .map_err(|e| e.to_string())?;
        let token: AccessToken = serde_json::from_str(&content).map_err(|e| e.to_string())?;
        self.replace(token.clone()).await;
        Ok(token)
    }

    async fn replace(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    fn basic_auth_header(&self) -> String {
        let credentials = format!(
            "{}:{}",
            self.credentials.client_id, self.credentials.client_secret
        );
        format!("Basic {}", STANDARD.encode(credentials))
    }

    async fn token_request(
        &self,
        params: &[(&str, &str)],
        previous_refresh: Option<String>,
    ) -> Result<AccessToken, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, self.basic_auth_header())
            .form(params)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                detail: token_error_detail(&body),
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::Malformed(e.to_string()))?;

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        Ok(AccessToken {
            value,
            obtained_at: Utc::now().timestamp() as u64,
            expires_in: parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            refresh_token: parsed.refresh_token.or(previous_refresh),
            scope: parsed.scope,
        })
    }
}

/// Pulls `error_description` (or `error`) out of an OAuth error body.
fn token_error_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json["error_description"]
            .as_str()
            .or_else(|| json["error"].as_str())
            .unwrap_or(body)
            .to_string(),
        Err(_) => body.trim().to_string(),
    }
}
