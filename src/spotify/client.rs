use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client, Method, Response, StatusCode,
    header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER},
};
use serde::Serialize;
use serde_json::Value;

use crate::{config, error::ApiError, management::TokenManager};

/// A single Web API call, relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    /// Serializes `body` into the request. Fails with a decode error when the
    /// value cannot be represented as JSON.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::decode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    fn is_write(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }
}

/// The seam between domain operations and the network. [`ApiClient`] is the
/// real implementation; tests substitute a recording fake.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Runs one authenticated request and returns its decoded JSON body.
    /// An empty body decodes to `Value::Null`.
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError>;

    /// Downloads raw bytes from an absolute URL (album artwork). No bearer
    /// token is attached.
    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
}

impl ApiClient {
    pub fn new(http: Client, base_url: impl Into<String>, tokens: Arc<TokenManager>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            tokens,
        }
    }

    /// Client with the configured base URL and a bounded per-request timeout.
    pub fn from_config(tokens: Arc<TokenManager>) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(config::request_timeout())
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self::new(http, config::spotify_apiurl(), tokens))
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// `path` is either relative (`/v1/...`) or an absolute URL that already
    /// points at the API, as found in pagination `next` links. Absolute URLs
    /// anywhere else are refused before the bearer token is attached.
    fn url_for(&self, path: &str) -> Result<String, ApiError> {
        let under_base = path
            .strip_prefix(self.base_url.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']));
        if under_base {
            return Ok(path.to_string());
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Err(ApiError::decode(
                "refusing to follow a link outside the API base URL",
            ));
        }
        Ok(format!("{}{}", self.base_url, path))
    }
}

#[async_trait]
impl Executor for ApiClient {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.url_for(&request.path)?;
        let bearer = self.tokens.bearer().await?;
        let is_write = request.is_write();

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(AUTHORIZATION, format!("Bearer {}", bearer));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        builder = match &request.body {
            Some(body) => builder.json(body),
            None if is_write => builder
                .header(CONTENT_TYPE, "application/json")
                .header(CONTENT_LENGTH, "0"),
            None => builder,
        };

        let response = builder.send().await.map_err(transport_error)?;
        decode_response(response).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                detail: status.canonical_reason().unwrap_or("").to_string(),
                retry_after: None,
            });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    // the URL may carry query parameters; the detail only needs the cause
    ApiError::Transport {
        detail: err.without_url().to_string(),
    }
}

async fn decode_response(response: Response) -> Result<Value, ApiError> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let body = response.text().await.map_err(transport_error)?;

    if status.is_client_error() || status.is_server_error() {
        return Err(ApiError::Http {
            status: status.as_u16(),
            detail: parse_spotify_error(status, &body),
            retry_after,
        });
    }

    if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body).map_err(|e| ApiError::decode(e.to_string()))
}

/// Turns a Spotify error body (`{"error": {"status", "message"}}`) into a
/// short message, falling back to the raw text or the status reason.
pub(crate) fn parse_spotify_error(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json["error"]["message"].as_str() {
            return message.to_string();
        }
        if let Some(message) = json["error"].as_str() {
            return message.to_string();
        }
    }

    let text = body.trim();
    if text.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        text.to_string()
    }
}
