use std::{sync::Arc, time::Duration};

use rand::{Rng, distr::Alphanumeric};
use reqwest::Url;
use tokio::sync::Mutex;

use crate::{
    config,
    error::AuthError,
    management::TokenManager,
    server::start_api_server,
    types::{AccessToken, AuthCallbackState},
    warning,
};

/// How long the user gets to approve access in the browser.
pub const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Random value echoed back by the authorize page, used to reject callbacks
/// that were not started by this process.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

pub fn authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> Result<String, AuthError> {
    let url = Url::parse_with_params(
        auth_url,
        &[
            ("client_id", client_id),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("scope", scope),
            ("state", state),
        ],
    )
    .map_err(|e| AuthError::Authorization(format!("invalid authorize URL: {}", e)))?;
    Ok(url.to_string())
}

/// Runs the authorization-code flow end to end.
///
/// 1. Starts the local callback server on the configured address
/// 2. Opens the authorize page in the default browser (or prints the URL)
/// 3. Waits for the redirect to deliver a code
/// 4. Exchanges the code through `tokens`, which then holds the user token
///
/// The callback server is shut down before returning.
pub async fn authorize(tokens: &TokenManager) -> Result<AccessToken, AuthError> {
    let redirect_uri = config::spotify_redirect_uri();
    let state = generate_state();
    let auth_url = authorize_url(
        &config::spotify_apiauth_url(),
        tokens.client_id(),
        &redirect_uri,
        &config::spotify_scope(),
        &state,
    )?;

    let shared_state = Arc::new(Mutex::new(Some(AuthCallbackState {
        expected_state: state,
        code: None,
        error: None,
    })));

    let server_state = Arc::clone(&shared_state);
    let addr = config::server_addr();
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(&addr, server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let code = wait_for_code(Arc::clone(&shared_state), AUTHORIZATION_TIMEOUT).await;
    server.abort();

    tokens
        .authorization_code_token(&code?, &redirect_uri)
        .await
}

/// Polls the shared callback state until a code or an error
/// arrives, or `max_wait` elapses.
pub async fn wait_for_code(
    shared_state: Arc<Mutex<Option<AuthCallbackState>>>,
    max_wait: Duration,
) -> Result<String, AuthError> {
    use std::time::Instant;

    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(pending) = lock.as_ref() {
            if let Some(code) = &pending.code {
                return Ok(code.clone());
            }
            if let Some(error) = &pending.error {
                return Err(AuthError::Authorization(error.clone()));
            }
        }
        drop(lock);
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    Err(AuthError::Authorization("timed out waiting for the callback".to_string()))
}
