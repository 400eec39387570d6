use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{api, types::AuthCallbackState};

pub fn router(state: Arc<Mutex<Option<AuthCallbackState>>>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback))
        .layer(Extension(state))
}

/// Serves the callback router on `addr` until the task is aborted.
pub async fn start_api_server(
    addr: &str,
    state: Arc<Mutex<Option<AuthCallbackState>>>,
) -> Result<(), String> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| format!("Failed to parse server address {}: {}", addr, e))?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    axum::serve(listener, router(state))
        .await
        .map_err(|e| e.to_string())
}
