use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::types::AuthCallbackState;

pub async fn health(
    Extension(shared_state): Extension<Arc<Mutex<Option<AuthCallbackState>>>>,
) -> Json<Value> {
    let authorization = match shared_state.lock().await.as_ref() {
        None => "idle",
        Some(pending) if pending.code.is_some() => "received",
        Some(pending) if pending.error.is_some() => "failed",
        Some(_) => "pending",
    };

    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "authorization": authorization,
    }))
}
