use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::{types::AuthCallbackState, warning};

/// Receives the redirect from the Spotify authorize page and stores the
/// authorization code for the waiting flow. The token exchange itself is done
/// by the token manager, not here.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<AuthCallbackState>>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;
    let Some(pending) = state.as_mut() else {
        return Html("<h4>No authorization in progress.</h4>");
    };

    if params.get("state") != Some(&pending.expected_state) {
        warning!("Ignoring callback with unexpected state parameter");
        return Html("<h4>State mismatch, login rejected.</h4>");
    }

    if let Some(error) = params.get("error") {
        pending.error = Some(error.clone());
        return Html("<h4>Login failed.</h4>");
    }

    match params.get("code") {
        Some(code) => {
            pending.code = Some(code.clone());
            Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
