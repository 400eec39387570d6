use crate::{config, error, info, spotify, success};

use super::token_manager;
use crate::management::RefreshPolicy;

pub async fn auth() {
    let tokens = token_manager(RefreshPolicy::Manual);

    info!("Waiting for authorization in the browser...");
    let token = match spotify::auth::authorize(&tokens).await {
        Ok(token) => token,
        Err(e) => error!("Authentication failed. Err: {}", e),
    };

    if let Err(e) = tokens.persist(&config::token_cache_path()).await {
        error!("Failed to save token to cache: {}", e);
    }

    match token.scope {
        Some(scope) => success!("Authentication successful! Granted: {}", scope),
        None => success!("Authentication successful!"),
    }
}
