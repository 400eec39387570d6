//! # CLI Module
//!
//! User-facing commands of spotmerge. Each command builds what it needs from
//! configuration (token manager, API client, aggregator), runs, and reports
//! with the crate's console macros. Fatal setup problems end the process via
//! [`crate::error!`]; per-item problems during a merge are reported, not fatal.
//!
//! ## Commands
//!
//! - [`auth`] - authorization-code flow in the browser, caches the user token
//! - [`merge`] - merges the playlists listed in a CSV export into one
//!   playlist and prints a per-source report
//! - [`tracks`] - lists the tracks of a playlist URL using an app-only token
//! - [`play`], [`pause`], [`resume`], [`volume`] - playback control
//! - [`now_playing`] - shows the current track, optionally polling
//! - [`devices`] - lists Spotify Connect devices
//!
//! ## Sessions
//!
//! Commands that act on the user's account restore the token cached by
//! `spotmerge auth` and refresh it when it has expired, writing the renewed
//! token back to the cache. Read-only catalogue commands use the
//! client-credentials grant and never touch the cache.

mod auth;
mod merge;
mod playback;
mod tracks;

use std::sync::Arc;

use crate::{
    config, error,
    management::{RefreshPolicy, TokenManager},
    spotify::client::ApiClient,
    warning,
};

pub use auth::auth;
pub use merge::merge;
pub use playback::devices;
pub use playback::now_playing;
pub use playback::pause;
pub use playback::play;
pub use playback::resume;
pub use playback::volume;
pub use tracks::tracks;

pub(crate) struct Session {
    pub tokens: Arc<TokenManager>,
    pub api: Arc<ApiClient>,
}

impl Session {
    /// Writes the (possibly refreshed) user token back to the cache.
    pub async fn save(&self) {
        if let Err(e) = self.tokens.persist(&config::token_cache_path()).await {
            warning!("Failed to update cached token: {}", e);
        }
    }
}

fn token_manager(policy: RefreshPolicy) -> TokenManager {
    match TokenManager::from_config() {
        Ok(tokens) => tokens.with_refresh_policy(policy),
        Err(e) => error!("Cannot configure Spotify credentials. Err: {}", e),
    }
}

fn session(tokens: TokenManager) -> Session {
    let tokens = Arc::new(tokens);
    match ApiClient::from_config(Arc::clone(&tokens)) {
        Ok(api) => Session {
            tokens,
            api: Arc::new(api),
        },
        Err(e) => error!("Cannot build HTTP client. Err: {}", e),
    }
}

pub(crate) async fn user_session() -> Session {
    let tokens = token_manager(RefreshPolicy::OnExpiry);
    if let Err(e) = tokens.restore(&config::token_cache_path()).await {
        error!(
            "Failed to load token. Please run spotmerge auth\n Error: {}",
            e
        );
    }
    session(tokens)
}

pub(crate) async fn app_session() -> Session {
    let tokens = token_manager(RefreshPolicy::OnExpiry);
    if let Err(e) = tokens.client_credentials_token().await {
        error!("Failed to obtain an app token. Err: {}", e);
    }
    session(tokens)
}
