//! Configuration management for spotmerge.
//!
//! Values come from environment variables, optionally loaded from a `.env`
//! file in the platform-specific local data directory
//! (`~/.local/share/spotmerge/.env` on Linux). Each setting has one accessor.
//! Credentials have no default and are returned as `Result`; endpoints,
//! timeouts and paths fall back to sensible defaults.

use std::{env, path::PathBuf, time::Duration};

use crate::types::Credentials;

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:3000/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_SCOPE: &str = "playlist-modify-private playlist-modify-public user-read-playback-state user-modify-playback-state user-read-currently-playing";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

/// Loads environment variables from `spotmerge/.env` in the local data
/// directory. A missing file is not an error; variables may come from the
/// process environment instead.
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(_)) => Ok(()),
        Err(e) => Err(format!("Failed to parse {}: {}", path.display(), e)),
    }
}

/// Root directory for everything spotmerge writes locally.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotmerge");
    path
}

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("{} must be set", name))
}

fn or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn secs_or_default(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

pub fn spotify_client_id() -> Result<String, String> {
    required("SPOTIFY_API_AUTH_CLIENT_ID")
}

/// The client secret. Never log the returned value.
pub fn spotify_client_secret() -> Result<String, String> {
    required("SPOTIFY_API_AUTH_CLIENT_SECRET")
}

pub fn credentials() -> Result<Credentials, String> {
    Ok(Credentials::new(spotify_client_id()?, spotify_client_secret()?))
}

/// Must match a redirect URI registered in the Spotify dashboard.
pub fn spotify_redirect_uri() -> String {
    or_default("SPOTIFY_API_REDIRECT_URI", DEFAULT_REDIRECT_URI)
}

pub fn spotify_scope() -> String {
    or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE)
}

pub fn spotify_apiauth_url() -> String {
    or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL)
}

pub fn spotify_apitoken_url() -> String {
    or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL)
}

/// Base URL of the Web API, without the `/v1` version segment.
pub fn spotify_apiurl() -> String {
    or_default("SPOTIFY_API_URL", DEFAULT_API_URL)
}

/// Address the local OAuth callback server binds to.
pub fn server_addr() -> String {
    or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS)
}

/// Upper bound for every network call.
pub fn request_timeout() -> Duration {
    secs_or_default("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)
}

pub fn poll_interval() -> Duration {
    secs_or_default("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)
}

pub fn artwork_dir() -> PathBuf {
    env::var("ARTWORK_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join("artwork"))
}

pub fn token_cache_path() -> PathBuf {
    data_dir().join("cache/token.json")
}
