use std::fmt;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Seconds before the nominal expiry at which a token is treated as expired.
pub const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub value: String,
    pub obtained_at: u64,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AccessToken {
    pub fn expires_at(&self) -> u64 {
        self.obtained_at + self.expires_in
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at().saturating_sub(EXPIRY_MARGIN_SECS)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp() as u64)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    pub album_image_url: Option<String>,
}

impl Track {
    /// Artists joined the way the player shows them, e.g. `"A, B"`.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }

    pub fn uri(&self) -> String {
        track_uri(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub source_url: Option<String>,
    pub track_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub volume_percent: u8,
    pub is_active: bool,
}

/// One row of the source list: a display name and the playlist URL to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlaylist {
    pub display_name: String,
    pub playlist_url: String,
}

impl SourcePlaylist {
    pub fn new(display_name: impl Into<String>, playlist_url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            playlist_url: playlist_url.into(),
        }
    }
}

/// Shared between the authorization flow and the local callback handler.
#[derive(Debug, Clone)]
pub struct AuthCallbackState {
    pub expected_state: String,
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uris: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_uri: Option<String>,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub name: String,
    pub artists: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct DeviceTableRow {
    pub name: String,
    pub id: String,
    pub volume: String,
    pub active: String,
}

#[derive(Tabled)]
pub struct SourceReportRow {
    pub source: String,
    pub status: String,
    pub added: usize,
    pub failed: usize,
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

pub fn playlist_uri(playlist_id: &str) -> String {
    format!("spotify:playlist:{}", playlist_id)
}
