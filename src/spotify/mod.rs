//! # Spotify Integration Module
//!
//! This module is the integration layer between spotmerge and the Spotify Web
//! API. It owns request execution, response interpretation and the
//! authorization-code browser flow; higher layers (the aggregator in
//! [`crate::management`] and the CLI) only deal in domain values.
//!
//! ## Architecture
//!
//! ```text
//! CLI / PlaylistAggregator
//!          ↓
//! Domain operations (playlist, playback)
//!          ↓
//! Executor trait ── ApiClient (reqwest, bearer from TokenManager)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Submodules
//!
//! - [`client`] - [`client::Executor`], the seam every domain operation goes
//!   through, and [`client::ApiClient`], its reqwest implementation. The
//!   client attaches the bearer token, encodes JSON bodies, bounds every call
//!   with a timeout and classifies failures as transport, HTTP or decode
//!   errors. It never retries; a 429 surfaces with its `Retry-After` value so
//!   the caller can decide.
//! - [`extract`] - pure functions turning raw payloads into track ids,
//!   playlist ids, [`crate::types::Track`] and [`crate::types::Device`]
//!   values.
//! - [`playlist`] - playlist and track reads, playlist creation, adding
//!   tracks. Listings are followed across `next` pages.
//! - [`playback`] - play, pause, resume, volume and now-playing commands with
//!   explicit device selection.
//! - [`auth`] - authorization-code flow: authorize URL, local callback server,
//!   browser launch and code exchange.
//!
//! ## Endpoints
//!
//! - `POST /api/token` - client-credentials, authorization-code and refresh
//!   grants (handled by [`crate::management::TokenManager`])
//! - `GET /v1/tracks/{id}`, `GET /v1/playlists/{id}`
//! - `POST /v1/users/{user_id}/playlists`, `POST /v1/playlists/{id}/tracks`
//! - `GET /v1/me`, `GET /v1/me/player/devices`,
//!   `GET /v1/me/player/currently-playing`
//! - `PUT /v1/me/player/play`, `PUT /v1/me/player/pause`,
//!   `PUT /v1/me/player/volume`
//!
//! ## Usage
//!
//! ```rust,ignore
//! let tokens = Arc::new(TokenManager::from_config()?);
//! tokens.client_credentials_token().await?;
//!
//! let api = ApiClient::from_config(Arc::clone(&tokens))?;
//! let track = spotify::playlist::get_track(&api, "4uLU6hMCjMI75M1A2tKUQC").await?;
//! println!("{} - {}", track.name, track.artist_line());
//! ```
//!
//! ## Security
//!
//! - Bearer tokens only ever travel in the `Authorization` header; error
//!   details are built from status codes and response bodies, never from the
//!   outgoing request.
//! - Artwork downloads go to the image CDN without a bearer token.

pub mod auth;
pub mod client;
pub mod extract;
pub mod playback;
pub mod playlist;
