//! # API Module
//!
//! HTTP endpoints served by the local callback server during the
//! authorization-code flow.
//!
//! - [`callback`] - receives Spotify's redirect, checks the `state`
//!   parameter and hands the authorization code to the waiting flow.
//! - [`health`] - reports status and version, handy for checking that the
//!   server came up on the configured address.
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use spotmerge::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
