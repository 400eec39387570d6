//! Error taxonomy shared by the token manager, the API client and the
//! aggregation pipeline.
//!
//! - [`AuthError`] - token acquisition or refresh failed. Fatal to any
//!   dependent operation until the user authenticates again.
//! - [`ApiError`] - a single Web API call failed. Non-fatal to an aggregation
//!   run, which records it per source or per track, unless it wraps an
//!   [`AuthError`], which ends the run.
//! - [`Error::Validation`] - bad caller input, rejected before any network call.
//! - [`Error::Busy`] - a second aggregation was started while one is running.
//!
//! None of the messages produced here contain bearer tokens or client secrets.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Transport(String),

    #[error("token endpoint rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("token response is not valid JSON: {0}")]
    Malformed(String),

    #[error("token response has no access_token field")]
    MissingAccessToken,

    #[error("no access token has been obtained yet")]
    NoToken,

    #[error("access token expired, re-authenticate or refresh it")]
    Expired,

    #[error("user token has no refresh token, authorize again")]
    RefreshUnavailable,

    #[error("authorization was not completed: {0}")]
    Authorization(String),
}

/// Coarse classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Transport,
    Http,
    Decode,
    Auth,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// DNS, TLS, timeout or connection reset.
    #[error("transport error: {detail}")]
    Transport { detail: String },

    /// The server answered with a status >= 400.
    #[error("HTTP {status}: {detail}")]
    Http {
        status: u16,
        detail: String,
        /// Seconds from the `Retry-After` header, present on 429 responses.
        retry_after: Option<u64>,
    },

    /// The response body was not the JSON we expected.
    #[error("malformed response: {detail}")]
    Decode { detail: String },

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Transport { .. } => ApiErrorKind::Transport,
            ApiError::Http { .. } => ApiErrorKind::Http,
            ApiError::Decode { .. } => ApiErrorKind::Decode,
            ApiError::Auth(_) => ApiErrorKind::Auth,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn decode(detail: impl Into<String>) -> Self {
        ApiError::Decode {
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("an aggregation is already running")]
    Busy,
}
