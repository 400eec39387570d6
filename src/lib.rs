//! Spotify Playlist Merge Library
//!
//! This library provides a Spotify Web API client and a playlist aggregation
//! pipeline: it reads a list of source playlists, fetches their tracks, saves
//! album artwork locally, and appends every track to one destination
//! playlist. Failures of a single source or track are recorded and reported
//! instead of aborting the run.
//!
//! # Modules
//!
//! - `api` - HTTP API endpoints for the local callback server
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error types shared by the client and the pipeline
//! - `management` - Token management, source lists, artwork and aggregation
//! - `server` - Local HTTP server for OAuth callbacks
//! - `spotify` - Spotify Web API client implementation
//! - `types` - Data structures and type definitions
//!
//! # Example
//!
//! ```
//! use spotmerge::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> spotmerge::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the outer edges (binary, helpers) where the concrete error type
/// does not matter. Library operations return the typed errors in
/// [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Merging {} playlists...", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Created playlist {}", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for fatal errors in the command layer. Library code returns errors
/// instead.
///
/// # Example
///
/// ```
/// error!("Missing required environment variable: {}", var_name);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable problems such as a track that could not be added or
/// artwork that could not be saved.
///
/// # Example
///
/// ```
/// warning!("Artwork for {} not saved: {}", track_id, cause);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
