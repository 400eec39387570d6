use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    error,
    spotify::{extract, playlist},
    types::TrackTableRow,
    warning,
};

use super::app_session;

/// Lists the tracks of a playlist URL. Only needs an app token, so it works
/// before `spotmerge auth` has been run.
pub async fn tracks(url: &str) {
    let Some(playlist_id) = extract::extract_playlist_id(url) else {
        error!("Not a playlist URL: {}", url);
    };

    let session = app_session().await;
    let api = session.api.as_ref();

    let pb = ProgressBar::new_spinner();
    pb.set_message("Fetching playlist...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let track_ids = match playlist::get_playlist_track_ids(api, &playlist_id).await {
        Ok(ids) => ids,
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch playlist {}. Err: {}", playlist_id, e);
        }
    };

    let mut rows: Vec<TrackTableRow> = Vec::with_capacity(track_ids.len());
    for (i, track_id) in track_ids.iter().enumerate() {
        pb.set_message(format!("Fetching track {}/{}...", i + 1, track_ids.len()));
        match playlist::get_track(api, track_id).await {
            Ok(track) => rows.push(TrackTableRow {
                artists: track.artist_line(),
                name: track.name,
                id: track.id,
            }),
            Err(e) => warning!("Track {}: {}", track_id, e),
        }
    }
    pb.finish_and_clear();

    println!("{}", Table::new(rows));
}
