use std::{path::Path, sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;
use tokio::sync::mpsc;

use crate::{
    config, error,
    error::Error,
    info,
    management::{
        AggregationEvent, AggregationReport, ArtworkDirectory, CancelToken, DedupPolicy,
        PlaylistAggregator, SourceFailure, load_sources,
    },
    spotify::{self, client::Executor},
    success,
    types::SourceReportRow,
    warning,
};

use super::user_session;

pub async fn merge(sources_path: &Path, name: &str, destination: Option<String>, dedup: bool) {
    let sources = match load_sources(sources_path).await {
        Ok(sources) if sources.is_empty() => {
            error!("No playlist URLs found in {}", sources_path.display())
        }
        Ok(sources) => sources,
        Err(e) => error!("Cannot read source list. Err: {}", e),
    };

    let session = user_session().await;
    let api: Arc<dyn Executor> = session.api.clone();

    let destination = match destination {
        Some(id) => id,
        None => match spotify::playlist::create_playlist(api.as_ref(), name).await {
            Ok(id) => {
                success!("Created playlist {}", name);
                id
            }
            Err(e) => error!("Failed to create playlist. Err: {}", e),
        },
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let policy = if dedup {
        DedupPolicy::SkipSeen
    } else {
        DedupPolicy::Preserve
    };
    let aggregator = Arc::new(
        PlaylistAggregator::new(api, Arc::new(ArtworkDirectory::new(config::artwork_dir())))
            .with_dedup(policy)
            .with_events(events_tx),
    );

    let cancel = CancelToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    info!("Merging {} playlists...", sources.len());
    let run = aggregator.spawn(destination, sources, cancel);

    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let mut added = 0;
    while let Some(event) = events_rx.recv().await {
        match event {
            AggregationEvent::SourceStarted { name, .. } => {
                pb.set_message(format!("Reading {}...", name))
            }
            AggregationEvent::TrackAdded { track, .. } => {
                added += 1;
                pb.set_message(format!(
                    "[{}] {} - {}",
                    added,
                    track.name,
                    track.artist_line()
                ));
            }
            AggregationEvent::Finished => break,
            _ => {}
        }
    }
    pb.finish_and_clear();

    let report = match run.await {
        Ok(Ok(report)) => report,
        Ok(Err(Error::Auth(e))) => {
            session.save().await;
            error!(
                "Merge stopped, tracks added so far were kept. Run `spotmerge auth` and merge again. Err: {}",
                e
            )
        }
        Ok(Err(e)) => error!("Merge did not run. Err: {}", e),
        Err(e) => error!("Task join error: {}", e),
    };

    print_report(&report);
    session.save().await;
    success!(
        "Playlist: {}",
        spotify::playlist::share_url(&report.destination)
    );
}

fn print_report(report: &AggregationReport) {
    let rows: Vec<SourceReportRow> = report
        .sources
        .iter()
        .map(|s| SourceReportRow {
            source: if s.display_name.is_empty() {
                s.url.clone()
            } else {
                s.display_name.clone()
            },
            status: match &s.failure {
                Some(failure @ SourceFailure::Cancelled { .. }) => failure.to_string(),
                Some(failure) => format!("failed: {}", failure),
                None => "ok".to_string(),
            },
            added: s.added.len(),
            failed: s.track_failures.len(),
        })
        .collect();
    println!("{}", Table::new(rows));

    for failure in report.failed_tracks() {
        warning!(
            "Track {} ({:?}): {}",
            failure.track_id,
            failure.stage,
            failure.error
        );
    }

    if report.cancelled {
        warning!("Merge cancelled, tracks added so far were kept.");
    }

    info!(
        "{} sources ok, {} failed; {} tracks added, {} failed",
        report.sources_succeeded(),
        report.sources_failed(),
        report.tracks_added(),
        report.tracks_failed()
    );
}
