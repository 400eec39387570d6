use std::sync::Arc;

use tabled::Table;

use crate::{
    config, error, info,
    spotify::{
        client::Executor,
        playback::{DeviceSelector, PlaybackController},
    },
    success,
    types::{DeviceTableRow, Track},
    warning,
};

use super::{Session, user_session};

/// `active`, `last`, or a literal device id.
pub fn parse_device_selector(value: &str) -> DeviceSelector {
    match value {
        "active" => DeviceSelector::Active,
        "last" => DeviceSelector::Last,
        id => DeviceSelector::Id(id.to_string()),
    }
}

async fn controller(session: &Session, device: Option<&str>) -> PlaybackController {
    let api: Arc<dyn Executor> = session.api.clone();
    let mut controller = PlaybackController::new(api);

    if let Some(value) = device {
        let selector = parse_device_selector(value);
        match controller.select_device(&selector).await {
            Ok(Some(device)) => info!("Using device {}", device.name),
            Ok(None) => error!("No device matches {:?}. Run spotmerge devices.", selector),
            Err(e) => error!("Failed to list devices. Err: {}", e),
        }
    }
    controller
}

pub async fn play(track: Option<String>, playlist: Option<String>, device: Option<String>) {
    let session = user_session().await;
    let controller = controller(&session, device.as_deref()).await;

    let result = match (track, playlist) {
        (Some(track_id), _) => controller.play_track(&track_id).await,
        (None, Some(playlist_id)) => controller.play_playlist(&playlist_id).await,
        (None, None) => controller.resume().await,
    };

    match result {
        Ok(()) => success!("Playback started."),
        Err(e) => warning!("Failed to start playback: {}", e),
    }
    session.save().await;
}

pub async fn resume(device: Option<String>) {
    play(None, None, device).await
}

pub async fn pause(device: Option<String>) {
    let session = user_session().await;
    let controller = controller(&session, device.as_deref()).await;

    match controller.pause().await {
        Ok(()) => success!("Playback paused."),
        Err(e) => warning!("Failed to pause playback: {}", e),
    }
    session.save().await;
}

pub async fn volume(percent: i32, device: Option<String>) {
    let session = user_session().await;
    let controller = controller(&session, device.as_deref()).await;

    match controller.set_volume(percent).await {
        Ok(()) => success!("Volume set to {}%.", percent),
        Err(e) => warning!("Failed to set volume: {}", e),
    }
    session.save().await;
}

pub async fn devices() {
    let session = user_session().await;
    let controller = controller(&session, None).await;

    match controller.devices().await {
        Ok(devices) if devices.is_empty() => warning!(
            "No Spotify devices found. Start the Spotify app on a phone, desktop or speaker."
        ),
        Ok(devices) => {
            // with several devices the last one carries the current volume
            let volume = devices.last().map(|d| d.volume_percent);
            let rows: Vec<DeviceTableRow> = devices
                .into_iter()
                .map(|d| DeviceTableRow {
                    name: d.name,
                    id: d.id,
                    volume: format!("{}%", d.volume_percent),
                    active: if d.is_active { "yes" } else { "" }.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows));
            if let Some(volume) = volume {
                info!("Current volume: {}%", volume);
            }
        }
        Err(e) => warning!("Failed to list devices: {}", e),
    }
    session.save().await;
}

fn describe(track: &Option<Track>) -> String {
    match track {
        Some(track) => format!("{} - {}", track.name, track.artist_line()),
        None => "nothing playing".to_string(),
    }
}

/// Prints the current track once, or keeps polling when `watch` is set and
/// prints whenever it changes. Each poll is bounded by the request timeout,
/// so a stuck call only delays the next tick.
pub async fn now_playing(watch: bool) {
    let session = user_session().await;
    let controller = controller(&session, None).await;

    if !watch {
        match controller.current_track().await {
            Ok(track) => info!("Now playing: {}", describe(&track)),
            Err(e) => warning!("Failed to read current track: {}", e),
        }
        session.save().await;
        return;
    }

    let mut interval = tokio::time::interval(config::poll_interval());
    let mut last: Option<Option<Track>> = None;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        match controller.current_track().await {
            Ok(track) => {
                if last.as_ref() != Some(&track) {
                    info!("Now playing: {}", describe(&track));
                    last = Some(track);
                }
            }
            Err(e) => warning!("Failed to read current track: {}", e),
        }
    }
    session.save().await;
}
