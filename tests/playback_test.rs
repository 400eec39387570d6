mod common;

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Value, json};
use spotmerge::{
    error::Error,
    spotify::playback::{DeviceSelector, PlaybackController},
    types::Device,
};

use common::FakeExecutor;

fn devices_json() -> Value {
    json!({
        "devices": [
            { "id": "phone", "name": "Phone", "is_active": false, "volume_percent": 40 },
            { "id": null, "name": "Restricted", "is_active": false, "volume_percent": null },
            { "id": "desk", "name": "Desktop", "is_active": true, "volume_percent": 75 }
        ]
    })
}

fn player() -> Arc<FakeExecutor> {
    Arc::new(
        FakeExecutor::new()
            .on(Method::PUT, "/v1/me/player/play", Value::Null)
            .on(Method::PUT, "/v1/me/player/pause", Value::Null)
            .on(Method::PUT, "/v1/me/player/volume", Value::Null)
            .on(Method::GET, "/v1/me/player/devices", devices_json()),
    )
}

#[tokio::test]
async fn test_set_volume_rejects_out_of_range_without_network_call() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    for percent in [-5, -1, 101, 1000] {
        let result = controller.set_volume(percent).await;
        assert!(
            matches!(result, Err(Error::Validation(_))),
            "{} should be rejected",
            percent
        );
    }

    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_set_volume_accepts_bounds() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    controller.set_volume(0).await.unwrap();
    controller.set_volume(100).await.unwrap();

    let requests = api.requests_to(Method::PUT, "/v1/me/player/volume");
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].query,
        vec![("volume_percent".to_string(), "0".to_string())]
    );
    assert_eq!(
        requests[1].query,
        vec![("volume_percent".to_string(), "100".to_string())]
    );
}

#[tokio::test]
async fn test_pause_and_resume_send_no_body() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    controller.pause().await.unwrap();
    controller.resume().await.unwrap();

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/v1/me/player/pause");
    assert_eq!(requests[1].path, "/v1/me/player/play");
    assert!(requests.iter().all(|r| r.body.is_none()));
    assert!(requests.iter().all(|r| r.query.is_empty()));
}

#[tokio::test]
async fn test_play_track_and_playlist_bodies() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    controller.play_track("4uLU6hMCjMI75M1A2tKUQC").await.unwrap();
    controller.play_playlist("37i9dQZF1DXcBWIGoYBM5M").await.unwrap();

    let requests = api.requests_to(Method::PUT, "/v1/me/player/play");
    assert_eq!(
        requests[0].body,
        Some(json!({ "uris": ["spotify:track:4uLU6hMCjMI75M1A2tKUQC"] }))
    );
    assert_eq!(
        requests[1].body,
        Some(json!({ "context_uri": "spotify:playlist:37i9dQZF1DXcBWIGoYBM5M" }))
    );
}

#[tokio::test]
async fn test_device_id_is_passed_when_set() {
    let api = player();
    let controller = PlaybackController::new(api.clone()).with_device("desk");

    controller.pause().await.unwrap();
    controller.set_volume(30).await.unwrap();

    let requests = api.requests();
    assert_eq!(
        requests[0].query,
        vec![("device_id".to_string(), "desk".to_string())]
    );
    assert!(
        requests[1]
            .query
            .contains(&("device_id".to_string(), "desk".to_string()))
    );
    assert!(
        requests[1]
            .query
            .contains(&("volume_percent".to_string(), "30".to_string()))
    );
}

#[tokio::test]
async fn test_devices_skip_entries_without_id() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    let devices = controller.devices().await.unwrap();
    assert_eq!(
        devices,
        vec![
            Device {
                id: "phone".to_string(),
                name: "Phone".to_string(),
                volume_percent: 40,
                is_active: false,
            },
            Device {
                id: "desk".to_string(),
                name: "Desktop".to_string(),
                volume_percent: 75,
                is_active: true,
            },
        ]
    );
}

#[tokio::test]
async fn test_current_volume_is_taken_from_last_device() {
    let api = player();
    let controller = PlaybackController::new(api.clone());

    assert_eq!(controller.current_volume().await.unwrap(), Some(75));
}

#[tokio::test]
async fn test_select_device() {
    let api = player();
    let mut controller = PlaybackController::new(api.clone());
    assert_eq!(controller.device_id(), None);

    let picked = controller
        .select_device(&DeviceSelector::Id("phone".to_string()))
        .await
        .unwrap();
    assert_eq!(picked.map(|d| d.id), Some("phone".to_string()));
    assert_eq!(controller.device_id(), Some("phone"));

    let picked = controller
        .select_device(&DeviceSelector::Active)
        .await
        .unwrap();
    assert_eq!(picked.map(|d| d.id), Some("desk".to_string()));

    // an unknown id leaves the previous choice in place
    let picked = controller
        .select_device(&DeviceSelector::Id("tv".to_string()))
        .await
        .unwrap();
    assert!(picked.is_none());
    assert_eq!(controller.device_id(), Some("desk"));
}

#[tokio::test]
async fn test_current_track_when_nothing_is_playing() {
    // currently-playing answers 204 with no body, which decodes to null
    let api = Arc::new(FakeExecutor::new().on(
        Method::GET,
        "/v1/me/player/currently-playing",
        Value::Null,
    ));
    let controller = PlaybackController::new(api);

    assert_eq!(controller.current_track().await.unwrap(), None);
}

#[tokio::test]
async fn test_current_track() {
    let api = Arc::new(FakeExecutor::new().on(
        Method::GET,
        "/v1/me/player/currently-playing",
        json!({
            "is_playing": true,
            "item": common::track_json("t1", Some("https://i.scdn.co/image/one"))
        }),
    ));
    let controller = PlaybackController::new(api);

    let track = controller.current_track().await.unwrap().unwrap();
    assert_eq!(track.id, "t1");
    assert_eq!(track.artist_line(), "Artist A, Artist B");
    assert_eq!(
        track.album_image_url.as_deref(),
        Some("https://i.scdn.co/image/one")
    );
}

#[tokio::test]
async fn test_errors_are_surfaced_to_caller() {
    let api = Arc::new(FakeExecutor::new());
    let controller = PlaybackController::new(api);

    let err = controller.pause().await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    let err = controller.set_volume(50).await.unwrap_err();
    assert!(matches!(err, Error::Api(_)));
}
