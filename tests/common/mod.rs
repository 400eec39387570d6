#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use axum::Router;
use reqwest::Method;
use serde_json::{Value, json};
use spotmerge::{
    error::ApiError,
    management::{CancelToken, ImageStore},
    spotify::client::{ApiRequest, Executor},
};
use tokio::sync::Semaphore;

pub const DESTINATION: &str = "dest";

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A local URL nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// In-memory stand-in for the Web API. Responses are keyed by method and
/// path; anything not registered answers 404. Every request is recorded.
pub struct FakeExecutor {
    responses: HashMap<(Method, String), Result<Value, ApiError>>,
    once: Mutex<HashMap<(Method, String), VecDeque<ApiError>>>,
    images: HashMap<String, Result<Vec<u8>, ApiError>>,
    gate: Option<Arc<Semaphore>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            once: Mutex::new(HashMap::new()),
            images: HashMap::new(),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, method: Method, path: &str, response: Value) -> Self {
        self.responses.insert((method, path.to_string()), Ok(response));
        self
    }

    pub fn fail(mut self, method: Method, path: &str, error: ApiError) -> Self {
        self.responses.insert((method, path.to_string()), Err(error));
        self
    }

    /// The next call to `method path` fails with `error`; later calls get the
    /// registered response.
    pub fn fail_once(self, method: Method, path: &str, error: ApiError) -> Self {
        self.once
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(error);
        self
    }

    /// Registers a playlist and its tracks in one go.
    pub fn playlist(self, playlist_id: &str, track_ids: &[&str]) -> Self {
        let path = format!("/v1/playlists/{}", playlist_id);
        let mut fake = self.on(Method::GET, &path, playlist_json(playlist_id, track_ids));
        for id in track_ids {
            fake = fake.track(id);
        }
        fake
    }

    pub fn track(self, track_id: &str) -> Self {
        let path = format!("/v1/tracks/{}", track_id);
        self.on(Method::GET, &path, track_json(track_id, None))
    }

    pub fn track_with_image(self, track_id: &str, image_url: &str) -> Self {
        let path = format!("/v1/tracks/{}", track_id);
        self.on(Method::GET, &path, track_json(track_id, Some(image_url)))
            .image(image_url, vec![0x89, b'P', b'N', b'G'])
    }

    pub fn image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), Ok(bytes));
        self
    }

    pub fn image_error(mut self, url: &str, error: ApiError) -> Self {
        self.images.insert(url.to_string(), Err(error));
        self
    }

    pub fn accept_adds(self, destination: &str) -> Self {
        let path = format!("/v1/playlists/{}/tracks", destination);
        self.on(Method::POST, &path, json!({ "snapshot_id": "snap" }))
    }

    /// Every `execute` waits for a permit before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Track ids of every add call to `destination`, in call order.
    pub fn added_to(&self, destination: &str) -> Vec<String> {
        let path = format!("/v1/playlists/{}/tracks", destination);
        self.requests_to(Method::POST, &path)
            .iter()
            .flat_map(|r| {
                r.body.as_ref().unwrap()["uris"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|uri| {
                        uri.as_str()
                            .unwrap()
                            .trim_start_matches("spotify:track:")
                            .to_string()
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }

        let key = (request.method.clone(), request.path.clone());
        if let Some(error) = self
            .once
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        self.responses
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Err(not_found()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.images.get(url).cloned().unwrap_or_else(|| Err(not_found()))
    }
}

pub fn not_found() -> ApiError {
    ApiError::Http {
        status: 404,
        detail: "Resource not found".to_string(),
        retry_after: None,
    }
}

pub fn playlist_url(playlist_id: &str) -> String {
    format!("https://open.spotify.com/playlist/{}?si=abc123", playlist_id)
}

pub fn playlist_json(playlist_id: &str, track_ids: &[&str]) -> Value {
    let items: Vec<Value> = track_ids
        .iter()
        .map(|id| json!({ "track": { "id": id } }))
        .collect();
    json!({
        "id": playlist_id,
        "name": format!("Playlist {}", playlist_id),
        "tracks": { "items": items, "next": null }
    })
}

pub fn track_json(track_id: &str, image_url: Option<&str>) -> Value {
    let images = match image_url {
        Some(url) => json!([{ "url": url, "height": 640, "width": 640 }]),
        None => json!([]),
    };
    json!({
        "id": track_id,
        "name": format!("Song {}", track_id),
        "artists": [{ "name": "Artist A" }, { "name": "Artist B" }],
        "album": { "images": images }
    })
}

/// Keeps saved artwork in memory. Can be told to fail, or to cancel a run
/// as soon as the first image is stored.
#[derive(Default)]
pub struct MemoryImageStore {
    saved: Mutex<Vec<(String, usize)>>,
    fail: bool,
    cancel_on_save: Option<CancelToken>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn cancelling(cancel: CancelToken) -> Self {
        Self {
            cancel_on_save: Some(cancel),
            ..Self::default()
        }
    }

    pub fn saved_ids(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, bytes: &[u8], track_id: &str) -> Result<PathBuf, String> {
        if self.fail {
            return Err("disk full".to_string());
        }
        self.saved
            .lock()
            .unwrap()
            .push((track_id.to_string(), bytes.len()));
        if let Some(cancel) = &self.cancel_on_save {
            cancel.cancel();
        }
        Ok(PathBuf::from(format!("{}.png", track_id)))
    }
}
