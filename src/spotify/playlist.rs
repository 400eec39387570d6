use serde_json::Value;

use crate::{
    error::ApiError,
    spotify::{
        client::{ApiRequest, Executor},
        extract,
    },
    types::{AddTrackToPlaylistRequest, CreatePlaylistRequest, Track, track_uri},
};

/// Raw playlist object, first page of tracks included.
pub async fn get_playlist(api: &dyn Executor, playlist_id: &str) -> Result<Value, ApiError> {
    api.execute(ApiRequest::get(format!("/v1/playlists/{}", playlist_id)))
        .await
}

/// Every track id of a playlist, following `next` links until the listing
/// is exhausted.
pub async fn get_playlist_track_ids(
    api: &dyn Executor,
    playlist_id: &str,
) -> Result<Vec<String>, ApiError> {
    let first = get_playlist(api, playlist_id).await?;
    let mut track_ids = extract::extract_track_ids(&first);
    let mut next = extract::extract_next_page(&first);

    while let Some(link) = next {
        let page = api.execute(ApiRequest::get(link)).await?;
        track_ids.extend(extract::extract_page_track_ids(&page));
        next = extract::extract_next_page(&page);
    }

    Ok(track_ids)
}

pub async fn get_track_json(api: &dyn Executor, track_id: &str) -> Result<Value, ApiError> {
    api.execute(ApiRequest::get(format!("/v1/tracks/{}", track_id)))
        .await
}

pub async fn get_track(api: &dyn Executor, track_id: &str) -> Result<Track, ApiError> {
    let json = get_track_json(api, track_id).await?;
    extract::extract_track_meta(&json)
}

pub async fn add_track_to_playlist(
    api: &dyn Executor,
    playlist_id: &str,
    track_id: &str,
) -> Result<(), ApiError> {
    let body = AddTrackToPlaylistRequest {
        uris: vec![track_uri(track_id)],
    };
    let request =
        ApiRequest::post(format!("/v1/playlists/{}/tracks", playlist_id)).json(&body)?;
    api.execute(request).await?;
    Ok(())
}

pub async fn current_user_id(api: &dyn Executor) -> Result<String, ApiError> {
    let me = api.execute(ApiRequest::get("/v1/me")).await?;
    extract::extract_id(&me)
}

/// Creates a private playlist owned by the authenticated user and returns
/// its id.
pub async fn create_playlist(api: &dyn Executor, name: &str) -> Result<String, ApiError> {
    let user_id = current_user_id(api).await?;
    let body = CreatePlaylistRequest {
        name: name.to_string(),
        public: false,
    };
    let request = ApiRequest::post(format!("/v1/users/{}/playlists", user_id)).json(&body)?;
    let created = api.execute(request).await?;
    extract::extract_id(&created)
}

pub fn share_url(playlist_id: &str) -> String {
    format!("{}{}", extract::PLAYLIST_URL_PREFIX, playlist_id)
}
