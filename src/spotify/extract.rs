//! Pure mapping functions from raw Web API payloads to domain values.
//!
//! Nothing here touches the network. Functions that need a field to produce a
//! value return [`ApiError::Decode`] when it is missing; functions that walk
//! lists skip unusable entries.

use serde_json::Value;

use crate::{
    error::ApiError,
    types::{Device, Playlist, Track},
};

pub const PLAYLIST_URL_PREFIX: &str = "https://open.spotify.com/playlist/";

/// Returns the id between the playlist URL prefix and the first `?`.
/// `None` when the prefix is absent or nothing follows it.
pub fn extract_playlist_id(url: &str) -> Option<String> {
    let start = url.find(PLAYLIST_URL_PREFIX)? + PLAYLIST_URL_PREFIX.len();
    let rest = &url[start..];
    let id = match rest.find('?') {
        Some(end) => &rest[..end],
        None => rest,
    };

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Track ids of a full playlist object, in `tracks.items` order. Local files
/// and removed tracks (null id) are skipped; duplicates are kept.
pub fn extract_track_ids(playlist: &Value) -> Vec<String> {
    extract_page_track_ids(&playlist["tracks"])
}

/// Same as [`extract_track_ids`] but for a bare paging object (`items`),
/// as returned when following a `next` link.
pub fn extract_page_track_ids(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["track"]["id"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// The `next` link of a playlist object (`tracks.next`) or of a paging
/// object (`next`).
pub fn extract_next_page(payload: &Value) -> Option<String> {
    payload["tracks"]["next"]
        .as_str()
        .or_else(|| payload["next"].as_str())
        .map(str::to_string)
}

pub fn extract_track_meta(track: &Value) -> Result<Track, ApiError> {
    let id = track["id"]
        .as_str()
        .ok_or_else(|| ApiError::decode("track payload has no id"))?;
    let name = track["name"]
        .as_str()
        .ok_or_else(|| ApiError::decode(format!("track {} has no name", id)))?;

    let artists = track["artists"]
        .as_array()
        .map(|artists| {
            artists
                .iter()
                .filter_map(|a| a["name"].as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Track {
        id: id.to_string(),
        name: name.to_string(),
        artists,
        album_image_url: extract_album_image_url(track),
    })
}

/// First entry of `album.images`, which Spotify orders widest first.
pub fn extract_album_image_url(track: &Value) -> Option<String> {
    track["album"]["images"]
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .map(str::to_string)
}

/// The `item` of a currently-playing payload. `None` when nothing is playing
/// (empty body) or the item is not a track.
pub fn extract_current_track(currently_playing: &Value) -> Result<Option<Track>, ApiError> {
    let item = &currently_playing["item"];
    if item.is_null() {
        return Ok(None);
    }
    extract_track_meta(item).map(Some)
}

pub fn extract_playlist(payload: &Value, source_url: Option<&str>) -> Result<Playlist, ApiError> {
    let id = payload["id"]
        .as_str()
        .ok_or_else(|| ApiError::decode("playlist payload has no id"))?;

    Ok(Playlist {
        id: id.to_string(),
        name: payload["name"].as_str().unwrap_or_default().to_string(),
        source_url: source_url.map(str::to_string),
        track_ids: extract_track_ids(payload),
    })
}

/// One entry per listed device that has an id, in response order.
/// Restricted devices report no volume and come back as 0.
pub fn extract_devices(devices: &Value) -> Vec<Device> {
    devices["devices"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|d| {
                    let id = d["id"].as_str()?;
                    Some(Device {
                        id: id.to_string(),
                        name: d["name"].as_str().unwrap_or_default().to_string(),
                        volume_percent: d["volume_percent"].as_u64().unwrap_or(0).min(100) as u8,
                        is_active: d["is_active"].as_bool().unwrap_or(false),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Volume of the last listed device. The player reports one volume per
/// device; with several devices the last entry is taken as current.
pub fn extract_current_volume(devices: &Value) -> Option<u8> {
    extract_devices(devices).last().map(|d| d.volume_percent)
}

/// `id` field of an object response such as `/v1/me` or a created playlist.
pub fn extract_id(payload: &Value) -> Result<String, ApiError> {
    payload["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::decode("response has no id"))
}
