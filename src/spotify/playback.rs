use std::sync::Arc;

use crate::{
    error::{ApiError, Error},
    spotify::{
        client::{ApiRequest, Executor},
        extract,
    },
    types::{Device, PlayRequest, Track, playlist_uri, track_uri},
};

/// How the caller picks the device that playback commands target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Id(String),
    /// The device Spotify reports as active.
    Active,
    /// The last device in the listing.
    Last,
}

impl DeviceSelector {
    pub fn pick<'a>(&self, devices: &'a [Device]) -> Option<&'a Device> {
        match self {
            DeviceSelector::Id(id) => devices.iter().find(|d| &d.id == id),
            DeviceSelector::Active => devices.iter().find(|d| d.is_active),
            DeviceSelector::Last => devices.last(),
        }
    }
}

/// Stateless playback commands. Each one is a single API call; when a device
/// id is set it is passed along, otherwise Spotify targets the active device.
pub struct PlaybackController {
    api: Arc<dyn Executor>,
    device_id: Option<String>,
}

impl PlaybackController {
    pub fn new(api: Arc<dyn Executor>) -> Self {
        Self {
            api,
            device_id: None,
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    fn player(&self, request: ApiRequest) -> ApiRequest {
        match &self.device_id {
            Some(id) => request.query("device_id", id),
            None => request,
        }
    }

    pub async fn devices(&self) -> Result<Vec<Device>, ApiError> {
        let json = self
            .api
            .execute(ApiRequest::get("/v1/me/player/devices"))
            .await?;
        Ok(extract::extract_devices(&json))
    }

    pub async fn current_volume(&self) -> Result<Option<u8>, ApiError> {
        let json = self
            .api
            .execute(ApiRequest::get("/v1/me/player/devices"))
            .await?;
        Ok(extract::extract_current_volume(&json))
    }

    /// Lists devices and selects one. `None` when nothing matches.
    pub async fn select_device(
        &mut self,
        selector: &DeviceSelector,
    ) -> Result<Option<Device>, ApiError> {
        let devices = self.devices().await?;
        let picked = selector.pick(&devices).cloned();
        if let Some(device) = &picked {
            self.device_id = Some(device.id.clone());
        }
        Ok(picked)
    }

    pub async fn resume(&self) -> Result<(), ApiError> {
        self.api
            .execute(self.player(ApiRequest::put("/v1/me/player/play")))
            .await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), ApiError> {
        self.api
            .execute(self.player(ApiRequest::put("/v1/me/player/pause")))
            .await?;
        Ok(())
    }

    pub async fn play_track(&self, track_id: &str) -> Result<(), ApiError> {
        let body = PlayRequest {
            uris: Some(vec![track_uri(track_id)]),
            ..Default::default()
        };
        let request = self.player(ApiRequest::put("/v1/me/player/play")).json(&body)?;
        self.api.execute(request).await?;
        Ok(())
    }

    pub async fn play_playlist(&self, playlist_id: &str) -> Result<(), ApiError> {
        let body = PlayRequest {
            context_uri: Some(playlist_uri(playlist_id)),
            ..Default::default()
        };
        let request = self.player(ApiRequest::put("/v1/me/player/play")).json(&body)?;
        self.api.execute(request).await?;
        Ok(())
    }

    /// Out-of-range values are rejected before any request is made.
    pub async fn set_volume(&self, percent: i32) -> Result<(), Error> {
        if !(0..=100).contains(&percent) {
            return Err(Error::Validation(format!(
                "volume must be between 0 and 100, got {}",
                percent
            )));
        }

        let request = self.player(
            ApiRequest::put("/v1/me/player/volume").query("volume_percent", percent),
        );
        self.api.execute(request).await?;
        Ok(())
    }

    pub async fn current_track(&self) -> Result<Option<Track>, ApiError> {
        let json = self
            .api
            .execute(ApiRequest::get("/v1/me/player/currently-playing"))
            .await?;
        extract::extract_current_track(&json)
    }
}
