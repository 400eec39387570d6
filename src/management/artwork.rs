use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Where downloaded album artwork ends up. The aggregator only hands over
/// bytes and the track id; naming and storage are up to the implementation.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, bytes: &[u8], track_id: &str) -> Result<PathBuf, String>;
}

/// Writes `{track_id}.png` files into a single directory, overwriting any
/// previous file for the same track.
pub struct ArtworkDirectory {
    root: PathBuf,
}

impl ArtworkDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, track_id: &str) -> PathBuf {
        self.root.join(format!("{}.png", track_id))
    }
}

#[async_trait]
impl ImageStore for ArtworkDirectory {
    async fn save(&self, bytes: &[u8], track_id: &str) -> Result<PathBuf, String> {
        if track_id.is_empty() || track_id.contains(['/', '\\', '.']) {
            return Err(format!("refusing to store artwork for track id {:?}", track_id));
        }

        async_fs::create_dir_all(&self.root)
            .await
            .map_err(|e| format!("{}: {}", self.root.display(), e))?;

        let path = self.path_for(track_id);
        async_fs::write(&path, bytes)
            .await
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(path)
    }
}
