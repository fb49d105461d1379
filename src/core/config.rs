// ─── Launcher Configuration ───
// Data directory resolution, origin URLs and pool sizing, persisted as JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::downloader::install::atomic_write;
use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "LauncherFetch";
const SETTINGS_FILE: &str = "launcher_settings.json";

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "LAUNCHER_FETCH_DATA_DIR";

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";
pub const LIBRARIES_URL: &str = "https://libraries.minecraft.net";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LauncherConfig {
    /// Root of `versions/`, `libraries/` and `assets/`. Not persisted.
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Number of parallel download workers.
    pub concurrency: usize,
    /// Capacity of the task queue and the error channel.
    pub queue_capacity: usize,
    pub version_manifest_url: String,
    pub resources_url: String,
    pub libraries_url: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            concurrency: 10,
            queue_capacity: 100,
            version_manifest_url: VERSION_MANIFEST_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            libraries_url: LIBRARIES_URL.to_string(),
        }
    }
}

impl LauncherConfig {
    /// Defaults rooted at an explicit data directory.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load persisted settings from `data_dir`, falling back to defaults.
    pub fn load(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let mut config = load_settings_from_disk(&data_dir).unwrap_or_default();
        config.data_dir = data_dir;
        config
    }

    pub async fn save(&self) -> LauncherResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        atomic_write(&self.data_dir.join(SETTINGS_FILE), json.as_bytes()).await
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.data_dir.join("versions")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.data_dir.join("libraries")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.data_dir.join("assets")
    }

    /// Ensure the directory layout exists.
    pub async fn ensure_dirs(&self) -> LauncherResult<()> {
        for dir in [self.versions_dir(), self.libraries_dir(), self.assets_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| LauncherError::io(&dir, e))?;
        }
        Ok(())
    }
}

fn load_settings_from_disk(data_dir: &Path) -> Option<LauncherConfig> {
    let path = data_dir.join(SETTINGS_FILE);
    let raw = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(config) => {
            debug!("Loaded settings from {:?}", path);
            Some(config)
        }
        Err(e) => {
            warn!("Ignoring unreadable settings at {:?}: {}", path, e);
            None
        }
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
