use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::downloader::install::atomic_write;
use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_bytes;
use crate::core::downloader::format_bytes;
use crate::core::version::{validate_version_id, VersionJson};

/// Top-level asset index JSON structure: logical name → object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetObject {
    /// `<hh>/<hash>`, shared by the local layout and the origin URL.
    /// `None` unless the hash is hex of at least two digits.
    pub fn relative_path(&self) -> Option<String> {
        if self.hash.len() < 2 || !self.hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(format!("{}/{}", &self.hash[..2], self.hash))
    }
}

impl AssetIndex {
    pub fn parse(id: &str, raw: &[u8]) -> LauncherResult<Self> {
        serde_json::from_slice(raw).map_err(|e| LauncherError::AssetIndexUnavailable {
            id: id.to_string(),
            reason: format!("malformed index: {e}"),
        })
    }

    /// One object per distinct hash, ordered by hash.
    pub fn unique_objects(&self) -> Vec<&AssetObject> {
        let mut by_hash: BTreeMap<&str, &AssetObject> = BTreeMap::new();
        for object in self.objects.values() {
            by_hash.entry(object.hash.as_str()).or_insert(object);
        }
        by_hash.into_values().collect()
    }

    /// Retrieval tasks for every distinct object. Hashes that cannot be
    /// addressed are skipped.
    pub fn object_tasks(&self, assets_dir: &Path, resources_url: &str) -> Vec<DownloadTask> {
        let objects_dir = assets_dir.join("objects");
        let base = resources_url.trim_end_matches('/');

        self.unique_objects()
            .into_iter()
            .filter_map(|object| {
                let Some(rel) = object.relative_path() else {
                    warn!("Skipping asset with unusable hash {:?}", object.hash);
                    return None;
                };
                let dest = objects_dir.join(&object.hash[..2]).join(&object.hash);
                Some(
                    DownloadTask::new(format!("{base}/{rel}"), dest, Some(&object.hash))
                        .with_size(Some(object.size)),
                )
            })
            .collect()
    }

    pub fn total_size(&self) -> u64 {
        self.unique_objects().iter().map(|o| o.size).sum()
    }
}

/// `<assets>/indexes/<id>.json`
pub fn index_path(assets_dir: &Path, index_id: &str) -> PathBuf {
    assets_dir.join("indexes").join(format!("{index_id}.json"))
}

/// Fetch the asset index a manifest refers to, caching it on success and
/// falling back to the cached copy when the origin is unreachable.
///
/// Returns `None` when the manifest declares no asset index URL.
pub async fn load_asset_index(
    client: &Client,
    version: &VersionJson,
    assets_dir: &Path,
) -> LauncherResult<Option<AssetIndex>> {
    let Some(url) = version
        .asset_index
        .as_ref()
        .map(|ai| ai.url.as_str())
        .filter(|u| !u.is_empty())
    else {
        debug!("{} declares no asset index", version.id);
        return Ok(None);
    };

    let id = version.asset_index_id();
    if validate_version_id(id).is_err() {
        return Err(LauncherError::AssetIndexUnavailable {
            id: id.to_string(),
            reason: "index id is not a plain file name".into(),
        });
    }
    let cache = index_path(assets_dir, id);

    let live = match get_bytes(client, url).await {
        Ok(raw) => AssetIndex::parse(id, &raw).map(|index| (index, raw)),
        Err(e) => Err(e),
    };

    match live {
        Ok((index, raw)) => {
            if let Err(e) = atomic_write(&cache, &raw).await {
                warn!("Could not cache asset index {}: {}", id, e);
            }
            info!(
                "Asset index {}: {} objects, {}",
                id,
                index.objects.len(),
                format_bytes(index.total_size() as f64)
            );
            Ok(Some(index))
        }
        Err(live_err) => {
            let cached = tokio::fs::read(&cache).await.map_err(|_| {
                LauncherError::AssetIndexUnavailable {
                    id: id.to_string(),
                    reason: live_err.to_string(),
                }
            })?;
            warn!(
                "Asset index {} unreachable ({}), using cached copy",
                id, live_err
            );
            AssetIndex::parse(id, &cached).map(Some)
        }
    }
}
