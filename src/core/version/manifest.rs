// ─── Version Catalog ───
// The global list of known versions (Mojang version manifest v2).

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::downloader::install::atomic_write;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_bytes;

/// File name of the on-disk copy kept under the versions directory.
pub const CATALOG_FILE: &str = "version_manifest_v2.json";

/// Top-level version catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub release_time: Option<String>,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the catalog and keep a copy at `<versions_dir>/version_manifest_v2.json`.
    pub async fn fetch(
        client: &reqwest::Client,
        url: &str,
        versions_dir: &Path,
    ) -> LauncherResult<Self> {
        info!("Fetching version catalog from {}", url);

        let raw = get_bytes(client, url)
            .await
            .map_err(|e| LauncherError::CatalogUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let manifest: VersionManifest =
            serde_json::from_slice(&raw).map_err(|e| LauncherError::CatalogUnavailable {
                url: url.to_string(),
                reason: format!("malformed catalog: {e}"),
            })?;

        if let Err(e) = atomic_write(&versions_dir.join(CATALOG_FILE), &raw).await {
            warn!("Could not keep a copy of the version catalog: {}", e);
        }

        info!("Loaded {} versions from catalog", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn deserialize_catalog() {
        let json = r#"{
            "latest": {"release": "1.20.4", "snapshot": "24w01a"},
            "versions": [
                {"id": "24w01a", "type": "snapshot", "url": "https://example.com/24w01a.json"},
                {"id": "1.20.4", "type": "release", "releaseTime": "2023-12-07T08:00:00+00:00",
                 "url": "https://example.com/1.20.4.json", "sha1": "abc123"}
            ]
        }"#;
        let manifest: VersionManifest = serde_json::from_str(json).unwrap();
        let entry = manifest.find_version("1.20.4").unwrap();
        assert_eq!(entry.url, "https://example.com/1.20.4.json");
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
        assert_eq!(manifest.latest.as_ref().unwrap().release, "1.20.4");
        assert!(manifest.find_version("1.0").is_none());
    }

    #[tokio::test]
    async fn fetch_keeps_a_copy_on_disk() {
        let server = MockServer::start().await;
        let body = r#"{"versions": [{"id": "1.0", "type": "release", "url": "http://x/1.0.json"}]}"#;
        Mock::given(method("GET"))
            .and(path("/catalog.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = build_http_client().unwrap();
        let manifest = VersionManifest::fetch(
            &client,
            &format!("{}/catalog.json", server.uri()),
            tmp.path(),
        )
        .await
        .unwrap();

        assert_eq!(manifest.versions.len(), 1);
        let copy = std::fs::read_to_string(tmp.path().join(CATALOG_FILE)).unwrap();
        assert_eq!(copy, body);
    }

    #[tokio::test]
    async fn unreachable_catalog_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = build_http_client().unwrap();
        let err = VersionManifest::fetch(&client, &server.uri(), tmp.path())
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::CatalogUnavailable { .. }));
    }
}
