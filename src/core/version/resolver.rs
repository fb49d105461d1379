// ─── Version Graph Resolver ───
// Walks an inheritance chain (loader profile → vanilla release → ...) and
// folds it into one effective manifest.

use std::collections::HashSet;
use std::path::PathBuf;

use reqwest::Client;
use tracing::{debug, info};

use crate::core::config::LauncherConfig;
use crate::core::downloader::install::atomic_write;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::get_bytes;

use super::manifest::VersionManifest;
use super::merge::merge_with_parent;
use super::version_file::VersionJson;

/// Resolves version ids against the local cache and the remote catalog.
///
/// The catalog is fetched lazily, at most once per resolver.
pub struct VersionResolver {
    client: Client,
    versions_dir: PathBuf,
    catalog_url: String,
    catalog: Option<VersionManifest>,
}

impl VersionResolver {
    pub fn new(client: Client, config: &LauncherConfig) -> Self {
        Self {
            client,
            versions_dir: config.versions_dir(),
            catalog_url: config.version_manifest_url.clone(),
            catalog: None,
        }
    }

    /// `<versions>/<id>/<id>.json`
    pub fn cache_path(&self, id: &str) -> PathBuf {
        self.versions_dir.join(id).join(format!("{}.json", id))
    }

    /// Resolve `id` and every ancestor into one effective manifest.
    pub async fn resolve(&mut self, id: &str) -> LauncherResult<VersionJson> {
        let mut visited = HashSet::new();
        let mut order: Vec<String> = Vec::new();
        let mut chain: Vec<VersionJson> = Vec::new();
        let mut next = Some(id.to_string());

        while let Some(current) = next.take() {
            order.push(current.clone());
            if !visited.insert(current.clone()) {
                return Err(LauncherError::InheritanceCycle { id: current, chain: order });
            }

            let manifest = self.load(&current).await?;
            next = manifest
                .inherits_from
                .clone()
                .filter(|parent| !parent.is_empty());
            chain.push(manifest);
        }

        // Fold from the root ancestor down to the requested version.
        let mut effective = chain
            .pop()
            .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))?;
        while let Some(child) = chain.pop() {
            debug!("Merging {} onto {}", child.id, effective.id);
            effective = merge_with_parent(child, &effective);
        }

        info!(
            "Resolved {} (chain: {}, {} libraries)",
            id,
            order.join(" -> "),
            effective.libraries.len()
        );
        Ok(effective)
    }

    /// Cached manifest if present, else catalog lookup + fetch + cache.
    pub async fn load(&mut self, id: &str) -> LauncherResult<VersionJson> {
        validate_version_id(id)?;

        let path = self.cache_path(id);
        match tokio::fs::read(&path).await {
            Ok(raw) => {
                debug!("Using cached manifest {:?}", path);
                let mut manifest = VersionJson::from_slice(id, &raw)?;
                if manifest.id.is_empty() {
                    manifest.id = id.to_string();
                }
                return Ok(manifest);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(LauncherError::io(path, e)),
        }

        self.fetch_and_cache(id).await
    }

    async fn fetch_and_cache(&mut self, id: &str) -> LauncherResult<VersionJson> {
        let url = {
            let catalog = self.catalog().await?;
            catalog
                .find_version(id)
                .map(|entry| entry.url.clone())
                .ok_or_else(|| LauncherError::VersionNotFound(id.to_string()))?
        };

        info!("Fetching manifest for {} from {}", id, url);
        let raw = get_bytes(&self.client, &url).await?;
        let mut manifest = VersionJson::from_slice(id, &raw)?;
        if manifest.id.is_empty() {
            manifest.id = id.to_string();
        }

        atomic_write(&self.cache_path(id), &raw).await?;
        Ok(manifest)
    }

    async fn catalog(&mut self) -> LauncherResult<&VersionManifest> {
        if self.catalog.is_none() {
            let fetched =
                VersionManifest::fetch(&self.client, &self.catalog_url, &self.versions_dir).await?;
            self.catalog = Some(fetched);
        }
        self.catalog
            .as_ref()
            .ok_or_else(|| LauncherError::Other("version catalog missing after fetch".into()))
    }
}

/// Version ids become path components, so only `[A-Za-z0-9._-]` is accepted.
pub fn validate_version_id(id: &str) -> LauncherResult<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(LauncherError::InvalidVersionId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn seed(config: &LauncherConfig, id: &str, body: serde_json::Value) {
        let dir = config.versions_dir().join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{id}.json")), body.to_string()).unwrap();
    }

    fn resolver(config: &LauncherConfig) -> VersionResolver {
        VersionResolver::new(build_http_client().unwrap(), config)
    }

    #[test]
    fn version_id_validation() {
        for ok in ["1.20.1", "fabric-loader-0.15.7-1.20.1", "rd-132211", "1.7.10_pre4"] {
            assert!(validate_version_id(ok).is_ok(), "{ok}");
        }
        for bad in ["", ".", "..", "../etc", "a/b", "a b", "1.20\\x"] {
            assert!(validate_version_id(bad).is_err(), "{bad}");
        }
    }

    #[tokio::test]
    async fn resolves_chain_from_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LauncherConfig::with_data_dir(tmp.path());
        seed(
            &config,
            "forge-1.20.1",
            json!({
                "id": "forge-1.20.1",
                "inheritsFrom": "1.20.1",
                "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
                "libraries": [{"name": "X:Y:2.0"}]
            }),
        );
        seed(
            &config,
            "1.20.1",
            json!({
                "id": "1.20.1",
                "mainClass": "net.minecraft.client.main.Main",
                "downloads": {"client": {"sha1": "aa", "url": "https://x/client.jar"}},
                "libraries": [{
                    "name": "X:Y:1.0",
                    "natives": {"linux": "natives-linux"},
                    "downloads": {"classifiers": {"natives-linux": {"url": "https://x/n.jar", "sha1": "bb"}}}
                }]
            }),
        );

        let effective = resolver(&config).resolve("forge-1.20.1").await.unwrap();
        assert_eq!(effective.id, "forge-1.20.1");
        assert_eq!(
            effective.main_class.as_deref(),
            Some("cpw.mods.bootstraplauncher.BootstrapLauncher")
        );
        assert_eq!(effective.jar_id(), "1.20.1");
        assert_eq!(effective.libraries.len(), 1);
        assert_eq!(effective.libraries[0].name, "X:Y:2.0");
        assert_eq!(effective.libraries[0].natives["linux"], "natives-linux");
    }

    #[tokio::test]
    async fn detects_inheritance_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LauncherConfig::with_data_dir(tmp.path());
        seed(&config, "a", json!({"id": "a", "inheritsFrom": "b"}));
        seed(&config, "b", json!({"id": "b", "inheritsFrom": "a"}));

        let err = resolver(&config).resolve("a").await.unwrap_err();
        match err {
            LauncherError::InheritanceCycle { id, chain } => {
                assert_eq!(id, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("expected cycle error, got {other}"),
        }
    }

    #[tokio::test]
    async fn self_inheritance_is_a_cycle() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LauncherConfig::with_data_dir(tmp.path());
        seed(&config, "loop", json!({"id": "loop", "inheritsFrom": "loop"}));

        let err = resolver(&config).resolve("loop").await.unwrap_err();
        assert!(matches!(err, LauncherError::InheritanceCycle { .. }));
    }

    #[tokio::test]
    async fn fetches_missing_manifest_through_catalog_and_caches_it() {
        let server = MockServer::start().await;
        let manifest_body = json!({"id": "1.0", "mainClass": "Main"}).to_string();
        Mock::given(method("GET"))
            .and(path("/catalog.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "versions": [{"id": "1.0", "type": "release", "url": format!("{}/v/1.0.json", server.uri())}]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v/1.0.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(manifest_body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = LauncherConfig::with_data_dir(tmp.path());
        config.version_manifest_url = format!("{}/catalog.json", server.uri());

        let mut resolver = resolver(&config);
        let resolved = resolver.resolve("1.0").await.unwrap();
        assert_eq!(resolved.main_class.as_deref(), Some("Main"));

        let cached = std::fs::read_to_string(resolver.cache_path("1.0")).unwrap();
        assert_eq!(cached, manifest_body);

        // Second resolve is served from the cache; mocks expect one hit each.
        resolver.resolve("1.0").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_version_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"versions": []})))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = LauncherConfig::with_data_dir(tmp.path());
        config.version_manifest_url = server.uri();

        let err = resolver(&config).resolve("9.9").await.unwrap_err();
        assert!(matches!(err, LauncherError::VersionNotFound(ref id) if id == "9.9"));
    }

    #[tokio::test]
    async fn missing_parent_fails_resolution() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let mut config = LauncherConfig::with_data_dir(tmp.path());
        config.version_manifest_url = server.uri();
        seed(&config, "child", json!({"id": "child", "inheritsFrom": "parent"}));

        let err = resolver(&config).resolve("child").await.unwrap_err();
        assert!(matches!(err, LauncherError::CatalogUnavailable { .. }));
    }

    #[tokio::test]
    async fn malformed_cached_manifest_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = LauncherConfig::with_data_dir(tmp.path());
        let dir = config.versions_dir().join("bad");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.json"), "{not json").unwrap();

        let err = resolver(&config).resolve("bad").await.unwrap_err();
        assert!(matches!(err, LauncherError::ManifestParse { .. }));
    }
}
