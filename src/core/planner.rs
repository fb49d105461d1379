// ─── Task Planner ───
// Expands an effective manifest into retrieval tasks: client archive,
// platform-filtered libraries, native classifiers and asset objects.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::core::assets::load_asset_index;
use crate::core::config::LauncherConfig;
use crate::core::downloader::DownloadTask;
use crate::core::error::LauncherResult;
use crate::core::maven::MavenArtifact;
use crate::core::platform::Platform;
use crate::core::version::{validate_version_id, DownloadArtifact, LibraryEntry, VersionJson};

pub struct TaskPlanner {
    platform: Platform,
    versions_dir: PathBuf,
    libraries_dir: PathBuf,
    assets_dir: PathBuf,
    libraries_url: String,
    resources_url: String,
}

impl TaskPlanner {
    pub fn new(config: &LauncherConfig, platform: Platform) -> Self {
        Self {
            platform,
            versions_dir: config.versions_dir(),
            libraries_dir: config.libraries_dir(),
            assets_dir: config.assets_dir(),
            libraries_url: config.libraries_url.clone(),
            resources_url: config.resources_url.clone(),
        }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// `versions/<jar>/<jar>.jar`, keyed by the archive's own identifier.
    /// `None` when that identifier is not a plain directory name.
    pub fn client_jar_path(&self, version: &VersionJson) -> Option<PathBuf> {
        let jar = version.jar_id();
        if let Err(e) = validate_version_id(jar) {
            warn!("{}: refusing client archive path: {}", version.id, e);
            return None;
        }
        Some(self.versions_dir.join(jar).join(format!("{jar}.jar")))
    }

    pub fn plan_client(&self, version: &VersionJson) -> Option<DownloadTask> {
        let Some(download) = version.client_download() else {
            debug!("{} declares no client archive", version.id);
            return None;
        };
        Some(
            DownloadTask::new(
                &download.url,
                self.client_jar_path(version)?,
                download.expected_hash(),
            )
            .with_size(download.size),
        )
    }

    /// Library and native tasks for the platform. Pure: no I/O.
    pub fn plan_libraries(&self, version: &VersionJson) -> Vec<DownloadTask> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();

        for lib in &version.libraries {
            if !lib.is_allowed(&self.platform) {
                debug!("Skipping library (OS rule): {}", lib.name);
                continue;
            }

            for task in self.library_tasks(lib) {
                if seen.insert(task.dest.clone()) {
                    tasks.push(task);
                }
            }
        }

        debug!(
            "Planned {} library files from {} entries",
            tasks.len(),
            version.libraries.len()
        );
        tasks
    }

    fn library_tasks(&self, lib: &LibraryEntry) -> Vec<DownloadTask> {
        let mut tasks = Vec::with_capacity(2);

        // ── Main artifact ──
        match lib.artifact() {
            Some(artifact) => match self.declared_dest(artifact, &lib.name, None) {
                Some(dest) => tasks.push(
                    DownloadTask::new(&artifact.url, dest, artifact.expected_hash())
                        .with_size(artifact.size),
                ),
                None => warn!("Library {} has no usable path", lib.name),
            },
            None => match MavenArtifact::parse(&lib.name) {
                Ok(coord) => {
                    let base = lib
                        .url
                        .as_deref()
                        .filter(|u| !u.is_empty())
                        .unwrap_or(&self.libraries_url);
                    tasks.push(DownloadTask::new(
                        coord.url(base),
                        self.libraries_dir.join(coord.local_path()),
                        None,
                    ));
                }
                Err(e) => warn!("Skipping library: {}", e),
            },
        }

        // ── Native classifier ──
        if let Some(classifier) = lib.native_classifier(&self.platform) {
            match lib.native_artifact(&self.platform).filter(|a| !a.url.is_empty()) {
                Some(native) => {
                    if let Some(dest) = self.declared_dest(native, &lib.name, Some(&classifier)) {
                        tasks.push(
                            DownloadTask::new(&native.url, dest, native.expected_hash())
                                .with_size(native.size),
                        );
                    }
                }
                None => debug!(
                    "{} maps {} to {} but ships no such classifier",
                    lib.name, self.platform.os, classifier
                ),
            }
        }

        tasks
    }

    /// Declared relative path, else the URL path, else the coordinate layout.
    fn declared_dest(
        &self,
        artifact: &DownloadArtifact,
        name: &str,
        classifier: Option<&str>,
    ) -> Option<PathBuf> {
        if let Some(rel) = artifact.path.as_deref().filter(|p| !p.is_empty()) {
            return Some(join_relative(&self.libraries_dir, rel));
        }

        let coord = MavenArtifact::parse(name).and_then(|coord| match classifier {
            Some(classifier) => coord.with_classifier(classifier),
            None => Ok(coord),
        });
        match coord.ok() {
            Some(coord) => Some(self.libraries_dir.join(coord.local_path())),
            None => artifact
                .relative_path()
                .map(|rel| join_relative(&self.libraries_dir, &rel)),
        }
    }

    /// Asset object tasks; fetches (or falls back to the cached) asset index.
    pub async fn plan_assets(
        &self,
        client: &Client,
        version: &VersionJson,
    ) -> LauncherResult<Vec<DownloadTask>> {
        let Some(index) = load_asset_index(client, version, &self.assets_dir).await? else {
            return Ok(Vec::new());
        };
        Ok(index.object_tasks(&self.assets_dir, &self.resources_url))
    }

    /// Every task for the version, in client → libraries → assets order.
    pub async fn plan(
        &self,
        client: &Client,
        version: &VersionJson,
    ) -> LauncherResult<Vec<DownloadTask>> {
        let mut tasks: Vec<_> = self.plan_client(version).into_iter().collect();
        tasks.extend(self.plan_libraries(version));
        tasks.extend(self.plan_assets(client, version).await?);

        info!("Planned {} tasks for {}", tasks.len(), version.id);
        Ok(tasks)
    }
}

/// Join a forward-slash relative path segment by segment.
fn join_relative(root: &Path, rel: &str) -> PathBuf {
    rel.split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .fold(root.to_path_buf(), |acc, seg| acc.join(seg))
}
