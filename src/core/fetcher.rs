// ─── Artifact Fetcher ───
// One retrieval session: resolve → plan client → plan libraries → plan assets
// → drain the pool → report.

use std::sync::Arc;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::core::config::LauncherConfig;
use crate::core::downloader::{DownloadTask, PathLocks, ProgressTracker, WorkerPool};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::planner::TaskPlanner;
use crate::core::platform::Platform;
use crate::core::verify::{verify_installation, VerificationResult};
use crate::core::version::{VersionJson, VersionResolver};

/// Outcome of a session that ran to completion.
#[derive(Debug)]
pub struct DownloadReport {
    /// The effective (merged) manifest.
    pub version: VersionJson,
    pub completed: usize,
    pub total: usize,
    pub failures: Vec<Arc<LauncherError>>,
}

impl DownloadReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ArtifactFetcher {
    config: LauncherConfig,
    client: Client,
    platform: Platform,
    /// Shared by every session so concurrent sessions serialize per file.
    path_locks: Arc<PathLocks>,
}

impl ArtifactFetcher {
    pub fn new(config: LauncherConfig) -> LauncherResult<Self> {
        Ok(Self {
            config,
            client: build_http_client()?,
            platform: Platform::host(),
            path_locks: Arc::new(PathLocks::new()),
        })
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub async fn resolve(&self, id: &str) -> LauncherResult<VersionJson> {
        VersionResolver::new(self.client.clone(), &self.config)
            .resolve(id)
            .await
    }

    /// Retrieve everything `id` needs. Per-task failures are collected in the
    /// report; resolution or planning failures abort the session.
    pub async fn download_version(
        &self,
        id: &str,
        progress: Arc<ProgressTracker>,
        cancel: CancellationToken,
    ) -> LauncherResult<DownloadReport> {
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        self.config.ensure_dirs().await?;
        let version = self.resolve(id).await?;
        if cancel.is_cancelled() {
            return Err(LauncherError::Cancelled);
        }

        // A planning failure cancels this session only, not the caller's token.
        let session = cancel.child_token();
        let pool = WorkerPool::new(
            self.client.clone(),
            self.config.concurrency,
            self.config.queue_capacity,
        )
        .with_progress(Arc::clone(&progress))
        .with_path_locks(Arc::clone(&self.path_locks));
        pool.start(session.clone())?;

        let planned = self.plan_and_submit(&pool, &progress, &version).await;
        if planned.is_err() {
            session.cancel();
        }
        pool.wait().await;
        planned?;

        if cancel.is_cancelled() {
            info!("Session for {} cancelled", id);
            return Err(LauncherError::Cancelled);
        }

        let (completed, total) = progress.counts();
        let failures = pool.errors();
        if failures.is_empty() {
            info!("{} is up to date ({} files)", id, total);
        } else {
            warn!("{}: {} of {} files failed", id, failures.len(), total);
        }

        Ok(DownloadReport {
            version,
            completed,
            total,
            failures,
        })
    }

    /// Same as `download_version`, but any failed task fails the call.
    /// Already-valid files are skipped, so this is safe to re-run.
    pub async fn repair_version(
        &self,
        id: &str,
        progress: Arc<ProgressTracker>,
        cancel: CancellationToken,
    ) -> LauncherResult<DownloadReport> {
        let report = self.download_version(id, progress, cancel).await?;
        if report.is_success() {
            Ok(report)
        } else {
            Err(LauncherError::IncompleteDownload {
                id: id.to_string(),
                failed: report.failures.len(),
                total: report.total,
            })
        }
    }

    /// Offline check of an already resolved version.
    pub async fn verify(&self, version: &VersionJson) -> LauncherResult<Vec<VerificationResult>> {
        verify_installation(&self.config, version, &self.platform).await
    }

    async fn plan_and_submit(
        &self,
        pool: &WorkerPool,
        progress: &ProgressTracker,
        version: &VersionJson,
    ) -> LauncherResult<()> {
        let planner = TaskPlanner::new(&self.config, self.platform.clone());

        let client: Vec<_> = planner.plan_client(version).into_iter().collect();
        submit_batch(pool, progress, client).await?;

        submit_batch(pool, progress, planner.plan_libraries(version)).await?;

        let assets = planner.plan_assets(&self.client, version).await?;
        submit_batch(pool, progress, assets).await
    }
}

/// Grow the session totals, then queue the batch.
async fn submit_batch(
    pool: &WorkerPool,
    progress: &ProgressTracker,
    tasks: Vec<DownloadTask>,
) -> LauncherResult<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    progress.add_total(tasks.len());
    progress.add_total_bytes(tasks.iter().filter_map(|t| t.size).sum());

    for task in tasks {
        pool.submit(task).await?;
    }
    Ok(())
}
