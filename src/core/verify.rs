//! Offline health check of an installed version: no network, only the local
//! client archive, libraries and natives against their declared hashes.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::LauncherConfig;
use crate::core::downloader::{verify_file, DownloadTask, HashCheck};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::planner::TaskPlanner;
use crate::core::platform::Platform;
use crate::core::version::VersionJson;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Missing,
    Corrupt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Path relative to the data directory.
    pub file: String,
    pub status: FileStatus,
}

/// Report every missing or corrupt file. An empty report means healthy.
pub async fn verify_installation(
    config: &LauncherConfig,
    version: &VersionJson,
    platform: &Platform,
) -> LauncherResult<Vec<VerificationResult>> {
    let planner = TaskPlanner::new(config, platform.clone());

    let client = planner
        .plan_client(version)
        .or_else(|| Some(DownloadTask::new("", planner.client_jar_path(version)?, None)));

    let mut results = Vec::new();
    for task in client.into_iter().chain(planner.plan_libraries(version)) {
        if let Some(status) = check(&task).await? {
            results.push(VerificationResult {
                file: display_path(&config.data_dir, &task.dest),
                status,
            });
        }
    }

    info!("Verified {}: {} problem(s)", version.id, results.len());
    Ok(results)
}

async fn check(task: &DownloadTask) -> LauncherResult<Option<FileStatus>> {
    let exists = tokio::fs::try_exists(&task.dest)
        .await
        .map_err(|e| LauncherError::io(&task.dest, e))?;
    if !exists {
        return Ok(Some(FileStatus::Missing));
    }

    match verify_file(&task.dest, task.expected_hash()).await {
        Ok(HashCheck::Match | HashCheck::NotApplicable) => Ok(None),
        Ok(HashCheck::Mismatch { actual }) => {
            debug!("{:?} hashes to {}", task.dest, actual);
            Ok(Some(FileStatus::Corrupt))
        }
        // Vanished or unreadable between the existence check and the read.
        Err(_) => Ok(Some(FileStatus::Corrupt)),
    }
}

fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}
