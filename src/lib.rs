pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::LauncherConfig;
pub use crate::core::downloader::{DownloadTask, ProgressSnapshot, ProgressTracker, WorkerPool};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::fetcher::{ArtifactFetcher, DownloadReport};
pub use crate::core::planner::TaskPlanner;
pub use crate::core::platform::Platform;
pub use crate::core::verify::{verify_installation, FileStatus, VerificationResult};
pub use crate::core::version::{VersionJson, VersionResolver};

/// Initialize structured logging. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_fetch=debug")),
        )
        .try_init();
}
