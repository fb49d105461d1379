use std::path::PathBuf;
use thiserror::Error;

/// Central error type for version resolution and artifact retrieval.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Range not satisfiable for {url} even after restarting from zero")]
    RangeNotSatisfiable { url: String },

    // ── Integrity ───────────────────────────────────────
    #[error("Hash mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Resolution ──────────────────────────────────────
    #[error("Version catalog unreachable at {url}: {reason}")]
    CatalogUnavailable { url: String, reason: String },

    #[error("Version {0} not found in catalog")]
    VersionNotFound(String),

    #[error("Malformed manifest for {id}: {source}")]
    ManifestParse {
        id: String,
        source: serde_json::Error,
    },

    #[error("Version inheritance cycle at {id} (chain: {})", .chain.join(" -> "))]
    InheritanceCycle { id: String, chain: Vec<String> },

    #[error("Invalid version identifier: {0:?}")]
    InvalidVersionId(String),

    #[error("Asset index {id} unavailable and no cached copy: {reason}")]
    AssetIndexUnavailable { id: String, reason: String },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Worker pool ─────────────────────────────────────
    #[error("Invalid download task: {0}")]
    InvalidTask(String),

    #[error("Download pool is draining; no more tasks can be submitted")]
    PoolClosed,

    #[error("Download pool has not been started")]
    PoolNotStarted,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Failed to process {file}: {source}")]
    Task {
        file: String,
        source: Box<LauncherError>,
    },

    #[error("{failed} of {total} files for {id} could not be retrieved")]
    IncompleteDownload {
        id: String,
        failed: usize,
        total: usize,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Attach a path to an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the error (or the task failure it wraps) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            LauncherError::Cancelled => true,
            LauncherError::Task { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// Errors cross into UI consumers as their display string.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_error_carries_basename_and_cause() {
        let err = LauncherError::Task {
            file: "client.jar".into(),
            source: Box::new(LauncherError::DownloadFailed {
                url: "https://example.com/client.jar".into(),
                status: 404,
            }),
        };
        let text = err.to_string();
        assert!(text.starts_with("Failed to process client.jar"));
        assert!(text.contains("HTTP 404"));
    }

    #[test]
    fn cycle_error_lists_chain() {
        let err = LauncherError::InheritanceCycle {
            id: "a".into(),
            chain: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "Version inheritance cycle at a (chain: a -> b -> a)"
        );
    }

    #[test]
    fn cancellation_is_seen_through_task_wrapper() {
        let err = LauncherError::Task {
            file: "x".into(),
            source: Box::new(LauncherError::Cancelled),
        };
        assert!(err.is_cancelled());
        assert!(!LauncherError::PoolClosed.is_cancelled());
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&LauncherError::VersionNotFound("1.0".into())).unwrap();
        assert_eq!(json, "\"Version 1.0 not found in catalog\"");
    }
}
