use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single file to retrieve. Identity is the destination path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadTask {
    pub url: String,
    pub dest: PathBuf,
    /// Expected hex digest. `None` means presence alone counts as complete.
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

impl DownloadTask {
    /// Blank hashes are normalized to `None`.
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>, sha1: Option<&str>) -> Self {
        Self {
            url: url.into(),
            dest: dest.into(),
            sha1: sha1
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
            size: None,
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    /// `<dest>.part`, where partial transfers accumulate.
    pub fn part_path(&self) -> PathBuf {
        let mut name = self.dest.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }

    /// Basename used to label failures.
    pub fn file_name(&self) -> String {
        file_label(&self.dest)
    }

    pub fn expected_hash(&self) -> Option<&str> {
        self.sha1.as_deref()
    }
}

pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
