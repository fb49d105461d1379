use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// Represents a fully parsed Maven coordinate.
///
/// Supported formats:
///   `groupId:artifactId:version`
///   `groupId:artifactId:version:classifier`
///   `groupId:artifactId:version[:classifier]@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

/// Identity of a library for merge purposes: the version is deliberately
/// absent so that two versions of the same artifact collapse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryKey {
    pub group_id: String,
    pub artifact_id: String,
    pub classifier: Option<String>,
}

impl MavenArtifact {
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            Some(_) => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        };

        // Every part becomes a path component under the libraries directory.
        let group_ok = parts[0].split('.').all(is_path_segment);
        let rest_ok = parts[1..].iter().chain([&extension]).all(|p| is_plain_name(p));
        if !group_ok || !rest_ok {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// Same coordinate with another classifier, e.g. a native variant.
    pub fn with_classifier(&self, classifier: &str) -> LauncherResult<Self> {
        if !is_plain_name(classifier) {
            return Err(LauncherError::InvalidMavenCoordinate(format!(
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.version, classifier
            )));
        }
        Ok(Self {
            classifier: Some(classifier.to_string()),
            ..self.clone()
        })
    }

    pub fn key(&self) -> LibraryKey {
        LibraryKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            classifier: self.classifier.clone(),
        }
    }

    /// `net.sf.jopt-simple` → `net/sf/jopt-simple`
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `artifactId-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Repository-relative path with forward slashes, as used in URLs.
    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_path(),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// `<repo>/<group_path>/<artifact_id>/<version>/<filename>`
    pub fn url(&self, repo_base: &str) -> String {
        format!(
            "{}/{}",
            repo_base.trim_end_matches('/'),
            self.relative_path()
        )
    }

    /// Local path relative to the libraries directory.
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.group_path())
            .join(&self.artifact_id)
            .join(&self.version)
            .join(self.filename())
    }
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && !s.contains(['/', '\\'])
}

fn is_plain_name(s: &str) -> bool {
    is_path_segment(s) && s != "." && s != ".."
}

/// Merge key for a raw coordinate string. Unparseable names key on
/// themselves so they still dedup against identical spellings.
pub fn library_key(name: &str) -> LibraryKey {
    match MavenArtifact::parse(name) {
        Ok(artifact) => artifact.key(),
        Err(_) => LibraryKey {
            group_id: name.to_string(),
            artifact_id: String::new(),
            classifier: None,
        },
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
