// ─── Version File ───
// The per-version manifest (Mojang version JSON or a loader profile layered
// on top of one) and helpers for reading it against a host platform.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{rules_allow, Platform, Rule};

/// A parsed version manifest. After resolution this is the effective,
/// fully merged description of one launchable version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits_from: Option<String>,
    /// Identifier whose client archive this version runs on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jar: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub version_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_index: Option<AssetIndexInfo>,
    /// Legacy asset index name, used when `assetIndex.id` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
    /// Legacy `minecraftArguments` field (pre-1.13).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minecraft_arguments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java_version: Option<JavaVersionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    #[serde(default)]
    pub component: Option<String>,
    pub major_version: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<DownloadArtifact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<DownloadArtifact>,
}

/// A downloadable file: client archive, library artifact or native classifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadArtifact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
}

impl DownloadArtifact {
    /// Declared path, else the path component of the URL.
    pub fn relative_path(&self) -> Option<String> {
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            return Some(path.to_string());
        }
        if self.url.is_empty() {
            return None;
        }

        let from_url = reqwest::Url::parse(&self.url)
            .ok()
            .map(|u| u.path().trim_start_matches('/').to_string())
            .filter(|p| !p.is_empty());

        from_url.or_else(|| self.url.rsplit('/').next().map(str::to_string))
    }

    pub fn expected_hash(&self) -> Option<&str> {
        self.sha1.as_deref().filter(|h| !h.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,
}

// ─── Arguments ───

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// One entry of an argument template: a bare flag or a rule-gated group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl Argument {
    pub fn values_for(&self, platform: &Platform) -> Vec<String> {
        match self {
            Argument::Plain(arg) => vec![arg.clone()],
            Argument::Conditional { rules, value } => {
                if !rules_allow(rules, platform) {
                    return vec![];
                }
                match value {
                    ArgumentValue::Single(s) => vec![s.clone()],
                    ArgumentValue::Many(values) => values.clone(),
                }
            }
        }
    }
}

fn render(args: &[Argument], platform: &Platform) -> Vec<String> {
    args.iter().flat_map(|a| a.values_for(platform)).collect()
}

// ─── Libraries ───

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Maven coordinate `group:artifact:version[:classifier][@ext]`.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloads: Option<LibraryDownloads>,
    /// Repository root for coordinate-derived downloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<Rule>,
    /// Normalized OS name → classifier key (may contain `${arch}`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub natives: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<DownloadArtifact>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub classifiers: BTreeMap<String, DownloadArtifact>,
}

impl LibraryEntry {
    pub fn is_allowed(&self, platform: &Platform) -> bool {
        rules_allow(&self.rules, platform)
    }

    /// The directly declared artifact, if it has a URL.
    pub fn artifact(&self) -> Option<&DownloadArtifact> {
        self.downloads
            .as_ref()?
            .artifact
            .as_ref()
            .filter(|a| !a.url.is_empty())
    }

    /// Classifier key for the platform with `${arch}` substituted.
    /// `None` when the library has no native mapping for this OS.
    pub fn native_classifier(&self, platform: &Platform) -> Option<String> {
        self.natives
            .get(&platform.os)
            .map(|c| c.replace("${arch}", platform.arch_bits()))
    }

    /// The native download for the platform, if both the mapping and the
    /// classifier descriptor exist.
    pub fn native_artifact(&self, platform: &Platform) -> Option<&DownloadArtifact> {
        let classifier = self.native_classifier(platform)?;
        self.downloads.as_ref()?.classifiers.get(&classifier)
    }
}

impl VersionJson {
    /// Parse raw manifest bytes, tagging errors with the requested id.
    pub fn from_slice(id: &str, raw: &[u8]) -> LauncherResult<Self> {
        serde_json::from_slice(raw).map_err(|source| LauncherError::ManifestParse {
            id: id.to_string(),
            source,
        })
    }

    /// Identifier whose client archive this version uses.
    pub fn jar_id(&self) -> &str {
        self.jar.as_deref().filter(|j| !j.is_empty()).unwrap_or(&self.id)
    }

    pub fn client_download(&self) -> Option<&DownloadArtifact> {
        self.downloads
            .as_ref()?
            .client
            .as_ref()
            .filter(|c| !c.url.is_empty())
    }

    /// Asset index name: `assetIndex.id`, else `assets`, else the version id.
    pub fn asset_index_id(&self) -> &str {
        self.asset_index
            .as_ref()
            .map(|ai| ai.id.as_str())
            .filter(|id| !id.is_empty())
            .or_else(|| self.assets.as_deref().filter(|a| !a.is_empty()))
            .unwrap_or(&self.id)
    }

    /// Required Java major version, defaulting to 8 for manifests that
    /// predate the field.
    pub fn required_java_major(&self) -> u32 {
        self.java_version
            .as_ref()
            .map(|j| j.major_version)
            .unwrap_or(8)
    }

    /// Game flags for the platform; legacy manifests split `minecraftArguments`.
    pub fn game_args(&self, platform: &Platform) -> Vec<String> {
        match &self.arguments {
            Some(args) if !args.game.is_empty() => render(&args.game, platform),
            _ => self
                .minecraft_arguments
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    pub fn jvm_args(&self, platform: &Platform) -> Vec<String> {
        self.arguments
            .as_ref()
            .map(|args| render(&args.jvm, platform))
            .unwrap_or_default()
    }
}
