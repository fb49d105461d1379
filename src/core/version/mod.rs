pub mod manifest;
pub mod merge;
pub mod resolver;
pub mod version_file;

pub use manifest::{VersionEntry, VersionManifest};
pub use merge::merge_with_parent;
pub use resolver::{validate_version_id, VersionResolver};
pub use version_file::{
    Argument, ArgumentValue, Arguments, AssetIndexInfo, DownloadArtifact, JavaVersionInfo,
    LibraryDownloads, LibraryEntry, VersionDownloads, VersionJson,
};
