mod artifact;

pub use artifact::{library_key, LibraryKey, MavenArtifact};
