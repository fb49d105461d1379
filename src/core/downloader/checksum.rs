use std::path::Path;

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use tokio::io::AsyncReadExt;

use crate::core::error::{LauncherError, LauncherResult};

const READ_CHUNK: usize = 64 * 1024;

/// Digest algorithm, chosen from the length of the expected hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Md5,
}

impl HashAlgorithm {
    pub fn detect(expected_hex: &str) -> Option<Self> {
        match expected_hex.len() {
            40 => Some(Self::Sha1),
            64 => Some(Self::Sha256),
            32 => Some(Self::Md5),
            _ => None,
        }
    }
}

/// Outcome of checking a file against an expected digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashCheck {
    Match,
    Mismatch { actual: String },
    /// No expected hash was declared. Presence is all that is known; this is
    /// never a statement that the content is valid.
    NotApplicable,
}

impl HashCheck {
    pub fn is_match(&self) -> bool {
        matches!(self, HashCheck::Match)
    }
}

/// Stream `path` through the digest selected by `expected` and compare
/// case-insensitively.
pub async fn verify_file(path: &Path, expected: Option<&str>) -> LauncherResult<HashCheck> {
    let Some(expected) = expected.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(HashCheck::NotApplicable);
    };

    let Some(algorithm) = HashAlgorithm::detect(expected) else {
        return Ok(HashCheck::Mismatch {
            actual: format!("<unsupported digest length {}>", expected.len()),
        });
    };

    let actual = file_digest(path, algorithm).await?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(HashCheck::Match)
    } else {
        Ok(HashCheck::Mismatch { actual })
    }
}

/// Lowercase hex digest of a file.
pub async fn file_digest(path: &Path, algorithm: HashAlgorithm) -> LauncherResult<String> {
    match algorithm {
        HashAlgorithm::Sha1 => digest_with::<Sha1>(path).await,
        HashAlgorithm::Sha256 => digest_with::<Sha256>(path).await,
        HashAlgorithm::Md5 => digest_with::<Md5>(path).await,
    }
}

async fn digest_with<D: Digest>(path: &Path) -> LauncherResult<String> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| LauncherError::io(path, e))?;

    let mut hasher = D::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| LauncherError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// SHA-1 of an in-memory buffer.
pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}
