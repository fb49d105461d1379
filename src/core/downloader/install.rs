use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::checksum::{verify_file, HashCheck};
use crate::core::error::{LauncherError, LauncherResult};

/// Move a fully downloaded temp file into place.
///
/// The temp file is verified before the destination is touched; on mismatch it
/// is deleted and the destination is left as it was. The final step is a single
/// rename, which replaces any existing file without exposing a partial one.
pub async fn commit_file(
    temp_path: &Path,
    final_path: &Path,
    expected_hash: Option<&str>,
) -> LauncherResult<()> {
    match verify_file(temp_path, expected_hash).await {
        Ok(HashCheck::Match) | Ok(HashCheck::NotApplicable) => {}
        Ok(HashCheck::Mismatch { actual }) => {
            discard(temp_path).await;
            return Err(LauncherError::HashMismatch {
                path: final_path.to_path_buf(),
                expected: expected_hash.unwrap_or_default().to_string(),
                actual,
            });
        }
        Err(e) => {
            discard(temp_path).await;
            return Err(e);
        }
    }

    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }

    tokio::fs::rename(temp_path, final_path)
        .await
        .map_err(|e| LauncherError::io(final_path, e))?;

    debug!("Installed {:?}", final_path);
    Ok(())
}

/// Write a small document (manifest, index, settings) so readers only ever see
/// the previous or the complete new contents.
pub async fn atomic_write(path: &Path, data: &[u8]) -> LauncherResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| LauncherError::io(dir, e))?;

    let tmp = temp_sibling(path);
    let written = async {
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok::<_, std::io::Error>(())
    }
    .await;

    if let Err(e) = written {
        discard(&tmp).await;
        return Err(LauncherError::io(&tmp, e));
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        discard(&tmp).await;
        return Err(LauncherError::io(path, e));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp-{}", name, uuid::Uuid::new_v4().simple()))
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::checksum::sha1_hex;

    #[tokio::test]
    async fn commit_moves_verified_file_into_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let temp_file = tmp.path().join("test_file.part");
        let final_file = tmp.path().join("final_subdir").join("test_file.jar");
        std::fs::write(&temp_file, b"Valid Content").unwrap();

        commit_file(&temp_file, &final_file, Some(&sha1_hex(b"Valid Content")))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&final_file).unwrap(), b"Valid Content");
        assert!(!temp_file.exists());
    }

    #[tokio::test]
    async fn corrupt_temp_is_discarded_and_destination_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let temp_file = tmp.path().join("corrupt.part");
        let final_file = tmp.path().join("corrupt.jar");
        std::fs::write(&temp_file, b"Corrupt Content").unwrap();
        std::fs::write(&final_file, b"previous").unwrap();

        let err = commit_file(&temp_file, &final_file, Some(&sha1_hex(b"expected")))
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::HashMismatch { .. }));
        assert!(!temp_file.exists());
        assert_eq!(std::fs::read(&final_file).unwrap(), b"previous");
    }

    #[tokio::test]
    async fn commit_replaces_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let temp_file = tmp.path().join("new.part");
        let final_file = tmp.path().join("new.jar");
        std::fs::write(&temp_file, b"new").unwrap();
        std::fs::write(&final_file, b"old contents").unwrap();

        commit_file(&temp_file, &final_file, None).await.unwrap();
        assert_eq!(std::fs::read(&final_file).unwrap(), b"new");
    }

    #[tokio::test]
    async fn atomic_write_leaves_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("doc.json");

        atomic_write(&target, b"{\"a\":1}").await.unwrap();
        atomic_write(&target, b"{\"a\":2}").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"{\"a\":2}");
        let entries: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
