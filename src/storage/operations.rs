//! Storage operations
//!
//! Prepares upload destinations and resolves download targets on the
//! date-partitioned storage tree.

use chrono::{DateTime, TimeZone};
use log::{error, info, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};

use crate::error::StorageError;
use crate::storage::allocator::PathAllocator;
use crate::storage::results::{AllocatedPath, RetrieveResult, StoreResult};
use crate::storage::validation::resolve_and_validate_file_path;

/// Fresh names tried before giving up on a reservation
pub const MAX_ALLOCATION_ATTEMPTS: usize = 8;

/// Hidden reservation file an upload is written to before commit
pub fn temp_path_for(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(format!(".{file_name}.part"))
}

/// Real directory for an allocation
fn real_dir(server_root: &Path, allocated: &AllocatedPath) -> PathBuf {
    server_root.join(allocated.relative_dir.trim_matches('/'))
}

/// Prepares for file storage.
///
/// Creates the date directory and reserves a name by creating its hidden
/// reservation file with create-new semantics. A name whose reservation or
/// final file already exists is discarded and a fresh one is allocated, so
/// concurrent uploads can never share a destination.
pub async fn prepare_file_storage<Tz: TimeZone>(
    server_root: &Path,
    allocator: &PathAllocator,
    origin_name: &str,
    now: &DateTime<Tz>,
) -> Result<(StoreResult, File), StorageError> {
    let mut allocated = allocator.allocate(origin_name, now);
    let dir = real_dir(server_root, &allocated);

    if let Err(e) = fs::create_dir_all(&dir).await {
        error!("Failed to create directory {}: {}", dir.display(), e);
        return Err(StorageError::CreateDirectory(dir.display().to_string(), e));
    }

    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        if attempt > 1 {
            allocated = allocator.allocate(origin_name, now);
        }

        let file_path = dir.join(&allocated.file_name);
        let temp_path = temp_path_for(&dir, &allocated.file_name);

        let taken = fs::try_exists(&file_path).await.map_err(|e| {
            error!("Failed to check {}: {}", file_path.display(), e);
            StorageError::CreateFile(file_path.display().to_string(), e)
        })?;
        if taken {
            warn!(
                "Name collision on {} (attempt {}/{})",
                allocated.path(),
                attempt,
                MAX_ALLOCATION_ATTEMPTS
            );
            continue;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await
        {
            Ok(file) => {
                info!(
                    "Prepared file storage for {} (real: {})",
                    allocated.path(),
                    file_path.display()
                );
                return Ok((
                    StoreResult {
                        allocated,
                        file_path,
                        temp_path,
                    },
                    file,
                ));
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    "Upload already in progress for {} (attempt {}/{})",
                    allocated.path(),
                    attempt,
                    MAX_ALLOCATION_ATTEMPTS
                );
            }
            Err(e) => {
                error!("Failed to create file {}: {}", temp_path.display(), e);
                return Err(StorageError::CreateFile(temp_path.display().to_string(), e));
            }
        }
    }

    Err(StorageError::NamesExhausted(MAX_ALLOCATION_ATTEMPTS))
}

/// Prepares for file retrieval
pub async fn prepare_file_retrieval(
    server_root: &Path,
    raw_path: &str,
) -> Result<RetrieveResult, StorageError> {
    let (file_path, file_name) = resolve_and_validate_file_path(server_root, raw_path)?;

    let metadata = fs::metadata(&file_path).await?;
    if !metadata.is_file() {
        return Err(StorageError::FileNotFound(raw_path.to_string()));
    }

    info!(
        "Prepared file retrieval for {} (real: {})",
        raw_path,
        file_path.display()
    );

    Ok(RetrieveResult {
        file_path,
        file_name,
        size: metadata.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn storage_creates_date_directory_and_reservation() {
        let root = tempfile::tempdir().unwrap();
        let allocator = PathAllocator::with_seed(3);
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();

        let (store, _file) = prepare_file_storage(root.path(), &allocator, "report.PDF", &now)
            .await
            .unwrap();

        assert!(root.path().join("2024/03/05").is_dir());
        assert!(store.temp_path.exists());
        assert!(!store.file_path.exists());
        assert_eq!(store.file_path.parent(), store.temp_path.parent());
        assert!(
            store
                .temp_path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with('.')
        );
    }

    #[tokio::test]
    async fn taken_names_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();

        // Same seed, same first name: the second reservation must move on
        let (first, _f1) =
            prepare_file_storage(root.path(), &PathAllocator::with_seed(9), "a.txt", &now)
                .await
                .unwrap();
        let (second, _f2) =
            prepare_file_storage(root.path(), &PathAllocator::with_seed(9), "a.txt", &now)
                .await
                .unwrap();

        assert_ne!(first.allocated.file_name, second.allocated.file_name);
    }

    #[tokio::test]
    async fn unwritable_root_fails_directory_creation() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("blocker");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let result =
            prepare_file_storage(&blocker, &PathAllocator::new(), "a.txt", &now).await;
        assert!(matches!(result, Err(StorageError::CreateDirectory(..))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unusable_name_fails_file_creation() {
        let root = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();

        // An extension longer than any file name the filesystem accepts
        let origin_name = format!("a.{}", "x".repeat(300));
        let result =
            prepare_file_storage(root.path(), &PathAllocator::new(), &origin_name, &now).await;
        assert!(matches!(result, Err(StorageError::CreateFile(..))));
    }

    #[tokio::test]
    async fn retrieval_of_directory_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("2024/03/05")).unwrap();

        let result = prepare_file_retrieval(root.path(), "/2024/03/05").await;
        assert!(matches!(result, Err(StorageError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn retrieval_reports_size() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("2024/03/05")).unwrap();
        std::fs::write(root.path().join("2024/03/05/x.bin"), [1u8, 2, 3]).unwrap();

        let result = prepare_file_retrieval(root.path(), "/2024/03/05/x.bin")
            .await
            .unwrap();
        assert_eq!(result.size, 3);
        assert_eq!(result.file_name, "x.bin");
    }
}
