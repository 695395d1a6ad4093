//! Path validation
//!
//! Maps request paths onto the storage tree and rejects anything that could
//! resolve outside of it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Percent-decode a raw URL path
pub fn decode_url_path(raw: &str) -> Result<String, StorageError> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| StorageError::InvalidPath(raw.to_string()))
}

/// Split a decoded request path into safe segments.
///
/// Empty segments are skipped. `.` and `..` are traversal attempts; other
/// dot-prefixed names (including in-flight `.part` reservations) are never
/// served.
pub fn virtual_segments(virtual_path: &str) -> Result<Vec<&str>, StorageError> {
    let mut segments = Vec::new();

    for segment in virtual_path.split('/') {
        if segment.is_empty() {
            continue;
        }
        if segment == "." || segment == ".." {
            return Err(StorageError::PathTraversal(virtual_path.to_string()));
        }
        if segment.starts_with('.') || segment.contains(['\\', '\0']) {
            return Err(StorageError::InvalidPath(virtual_path.to_string()));
        }
        segments.push(segment);
    }

    Ok(segments)
}

/// Convert validated segments into a path under `server_root`
pub fn virtual_to_real_path(server_root: &Path, segments: &[&str]) -> PathBuf {
    segments
        .iter()
        .fold(server_root.to_path_buf(), |path, segment| path.join(segment))
}

/// Canonicalise `real_path` and make sure it stays under `server_root`.
///
/// Catches symlinks that point out of the storage tree.
pub fn ensure_within_root(server_root: &Path, real_path: &Path) -> Result<PathBuf, StorageError> {
    let canonical = real_path.canonicalize().map_err(|e| match e.kind() {
        ErrorKind::NotFound => StorageError::FileNotFound(real_path.display().to_string()),
        _ => StorageError::IoError(e),
    })?;
    let root = server_root.canonicalize()?;

    if !canonical.starts_with(&root) {
        return Err(StorageError::PathTraversal(real_path.display().to_string()));
    }

    Ok(canonical)
}

/// Resolve a raw request path to a real path and the download file name
pub fn resolve_and_validate_file_path(
    server_root: &Path,
    raw_path: &str,
) -> Result<(PathBuf, String), StorageError> {
    let decoded = decode_url_path(raw_path)?;
    let segments = virtual_segments(&decoded)?;

    // A directory-style path names no file
    if decoded.ends_with('/') {
        return Err(StorageError::FileNotFound(decoded));
    }

    let file_name = segments
        .last()
        .map(|s| s.to_string())
        .ok_or_else(|| StorageError::FileNotFound(decoded.clone()))?;

    let real_path = virtual_to_real_path(server_root, &segments);
    let canonical = ensure_within_root(server_root, &real_path)?;

    Ok((canonical, file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn traversal_segments_are_rejected() {
        for path in ["/../etc/passwd", "/2024/../../secret", "/./a", "/a/.."] {
            assert!(matches!(
                virtual_segments(path),
                Err(StorageError::PathTraversal(_))
            ));
        }
    }

    #[test]
    fn encoded_traversal_is_rejected() {
        let root = tempfile::tempdir().unwrap();
        let result = resolve_and_validate_file_path(root.path(), "/%2e%2e/%2e%2e/etc/passwd");
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));

        let result = resolve_and_validate_file_path(root.path(), "/..%2f..%2fetc");
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));
    }

    #[test]
    fn hidden_and_odd_segments_are_rejected() {
        assert!(virtual_segments("/2024/01/01/.123-abc.txt.part").is_err());
        assert!(virtual_segments("/a\\b").is_err());
        assert!(virtual_segments("/a\0b").is_err());
    }

    #[test]
    fn segments_map_under_root() {
        let segments = virtual_segments("//2024/03//05/x.txt").unwrap();
        assert_eq!(segments, vec!["2024", "03", "05", "x.txt"]);
        let real = virtual_to_real_path(Path::new("/srv/data"), &segments);
        assert_eq!(real, PathBuf::from("/srv/data/2024/03/05/x.txt"));
    }

    #[test]
    fn existing_file_resolves() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("2024/03/05")).unwrap();
        fs::write(root.path().join("2024/03/05/a b.txt"), b"hi").unwrap();

        let (path, name) =
            resolve_and_validate_file_path(root.path(), "/2024/03/05/a%20b.txt").unwrap();
        assert_eq!(name, "a b.txt");
        assert_eq!(fs::read(path).unwrap(), b"hi");
    }

    #[test]
    fn missing_file_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let result = resolve_and_validate_file_path(root.path(), "/2099/01/01/missing.txt");
        assert!(matches!(result, Err(StorageError::FileNotFound(_))));

        let result = resolve_and_validate_file_path(root.path(), "/");
        assert!(matches!(result, Err(StorageError::FileNotFound(_))));
    }

    #[test]
    fn trailing_slash_names_no_file() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("2024/03/05")).unwrap();
        fs::write(root.path().join("2024/03/05/x.txt"), b"hi").unwrap();

        for path in ["/2024/03/05/x.txt/", "/2024/03/05/x.txt%2f"] {
            let result = resolve_and_validate_file_path(root.path(), path);
            assert!(matches!(result, Err(StorageError::FileNotFound(_))), "{path}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.txt"), b"secret").unwrap();

        let root = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();

        let result = resolve_and_validate_file_path(root.path(), "/link/secret.txt");
        assert!(matches!(result, Err(StorageError::PathTraversal(_))));
    }
}
