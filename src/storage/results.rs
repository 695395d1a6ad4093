//! Storage result types
//!
//! Defines result structures returned by storage operations.

use std::path::PathBuf;

/// Output of the path allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedPath {
    /// Date directory, `/YYYY/MM/DD/`
    pub relative_dir: String,
    pub file_name: String,
}

impl AllocatedPath {
    /// Storage-relative path, `/YYYY/MM/DD/<file_name>`
    pub fn path(&self) -> String {
        format!("{}{}", self.relative_dir, self.file_name)
    }
}

/// A reserved upload destination
#[derive(Debug)]
pub struct StoreResult {
    pub allocated: AllocatedPath,
    pub file_path: PathBuf,
    pub temp_path: PathBuf,
}

/// A file resolved for download
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    pub file_path: PathBuf,
    /// Name sent in `Content-Disposition`
    pub file_name: String,
    pub size: u64,
}
