//! Transfer module for the file server
//!
//! Handles the upload and download request lifecycle.

pub mod file_ops;
pub mod handlers;
pub mod results;

// Re-export key types and functions
pub use file_ops::{handle_file_download, handle_file_upload};
pub use handlers::{download_file, preflight, upload_file, upload_method_not_allowed};
pub use results::{StoredFile, UploadResult};
