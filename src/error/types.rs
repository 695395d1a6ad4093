//! Error types
//!
//! Defines domain-specific error types for each module of the file server.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Storage module errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to create directory {0}: {1}")]
    CreateDirectory(String, io::Error),
    #[error("Failed to create file {0}: {1}")]
    CreateFile(String, io::Error),
    #[error("No free file name after {0} attempts")]
    NamesExhausted(usize),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Path traversal attempt: {0}")]
    PathTraversal(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Transfer module errors
///
/// Each variant maps onto one wire message; the underlying cause is only logged.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Read file error")]
    ReadFile,
    #[error("Create file dir error")]
    CreateDir,
    #[error("Create file error")]
    CreateFile,
    #[error("Write file error")]
    WriteFile,
    #[error("File too large")]
    FileTooLarge,
    #[error("Bad request")]
    BadRequest,
    #[error("Not Found")]
    NotFound,
}

impl From<StorageError> for TransferError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::CreateDirectory(..) => TransferError::CreateDir,
            StorageError::CreateFile(..) | StorageError::NamesExhausted(_) => {
                TransferError::CreateFile
            }
            StorageError::InvalidPath(_) | StorageError::PathTraversal(_) => {
                TransferError::BadRequest
            }
            StorageError::FileNotFound(_) => TransferError::NotFound,
            StorageError::IoError(_) => TransferError::WriteFile,
        }
    }
}

/// Process-level errors surfaced by server startup
#[derive(Debug, Error)]
pub enum FileServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to bind to {0}: {1}")]
    Bind(SocketAddr, io::Error),
    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_collapse_to_wire_messages() {
        let err = StorageError::CreateDirectory("/2024".into(), io::ErrorKind::Other.into());
        assert_eq!(TransferError::from(err).to_string(), "Create file dir error");

        let err = StorageError::CreateFile("/2024/x.txt".into(), io::ErrorKind::InvalidInput.into());
        assert_eq!(TransferError::from(err).to_string(), "Create file error");

        let err = StorageError::NamesExhausted(8);
        assert_eq!(TransferError::from(err).to_string(), "Create file error");

        let err = StorageError::PathTraversal("/../etc".into());
        assert_eq!(TransferError::from(err).to_string(), "Bad request");

        let err = StorageError::FileNotFound("/missing".into());
        assert_eq!(TransferError::from(err).to_string(), "Not Found");
    }
}
