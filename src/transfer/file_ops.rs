//! File upload and download
//!
//! Streams request bodies into reserved files and stored files back out as
//! response bodies.

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{Stream, StreamExt, TryStreamExt};
use log::{error, info, warn};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::pin;
use tokio::fs::{File, hard_link, remove_file};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::error::TransferError;
use crate::storage::{RetrieveResult, StoreResult};

/// Removes the reservation file if an upload is abandoned mid-flight.
///
/// Completed and failed uploads clean up asynchronously and disarm the guard;
/// the blocking removal only runs when the upload future is dropped.
struct PartialUpload {
    temp_path: PathBuf,
    armed: bool,
}

impl PartialUpload {
    fn new(temp_path: &Path) -> Self {
        Self {
            temp_path: temp_path.to_path_buf(),
            armed: true,
        }
    }

    /// Remove the reservation without blocking the runtime
    async fn release(mut self) {
        self.armed = false;
        match remove_file(&self.temp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove reservation {}: {}",
                self.temp_path.display(),
                e
            ),
        }
    }
}

impl Drop for PartialUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.temp_path) {
            Ok(()) => info!("Removed partial upload {}", self.temp_path.display()),
            Err(e) => warn!(
                "Failed to remove partial upload {}: {}",
                self.temp_path.display(),
                e
            ),
        }
    }
}

/// Copies `source` into the reservation, then links it under its final name.
///
/// Returns the number of bytes received. The reservation is always removed
/// afterwards. On failure nothing is left under the final name, and a file
/// already stored under that name is never replaced.
pub async fn handle_file_upload<S, E>(
    source: S,
    store: &StoreResult,
    temp_file: File,
    max_file_size: Option<u64>,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let guard = PartialUpload::new(&store.temp_path);
    info!(
        "Starting file upload: {} -> {}",
        store.temp_path.display(),
        store.file_path.display()
    );

    let result = write_and_commit(source, store, temp_file, max_file_size).await;
    guard.release().await;

    if let Ok(total_bytes_received) = result {
        info!(
            "File upload completed successfully: {} ({total_bytes_received} bytes)",
            store.file_path.display()
        );
    }
    result
}

async fn write_and_commit<S, E>(
    source: S,
    store: &StoreResult,
    mut temp_file: File,
    max_file_size: Option<u64>,
) -> Result<u64, TransferError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    let mut source = pin!(source);
    let final_path = store.file_path.display();
    let mut total_bytes_received = 0u64;

    while let Some(chunk) = source.next().await {
        let chunk = chunk.map_err(|e| {
            error!("Read failure on upload stream for {final_path}: {e}");
            TransferError::WriteFile
        })?;

        // Check file size limit BEFORE writing (fail fast)
        total_bytes_received += chunk.len() as u64;
        if let Some(max) = max_file_size {
            if total_bytes_received > max {
                error!("File size limit exceeded: {total_bytes_received} bytes > {max} bytes");
                return Err(TransferError::FileTooLarge);
            }
        }

        temp_file.write_all(&chunk).await.map_err(|e| {
            error!("Failed to write to temporary file for {final_path}: {e}");
            TransferError::WriteFile
        })?;
    }

    // Ensure all data is on disk before the name becomes visible
    if let Err(e) = temp_file.flush().await {
        error!("Failed to flush temporary file for {final_path}: {e}");
        return Err(TransferError::WriteFile);
    }
    if let Err(e) = temp_file.sync_all().await {
        error!("Failed to sync temporary file for {final_path}: {e}");
        return Err(TransferError::WriteFile);
    }
    drop(temp_file);

    // hard_link fails if the final name exists, unlike rename
    match hard_link(&store.temp_path, &store.file_path).await {
        Ok(()) => Ok(total_bytes_received),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            error!("Refusing to replace stored file {final_path}");
            Err(TransferError::CreateFile)
        }
        Err(e) => {
            error!("Failed to commit {} to {final_path}: {e}", store.temp_path.display());
            Err(TransferError::WriteFile)
        }
    }
}

/// `attachment; filename="<name>"`, with quotes and backslashes escaped
pub fn content_disposition(file_name: &str) -> Result<HeaderValue, TransferError> {
    let escaped = file_name.replace('\\', "\\\\").replace('"', "\\\"");
    HeaderValue::from_bytes(format!("attachment; filename=\"{escaped}\"").as_bytes())
        .map_err(|_| TransferError::BadRequest)
}

/// Opens a resolved file and streams it as an `application/octet-stream`
/// attachment.
///
/// A read error after the headers are sent can only abort the body; it is
/// logged and the connection is cut.
pub async fn handle_file_download(target: &RetrieveResult) -> Result<Response, TransferError> {
    info!("Starting file download: {}", target.file_path.display());

    let disposition = content_disposition(&target.file_name)?;

    let file = File::open(&target.file_path).await.map_err(|e| {
        error!("Failed to open file {}: {}", target.file_path.display(), e);
        TransferError::NotFound
    })?;

    let path = target.file_path.display().to_string();
    let stream = ReaderStream::new(file)
        .inspect_err(move |e| error!("Read error on {path} while streaming: {e}"));

    let headers = [
        (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
        (CONTENT_DISPOSITION, disposition),
        (CONTENT_LENGTH, HeaderValue::from(target.size)),
    ];

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}
