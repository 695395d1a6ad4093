//! HTTP handlers for uploads and downloads.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::Local;
use log::{info, warn};

use crate::error::{StorageError, TransferError};
use crate::error::handlers::{download_error_response, upload_error_response};
use crate::server::AppState;
use crate::storage::allocator::extension_of;
use crate::storage::{prepare_file_retrieval, prepare_file_storage};
use crate::transfer::file_ops::{handle_file_download, handle_file_upload};
use crate::transfer::results::{StoredFile, UploadResult};

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// Answers CORS preflight requests with an empty body.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// `POST /upload`
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match store_upload(&state, multipart).await {
        Ok(stored) => UploadResult::success(stored).into_response(),
        Err(e) => upload_error_response(e),
    }
}

/// Any other method on `/upload`
pub async fn upload_method_not_allowed(method: Method) -> Response {
    warn!("Rejected {} on upload endpoint", method);
    upload_error_response(TransferError::MethodNotAllowed)
}

async fn store_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<StoredFile, TransferError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Upload is not a readable multipart form: {}", e);
        TransferError::ReadFile
    })?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| {
                warn!("Failed to parse multipart data: {}", e);
                TransferError::ReadFile
            })?
            .ok_or(TransferError::ReadFile)?;

        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let origin_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!("Skipping field '{}' without a file name", FILE_FIELD);
                continue;
            }
        };
        info!("Upload started: {} (extension: '{}')", origin_name, extension_of(&origin_name));

        let now = Local::now();
        let (store, temp_file) =
            prepare_file_storage(&state.data_dir, &state.allocator, &origin_name, &now).await?;

        let size = handle_file_upload(
            field,
            &store,
            temp_file,
            state.config.max_file_size_bytes(),
        )
        .await?;

        let stored = StoredFile::new(&state.config, &store.allocated, origin_name, size);
        info!("Upload finished: {} -> {}", stored.origin_name, stored.remote_path);
        return Ok(stored);
    }
}

/// Every path other than `/upload`: `GET` downloads, `OPTIONS` is a
/// preflight, anything else is refused.
pub async fn download_file(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::GET {
        warn!("Rejected {} on {}", method, uri.path());
        return download_error_response(TransferError::MethodNotAllowed);
    }

    info!("Download requested: {}", uri.path());
    match serve_download(&state, uri.path()).await {
        Ok(response) => response,
        Err(e) => download_error_response(e),
    }
}

async fn serve_download(state: &AppState, raw_path: &str) -> Result<Response, TransferError> {
    let target = prepare_file_retrieval(&state.data_dir, raw_path)
        .await
        .map_err(|e| {
            warn!("Download of {} refused: {}", raw_path, e);
            match e {
                StorageError::InvalidPath(_) | StorageError::PathTraversal(_) => {
                    TransferError::BadRequest
                }
                _ => TransferError::NotFound,
            }
        })?;
    handle_file_download(&target).await
}
