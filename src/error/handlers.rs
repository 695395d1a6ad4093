//! Error handlers
//!
//! Converts transfer errors into HTTP responses.

use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::error::types::TransferError;
use crate::transfer::UploadResult;

/// Log a transfer error
pub fn handle_error(err: &TransferError) {
    error!("Transfer error: {}", err);
}

/// Convert error to HTTP status code
pub fn error_to_status(err: &TransferError) -> StatusCode {
    match err {
        TransferError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        TransferError::ReadFile
        | TransferError::CreateDir
        | TransferError::CreateFile
        | TransferError::WriteFile
        | TransferError::FileTooLarge
        | TransferError::BadRequest
        | TransferError::NotFound => StatusCode::BAD_REQUEST,
    }
}

/// Upload failures answer with the JSON envelope and a `400`.
pub fn upload_error_response(err: TransferError) -> Response {
    handle_error(&err);
    UploadResult::failure(StatusCode::BAD_REQUEST, err.to_string()).into_response()
}

/// Download failures answer with a plain-text body, except method errors
/// which reuse the JSON envelope.
pub fn download_error_response(err: TransferError) -> Response {
    handle_error(&err);
    let status = error_to_status(&err);
    match err {
        TransferError::MethodNotAllowed => {
            UploadResult::failure(status, err.to_string()).into_response()
        }
        _ => (
            status,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            err.to_string(),
        )
            .into_response(),
    }
}
