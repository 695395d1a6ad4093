//! Transfer result types
//!
//! Defines the JSON envelope returned by the upload endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::config::ServerConfig;
use crate::storage::AllocatedPath;

/// Description of a stored upload
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub remote_path: String,
    pub domain: String,
    pub path: String,
    pub new_name: String,
    pub origin_name: String,
    pub size: u64,
}

impl StoredFile {
    /// Build the record for a committed upload.
    ///
    /// With a group configured the remote path is `/<group><path>` and the
    /// domain is not part of it.
    pub fn new(
        config: &ServerConfig,
        allocated: &AllocatedPath,
        origin_name: String,
        size: u64,
    ) -> Self {
        let path = allocated.path();
        let base = match config.group_name() {
            Some(group) => format!("/{group}"),
            None => config.domain_base().to_string(),
        };

        Self {
            remote_path: format!("{base}{path}"),
            domain: config.domain.clone(),
            path,
            new_name: allocated.file_name.clone(),
            origin_name,
            size,
        }
    }
}

/// Wire envelope: `{code, message, data}`
#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub code: u16,
    pub message: String,
    pub data: Option<StoredFile>,
}

impl UploadResult {
    pub fn success(data: StoredFile) -> Self {
        Self {
            code: StatusCode::OK.as_u16(),
            message: "Upload success".to_string(),
            data: Some(data),
        }
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }
}

impl IntoResponse for UploadResult {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::BAD_REQUEST);
        (status, Json(self)).into_response()
    }
}
