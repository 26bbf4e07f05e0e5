//! HTTP wire contract of the RAW processing backend.
//!
//! Transports only move bytes; everything about URLs, bodies, response
//! shapes and status classification lives here so every transport reports
//! failures identically.
//!
//! | Operation | Request                       | Success body                                  |
//! |-----------|-------------------------------|-----------------------------------------------|
//! | Upload    | `POST /upload/` multipart     | `{ filename, preview, raw_url? }`             |
//! | Crop      | `POST /crop-raw/` JSON        | `{ cropped_preview_url, cropped_raw_url }`    |
//! | Clear     | `DELETE /clear-data`          | `{ message }`                                 |

use serde::{Deserialize, Serialize};

use crate::crop::CropRequest;
use crate::error::GatewayError;
use crate::record::{CropResult, UploadReceipt};

/// Multipart field name carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// Backend operations, used to classify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Crop,
    Clear,
}

/// Endpoint URLs derived from a base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload(&self) -> String {
        format!("{}/upload/", self.base)
    }

    pub fn crop(&self) -> String {
        format!("{}/crop-raw/", self.base)
    }

    pub fn clear(&self) -> String {
        format!("{}/clear-data", self.base)
    }
}

/// JSON body of a crop request.
#[derive(Debug, Serialize)]
pub struct CropRawBody<'a> {
    pub filename: &'a str,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Omitted when zero so backends without rotation support see the plain shape.
    #[serde(skip_serializing_if = "is_zero")]
    pub rotation: i32,
}

fn is_zero(value: &i32) -> bool {
    *value == 0
}

impl<'a> From<&'a CropRequest> for CropRawBody<'a> {
    fn from(req: &'a CropRequest) -> Self {
        Self {
            filename: &req.file_id,
            x: req.x,
            y: req.y,
            width: req.width,
            height: req.height,
            rotation: req.rotation_degrees,
        }
    }
}

/// Serialize the crop body for `request`.
pub fn crop_body(request: &CropRequest) -> Result<String, GatewayError> {
    serde_json::to_string(&CropRawBody::from(request))
        .map_err(|e| GatewayError::Transport(format!("Failed to encode crop request: {}", e)))
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    filename: String,
    preview: String,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CropResponse {
    cropped_preview_url: String,
    cropped_raw_url: String,
}

#[derive(Debug, Deserialize)]
struct ClearResponse {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_success<T: for<'de> Deserialize<'de>>(op: Operation, body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| {
        GatewayError::Transport(format!("Malformed {:?} response: {}", op, e))
    })
}

/// Human-readable message from an error body, falling back to the status.
fn failure_message(status: u16, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.detail.map(|d| match d {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    });

    parsed
        .error
        .or(detail)
        .or(parsed.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Server responded with {}", status))
}

/// Classify a non-2xx response.
///
/// 400, 415 and 422 are validation failures. 404 means an unknown file for a
/// crop, and a missing endpoint for the other operations.
pub fn classify_failure(op: Operation, status: u16, body: &str) -> GatewayError {
    let message = failure_message(status, body);
    match (op, status) {
        (_, 400 | 415 | 422) => GatewayError::Validation(message),
        (Operation::Crop, 404) => GatewayError::NotFound(message),
        _ => GatewayError::Transport(message),
    }
}

/// Interpret an upload response.
pub fn read_upload(status: u16, body: &str) -> Result<UploadReceipt, GatewayError> {
    if !is_success(status) {
        return Err(classify_failure(Operation::Upload, status, body));
    }
    let resp: UploadResponse = parse_success(Operation::Upload, body)?;
    Ok(UploadReceipt {
        remote_id: resp.filename,
        preview_uri: resp.preview,
        raw_download_uri: resp.raw_url.filter(|u| !u.is_empty()),
    })
}

/// Interpret a crop response.
pub fn read_crop(status: u16, body: &str) -> Result<CropResult, GatewayError> {
    if !is_success(status) {
        return Err(classify_failure(Operation::Crop, status, body));
    }
    let resp: CropResponse = parse_success(Operation::Crop, body)?;
    Ok(CropResult {
        preview_uri: resp.cropped_preview_url,
        raw_download_uri: resp.cropped_raw_url,
    })
}

/// Interpret a clear-all response, returning the server's message.
pub fn read_clear(status: u16, body: &str) -> Result<String, GatewayError> {
    if !is_success(status) {
        return Err(classify_failure(Operation::Clear, status, body));
    }
    let resp: ClearResponse = parse_success(Operation::Clear, body)?;
    Ok(resp.message)
}
