//! Remote processing gateway.
//!
//! The backend decodes, renders and crops RAW files; the client only drives it
//! through the three operations of [`Gateway`]. None of them is retried: RAW
//! processing is not idempotent on the storage side, so failures are surfaced
//! to the user instead.
//!
//! Futures returned by a gateway are not required to be `Send`. The client
//! runs on a single-threaded cooperative scheduler (the browser event loop).

pub mod wire;

#[cfg(test)]
pub(crate) mod scripted;

use crate::crop::CropRequest;
use crate::error::GatewayError;
use crate::record::{CropResult, UploadReceipt};

/// Boundary to the RAW processing backend.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    /// Upload one file and get its backend identifier and preview.
    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<UploadReceipt, GatewayError>;

    /// Crop the stored source identified by `request.file_id`.
    async fn crop(&self, request: &CropRequest) -> Result<CropResult, GatewayError>;

    /// Delete every file the backend holds. Returns the server's message.
    async fn clear_all(&self) -> Result<String, GatewayError>;
}
