//! In-memory gateway for tests: records every call and answers from a script.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::Gateway;
use crate::crop::CropRequest;
use crate::error::GatewayError;
use crate::record::{CropResult, UploadReceipt};

pub(crate) struct ScriptedGateway {
    pub uploads: RefCell<Vec<String>>,
    pub crops: RefCell<Vec<CropRequest>>,
    pub clears: Cell<usize>,
    upload_failures: RefCell<HashMap<String, GatewayError>>,
    crop_outcome: RefCell<Option<Result<CropResult, GatewayError>>>,
    clear_outcome: RefCell<Result<String, GatewayError>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            uploads: RefCell::new(Vec::new()),
            crops: RefCell::new(Vec::new()),
            clears: Cell::new(0),
            upload_failures: RefCell::new(HashMap::new()),
            crop_outcome: RefCell::new(None),
            clear_outcome: RefCell::new(Ok("All data cleared".to_string())),
        }
    }

    pub fn fail_upload(&self, filename: &str, error: GatewayError) {
        self.upload_failures
            .borrow_mut()
            .insert(filename.to_string(), error);
    }

    pub fn set_crop_outcome(&self, outcome: Result<CropResult, GatewayError>) {
        *self.crop_outcome.borrow_mut() = Some(outcome);
    }

    pub fn set_clear_outcome(&self, outcome: Result<String, GatewayError>) {
        *self.clear_outcome.borrow_mut() = outcome;
    }

    pub fn remote_id(filename: &str) -> String {
        format!("uuid_{filename}")
    }

    pub fn preview_uri(filename: &str) -> String {
        format!("http://127.0.0.1:8000/processed/uuid_{filename}.jpg")
    }
}

impl Gateway for ScriptedGateway {
    async fn upload(&self, _bytes: &[u8], filename: &str) -> Result<UploadReceipt, GatewayError> {
        self.uploads.borrow_mut().push(filename.to_string());
        if let Some(err) = self.upload_failures.borrow().get(filename) {
            return Err(err.clone());
        }
        Ok(UploadReceipt {
            remote_id: Self::remote_id(filename),
            preview_uri: Self::preview_uri(filename),
            raw_download_uri: Some(format!("http://127.0.0.1:8000/uploads/{filename}")),
        })
    }

    async fn crop(&self, request: &CropRequest) -> Result<CropResult, GatewayError> {
        self.crops.borrow_mut().push(request.clone());
        match self.crop_outcome.borrow().clone() {
            Some(outcome) => outcome,
            None => Ok(CropResult {
                preview_uri: format!("http://127.0.0.1:8000/processed/{}_crop.jpg", request.file_id),
                raw_download_uri: format!(
                    "http://127.0.0.1:8000/processed/{}_crop.raw",
                    request.file_id
                ),
            }),
        }
    }

    async fn clear_all(&self) -> Result<String, GatewayError> {
        self.clears.set(self.clears.get() + 1);
        self.clear_outcome.borrow().clone()
    }
}
