//! JavaScript-facing data shapes.
//!
//! Everything crossing the boundary goes through `serde-wasm-bindgen`, so the
//! TypeScript side sees plain objects with camelCase keys, nested core types
//! included. Enum values stay as they are (`"Previewing"`, `"not_found"`).

use rawcrop_core::{
    ActiveView, CropBox, CropSession, KeyOutcome, Workflow, WorkflowState,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// One entry of the uploaded-files list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsFileEntry {
    pub name: String,
    pub remote_id: String,
    pub active: bool,
}

/// Crop view geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsCropView {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
    pub rotation: i32,
    pub zoom: f64,
    pub source_width: u32,
    pub source_height: u32,
}

impl From<&CropSession> for JsCropView {
    fn from(session: &CropSession) -> Self {
        let b = session.crop_box();
        Self {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
            rotation: session.rotation(),
            zoom: session.zoom(),
            source_width: session.source().width,
            source_height: session.source().height,
        }
    }
}

/// Everything the view renders from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsSnapshot {
    pub state: WorkflowState,
    pub busy: bool,
    pub clear_armed: bool,
    pub files: Vec<JsFileEntry>,
    pub active: Option<ActiveView>,
    pub crop: Option<JsCropView>,
}

impl JsSnapshot {
    pub fn capture(workflow: &Workflow) -> Self {
        let active_index = workflow.store().active_index();
        Self {
            state: workflow.state(),
            busy: workflow.is_busy(),
            clear_armed: workflow.is_clear_armed(),
            files: workflow
                .store()
                .iter()
                .enumerate()
                .map(|(i, r)| JsFileEntry {
                    name: r.name.clone(),
                    remote_id: r.remote_id.clone(),
                    active: Some(i) == active_index,
                })
                .collect(),
            active: workflow.active_view(),
            crop: workflow.session().map(JsCropView::from),
        }
    }
}

/// Crop box as sent by pointer handlers. Fractional pixels are rounded.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct JsBoxInput {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl JsBoxInput {
    pub fn to_crop_box(self) -> Option<CropBox> {
        let values = [self.x, self.y, self.width, self.height];
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(CropBox::new(
            self.x.round() as i64,
            self.y.round() as i64,
            self.width.round() as i64,
            self.height.round() as i64,
        ))
    }
}

/// Key outcome as the string the view switches on.
pub fn key_outcome_name(outcome: KeyOutcome) -> &'static str {
    match outcome {
        KeyOutcome::Ignored => "ignored",
        KeyOutcome::Nudged => "nudged",
        KeyOutcome::CommitRequested => "commit_requested",
        KeyOutcome::Cancelled => "cancelled",
    }
}

/// Serialize a value for JavaScript.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}
