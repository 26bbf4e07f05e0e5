//! Workflow bindings.
//!
//! [`JsWorkflow`] owns the controller and the fetch gateway. Remote operations
//! return a `Promise`; their futures hold clones of the shared handles and
//! never keep the controller borrowed across an await, so the view can keep
//! calling synchronous methods (remove, abandon, snapshot) meanwhile.
//!
//! # Usage
//!
//! ```typescript
//! const workflow = new JsWorkflow({ base_url: 'http://127.0.0.1:8000' });
//!
//! dropZone.addEventListener('drop', async (e) => {
//!   e.preventDefault();
//!   await workflow.ingest_files(e.dataTransfer.files);
//!   render(workflow.snapshot(), workflow.take_notices());
//! });
//! window.addEventListener('paste', (e) => workflow.ingest_paste(e).then(refresh));
//! window.addEventListener('keydown', (e) => workflow.handle_key(e) !== 'ignored' && refresh());
//! ```

use std::cell::RefCell;
use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use js_sys::Promise;
use rawcrop_core::{
    ClearOutcome, ClientConfig, CommitOutcome, Gateway, Key, KeyOutcome, KeyPress, NoticeLevel,
    Workflow,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{ClipboardEvent, FileList, KeyboardEvent};

use crate::fetch::FetchGateway;
use crate::files::{clipboard_files, list_files, read_clipboard, read_files, ReadFailures};
use crate::types::{key_outcome_name, to_js, JsBoxInput, JsSnapshot};

fn js_error(error: impl Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn report_read_failures(workflow: &RefCell<Workflow>, failures: ReadFailures) {
    let mut workflow = workflow.borrow_mut();
    for message in failures {
        workflow.notify(NoticeLevel::Transport, message);
    }
}

pub(crate) fn commit_outcome_name(outcome: CommitOutcome) -> &'static str {
    match outcome {
        CommitOutcome::Applied => "applied",
        CommitOutcome::TargetRemoved => "target_removed",
        CommitOutcome::Discarded => "discarded",
    }
}

/// Upload, preview and crop controller for one view.
#[wasm_bindgen]
pub struct JsWorkflow {
    workflow: Rc<RefCell<Workflow>>,
    gateway: Rc<FetchGateway>,
}

impl JsWorkflow {
    fn from_config(config: ClientConfig) -> Self {
        log::info!("Workflow backend at {}", config.base_url);
        let gateway = Rc::new(FetchGateway::new(&config.base_url));
        Self {
            workflow: Rc::new(RefCell::new(Workflow::new(config))),
            gateway,
        }
    }

    fn commit_future(&self) -> impl Future<Output = Result<CommitOutcome, JsValue>> + 'static {
        let workflow = self.workflow.clone();
        let gateway = self.gateway.clone();
        async move {
            let ticket = workflow.borrow_mut().start_commit().map_err(js_error)?;
            let result = gateway.crop(ticket.request()).await;
            let outcome = workflow.borrow_mut().finish_commit(ticket, result);
            outcome.map_err(js_error)
        }
    }
}

#[wasm_bindgen]
impl JsWorkflow {
    /// Create a workflow. `config` is a partial `ClientConfig` object, or
    /// `undefined` for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsWorkflow, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            ClientConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<ClientConfig>(config).map_err(js_error)?
        };
        let config = config.validated().map_err(js_error)?;
        Ok(Self::from_config(config))
    }

    /// Create a workflow from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<JsWorkflow, JsValue> {
        let config = ClientConfig::from_json(json).map_err(js_error)?;
        Ok(Self::from_config(config))
    }

    /// Upload dropped or picked files. Resolves to the batch summary, or
    /// `undefined` if the view was abandoned meanwhile, even while the files
    /// were still being read.
    pub fn ingest_files(&self, files: &FileList) -> Promise {
        let files = list_files(files);
        let reservation = self.workflow.borrow_mut().reserve_ingest();
        let workflow = self.workflow.clone();
        let gateway = self.gateway.clone();
        future_to_promise(async move {
            let (pending, failures) = read_files(files).await;
            report_read_failures(&workflow, failures);
            let ticket = workflow.borrow_mut().start_ingest_with(reservation, pending);
            let uploaded = ticket.upload(gateway.as_ref()).await;
            let summary = workflow.borrow_mut().finish_ingest(uploaded);
            to_js(&summary)
        })
    }

    /// Upload the image items of a paste event.
    ///
    /// Call from the `paste` handler itself; the default action is
    /// prevented when the paste carries images.
    pub fn ingest_paste(&self, event: &ClipboardEvent) -> Promise {
        let files = clipboard_files(event);
        if !files.is_empty() {
            event.prevent_default();
        }
        let reservation = self.workflow.borrow_mut().reserve_ingest();
        let workflow = self.workflow.clone();
        let gateway = self.gateway.clone();
        future_to_promise(async move {
            let (items, failures) = read_clipboard(files).await;
            report_read_failures(&workflow, failures);
            let ticket = workflow.borrow_mut().start_paste_with(reservation, items);
            let uploaded = ticket.upload(gateway.as_ref()).await;
            let summary = workflow.borrow_mut().finish_ingest(uploaded);
            to_js(&summary)
        })
    }

    pub fn remove(&self, index: usize) -> Result<(), JsValue> {
        self.workflow.borrow_mut().remove(index).map(|_| ()).map_err(js_error)
    }

    pub fn select(&self, index: usize) -> Result<(), JsValue> {
        self.workflow.borrow_mut().select(index).map_err(js_error)
    }

    /// Report the source size the view measured for a file. Replaces
    /// dimensions read from the file's metadata; ignored once the view has
    /// reported a size, and while the file is being edited.
    pub fn record_dimensions(&self, remote_id: &str, width: u32, height: u32) -> bool {
        self.workflow
            .borrow_mut()
            .record_dimensions(remote_id, width, height)
    }

    pub fn begin_edit(&self) -> Result<(), JsValue> {
        self.workflow.borrow_mut().begin_edit().map_err(js_error)
    }

    /// Store geometry `{ x, y, width, height }` in source pixels.
    pub fn update_box(&self, value: JsValue) -> Result<(), JsValue> {
        let input: JsBoxInput = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        let crop_box = input
            .to_crop_box()
            .ok_or_else(|| JsValue::from_str("Crop box values must be finite"))?;
        self.workflow.borrow_mut().update_box(crop_box).map_err(js_error)
    }

    pub fn nudge(&self, dx: i32, dy: i32) -> Result<(), JsValue> {
        self.workflow
            .borrow_mut()
            .nudge(dx.into(), dy.into())
            .map_err(js_error)
    }

    /// Move the crop by a pointer delta in screen pixels.
    pub fn move_by_screen(&self, dx: f64, dy: f64) -> Result<(), JsValue> {
        self.workflow.borrow_mut().move_by_screen(dx, dy).map_err(js_error)
    }

    pub fn rotate(&self, delta_degrees: i32) -> Result<(), JsValue> {
        self.workflow.borrow_mut().rotate(delta_degrees).map_err(js_error)
    }

    pub fn zoom(&self, steps: i32) -> Result<(), JsValue> {
        self.workflow.borrow_mut().zoom(steps).map_err(js_error)
    }

    pub fn fit_to_viewport(&self, width: f64, height: f64) -> Result<(), JsValue> {
        self.workflow
            .borrow_mut()
            .fit_to_viewport(width, height)
            .map_err(js_error)
    }

    pub fn reset_crop(&self) -> Result<(), JsValue> {
        self.workflow.borrow_mut().reset_crop().map_err(js_error)
    }

    pub fn cancel_edit(&self) -> Result<(), JsValue> {
        self.workflow.borrow_mut().cancel_edit().map_err(js_error)
    }

    /// Handle a `keydown` event in the crop view.
    ///
    /// Handled keys have their default action prevented. Enter starts the
    /// commit in the background; its result shows up in the snapshot and the
    /// notices.
    pub fn handle_key(&self, event: &KeyboardEvent) -> String {
        let Some(key) = Key::from_dom_key(&event.key()) else {
            return key_outcome_name(KeyOutcome::Ignored).to_string();
        };
        let outcome = self
            .workflow
            .borrow_mut()
            .handle_key(KeyPress::new(key, event.shift_key()));

        if outcome != KeyOutcome::Ignored {
            event.prevent_default();
        }
        if outcome == KeyOutcome::CommitRequested {
            let commit = self.commit_future();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = commit.await {
                    log::debug!("Keyboard commit failed: {:?}", e.as_string());
                }
            });
        }
        key_outcome_name(outcome).to_string()
    }

    /// Commit the crop. Resolves to `"applied"`, `"target_removed"` or
    /// `"discarded"`; rejects with the error message.
    pub fn commit(&self) -> Promise {
        let commit = self.commit_future();
        future_to_promise(async move {
            let outcome = commit.await?;
            Ok(JsValue::from_str(commit_outcome_name(outcome)))
        })
    }

    /// Arm clear-all; the view shows its confirmation prompt.
    pub fn request_clear(&self) -> Result<(), JsValue> {
        self.workflow.borrow_mut().request_clear().map_err(js_error)
    }

    pub fn dismiss_clear(&self) {
        self.workflow.borrow_mut().dismiss_clear();
    }

    /// Clear everything after the user confirmed. Resolves to the server's
    /// message, or `undefined` if the result was dropped.
    pub fn confirm_clear(&self) -> Promise {
        let workflow = self.workflow.clone();
        let gateway = self.gateway.clone();
        future_to_promise(async move {
            let ticket = workflow.borrow_mut().start_clear().map_err(js_error)?;
            let result = gateway.clear_all().await;
            let outcome = workflow.borrow_mut().finish_clear(ticket, result);
            match outcome.map_err(js_error)? {
                ClearOutcome::Cleared(message) => Ok(JsValue::from_str(&message)),
                ClearOutcome::Discarded => Ok(JsValue::UNDEFINED),
            }
        })
    }

    /// The user left the view. Pending results are dropped when they arrive.
    pub fn abandon(&self) {
        self.workflow.borrow_mut().abandon();
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        format!("{:?}", self.workflow.borrow().state())
    }

    #[wasm_bindgen(getter)]
    pub fn busy(&self) -> bool {
        self.workflow.borrow().is_busy()
    }

    /// Most recent downloadable RAW of the active file.
    pub fn download_uri(&self) -> Option<String> {
        self.workflow.borrow().download_uri().map(str::to_string)
    }

    /// Everything the view renders from.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&JsSnapshot::capture(&self.workflow.borrow()))
    }

    /// Drain pending notifications: `[{ level, message }]`.
    pub fn take_notices(&self) -> Result<JsValue, JsValue> {
        let notices = self.workflow.borrow_mut().take_notices();
        to_js(&notices)
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_new_with_defaults() {
        let workflow = JsWorkflow::new(JsValue::UNDEFINED).unwrap();
        assert_eq!(workflow.state(), "Empty");
        assert!(workflow.download_uri().is_none());
    }

    #[wasm_bindgen_test]
    fn test_new_rejects_invalid_config() {
        let config = js_sys::Object::new();
        js_sys::Reflect::set(
            &config,
            &JsValue::from_str("default_crop_fraction"),
            &JsValue::from_f64(3.0),
        )
        .unwrap();
        assert!(JsWorkflow::new(config.into()).is_err());
    }

    #[wasm_bindgen_test]
    fn test_begin_edit_from_empty_queues_notice() {
        let workflow = JsWorkflow::new(JsValue::UNDEFINED).unwrap();
        assert!(workflow.begin_edit().is_err());

        let notices = workflow.take_notices().unwrap();
        let notices = js_sys::Array::from(&notices);
        assert_eq!(notices.length(), 1);
    }

    #[wasm_bindgen_test]
    async fn test_commit_outside_editing_rejects() {
        let workflow = JsWorkflow::new(JsValue::UNDEFINED).unwrap();
        let result = JsFuture::from(workflow.commit()).await;
        assert!(result.is_err());
        assert_eq!(workflow.state(), "Empty");
    }

    fn file_list(names: &[&str]) -> FileList {
        let transfer = web_sys::DataTransfer::new().unwrap();
        for name in names {
            let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(&[0u8; 8][..]));
            let file = web_sys::File::new_with_u8_array_sequence(&parts, name).unwrap();
            transfer.items().add_with_file(&file).unwrap();
        }
        transfer.files().unwrap()
    }

    #[wasm_bindgen_test]
    async fn test_abandon_while_reading_resolves_undefined() {
        let workflow = JsWorkflow::new(JsValue::UNDEFINED).unwrap();
        let pending = workflow.ingest_files(&file_list(&["photo.dng"]));
        assert!(workflow.busy());

        workflow.abandon();
        let summary = JsFuture::from(pending).await.unwrap();

        assert!(summary.is_undefined());
        assert_eq!(workflow.state(), "Empty");
        assert!(!workflow.busy());
    }

    #[wasm_bindgen_test]
    async fn test_clear_without_confirmation_rejects() {
        let workflow = JsWorkflow::new(JsValue::UNDEFINED).unwrap();
        let result = JsFuture::from(workflow.confirm_clear()).await;
        assert!(result.is_err());
    }
}
