//! Workflow controller.
//!
//! # States
//!
//! ```text
//!            ingest ok            edit              commit ok / cancel
//!   Empty ─────────────▶ Previewing ─────▶ Editing ───────────────────▶ Previewing
//!     ▲                     │  ▲              │  ▲
//!     │   clear confirmed   │  │ clear failed │  │ commit failed
//!     └──── Loading ◀───────┘  └── Loading ◀──┘  └── Loading
//! ```
//!
//! `Loading` marks the one mutating remote operation (crop or clear) that may
//! be in flight. While it lasts, edit, cancel, select and clear triggers are
//! rejected with [`WorkflowError::Busy`].
//!
//! # Two-phase operations
//!
//! Every remote operation is split into `start_*` (guards, state change,
//! ticket) and `finish_*` (apply the result). Nothing borrows the controller
//! while the gateway call is pending, so a single-threaded host can keep the
//! controller behind a `RefCell`. Each ticket carries the epoch it was issued
//! in; [`Workflow::abandon`] and every forced return to `Empty` bump the
//! epoch, and results of older tickets are dropped.
//!
//! Uploads use a separate ingest epoch that only [`Workflow::abandon`] bumps.
//! A batch that lands after the user removed every file, or after a clear,
//! is still added; a batch that lands after an abandon is dropped with a
//! notice. Hosts that read file contents asynchronously take an
//! [`IngestReservation`] before the read, so an abandon during the read is
//! seen as well.
//!
//! The `ingest`, `commit` and `clear_all` methods compose both phases for
//! callers that can hold `&mut Workflow` across an await.

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::crop::{command_for, CropBox, CropRequest, CropSession, KeyCommand, KeyPress};
use crate::error::{ErrorKind, GatewayError, WorkflowError};
use crate::gateway::Gateway;
use crate::ingest::{self, pasted_files, ClipboardItem, IngestSummary, PendingFile, Prepared, UploadBatch};
use crate::probe::CameraInfo;
use crate::record::{CropResult, DimensionSource, FileRecord, SourceDimensions};
use crate::store::UploadStore;

/// Which view the controller is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Empty,
    Previewing,
    Editing,
    Loading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Crop,
    Clear,
}

/// Severity of a user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Validation,
    NotFound,
    Transport,
}

impl From<ErrorKind> for NoticeLevel {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Validation => NoticeLevel::Validation,
            ErrorKind::NotFound => NoticeLevel::NotFound,
            ErrorKind::Transport => NoticeLevel::Transport,
        }
    }
}

/// A message for the user. Transport notices are meant to be dismissible,
/// validation notices are shown inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// What the preview/metadata panel shows for the active file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveView {
    pub index: usize,
    pub name: String,
    /// Upper-case extension, e.g. `NEF`.
    pub extension: String,
    pub preview_uri: String,
    /// Cropped RAW if a crop succeeded, else the original, if any.
    pub download_uri: Option<String>,
    pub dimensions: Option<SourceDimensions>,
    pub camera: Option<CameraInfo>,
}

/// Result of applying a finished crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The record's preview and download were replaced.
    Applied,
    /// The target was removed while the crop was in flight.
    TargetRemoved,
    /// The controller moved on (abandoned or emptied); the result was dropped.
    Discarded,
}

/// Result of applying a finished clear-all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearOutcome {
    /// Local state wiped; carries the server's message.
    Cleared(String),
    /// The controller moved on; the result was dropped.
    Discarded,
}

/// Outcome of a key press in the crop view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOutcome {
    /// Not intercepted; the host should apply its default handling.
    Ignored,
    Nudged,
    /// Enter was pressed; the host should run the commit.
    CommitRequested,
    Cancelled,
}

/// Issued by [`Workflow::start_commit`].
#[derive(Debug, Clone)]
pub struct CropTicket {
    epoch: u64,
    request: CropRequest,
}

impl CropTicket {
    /// The clamped request to send to the backend.
    pub fn request(&self) -> &CropRequest {
        &self.request
    }
}

/// Issued by [`Workflow::start_clear`].
#[derive(Debug, Clone)]
pub struct ClearTicket {
    epoch: u64,
}

/// Issued by [`Workflow::reserve_ingest`] before file contents are read.
///
/// Counts toward [`Workflow::is_busy`] until it is turned into a ticket.
#[derive(Debug)]
#[must_use = "a reservation keeps the workflow busy until it is started"]
pub struct IngestReservation {
    epoch: u64,
}

/// Issued by [`Workflow::start_ingest`].
#[derive(Debug, Clone)]
pub struct IngestTicket {
    epoch: u64,
    prepared: Prepared,
}

impl IngestTicket {
    /// Run every upload of the batch.
    pub async fn upload<G: Gateway>(self, gateway: &G) -> UploadedBatch {
        let uploads = self.prepared.upload_count();
        let batch = ingest::upload_all(gateway, self.prepared).await;
        UploadedBatch {
            epoch: self.epoch,
            uploads,
            batch,
        }
    }
}

/// Resolved uploads, ready for [`Workflow::finish_ingest`].
#[derive(Debug, Clone)]
pub struct UploadedBatch {
    epoch: u64,
    uploads: usize,
    batch: UploadBatch,
}

/// Sequences the upload, preview and crop views.
pub struct Workflow {
    config: ClientConfig,
    store: UploadStore,
    state: WorkflowState,
    session: Option<CropSession>,
    in_flight: Option<InFlight>,
    epoch: u64,
    clear_armed: bool,
    /// Bumped only by `abandon`; uploads issued before it are dropped.
    ingest_epoch: u64,
    reads_in_flight: usize,
    uploads_in_flight: usize,
    notices: Vec<Notice>,
}

impl Workflow {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            store: UploadStore::new(),
            state: WorkflowState::Empty,
            session: None,
            in_flight: None,
            epoch: 0,
            clear_armed: false,
            ingest_epoch: 0,
            reads_in_flight: 0,
            uploads_in_flight: 0,
            notices: Vec::new(),
        }
    }

    /// Settings the controller was created with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The current view.
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Uploaded files, in upload order.
    pub fn store(&self) -> &UploadStore {
        &self.store
    }

    /// The live crop session, while editing or committing.
    pub fn session(&self) -> Option<&CropSession> {
        self.session.as_ref()
    }

    /// Whether an indeterminate progress indicator should be shown: a crop
    /// or clear is pending, or files are still being read or uploaded.
    pub fn is_busy(&self) -> bool {
        self.state == WorkflowState::Loading
            || self.reads_in_flight > 0
            || self.uploads_in_flight > 0
    }

    /// Whether the clear-all confirmation prompt is showing.
    pub fn is_clear_armed(&self) -> bool {
        self.clear_armed
    }

    /// Pending notifications, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain pending notifications.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Preview and metadata of the active file.
    pub fn active_view(&self) -> Option<ActiveView> {
        let index = self.store.active_index()?;
        let record = self.store.active()?;
        Some(ActiveView {
            index,
            name: record.name.clone(),
            extension: record.extension(),
            preview_uri: record.preview_uri.clone(),
            download_uri: record.raw_download_uri.clone(),
            dimensions: record.dimensions,
            camera: record.camera.clone(),
        })
    }

    /// Most recent downloadable RAW of the active file.
    pub fn download_uri(&self) -> Option<&str> {
        self.store.active()?.raw_download_uri.as_deref()
    }

    /// Queue a notification, e.g. for a failure the host hit before handing
    /// files over.
    pub fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        log::debug!("Notice ({:?}): {}", level, message);
        self.notices.push(Notice { level, message });
    }

    fn reject(&mut self, error: WorkflowError) -> WorkflowError {
        self.notify(error.kind().into(), error.to_string());
        error
    }

    fn busy_guard(&mut self) -> Result<(), WorkflowError> {
        if self.state == WorkflowState::Loading {
            Err(self.reject(WorkflowError::Busy))
        } else {
            Ok(())
        }
    }

    fn invalid(&mut self, action: &'static str) -> WorkflowError {
        let state = self.state;
        self.reject(WorkflowError::InvalidState { action, state })
    }

    fn enter(&mut self, state: WorkflowState) {
        if self.state != state {
            log::debug!("Workflow {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Drop every local trace of the session and invalidate pending tickets.
    fn force_empty(&mut self) {
        self.store.clear();
        self.session = None;
        self.in_flight = None;
        self.clear_armed = false;
        self.epoch += 1;
        self.enter(WorkflowState::Empty);
    }

    /// Enforce the store-emptiness guard after a store mutation.
    fn settle(&mut self) {
        if self.store.is_empty() && self.state != WorkflowState::Empty {
            log::info!("Store emptied while {:?}; returning to Empty", self.state);
            self.session = None;
            self.in_flight = None;
            self.clear_armed = false;
            self.epoch += 1;
            self.enter(WorkflowState::Empty);
        }
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Reserve a batch before its file contents are read.
    ///
    /// The workflow reports busy from here on, and an [`abandon`](Self::abandon)
    /// before [`start_ingest_with`](Self::start_ingest_with) drops the batch.
    pub fn reserve_ingest(&mut self) -> IngestReservation {
        self.reads_in_flight += 1;
        IngestReservation {
            epoch: self.ingest_epoch,
        }
    }

    /// Validate a batch read under `reservation` and issue a ticket for its
    /// uploads. A batch reserved before an abandon yields a ticket with
    /// nothing to upload.
    pub fn start_ingest_with(
        &mut self,
        reservation: IngestReservation,
        files: Vec<PendingFile>,
    ) -> IngestTicket {
        self.reads_in_flight = self.reads_in_flight.saturating_sub(1);
        if reservation.epoch != self.ingest_epoch {
            log::info!("Dropping {} file(s) read before the session was reset", files.len());
            if !files.is_empty() {
                self.notify(
                    NoticeLevel::Info,
                    format!("Discarded {} file(s) selected before the view was reset", files.len()),
                );
            }
            return IngestTicket {
                epoch: reservation.epoch,
                prepared: Prepared::default(),
            };
        }

        let prepared = ingest::prepare(files, &self.config);
        self.uploads_in_flight += prepared.upload_count();
        IngestTicket {
            epoch: reservation.epoch,
            prepared,
        }
    }

    /// Validate a batch already in memory and issue a ticket for its uploads.
    pub fn start_ingest(&mut self, files: Vec<PendingFile>) -> IngestTicket {
        let reservation = self.reserve_ingest();
        self.start_ingest_with(reservation, files)
    }

    /// Same as [`start_ingest_with`](Self::start_ingest_with) for a clipboard
    /// paste. Items without an image MIME type are ignored.
    pub fn start_paste_with(
        &mut self,
        reservation: IngestReservation,
        items: Vec<ClipboardItem>,
    ) -> IngestTicket {
        self.start_ingest_with(reservation, pasted_files(items))
    }

    /// Same as [`start_ingest`](Self::start_ingest) for a clipboard paste.
    pub fn start_paste(&mut self, items: Vec<ClipboardItem>) -> IngestTicket {
        let reservation = self.reserve_ingest();
        self.start_paste_with(reservation, items)
    }

    /// Add the batch's successful uploads to the store.
    ///
    /// The first record of an empty store becomes active and the controller
    /// enters `Previewing`, also when the store was emptied while the batch
    /// was uploading. Returns `None` if the batch was issued before the
    /// controller was abandoned; its uploads are discarded with a notice.
    pub fn finish_ingest(&mut self, uploaded: UploadedBatch) -> Option<IngestSummary> {
        self.uploads_in_flight = self.uploads_in_flight.saturating_sub(uploaded.uploads);
        if uploaded.epoch != self.ingest_epoch {
            let dropped = uploaded.batch.succeeded();
            log::info!(
                "Dropping {} upload result(s) issued before the session was reset",
                uploaded.uploads
            );
            if dropped > 0 {
                self.notify(
                    NoticeLevel::Info,
                    format!("Discarded {dropped} upload(s) that finished after the view was reset"),
                );
            }
            return None;
        }

        let summary = ingest::apply(&mut self.store, uploaded.batch);
        for failure in &summary.failures {
            self.notify(failure.kind().into(), failure.message());
        }

        if self.state == WorkflowState::Empty && !self.store.is_empty() {
            self.enter(WorkflowState::Previewing);
        }
        Some(summary)
    }

    /// Ingest a batch of selected or dropped files.
    pub async fn ingest<G: Gateway>(
        &mut self,
        gateway: &G,
        files: Vec<PendingFile>,
    ) -> Option<IngestSummary> {
        let uploaded = self.start_ingest(files).upload(gateway).await;
        self.finish_ingest(uploaded)
    }

    /// Ingest the image items of a clipboard paste.
    pub async fn ingest_paste<G: Gateway>(
        &mut self,
        gateway: &G,
        items: Vec<ClipboardItem>,
    ) -> Option<IngestSummary> {
        let uploaded = self.start_paste(items).upload(gateway).await;
        self.finish_ingest(uploaded)
    }

    // ------------------------------------------------------------------
    // File list
    // ------------------------------------------------------------------

    /// Remove the file at `index`.
    ///
    /// Allowed in every state. Removing the file being edited discards the
    /// crop session; emptying the store returns to `Empty`.
    pub fn remove(&mut self, index: usize) -> Result<FileRecord, WorkflowError> {
        let Some(removed) = self.store.remove(index) else {
            return Err(self.reject(WorkflowError::NoSuchFile(index)));
        };
        log::info!("Removed '{}'", removed.name);

        let edited = self
            .session
            .as_ref()
            .is_some_and(|s| s.file_id() == removed.remote_id);
        if edited && self.state == WorkflowState::Editing {
            self.session = None;
            self.enter(WorkflowState::Previewing);
        }

        self.settle();
        Ok(removed)
    }

    /// Show another file in the preview.
    pub fn select(&mut self, index: usize) -> Result<(), WorkflowError> {
        self.busy_guard()?;
        if self.state == WorkflowState::Editing {
            return Err(self.invalid("switch files"));
        }
        if !self.store.select(index) {
            return Err(self.reject(WorkflowError::NoSuchFile(index)));
        }
        Ok(())
    }

    /// Record the source dimensions the view measured for a file.
    ///
    /// A size reported by the view replaces one read from the file's
    /// metadata, but not one the view reported earlier. The file being
    /// edited keeps its dimensions until the session ends. Returns whether
    /// the record changed.
    pub fn record_dimensions(&mut self, remote_id: &str, width: u32, height: u32) -> bool {
        let Some(dims) = SourceDimensions::new(width, height) else {
            return false;
        };
        if self.session.as_ref().is_some_and(|s| s.file_id() == remote_id) {
            log::debug!("Ignoring dimensions for {} while it is being edited", remote_id);
            return false;
        }
        self.store.record_dimensions(remote_id, dims, DimensionSource::View)
    }

    /// The user left the view: reset locally without any remote call.
    ///
    /// Results of operations still in flight, including uploads and reads
    /// not yet started, are dropped when they arrive.
    pub fn abandon(&mut self) {
        log::info!("Workflow abandoned while {:?}", self.state);
        self.ingest_epoch += 1;
        self.force_empty();
    }

    // ------------------------------------------------------------------
    // Crop editing
    // ------------------------------------------------------------------

    /// Enter the crop view for the active file.
    pub fn begin_edit(&mut self) -> Result<(), WorkflowError> {
        self.busy_guard()?;
        match self.state {
            WorkflowState::Previewing => {}
            WorkflowState::Empty => return Err(self.reject(WorkflowError::NoActiveRecord)),
            _ => return Err(self.invalid("start editing")),
        }

        let Some(record) = self.store.active() else {
            return Err(self.reject(WorkflowError::NoActiveRecord));
        };
        let Some(source) = record.dimensions else {
            let name = record.name.clone();
            return Err(self.reject(WorkflowError::UnknownDimensions(name)));
        };

        self.session = Some(CropSession::begin(record.remote_id.clone(), source, &self.config));
        self.clear_armed = false;
        self.enter(WorkflowState::Editing);
        Ok(())
    }

    fn editing(&mut self, action: &'static str) -> Result<&mut CropSession, WorkflowError> {
        if self.state != WorkflowState::Editing || self.session.is_none() {
            return Err(self.invalid(action));
        }
        self.session.as_mut().ok_or(WorkflowError::NoActiveRecord)
    }

    /// Store geometry from an interactive adjustment.
    pub fn update_box(&mut self, crop_box: CropBox) -> Result<(), WorkflowError> {
        self.editing("adjust the crop")?.update_box(crop_box);
        Ok(())
    }

    /// Move the crop by whole source pixels.
    pub fn nudge(&mut self, dx: i64, dy: i64) -> Result<(), WorkflowError> {
        self.editing("move the crop")?.nudge(dx, dy);
        Ok(())
    }

    pub fn move_by_screen(&mut self, dx: f64, dy: f64) -> Result<(), WorkflowError> {
        self.editing("move the crop")?.move_by_screen(dx, dy);
        Ok(())
    }

    /// Rotate by `delta_degrees`; the angle wraps into `[0, 360)`.
    pub fn rotate(&mut self, delta_degrees: i32) -> Result<(), WorkflowError> {
        self.editing("rotate")?.rotate(delta_degrees);
        Ok(())
    }

    /// Zoom in (`steps > 0`) or out by whole configured zoom steps.
    pub fn zoom(&mut self, steps: i32) -> Result<(), WorkflowError> {
        let factor = self.config.zoom_step.powi(steps);
        self.editing("zoom")?.zoom_by(factor);
        Ok(())
    }

    pub fn fit_to_viewport(&mut self, width: f64, height: f64) -> Result<(), WorkflowError> {
        self.editing("zoom")?.fit_to_viewport(width, height);
        Ok(())
    }

    /// Back to the default box with no rotation.
    pub fn reset_crop(&mut self) -> Result<(), WorkflowError> {
        self.editing("reset the crop")?.reset();
        Ok(())
    }

    /// Leave the crop view without any remote call.
    pub fn cancel_edit(&mut self) -> Result<(), WorkflowError> {
        self.busy_guard()?;
        if self.state != WorkflowState::Editing {
            return Err(self.invalid("cancel editing"));
        }
        self.session = None;
        self.enter(WorkflowState::Previewing);
        Ok(())
    }

    /// React to a key press. Keys are only intercepted while editing.
    pub fn handle_key(&mut self, press: KeyPress) -> KeyOutcome {
        if self.state != WorkflowState::Editing {
            return KeyOutcome::Ignored;
        }
        match command_for(press, &self.config) {
            KeyCommand::Nudge { dx, dy } => match self.nudge(dx, dy) {
                Ok(()) => KeyOutcome::Nudged,
                Err(_) => KeyOutcome::Ignored,
            },
            KeyCommand::Commit => KeyOutcome::CommitRequested,
            KeyCommand::Cancel => match self.cancel_edit() {
                Ok(()) => KeyOutcome::Cancelled,
                Err(_) => KeyOutcome::Ignored,
            },
        }
    }

    /// Clamp the crop, enter `Loading` and issue a ticket for the request.
    ///
    /// Geometry that cannot be clamped into the source is a validation
    /// error; the controller stays in `Editing`.
    pub fn start_commit(&mut self) -> Result<CropTicket, WorkflowError> {
        self.busy_guard()?;
        let session = self.editing("commit the crop")?;
        let request = match session.to_request() {
            Ok(request) => request,
            Err(e) => return Err(self.reject(e.into())),
        };

        log::info!(
            "Cropping {} to {}x{} at ({}, {}), rotation {}",
            request.file_id,
            request.width,
            request.height,
            request.x,
            request.y,
            request.rotation_degrees
        );
        self.in_flight = Some(InFlight::Crop);
        self.enter(WorkflowState::Loading);
        Ok(CropTicket {
            epoch: self.epoch,
            request,
        })
    }

    fn is_current(&self, epoch: u64, op: InFlight) -> bool {
        epoch == self.epoch && self.in_flight == Some(op) && self.state == WorkflowState::Loading
    }

    /// Apply the result of a crop request.
    ///
    /// Success replaces the file's preview and download and returns to
    /// `Previewing`. Validation and transport failures return to `Editing`
    /// with the geometry intact. A not-found failure means the backend lost
    /// that source: its record is dropped and the controller returns to
    /// `Previewing`, or to `Empty` if no other file remains.
    pub fn finish_commit(
        &mut self,
        ticket: CropTicket,
        result: Result<CropResult, GatewayError>,
    ) -> Result<CommitOutcome, WorkflowError> {
        if !self.is_current(ticket.epoch, InFlight::Crop) {
            log::info!("Dropping stale crop result for {}", ticket.request.file_id);
            return Ok(CommitOutcome::Discarded);
        }
        self.in_flight = None;
        let file_id = ticket.request.file_id;

        match result {
            Ok(crop) => {
                let applied = self.store.replace_preview(&file_id, crop);
                self.session = None;
                self.enter(WorkflowState::Previewing);
                if applied {
                    Ok(CommitOutcome::Applied)
                } else {
                    log::debug!("Crop target {} was removed meanwhile", file_id);
                    Ok(CommitOutcome::TargetRemoved)
                }
            }
            Err(GatewayError::NotFound(message)) => {
                log::warn!("Backend no longer knows {}: {}", file_id, message);
                let name = match self.store.position(&file_id) {
                    Some(index) => self.store.remove(index).map(|r| r.name),
                    None => None,
                };
                self.session = None;
                self.enter(WorkflowState::Previewing);
                self.settle();
                let notice = match name {
                    Some(name) => {
                        format!("The server no longer has '{name}'. Please upload it again.")
                    }
                    None => "The server no longer has this file. Please upload it again.".into(),
                };
                self.notify(NoticeLevel::NotFound, notice);
                Err(WorkflowError::Gateway(GatewayError::NotFound(message)))
            }
            Err(error) => {
                log::warn!("Crop of {} failed: {}", file_id, error);
                if self.store.contains(&file_id) {
                    self.enter(WorkflowState::Editing);
                } else {
                    self.session = None;
                    self.enter(WorkflowState::Previewing);
                }
                Err(self.reject(error.into()))
            }
        }
    }

    /// Commit the crop through `gateway`.
    pub async fn commit<G: Gateway>(&mut self, gateway: &G) -> Result<CommitOutcome, WorkflowError> {
        let ticket = self.start_commit()?;
        let result = gateway.crop(ticket.request()).await;
        self.finish_commit(ticket, result)
    }

    // ------------------------------------------------------------------
    // Clear all
    // ------------------------------------------------------------------

    /// Ask for confirmation before clearing everything.
    pub fn request_clear(&mut self) -> Result<(), WorkflowError> {
        self.busy_guard()?;
        if self.state != WorkflowState::Previewing {
            return Err(self.invalid("clear all files"));
        }
        self.clear_armed = true;
        Ok(())
    }

    /// The user declined the confirmation.
    pub fn dismiss_clear(&mut self) {
        self.clear_armed = false;
    }

    /// Enter `Loading` for a confirmed clear-all.
    pub fn start_clear(&mut self) -> Result<ClearTicket, WorkflowError> {
        self.busy_guard()?;
        if self.state != WorkflowState::Previewing {
            return Err(self.invalid("clear all files"));
        }
        if !self.clear_armed {
            return Err(self.reject(WorkflowError::ClearNotConfirmed));
        }
        self.clear_armed = false;
        self.in_flight = Some(InFlight::Clear);
        self.enter(WorkflowState::Loading);
        Ok(ClearTicket { epoch: self.epoch })
    }

    /// Apply the result of a clear-all.
    ///
    /// Local state is wiped only after the backend confirmed; on failure the
    /// store is untouched and the controller returns to `Previewing`.
    pub fn finish_clear(
        &mut self,
        ticket: ClearTicket,
        result: Result<String, GatewayError>,
    ) -> Result<ClearOutcome, WorkflowError> {
        if !self.is_current(ticket.epoch, InFlight::Clear) {
            log::info!("Dropping stale clear-all result");
            return Ok(ClearOutcome::Discarded);
        }
        self.in_flight = None;

        match result {
            Ok(message) => {
                log::info!("Backend cleared: {}", message);
                self.force_empty();
                self.notify(NoticeLevel::Info, message.clone());
                Ok(ClearOutcome::Cleared(message))
            }
            Err(error) => {
                log::warn!("Clear-all failed: {}", error);
                self.enter(WorkflowState::Previewing);
                Err(self.reject(error.into()))
            }
        }
    }

    /// Clear every file on the backend, then locally.
    pub async fn clear_all<G: Gateway>(&mut self, gateway: &G) -> Result<ClearOutcome, WorkflowError> {
        let ticket = self.start_clear()?;
        let result = gateway.clear_all().await;
        self.finish_clear(ticket, result)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
