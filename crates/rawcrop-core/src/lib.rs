//! Rawcrop Core - RAW upload, preview and crop client
//!
//! This crate holds the platform-independent half of the client: the upload
//! store, the crop session, the workflow controller that sequences the
//! upload/preview/crop views, and the wire format spoken with the RAW
//! processing backend. Decoding and cropping happen on the backend; the
//! client only probes file headers for metadata.
//!
//! The browser bindings live in the `rawcrop-wasm` crate, which supplies a
//! fetch-based [`Gateway`] and forwards DOM events to [`Workflow`].

pub mod config;
pub mod crop;
pub mod error;
pub mod gateway;
pub mod ingest;
pub mod probe;
pub mod record;
pub mod store;
pub mod theme;
pub mod workflow;

pub use config::{ClientConfig, ConfigError, DEFAULT_BASE_URL, RAW_EXTENSIONS};
pub use crop::{CropBox, CropRequest, CropSession, GeometryError, Key, KeyPress};
pub use error::{ErrorKind, GatewayError, WorkflowError};
pub use gateway::Gateway;
pub use ingest::{ClipboardItem, IngestFailure, IngestSummary, PendingFile};
pub use probe::{CameraInfo, SourceInfo};
pub use record::{CropResult, DimensionSource, FileRecord, SourceDimensions, UploadReceipt};
pub use store::UploadStore;
pub use theme::{ColorScheme, SubscriptionId, ThemeHub};
pub use workflow::{
    ActiveView, ClearOutcome, ClearTicket, CommitOutcome, CropTicket, IngestReservation,
    IngestTicket, KeyOutcome, Notice, NoticeLevel, UploadedBatch, Workflow, WorkflowState,
};
