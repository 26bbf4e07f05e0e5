//! Clipboard/drop ingestion.
//!
//! A batch goes through three steps:
//!
//! 1. [`prepare`] validates extensions and probes source metadata (pure).
//! 2. [`upload_all`] issues every upload concurrently and waits for all of them.
//! 3. [`apply`] adds the successful uploads to the store one at a time, in
//!    the order the files were given.
//!
//! Splitting the batch this way means no borrow of the store is held across
//! an await, and store mutations never interleave. Failures are isolated per
//! file: one rejected or failed file never aborts its siblings.

use futures_util::future::join_all;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ErrorKind, GatewayError};
use crate::gateway::Gateway;
use crate::probe::{probe_source, SourceInfo};
use crate::record::{file_extension, FileRecord, UploadReceipt};
use crate::store::UploadStore;

/// A file handed to ingestion by a drop, a file picker or a paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// One item of a clipboard paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    /// MIME type reported by the clipboard.
    pub mime: String,
    /// File payload, when the item can be read as a file.
    pub file: Option<PendingFile>,
}

/// Whether a clipboard MIME type carries image data.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Files of a paste that carry image data. Other items are ignored, not reported.
pub fn pasted_files(items: Vec<ClipboardItem>) -> Vec<PendingFile> {
    items
        .into_iter()
        .filter(|item| is_image_mime(&item.mime))
        .filter_map(|item| item.file)
        .collect()
}

/// Why a file of a batch did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestFailure {
    /// The extension is not an accepted RAW format; nothing was uploaded.
    Rejected {
        name: String,
        extension: Option<String>,
    },
    /// The upload itself failed.
    Failed { name: String, kind: ErrorKind, message: String },
}

impl IngestFailure {
    pub fn name(&self) -> &str {
        match self {
            IngestFailure::Rejected { name, .. } | IngestFailure::Failed { name, .. } => name,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestFailure::Rejected { .. } => ErrorKind::Validation,
            IngestFailure::Failed { kind, .. } => *kind,
        }
    }

    /// User-facing description.
    pub fn message(&self) -> String {
        match self {
            IngestFailure::Rejected { name, .. } => format!(
                "Unsupported file format for '{}'. Please upload a RAW image only.",
                name
            ),
            IngestFailure::Failed { name, message, .. } => {
                format!("Error uploading '{}': {}", name, message)
            }
        }
    }

    fn failed(name: String, error: GatewayError) -> Self {
        IngestFailure::Failed {
            name,
            kind: error.kind(),
            message: match error {
                GatewayError::Validation(m) | GatewayError::NotFound(m) | GatewayError::Transport(m) => m,
            },
        }
    }
}

/// A validated file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    position: usize,
    file: PendingFile,
    info: SourceInfo,
}

/// Result of [`prepare`].
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    uploads: Vec<PreparedUpload>,
    rejected: Vec<(usize, IngestFailure)>,
}

impl Prepared {
    /// Number of files that will be uploaded.
    pub fn upload_count(&self) -> usize {
        self.uploads.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Validate extensions and probe metadata of a batch.
pub fn prepare(files: Vec<PendingFile>, config: &ClientConfig) -> Prepared {
    let mut prepared = Prepared::default();

    for (position, file) in files.into_iter().enumerate() {
        let extension = file_extension(&file.name).map(str::to_string);
        let accepted = extension
            .as_deref()
            .map(|e| config.accepts_extension(e))
            .unwrap_or(false);

        if !accepted {
            log::warn!("Rejected '{}': unsupported extension {:?}", file.name, extension);
            prepared.rejected.push((
                position,
                IngestFailure::Rejected {
                    name: file.name,
                    extension,
                },
            ));
            continue;
        }

        let info = probe_source(&file.bytes).unwrap_or_else(|e| {
            log::debug!("No metadata for '{}': {}", file.name, e);
            SourceInfo::default()
        });

        prepared.uploads.push(PreparedUpload {
            position,
            file,
            info,
        });
    }

    prepared
}

/// Outcome of one upload of a batch.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    position: usize,
    name: String,
    info: SourceInfo,
    result: Result<UploadReceipt, GatewayError>,
}

/// All uploads of a batch, resolved.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    outcomes: Vec<UploadOutcome>,
    rejected: Vec<(usize, IngestFailure)>,
}

impl UploadBatch {
    /// Number of uploads the backend accepted.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Upload every prepared file concurrently and wait for all of them.
pub async fn upload_all<G: Gateway>(gateway: &G, prepared: Prepared) -> UploadBatch {
    let Prepared { uploads, rejected } = prepared;

    let outcomes = join_all(uploads.into_iter().map(|upload| async move {
        let result = gateway.upload(&upload.file.bytes, &upload.file.name).await;
        UploadOutcome {
            position: upload.position,
            name: upload.file.name,
            info: upload.info,
            result,
        }
    }))
    .await;

    UploadBatch { outcomes, rejected }
}

/// Summary of an ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Files uploaded and added to the store.
    pub accepted: usize,
    /// Files rejected by extension, never uploaded.
    pub rejected: usize,
    /// Files whose upload failed.
    pub failed: usize,
    /// Records created by this batch, in input order.
    pub created: Vec<FileRecord>,
    /// One entry per rejected or failed file, in input order.
    pub failures: Vec<IngestFailure>,
}

/// Add the successful uploads of a batch to the store, in input order.
pub fn apply(store: &mut UploadStore, batch: UploadBatch) -> IngestSummary {
    let UploadBatch {
        mut outcomes,
        rejected,
    } = batch;
    outcomes.sort_by_key(|o| o.position);

    let mut summary = IngestSummary {
        rejected: rejected.len(),
        ..IngestSummary::default()
    };
    let mut failures = rejected;

    for outcome in outcomes {
        match outcome.result {
            Ok(receipt) => {
                let record = FileRecord::from_receipt(outcome.name, receipt)
                    .with_dimensions(outcome.info.dimensions)
                    .with_camera(outcome.info.camera);
                log::info!("Uploaded '{}' as {}", record.name, record.remote_id);
                store.add(record.clone());
                summary.created.push(record);
                summary.accepted += 1;
            }
            Err(error) => {
                log::warn!("Upload of '{}' failed: {}", outcome.name, error);
                summary.failed += 1;
                failures.push((outcome.position, IngestFailure::failed(outcome.name, error)));
            }
        }
    }

    failures.sort_by_key(|(position, _)| *position);
    summary.failures = failures.into_iter().map(|(_, f)| f).collect();
    summary
}

/// Run a whole batch against `store`: prepare, upload, apply.
pub async fn ingest<G: Gateway>(
    store: &mut UploadStore,
    gateway: &G,
    files: Vec<PendingFile>,
    config: &ClientConfig,
) -> IngestSummary {
    let batch = upload_all(gateway, prepare(files, config)).await;
    apply(store, batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::scripted::ScriptedGateway;
    use futures::executor::block_on;

    fn file(name: &str) -> PendingFile {
        PendingFile::new(name, vec![0u8; 16])
    }

    #[test]
    fn test_single_dng_upload() {
        let gateway = ScriptedGateway::new();
        let mut store = UploadStore::new();

        let summary = block_on(ingest(
            &mut store,
            &gateway,
            vec![file("photo.dng")],
            &ClientConfig::default(),
        ));

        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.rejected, 0);
        assert_eq!(summary.failed, 0);
        assert_eq!(store.len(), 1);
        let active = store.active().unwrap();
        assert_eq!(active.name, "photo.dng");
        assert_eq!(active.preview_uri, ScriptedGateway::preview_uri("photo.dng"));
        assert_eq!(active.remote_id, ScriptedGateway::remote_id("photo.dng"));
    }

    #[test]
    fn test_invalid_extensions_are_not_uploaded() {
        let gateway = ScriptedGateway::new();
        let mut store = UploadStore::new();

        let summary = block_on(ingest(
            &mut store,
            &gateway,
            vec![
                file("a.NEF"),
                file("b.jpg"),
                file("c.cr2"),
                file("README"),
                file("d.Arw"),
            ],
            &ClientConfig::default(),
        ));

        assert_eq!(gateway.uploads.borrow().len(), 3);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.accepted, 3);
        assert_eq!(
            summary.failures.iter().map(|f| f.name()).collect::<Vec<_>>(),
            vec!["b.jpg", "README"]
        );
    }

    #[test]
    fn test_failed_upload_does_not_abort_batch() {
        let gateway = ScriptedGateway::new();
        gateway.fail_upload("b.nef", GatewayError::Transport("connection reset".into()));
        let mut store = UploadStore::new();

        let summary = block_on(ingest(
            &mut store,
            &gateway,
            vec![file("a.nef"), file("b.nef"), file("c.nef")],
            &ClientConfig::default(),
        ));

        assert_eq!(summary.accepted, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(gateway.uploads.borrow().len(), 3);
        assert_eq!(
            store.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["a.nef", "c.nef"]
        );
        assert_eq!(summary.failures[0].kind(), ErrorKind::Transport);
        assert!(summary.failures[0].message().contains("connection reset"));
    }

    #[test]
    fn test_created_records_keep_input_order() {
        let gateway = ScriptedGateway::new();
        let mut store = UploadStore::new();
        let names = ["z.dng", "a.dng", "m.dng"];

        let summary = block_on(ingest(
            &mut store,
            &gateway,
            names.iter().map(|n| file(n)).collect(),
            &ClientConfig::default(),
        ));

        let created: Vec<_> = summary.created.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(created, names);
        assert_eq!(store.active().unwrap().name, "z.dng");
    }

    #[test]
    fn test_second_batch_keeps_active() {
        let gateway = ScriptedGateway::new();
        let mut store = UploadStore::new();
        let config = ClientConfig::default();

        block_on(ingest(&mut store, &gateway, vec![file("first.arw")], &config));
        block_on(ingest(&mut store, &gateway, vec![file("second.arw")], &config));

        assert_eq!(store.len(), 2);
        assert_eq!(store.active().unwrap().name, "first.arw");
    }

    #[test]
    fn test_pasted_files_ignore_non_images() {
        let items = vec![
            ClipboardItem {
                mime: "text/plain".into(),
                file: None,
            },
            ClipboardItem {
                mime: "image/png".into(),
                file: Some(file("image.png")),
            },
            ClipboardItem {
                mime: "IMAGE/x-adobe-dng".into(),
                file: Some(file("pasted.dng")),
            },
            ClipboardItem {
                mime: "image/jpeg".into(),
                file: None,
            },
        ];

        let files = pasted_files(items);
        assert_eq!(
            files.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["image.png", "pasted.dng"]
        );
    }

    #[test]
    fn test_prepare_counts() {
        let prepared = prepare(
            vec![file("a.nef"), file("b.png"), file("c.dng")],
            &ClientConfig::default(),
        );
        assert_eq!(prepared.upload_count(), 2);
        assert_eq!(prepared.rejected_count(), 1);
    }

    #[test]
    fn test_rejected_message() {
        let failure = IngestFailure::Rejected {
            name: "cat.gif".into(),
            extension: Some("gif".into()),
        };
        assert_eq!(failure.kind(), ErrorKind::Validation);
        assert!(failure.message().contains("cat.gif"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::gateway::scripted::ScriptedGateway;
    use futures::executor::block_on;
    use proptest::prelude::*;

    fn name_strategy() -> impl Strategy<Value = (String, bool)> {
        (
            "[a-z]{1,8}",
            prop::sample::select(vec![
                ("nef", true),
                ("CR2", true),
                ("arw", true),
                ("Dng", true),
                ("jpg", false),
                ("png", false),
                ("tiff", false),
                ("", false),
            ]),
        )
            .prop_map(|(stem, (ext, valid))| {
                let name = if ext.is_empty() {
                    stem
                } else {
                    format!("{stem}.{ext}")
                };
                (name, valid)
            })
    }

    proptest! {
        /// Property: N files with k invalid extensions -> N-k upload calls, k rejected.
        #[test]
        fn prop_upload_calls_match_valid_files(names in prop::collection::vec(name_strategy(), 0..20)) {
            let gateway = ScriptedGateway::new();
            let mut store = UploadStore::new();
            let invalid = names.iter().filter(|(_, valid)| !valid).count();
            let files: Vec<_> = names
                .iter()
                .map(|(n, _)| PendingFile::new(n.clone(), vec![1, 2, 3]))
                .collect();
            let total = files.len();

            let summary = block_on(ingest(&mut store, &gateway, files, &ClientConfig::default()));

            prop_assert_eq!(gateway.uploads.borrow().len(), total - invalid);
            prop_assert_eq!(summary.rejected, invalid);
            prop_assert_eq!(summary.accepted + summary.rejected + summary.failed, total);
        }
    }
}
