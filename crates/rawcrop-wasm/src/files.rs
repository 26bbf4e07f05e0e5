//! Reading dropped, picked and pasted files into memory.

use js_sys::Uint8Array;
use rawcrop_core::ingest::is_image_mime;
use rawcrop_core::{ClipboardItem, PendingFile};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{ClipboardEvent, File, FileList};

/// Read the whole content of a file.
pub(crate) async fn read_file(file: &File) -> Result<PendingFile, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    Ok(PendingFile::new(file.name(), bytes))
}

/// Files of a `FileList`, in order.
pub(crate) fn list_files(list: &FileList) -> Vec<File> {
    (0..list.length()).filter_map(|i| list.get(i)).collect()
}

/// Files that could not be read, as user-facing messages.
pub(crate) type ReadFailures = Vec<String>;

fn read_failure(name: &str, error: &JsValue) -> String {
    let reason = crate::fetch::describe_js_error(error);
    log::warn!("Could not read '{}': {}", name, reason);
    format!("Could not read '{}': {}", name, reason)
}

/// Read every file. Unreadable files are skipped and reported.
pub(crate) async fn read_files(files: Vec<File>) -> (Vec<PendingFile>, ReadFailures) {
    let mut pending = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for file in files {
        match read_file(&file).await {
            Ok(p) => pending.push(p),
            Err(e) => failures.push(read_failure(&file.name(), &e)),
        }
    }
    (pending, failures)
}

/// Image items of a paste event, with their MIME type.
///
/// Must run synchronously inside the event handler: the clipboard data is
/// only readable while the event is being dispatched.
pub(crate) fn clipboard_files(event: &ClipboardEvent) -> Vec<(String, File)> {
    let Some(data) = event.clipboard_data() else {
        return Vec::new();
    };
    let items = data.items();
    let mut files = Vec::new();
    for i in 0..items.length() {
        let Some(item) = items.get(i) else {
            continue;
        };
        let mime = item.type_();
        if !is_image_mime(&mime) {
            continue;
        }
        if let Ok(Some(file)) = item.get_as_file() {
            files.push((mime, file));
        }
    }
    files
}

/// Read pasted files into clipboard items.
pub(crate) async fn read_clipboard(
    files: Vec<(String, File)>,
) -> (Vec<ClipboardItem>, ReadFailures) {
    let mut items = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for (mime, file) in files {
        match read_file(&file).await {
            Ok(p) => items.push(ClipboardItem {
                mime,
                file: Some(p),
            }),
            Err(e) => failures.push(read_failure(&file.name(), &e)),
        }
    }
    (items, failures)
}
