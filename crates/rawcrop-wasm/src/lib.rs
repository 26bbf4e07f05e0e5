//! Rawcrop WASM - WebAssembly bindings for the rawcrop client
//!
//! This crate exposes the rawcrop-core workflow to JavaScript/TypeScript views
//! and supplies the browser side of it: a `fetch` gateway, file and clipboard
//! readers, a console logger and a color scheme watcher.
//!
//! # Module Structure
//!
//! - `app` - `JsWorkflow`, the controller handle the view drives
//! - `fetch` - Backend gateway over `window.fetch`
//! - `files` - Reading dropped, picked and pasted files
//! - `theme` - `prefers-color-scheme` watcher
//! - `types` - Snapshot and input shapes exchanged with JavaScript
//! - `logger` - `log` backend writing to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsWorkflow, JsThemeWatcher } from '@rawcrop/wasm';
//!
//! await init();
//!
//! const workflow = new JsWorkflow(undefined);
//! const summary = await workflow.ingest_files(input.files);
//! console.log(`${summary.accepted} uploaded, ${summary.rejected} rejected`);
//!
//! workflow.begin_edit();
//! workflow.update_box({ x: 10, y: 10, width: 200, height: 150 });
//! await workflow.commit();
//! console.log(workflow.download_uri());
//! ```

use wasm_bindgen::prelude::*;

mod app;
mod fetch;
mod files;
mod logger;
mod theme;
mod types;

// Re-export public types
pub use app::JsWorkflow;
pub use fetch::FetchGateway;
pub use theme::{current_color_scheme, JsThemeWatcher};
pub use types::{JsBoxInput, JsCropView, JsFileEntry, JsSnapshot};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Info);
    log::debug!("rawcrop-wasm {} ready", version());
}

/// Change the console log level: `"off"`, `"error"`, `"warn"`, `"info"`,
/// `"debug"` or `"trace"`.
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logger::parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown log level '{}'", level)))?;
    log::set_max_level(filter);
    Ok(())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Whether a file name has an extension accepted by default.
#[wasm_bindgen]
pub fn is_raw_filename(name: &str) -> bool {
    rawcrop_core::record::file_extension(name)
        .map(|ext| rawcrop_core::ClientConfig::default().accepts_extension(ext))
        .unwrap_or(false)
}
