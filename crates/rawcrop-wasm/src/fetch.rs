//! Backend gateway over the browser `fetch` API.
//!
//! Only moves bytes: URLs, bodies and status classification come from
//! `rawcrop_core::gateway::wire`, so this transport reports failures the same
//! way as any other.

use js_sys::{Array, Uint8Array};
use rawcrop_core::crop::CropRequest;
use rawcrop_core::gateway::wire::{self, Endpoints, UPLOAD_FIELD};
use rawcrop_core::{CropResult, Gateway, GatewayError, UploadReceipt};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Headers, Request, RequestInit, RequestMode, Response};

/// [`Gateway`] implementation backed by `window.fetch`.
#[derive(Debug, Clone)]
pub struct FetchGateway {
    endpoints: Endpoints,
}

impl FetchGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            endpoints: Endpoints::new(base_url),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request and read the status and body text.
    ///
    /// Network failures (the promise rejecting) become transport errors.
    async fn send(&self, url: &str, init: &RequestInit) -> Result<(u16, String), GatewayError> {
        let request = Request::new_with_str_and_init(url, init).map_err(transport)?;
        let window = web_sys::window()
            .ok_or_else(|| GatewayError::Transport("No window available for fetch".into()))?;

        let value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(transport)?;
        let response: Response = value.dyn_into().map_err(transport)?;

        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        Ok((response.status(), text.as_string().unwrap_or_default()))
    }
}

fn request_init(method: &str) -> RequestInit {
    let init = RequestInit::new();
    init.set_method(method);
    init.set_mode(RequestMode::Cors);
    init
}

fn transport(error: JsValue) -> GatewayError {
    GatewayError::Transport(describe_js_error(&error))
}

/// Best-effort text of a JS exception or rejection value.
pub(crate) fn describe_js_error(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

impl Gateway for FetchGateway {
    async fn upload(&self, bytes: &[u8], filename: &str) -> Result<UploadReceipt, GatewayError> {
        let parts = Array::of1(&Uint8Array::from(bytes));
        let blob = Blob::new_with_u8_array_sequence(&parts).map_err(transport)?;
        let form = FormData::new().map_err(transport)?;
        form.append_with_blob_and_filename(UPLOAD_FIELD, &blob, filename)
            .map_err(transport)?;

        let init = request_init("POST");
        init.set_body(&form);

        log::debug!("Uploading '{}' ({} bytes)", filename, bytes.len());
        let (status, body) = self.send(&self.endpoints.upload(), &init).await?;
        wire::read_upload(status, &body)
    }

    async fn crop(&self, request: &CropRequest) -> Result<CropResult, GatewayError> {
        let body = wire::crop_body(request)?;
        let headers = Headers::new().map_err(transport)?;
        headers
            .set("Content-Type", "application/json")
            .map_err(transport)?;

        let init = request_init("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&body));

        let (status, text) = self.send(&self.endpoints.crop(), &init).await?;
        wire::read_crop(status, &text)
    }

    async fn clear_all(&self) -> Result<String, GatewayError> {
        let init = request_init("DELETE");
        let (status, body) = self.send(&self.endpoints.clear(), &init).await?;
        wire::read_clear(status, &body)
    }
}
