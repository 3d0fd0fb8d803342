//! Browser `fetch` region source for WASM builds.

use super::{GeoSource, LoadError};
use wasm_bindgen::JsCast as _;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Fetches region documents over HTTP, relative to the page URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpSource;

impl HttpSource {
    pub fn new() -> Self {
        Self
    }
}

impl GeoSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, LoadError> {
        let opts = RequestInit::new();
        opts.set_method("GET");
        opts.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(path, &opts)
            .map_err(|e| LoadError::Request(format!("{:?}", e)))?;
        request
            .headers()
            .set("Accept", "application/geo+json, application/json")
            .map_err(|e| LoadError::Request(format!("{:?}", e)))?;

        let window = web_sys::window().ok_or_else(|| LoadError::Request("No window".to_string()))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| LoadError::Network(format!("{:?}", e)))?;

        let resp: Response = resp_value
            .dyn_into()
            .map_err(|_| LoadError::Network("Response is not a Response".to_string()))?;

        if !resp.ok() {
            return Err(LoadError::Status(resp.status()));
        }

        let text = JsFuture::from(resp.text().map_err(|e| LoadError::Body(format!("{:?}", e)))?)
            .await
            .map_err(|e| LoadError::Body(format!("{:?}", e)))?;

        let text: js_sys::JsString = text
            .dyn_into()
            .map_err(|_| LoadError::Body("Body is not text".to_string()))?;

        Ok(String::from(text))
    }
}
