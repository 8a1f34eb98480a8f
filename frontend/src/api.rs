use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder};
use js_sys::{Array, Uint8Array};
use markflow_shared::{
    ApiClient, ApiError, ApiRequest, ApiResponse, FilePart, Method, MultipartForm, RequestBody,
    Transport,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, BlobPropertyBag, FileList, FormData};

use crate::{config, storage::LocalStorageTokenStore};

/// The client every page talks through.
pub type FrontendClient = ApiClient<GlooTransport, LocalStorageTokenStore>;

/// Build the app's client; `on_expired` runs when the session is dropped.
pub fn new_client(on_expired: impl Fn() + 'static) -> FrontendClient {
    ApiClient::new(config::api_root(), GlooTransport, LocalStorageTokenStore)
        .with_session_expired_hook(on_expired)
}

/// `fetch` through `gloo-net`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTransport;

fn js_error(context: &str, err: JsValue) -> ApiError {
    ApiError::Request(format!("{context}: {err:?}"))
}

fn builder(method: Method, url: &str) -> RequestBuilder {
    match method {
        Method::Get => Request::get(url),
        Method::Post => Request::post(url),
        Method::Put => Request::put(url),
        Method::Patch => Request::patch(url),
        Method::Delete => Request::delete(url),
    }
}

fn form_data(form: &MultipartForm) -> Result<FormData, ApiError> {
    let data = FormData::new().map_err(|e| js_error("FormData", e))?;
    for (key, value) in &form.fields {
        data.append_with_str(key, value)
            .map_err(|e| js_error("FormData field", e))?;
    }
    for file in &form.files {
        let parts = Array::new();
        parts.push(&Uint8Array::from(file.bytes.as_slice()));
        let options = BlobPropertyBag::new();
        if let Some(content_type) = file.content_type.as_deref() {
            options.set_type(content_type);
        }
        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| js_error("Blob", e))?;
        data.append_with_blob_and_filename(&file.field, &blob, &file.file_name)
            .map_err(|e| js_error("FormData file", e))?;
    }
    Ok(data)
}

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(
        &self,
        url: &str,
        bearer: Option<&str>,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        let mut builder = builder(request.method, url);
        if let Some(token) = bearer {
            builder = builder.header("Authorization", &format!("Bearer {token}"));
        }
        let prepared = match &request.body {
            RequestBody::Empty => builder.build(),
            RequestBody::Json(text) => builder
                .header("Content-Type", "application/json")
                .body(text.as_str()),
            // The browser writes the multipart boundary header itself.
            RequestBody::Multipart(form) => builder.body(form_data(form)?),
        }
        .map_err(|e| ApiError::Request(format!("{e:?}")))?;

        let response = prepared
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{e:?}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("{e:?}")))?;
        Ok(ApiResponse::new(status, body))
    }
}

/// Read the files picked in an `<input type="file">`.
pub async fn read_file_list(files: &FileList) -> Result<Vec<FilePart>, ApiError> {
    let mut parts = Vec::with_capacity(files.length() as usize);
    for index in 0..files.length() {
        let Some(file) = files.get(index) else {
            continue;
        };
        let buffer = JsFuture::from(file.array_buffer())
            .await
            .map_err(|e| js_error("read file", e))?;
        let content_type = file.type_();
        parts.push(FilePart {
            field: String::new(),
            file_name: file.name(),
            content_type: (!content_type.is_empty()).then_some(content_type),
            bytes: Uint8Array::new(&buffer).to_vec(),
        });
    }
    Ok(parts)
}
