//! `reqwest` implementation of the shared transport seam.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use markflow_shared::{
    ApiError, ApiRequest, ApiResponse, Method, MultipartForm, RequestBody, Transport,
};
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP transport backed by one pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Client with the default request timeout.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("mf-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
        })
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn multipart(form: &MultipartForm) -> Result<Form, ApiError> {
    let mut out = Form::new();
    for (name, value) in &form.fields {
        out = out.text(name.clone(), value.clone());
    }
    for file in &form.files {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| ApiError::Request(format!("{}: {e}", file.file_name)))?;
        }
        out = out.part(file.field.clone(), part);
    }
    Ok(out)
}

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        url: &str,
        bearer: Option<&str>,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        let mut builder = self.http.request(method(request.method), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(text) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(text.clone()),
            RequestBody::Multipart(form) => builder.multipart(multipart(form)?),
        };

        tracing::debug!(method = request.method.as_str(), url, "sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        tracing::debug!(status, url, "received response");
        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use markflow_shared::FilePart;

    use super::*;

    #[test]
    fn rejects_malformed_content_type() {
        let form = MultipartForm {
            fields: Vec::new(),
            files: vec![FilePart {
                field: "files".to_string(),
                file_name: "a.jpg".to_string(),
                content_type: Some("not a mime".to_string()),
                bytes: vec![1, 2, 3],
            }],
        };
        assert!(matches!(multipart(&form), Err(ApiError::Request(_))));
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(method(Method::Delete), reqwest::Method::DELETE);
    }
}
