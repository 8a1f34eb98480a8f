//! Transport-neutral request description and the seam the browser and CLI
//! HTTP stacks plug into.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ApiError;

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case verb.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One file of a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name.
    pub field: String,
    /// File name sent to the server.
    pub file_name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Multipart body: plain fields plus files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultipartForm {
    /// Text fields.
    pub fields: Vec<(String, String)>,
    /// File entries, in submission order.
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    /// Number of entries (fields and files).
    pub fn len(&self) -> usize {
        self.fields.len() + self.files.len()
    }

    /// True when the form has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Serialized JSON text.
    Json(String),
    /// Multipart form data.
    Multipart(MultipartForm),
}

/// A request relative to the API root, before auth decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Verb.
    pub method: Method,
    /// Path below the API root, starting with `/`.
    pub path: String,
    /// Query parameters, unencoded.
    pub query: Vec<(String, String)>,
    /// Body.
    pub body: RequestBody,
    /// Whether the bearer token is attached and 401 triggers a refresh.
    pub authenticated: bool,
    /// Set once the request has been replayed after a refresh.
    pub retried: bool,
}

impl ApiRequest {
    /// Authenticated request without body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            authenticated: true,
            retried: false,
        }
    }

    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// `POST path`.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// `PUT path`.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// `DELETE path`.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Send without a bearer token; a 401 is a plain rejection.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when present.
    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// JSON body.
    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let text = serde_json::to_string(body).map_err(|e| ApiError::Request(e.to_string()))?;
        self.body = RequestBody::Json(text);
        Ok(self)
    }

    /// Multipart body.
    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Encoded query string without the leading `?`.
    pub fn query_string(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Absolute URL under `root`.
    pub fn url(&self, root: &str) -> String {
        let mut url = format!("{}{}", root.trim_end_matches('/'), self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query_string());
        }
        url
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text.
    pub body: String,
}

impl ApiResponse {
    /// Response with the given status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs HTTP exchanges. Implemented over `gloo-net` in the browser and
/// `reqwest` in the CLI.
///
/// Any HTTP status is a successful exchange; only failures to get a response
/// at all are errors (normally [`ApiError::Network`]).
#[async_trait(?Send)]
pub trait Transport {
    /// Send `request` to `url`, attaching `bearer` as `Authorization: Bearer`
    /// when present.
    async fn send(
        &self,
        url: &str,
        bearer: Option<&str>,
        request: &ApiRequest,
    ) -> Result<ApiResponse, ApiError>;
}

/// Percent-encode one path segment.
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_root_path_and_encoded_query() {
        let request = ApiRequest::get("/groups/g%201/uploads")
            .query("page", 2)
            .query("batch_name", "Term 1");
        assert_eq!(
            request.url("http://api.test/api/v1/"),
            "http://api.test/api/v1/groups/g%201/uploads?page=2&batch_name=Term%201"
        );
    }

    #[test]
    fn optional_query_is_skipped() {
        let request = ApiRequest::get("/groups").query_opt("sort", None::<&str>);
        assert_eq!(request.url("http://h"), "http://h/groups");
    }

    #[test]
    fn anonymous_requests_skip_auth() {
        let request = ApiRequest::post("/auth/login").anonymous();
        assert!(!request.authenticated);
        assert!(!request.retried);
    }
}
