//! Client-observed API failures.

use serde::Deserialize;
use thiserror::Error;

const FALLBACK_VALIDATION: &str = "The request was rejected by the server";

/// Every way an API call can fail, as seen from the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    /// 401 that survived the refresh path; the session is gone.
    #[error("session expired")]
    Unauthorized,
    /// Any other 4xx.
    #[error("request rejected ({status}): {message}")]
    Validation {
        /// HTTP status code.
        status: u16,
        /// Server message, or a generic fallback.
        message: String,
    },
    /// 5xx.
    #[error("server error ({status})")]
    Server {
        /// HTTP status code.
        status: u16,
    },
    /// The body did not match the endpoint's declared shape.
    #[error("unexpected response from {endpoint}: {detail}")]
    Decode {
        /// Endpoint name.
        endpoint: &'static str,
        /// Decoder message.
        detail: String,
    },
    /// The request could not be assembled locally.
    #[error("could not build request: {0}")]
    Request(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Classify a non-2xx response. 401 maps to [`ApiError::Unauthorized`];
    /// the refresh path handles it before this is surfaced.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => Self::Unauthorized,
            500..=599 => Self::Server { status },
            _ => Self::Validation {
                status,
                message: server_message(body)
                    .unwrap_or_else(|| FALLBACK_VALIDATION.to_string()),
            },
        }
    }

    /// 401 on an anonymous request such as sign-in: the credentials were
    /// wrong, the session is not involved.
    pub fn credentials_rejected(body: &str) -> Self {
        Self::Validation {
            status: 401,
            message: server_message(body).unwrap_or_else(|| "Invalid credentials".to_string()),
        }
    }

    /// Text for banners and notices.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Failed to reach the server. Check your connection.".to_string(),
            Self::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            Self::Validation { message, .. } => message.clone(),
            Self::Server { .. } => "The server ran into a problem. Try again later.".to_string(),
            Self::Decode { .. } => "Failed to load data: unexpected server response.".to_string(),
            Self::Request(detail) => format!("Could not send the request: {detail}"),
        }
    }

    /// True when the caller should send the user back to sign in.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

fn server_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_uses_server_message() {
        let err = ApiError::from_status(422, r#"{"success":false,"message":"Name is required"}"#);
        assert_eq!(
            err,
            ApiError::Validation {
                status: 422,
                message: "Name is required".to_string()
            }
        );
        assert_eq!(err.user_message(), "Name is required");
    }

    #[test]
    fn error_field_is_accepted_too() {
        let err = ApiError::from_status(400, r#"{"error":"bad mode"}"#);
        assert_eq!(err.user_message(), "bad mode");
    }

    #[test]
    fn missing_body_falls_back() {
        let err = ApiError::from_status(404, "");
        assert_eq!(
            err,
            ApiError::Validation {
                status: 404,
                message: FALLBACK_VALIDATION.to_string()
            }
        );
    }

    #[test]
    fn rejected_credentials_have_a_default_message() {
        assert_eq!(ApiError::credentials_rejected("").user_message(), "Invalid credentials");
        assert!(!ApiError::credentials_rejected("").is_unauthorized());
    }

    #[test]
    fn server_errors_stay_generic() {
        let err = ApiError::from_status(503, r#"{"message":"db down"}"#);
        assert_eq!(err, ApiError::Server { status: 503 });
        assert!(!err.user_message().contains("db down"));
    }
}
