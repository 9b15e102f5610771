//! Mapping of HTTP failures onto [`BackendError`].

use reqwest::StatusCode;
use serde::Deserialize;

use crate::domain::BackendError;

/// Error body PostgREST returns for failed requests.
#[derive(Debug, Default, Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

impl PostgrestErrorBody {
    fn describe(self, fallback: &str) -> String {
        let mut text = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        if let Some(details) = self.details.filter(|d| !d.is_empty()) {
            text.push_str(&format!(" ({details})"));
        }
        if let Some(hint) = self.hint.filter(|h| !h.is_empty()) {
            text.push_str(&format!(" hint: {hint}"));
        }
        if let Some(code) = self.code.filter(|c| !c.is_empty()) {
            text.push_str(&format!(" [{code}]"));
        }
        text
    }
}

/// Classify a non-success response.
pub fn from_status(status: StatusCode, body: &str) -> BackendError {
    let fallback = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.trim().to_string()
    };
    let message = serde_json::from_str::<PostgrestErrorBody>(body)
        .map_or_else(|_| fallback.clone(), |parsed| parsed.describe(&fallback));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::PermissionDenied {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        StatusCode::CONFLICT => BackendError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited,
        s if s.is_server_error() => BackendError::Server {
            status: s.as_u16(),
            message,
        },
        _ => BackendError::BadRequest(message),
    }
}

/// Classify a transport-level failure.
pub fn from_reqwest(err: &reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Network(err.to_string())
    }
}
