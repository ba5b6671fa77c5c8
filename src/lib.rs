// lib.rs - CyberGuard shared core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod api;
pub mod attachment;
pub mod capabilities;
pub mod case_chat;
pub mod dashboard;
pub mod resolve;
pub mod scamshield;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use crux_core::{render::Render, App as CruxApp};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
pub const RISK_HIGH_THRESHOLD: u8 = 70;
pub const RISK_LOW_THRESHOLD: u8 = 40;
pub const DEFAULT_CASE_SUMMARY: &str = "Pending analysis...";
pub const RESOLVE_GREETING: &str =
    "I am CyberResolve. Describe your incident briefly (e.g., 'My Instagram was hacked').";
pub const CONNECTION_ERROR_REPLY: &str =
    "I encountered an error connecting to the core. Please try again.";
pub const DEFAULT_CONSEQUENCES: &str = "Potential financial or data loss.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    Serialization,
    Deserialization,
    ImageTooLarge,
    ImageFormatUnsupported,
    Backend,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::ImageTooLarge => "IMAGE_TOO_LARGE",
            Self::ImageFormatUnsupported => "IMAGE_FORMAT_UNSUPPORTED",
            Self::Backend => "BACKEND_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Conflict | Self::RateLimited => {
                ErrorSeverity::Transient
            }

            Self::Serialization | Self::Deserialization => ErrorSeverity::Fatal,

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::ImageTooLarge
            | Self::ImageFormatUnsupported
            | Self::Backend
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }
}

/// Error surface of the whole core. Every capability and parse failure is
/// folded into this one shape before it reaches a model; nothing here is
/// fatal to a view, and nothing is retried automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => "Your session has expired. Please sign in again.".into(),
            ErrorKind::Authorization => "You don't have permission to perform this action.".into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested case could not be found.".into(),
            ErrorKind::Conflict => {
                "This action conflicts with a recent change. Please refresh and try again.".into()
            }
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::ImageTooLarge => {
                format!(
                    "The image is too large. Please use an image smaller than {} MB.",
                    MAX_IMAGE_BYTES / 1_000_000
                )
            }
            ErrorKind::ImageFormatUnsupported => {
                "This file is not a supported image. Please use PNG, JPEG, or WebP.".into()
            }
            ErrorKind::Backend | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    /// Maps a non-success HTTP status onto the taxonomy. The backend reports
    /// failures as FastAPI-style `{"detail": ...}` bodies.
    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Backend,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .and_then(|e| e.detail)
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

pub type AppResult<T> = Result<T, AppError>;

/// Error payload handed to shells inside view models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorView {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ErrorView {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code().to_owned(),
            message: err.user_facing_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl CaseId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IncidentId(pub String);

impl IncidentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IncidentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-side timestamp for optimistic transcript entries. Confirmed
/// entries keep whatever stamp the backend minted.
#[must_use]
pub fn client_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod error_tests {
        use super::*;

        #[test]
        fn test_from_http_status_maps_statuses() {
            assert_eq!(AppError::from_http_status(400, None).kind, ErrorKind::Validation);
            assert_eq!(AppError::from_http_status(401, None).kind, ErrorKind::Authentication);
            assert_eq!(AppError::from_http_status(404, None).kind, ErrorKind::NotFound);
            assert_eq!(AppError::from_http_status(409, None).kind, ErrorKind::Conflict);
            assert_eq!(AppError::from_http_status(429, None).kind, ErrorKind::RateLimited);
            assert_eq!(AppError::from_http_status(500, None).kind, ErrorKind::Backend);
            assert_eq!(AppError::from_http_status(503, None).kind, ErrorKind::Backend);
            assert_eq!(AppError::from_http_status(600, None).kind, ErrorKind::Unknown);
        }

        #[test]
        fn test_from_http_status_reads_detail_body() {
            let body = br#"{"detail": "Case not found"}"#;
            let err = AppError::from_http_status(404, Some(body));
            assert_eq!(err.message, "Case not found");
            assert_eq!(err.context.get("http_status").map(String::as_str), Some("404"));
        }

        #[test]
        fn test_from_http_status_falls_back_on_garbage_body() {
            let err = AppError::from_http_status(500, Some(b"<html>oops</html>"));
            assert_eq!(err.message, "HTTP error: 500");
        }

        #[test]
        fn test_severity_defaults() {
            assert_eq!(ErrorKind::Network.default_severity(), ErrorSeverity::Transient);
            assert_eq!(ErrorKind::Validation.default_severity(), ErrorSeverity::Permanent);
            assert_eq!(ErrorKind::Deserialization.default_severity(), ErrorSeverity::Fatal);
        }

        #[test]
        fn test_display_includes_internal_message() {
            let err = AppError::new(ErrorKind::Network, "Network error")
                .with_internal("connection refused");
            let rendered = err.to_string();
            assert!(rendered.contains("NETWORK_ERROR"));
            assert!(rendered.contains("connection refused"));
        }
    }

    mod id_tests {
        use super::*;

        #[test]
        fn test_case_id_round_trip() {
            let id = CaseId::new("abc-123");
            assert_eq!(id.as_str(), "abc-123");
            assert_eq!(id.to_string(), "abc-123");
        }

        #[test]
        fn test_incident_id_display() {
            let id = IncidentId::new("inc-9");
            assert_eq!(id.to_string(), "inc-9");
        }
    }

    mod timestamp_tests {
        use super::*;

        #[test]
        fn test_client_timestamp_is_rfc3339() {
            let stamp = client_timestamp();
            assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
        }
    }
}
