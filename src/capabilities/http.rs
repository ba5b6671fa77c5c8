//! HTTP capability.
//!
//! One operation per request, no retries, no connection state. The shell
//! owns the actual transport (fetch, URLSession, reqwest, whatever fits the
//! platform) and reports either a full response or a transport failure.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

/// A fully-formed request, headers included. Built via the associated
/// constructors so every call site reads the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn bearer(self, token: &super::BearerToken) -> Self {
        self.header("Authorization", format!("Bearer {}", token.as_str()))
    }

    /// Serializes `payload` as the JSON body and sets the content type.
    pub fn json<T: Serialize>(self, payload: &T) -> Result<Self, AppError> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            AppError::new(ErrorKind::Serialization, "failed to encode request body")
                .with_internal(e.to_string())
        })?;
        Ok(self
            .header("Content-Type", "application/json")
            .with_body(body))
    }

    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Decodes the body, folding malformed payloads into the taxonomy.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            AppError::new(ErrorKind::Deserialization, "unexpected response from the server")
                .with_internal(e.to_string())
                .with_context("http_status", self.status.to_string())
        })
    }

    /// Non-2xx responses become typed errors keyed on the status code.
    #[must_use]
    pub fn as_error(&self) -> AppError {
        AppError::from_http_status(self.status, Some(&self.body))
    }
}

/// Transport-level failure. Anything that produced an HTTP status, even a
/// 5xx, is a response, not an `HttpError`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpError {
    Network { message: String },
    Timeout,
    Other { message: String },
}

impl From<&HttpError> for AppError {
    fn from(err: &HttpError) -> Self {
        match err {
            HttpError::Network { message } => {
                AppError::new(ErrorKind::Network, "Network error").with_internal(message.clone())
            }
            HttpError::Timeout => AppError::new(ErrorKind::Timeout, "Request timed out"),
            HttpError::Other { message } => {
                AppError::new(ErrorKind::Unknown, "Request failed").with_internal(message.clone())
            }
        }
    }
}

pub type HttpResult = Result<HttpResponse, HttpError>;

impl Operation for HttpRequest {
    type Output = HttpResult;
}

pub struct Http<Ev> {
    context: CapabilityContext<HttpRequest, Ev>,
}

impl<Ev> Http<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<HttpRequest, Ev>) -> Self {
        Self { context }
    }

    /// Sends `request` to the shell and maps the outcome back into an app
    /// event. The closure carries whatever intent the caller needs to route
    /// the response, so no in-flight bookkeeping lives in the model.
    pub fn send<F>(&self, request: HttpRequest, make_event: F)
    where
        F: FnOnce(HttpResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let outcome = ctx.request_from_shell(request).await;
            ctx.update_app(make_event(outcome));
        });
    }
}

impl<Ev> Capability<Ev> for Http<Ev> {
    type Operation = HttpRequest;
    type MappedSelf<MappedEv> = Http<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Http::new(self.context.map_event(f))
    }
}
