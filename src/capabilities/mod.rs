//! Custom capabilities fulfilled by the shell.
//!
//! The core never performs I/O itself. It emits `HttpRequest` and
//! `TokenRequest` operations and receives their outputs back as events,
//! keeping every app deterministic and testable with `AppTester`.

pub mod auth;
pub mod http;

pub use auth::{Auth, AuthError, BearerToken, TokenRequest, TokenResult};
pub use http::{Http, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult};
