//! Auth capability.
//!
//! The identity provider lives entirely in the shell. The core asks for a
//! bearer token immediately before each backend call and never stores one
//! in a model, so expiry and refresh stay the provider's problem.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

use crate::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken(String);

impl BearerToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    NotSignedIn,
    Failed { reason: String },
}

impl From<&AuthError> for AppError {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::NotSignedIn => {
                AppError::new(ErrorKind::Authentication, "You are not signed in")
            }
            AuthError::Failed { reason } => {
                AppError::new(ErrorKind::Authentication, "Could not verify your session")
                    .with_internal(reason.clone())
            }
        }
    }
}

pub type TokenResult = Result<BearerToken, AuthError>;

impl Operation for TokenRequest {
    type Output = TokenResult;
}

pub struct Auth<Ev> {
    context: CapabilityContext<TokenRequest, Ev>,
}

impl<Ev> Auth<Ev>
where
    Ev: 'static,
{
    #[must_use]
    pub fn new(context: CapabilityContext<TokenRequest, Ev>) -> Self {
        Self { context }
    }

    pub fn get_token<F>(&self, make_event: F)
    where
        F: FnOnce(TokenResult) -> Ev + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let outcome = ctx.request_from_shell(TokenRequest).await;
            ctx.update_app(make_event(outcome));
        });
    }
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = TokenRequest;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Auth::new(self.context.map_event(f))
    }
}
