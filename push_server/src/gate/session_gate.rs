//! The authorization gate.
//!
//! Every call that reaches a notification handler passes through [`SessionGate::authorize`] first. Calls dispatched
//! from the message broker come from producers that already hold topic access rights, so they are admitted without
//! consulting the authority. External calls must carry an `Authorization` header whose tokens are checked by the
//! remote authority on every call; nothing is cached.
//!
//! Every failure is reported as [`GateError::Unauthorized`] unless the gate was built with `distinguish_forbidden`, in
//! which case an insufficient role surfaces as [`GateError::Forbidden`].
use std::{fmt::Debug, sync::Arc};

use futures::future::LocalBoxFuture;
use log::*;
use thiserror::Error;

use crate::{
    authority::{AuthorityClient, AuthorityError, RequestTransport},
    gate::{
        call::{IncomingCall, Origin},
        session::{AuthRequest, SessionData},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("A {role} session may not call {handler}")]
    Forbidden { role: String, handler: &'static str },
}

/// The outcome of a successful check.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    /// Broker dispatched calls are admitted without a session.
    Trusted,
    Session(SessionData),
}

impl Authorization {
    pub fn session(&self) -> Option<&SessionData> {
        match self {
            Authorization::Trusted => None,
            Authorization::Session(s) => Some(s),
        }
    }
}

/// Anything that can turn a pair of tokens into a session.
///
/// `Ok(None)` means the authority answered, but had no session for the tokens.
pub trait SessionAuthority {
    fn validate<'a>(
        &'a self,
        request: &'a AuthRequest,
    ) -> LocalBoxFuture<'a, Result<Option<SessionData>, AuthorityError>>;
}

pub type SharedAuthority = Arc<dyn SessionAuthority + Send + Sync>;

/// Validates sessions by asking the remote authority over the broker.
pub struct RemoteSessionAuthority<T> {
    client: AuthorityClient<T>,
    topic: String,
}

impl<T> RemoteSessionAuthority<T> {
    pub fn new<S: Into<String>>(client: AuthorityClient<T>, topic: S) -> Self {
        Self { client, topic: topic.into() }
    }
}

impl<T: RequestTransport> SessionAuthority for RemoteSessionAuthority<T> {
    fn validate<'a>(
        &'a self,
        request: &'a AuthRequest,
    ) -> LocalBoxFuture<'a, Result<Option<SessionData>, AuthorityError>> {
        Box::pin(self.client.request::<_, SessionData>(&self.topic, request))
    }
}

#[derive(Clone)]
pub struct SessionGate {
    authority: SharedAuthority,
    distinguish_forbidden: bool,
}

impl Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionGate (distinguish_forbidden: {})", self.distinguish_forbidden)
    }
}

impl SessionGate {
    pub fn new(authority: SharedAuthority) -> Self {
        Self { authority, distinguish_forbidden: false }
    }

    /// Report insufficient roles as [`GateError::Forbidden`] instead of folding them into `Unauthorized`.
    pub fn distinguish_forbidden(mut self, distinguish: bool) -> Self {
        self.distinguish_forbidden = distinguish;
        self
    }

    pub async fn authorize(&self, call: &IncomingCall) -> Result<Authorization, GateError> {
        match self.check(call).await {
            Ok(auth) => Ok(auth),
            Err(GateError::Forbidden { role, handler }) if self.distinguish_forbidden => {
                Err(GateError::Forbidden { role, handler })
            },
            Err(_) => Err(GateError::Unauthorized),
        }
    }

    async fn check(&self, call: &IncomingCall) -> Result<Authorization, GateError> {
        if call.origin == Origin::Internal {
            trace!("🔐️ {} call to {} is trusted", call.origin, call.handler);
            return Ok(Authorization::Trusted);
        }
        let header = match call.credentials.as_deref() {
            Some(h) if !h.is_empty() => h,
            _ => {
                debug!("🔐️ Call to {} has no authorization header", call.handler);
                return Err(GateError::Unauthorized);
            },
        };
        let request = AuthRequest::from_header(header);
        let session = match self.authority.validate(&request).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                debug!("🔐️ The authority has no session for the tokens given to {}", call.handler);
                return Err(GateError::Unauthorized);
            },
            Err(e) => {
                warn!("🔐️ Session check for {} failed. {e}", call.handler);
                return Err(GateError::Unauthorized);
            },
        };
        if !call.required_roles.permits(&session.role) {
            info!(
                "🔐️ Role '{}' does not satisfy {} required by {}",
                session.role, call.required_roles, call.handler
            );
            return Err(GateError::Forbidden { role: session.role, handler: call.handler });
        }
        trace!("🔐️ Session with role '{}' admitted to {}", session.role, call.handler);
        Ok(Authorization::Session(session))
    }
}
