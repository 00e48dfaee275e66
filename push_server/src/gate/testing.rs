use std::sync::Mutex;

use futures::future::LocalBoxFuture;

use crate::{
    authority::AuthorityError,
    gate::{
        session::{AuthRequest, SessionData},
        session_gate::SessionAuthority,
    },
};

/// Records every request it receives and answers with a canned reply.
pub struct SpyAuthority {
    reply: Result<Option<SessionData>, AuthorityError>,
    calls: Mutex<Vec<AuthRequest>>,
}

impl SpyAuthority {
    pub fn replying(session: Option<SessionData>) -> Self {
        Self { reply: Ok(session), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(err: AuthorityError) -> Self {
        Self { reply: Err(err), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<AuthRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SessionAuthority for SpyAuthority {
    fn validate<'a>(
        &'a self,
        request: &'a AuthRequest,
    ) -> LocalBoxFuture<'a, Result<Option<SessionData>, AuthorityError>> {
        self.calls.lock().unwrap().push(request.clone());
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}
