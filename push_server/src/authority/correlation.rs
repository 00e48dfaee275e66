//! The table of requests that are waiting for a reply.
//!
//! Each entry maps a correlation id to the sending half of a oneshot channel. An entry leaves the table when its reply
//! arrives, when the transport fails, or when the [`PendingGuard`] held by the waiting caller is dropped. The last case
//! covers both timeouts and callers that give up early.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
        MutexGuard,
    },
};

use log::*;
use tokio::sync::oneshot;

use crate::authority::{transport::InboundReply, AuthorityError};

pub type ReplyResult = Result<InboundReply, AuthorityError>;

#[derive(Default)]
struct PendingTable {
    slots: HashMap<String, oneshot::Sender<ReplyResult>>,
    closed: Option<String>,
}

#[derive(Clone, Default)]
pub struct PendingReplies {
    table: Arc<Mutex<PendingTable>>,
}

impl PendingReplies {
    fn lock(&self) -> MutexGuard<'_, PendingTable> {
        // The table holds no invariants that a panicking holder could break halfway
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserves a slot for `correlation_id`. The slot is released when the returned guard is dropped.
    pub fn register(
        &self,
        correlation_id: &str,
    ) -> Result<(PendingGuard, oneshot::Receiver<ReplyResult>), AuthorityError> {
        let mut table = self.lock();
        if let Some(reason) = &table.closed {
            return Err(AuthorityError::Unavailable(reason.clone()));
        }
        if table.slots.contains_key(correlation_id) {
            return Err(AuthorityError::DuplicateCorrelationId(correlation_id.to_string()));
        }
        let (tx, rx) = oneshot::channel();
        table.slots.insert(correlation_id.to_string(), tx);
        let guard = PendingGuard { correlation_id: correlation_id.to_string(), pending: self.clone() };
        Ok((guard, rx))
    }

    /// Hands the reply to whoever is waiting on its correlation id. Returns false if nobody is.
    pub fn resolve(&self, reply: InboundReply) -> bool {
        let slot = self.lock().slots.remove(&reply.correlation_id);
        match slot {
            Some(tx) => {
                let id = reply.correlation_id.clone();
                if tx.send(Ok(reply)).is_err() {
                    trace!("🔐️ Request {id} was abandoned before its reply arrived");
                }
                true
            },
            None => {
                debug!("🔐️ Dropping reply for unknown or expired request {}", reply.correlation_id);
                false
            },
        }
    }

    /// Fails every request currently in flight.
    pub fn fail_all(&self, err: AuthorityError) {
        let slots = std::mem::take(&mut self.lock().slots);
        if !slots.is_empty() {
            warn!("🔐️ Failing {} pending requests. {err}", slots.len());
        }
        for (_, tx) in slots {
            let _ = tx.send(Err(err.clone()));
        }
    }

    /// Fails every pending request and refuses new ones from now on.
    pub fn close(&self, reason: &str) {
        self.lock().closed = Some(reason.to_string());
        self.fail_all(AuthorityError::Unavailable(reason.to_string()));
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, correlation_id: &str) {
        self.lock().slots.remove(correlation_id);
    }
}

pub struct PendingGuard {
    correlation_id: String,
    pending: PendingReplies,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.pending.remove(&self.correlation_id);
    }
}

/// Generates correlation ids that are unique for the life of the process.
///
/// Ids are a random per-process prefix followed by a counter, so two replicas publishing on the same topic never
/// collide either.
pub struct CorrelationIds {
    prefix: String,
    counter: AtomicU64,
}

impl Default for CorrelationIds {
    fn default() -> Self {
        Self { prefix: format!("{:016x}", rand::random::<u64>()), counter: AtomicU64::new(0) }
    }
}

impl CorrelationIds {
    pub fn next_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}
