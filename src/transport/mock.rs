//! In-memory transport for tests.
//!
//! [`MockTransport`] behaves like a small SNMPv2c agent: it holds a MIB and
//! answers GETBULK requests from it. Individual requests can be overridden
//! with scripted replies or dropped to simulate timeouts. Every request is
//! recorded for later inspection.

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use super::Transport;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::pdu::{GetBulkRequest, Message, Pdu, Response};
use crate::value::Value;
use crate::varbind::VarBind;

/// What to do with the next request, ahead of the MIB.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer with this response.
    Respond(ResponseBuilder),
    /// Drop the request; the matching `recv` times out.
    Timeout,
}

/// Builds a response; the request id is filled in from the request unless
/// overridden.
#[derive(Debug, Clone, Default)]
pub struct ResponseBuilder {
    request_id: Option<i32>,
    community: Option<Bytes>,
    error_status: i32,
    error_index: i32,
    varbinds: Vec<VarBind>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    pub fn error(mut self, status: i32, index: i32) -> Self {
        self.error_status = status;
        self.error_index = index;
        self
    }

    /// Answer with a fixed request id instead of echoing the request's.
    pub fn request_id(mut self, request_id: i32) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Answer with another community than the request used.
    pub fn community(mut self, community: &[u8]) -> Self {
        self.community = Some(Bytes::copy_from_slice(community));
        self
    }

    fn build(&self, request_id: i32, community: &Bytes) -> Bytes {
        Message::new(
            self.community.clone().unwrap_or_else(|| community.clone()),
            Pdu::Response(Response {
                request_id: self.request_id.unwrap_or(request_id),
                error_status: self.error_status,
                error_index: self.error_index,
                varbinds: self.varbinds.clone(),
            }),
        )
        .encode()
    }
}

/// In-memory SNMPv2c agent implementing [`Transport`].
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    target: SocketAddr,
    next_request_id: AtomicI32,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    mib: BTreeMap<Oid, Value>,
    community: Option<Bytes>,
    script: VecDeque<Scripted>,
    requests: Vec<GetBulkRequest>,
    replies: BTreeMap<i32, Bytes>,
}

impl MockTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(MockInner {
                target,
                next_request_id: AtomicI32::new(1),
                state: Mutex::new(MockState::default()),
            }),
        }
    }

    /// Add one object to the MIB.
    pub fn insert(&self, oid: Oid, value: Value) {
        self.inner.state.lock().unwrap().mib.insert(oid, value);
    }

    /// Add a column: `root.index = value` for each entry.
    pub fn insert_column<V: Into<Value>>(
        &self,
        root: &Oid,
        entries: impl IntoIterator<Item = (u32, V)>,
    ) {
        let mut state = self.inner.state.lock().unwrap();
        for (index, value) in entries {
            state.mib.insert(root.child(index), value.into());
        }
    }

    /// Only answer requests carrying this community; others are dropped
    /// the way a real agent drops them.
    pub fn require_community(&self, community: &[u8]) {
        self.inner.state.lock().unwrap().community = Some(Bytes::copy_from_slice(community));
    }

    /// Queue a scripted reply for the next unscripted request.
    pub fn push_script(&self, step: Scripted) {
        self.inner.state.lock().unwrap().script.push_back(step);
    }

    /// Every GETBULK received so far, in order.
    pub fn requests(&self) -> Vec<GetBulkRequest> {
        self.inner.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.state.lock().unwrap().requests.len()
    }

    /// Requests whose first binding lies under `root`.
    pub fn requests_under(&self, root: &Oid) -> usize {
        self.inner
            .state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.varbinds.first().is_some_and(|vb| vb.oid.starts_with(root)))
            .count()
    }
}

impl MockState {
    fn answer(&self, request: &GetBulkRequest) -> Vec<VarBind> {
        let max = usize::try_from(request.max_repetitions.max(1)).unwrap_or(1);
        let mut out = Vec::new();
        for vb in &request.varbinds {
            let mut cursor = vb.oid.clone();
            for _ in 0..max {
                let next = self
                    .mib
                    .range((Bound::Excluded(&cursor), Bound::Unbounded))
                    .next();
                match next {
                    Some((oid, value)) => {
                        out.push(VarBind::new(oid.clone(), value.clone()));
                        cursor = oid.clone();
                    }
                    None => {
                        out.push(VarBind::new(cursor.clone(), Value::EndOfMibView));
                        break;
                    }
                }
            }
        }
        out
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let message = Message::decode(Bytes::copy_from_slice(data))?;
        let Pdu::GetBulk(request) = message.pdu else {
            return Err(Error::UnexpectedPdu {
                expected: crate::ber::tag::pdu::GET_BULK_REQUEST,
                actual: message.pdu.tag(),
            });
        };

        let mut state = self.inner.state.lock().unwrap();
        state.requests.push(request.clone());

        let reply = match state.script.pop_front() {
            Some(Scripted::Timeout) => None,
            Some(Scripted::Respond(builder)) => {
                Some(builder.build(request.request_id, &message.community))
            }
            None => {
                let accepted = state
                    .community
                    .as_ref()
                    .is_none_or(|c| *c == message.community);
                accepted.then(|| {
                    ResponseBuilder {
                        varbinds: state.answer(&request),
                        ..ResponseBuilder::default()
                    }
                    .build(request.request_id, &message.community)
                })
            }
        };
        if let Some(reply) = reply {
            state.replies.insert(request.request_id, reply);
        }
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let reply = self.inner.state.lock().unwrap().replies.remove(&request_id);
        match reply {
            Some(data) => Ok((data, self.inner.target)),
            // Dropped requests fail at once rather than after `timeout`.
            None => Err(Error::Timeout {
                target: Some(self.inner.target),
                elapsed: timeout,
                request_id,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }

    fn alloc_request_id(&self) -> i32 {
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}
