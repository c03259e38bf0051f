//! Shared UDP transport.
//!
//! A discovery run walks several tables of the same device at once, and the
//! HTTP service polls many devices concurrently. Every request goes out over
//! one socket; a background task receives all datagrams and routes each one
//! to the waiting request by its request id.
//!
//! ```text
//! SharedUdpTransport (socket + recv loop)
//!        | Arc<Inner>
//!        +--> SharedUdpHandle (target 10.0.0.1) --> Client
//!        +--> SharedUdpHandle (target 10.0.0.2) --> Client
//! ```
//!
//! The pending slot is registered when the request is sent, so an answer
//! that arrives before the caller starts waiting is not lost.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

use super::Transport;
use crate::error::{Error, Result};
use crate::pdu::extract_request_id;
use crate::util::{bind_udp_socket, initial_request_id};

/// Slots nobody started waiting on are dropped after this long.
const UNCLAIMED_SLOT_TTL: Duration = Duration::from_secs(60);

/// One UDP socket shared by any number of [`SharedUdpHandle`]s.
///
/// The receive task runs until the transport and every handle cloned from
/// it have been dropped.
pub struct SharedUdpTransport {
    inner: Arc<Inner>,
}

struct Inner {
    socket: UdpSocket,
    local_addr: SocketAddr,
    pending: Mutex<HashMap<i32, PendingRequest>>,
    config: SharedTransportConfig,
    next_request_id: AtomicI32,
}

struct PendingRequest {
    target: SocketAddr,
    /// Taken by `dispatch`; `None` once the answer is in the channel.
    sender: Option<oneshot::Sender<(Bytes, SocketAddr)>>,
    /// Taken by `recv`; `None` once somebody is waiting.
    receiver: Option<oneshot::Receiver<(Bytes, SocketAddr)>>,
    registered: Instant,
}

/// Configuration for [`SharedUdpTransport`].
#[derive(Debug, Clone)]
pub struct SharedTransportConfig {
    /// Log a warning when a response comes from another address than the
    /// request went to (default: true).
    pub warn_on_source_mismatch: bool,
    /// Largest datagram accepted (default: 65535).
    pub max_message_size: usize,
    /// Kernel receive buffer to request (default: none).
    pub recv_buffer_size: Option<usize>,
}

impl Default for SharedTransportConfig {
    fn default() -> Self {
        Self {
            warn_on_source_mismatch: true,
            max_message_size: 65535,
            recv_buffer_size: None,
        }
    }
}

impl SharedUdpTransport {
    /// Bind with default settings.
    pub async fn bind(addr: impl Into<String>) -> Result<Self> {
        Self::builder().bind(addr).build().await
    }

    pub fn builder() -> SharedUdpTransportBuilder {
        SharedUdpTransportBuilder::new()
    }

    /// A handle that sends to `target`. Handles are cheap to clone.
    pub fn handle(&self, target: SocketAddr) -> SharedUdpHandle {
        SharedUdpHandle {
            inner: self.inner.clone(),
            target,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    fn start_recv_loop(inner: Arc<Inner>) {
        // Hold only a weak reference so dropping the last handle ends the task.
        let weak = Arc::downgrade(&inner);
        let max_message_size = inner.config.max_message_size;
        drop(inner);

        tokio::spawn(async move {
            let mut buf = vec![0u8; max_message_size];
            loop {
                let Some(inner) = weak.upgrade() else {
                    tracing::debug!("shared transport dropped, stopping recv loop");
                    break;
                };
                let received = tokio::select! {
                    r = inner.socket.recv_from(&mut buf) => Some(r),
                    _ = tokio::time::sleep(Duration::from_secs(1)) => None,
                };

                match received {
                    Some(Ok((len, source))) => {
                        let data = Bytes::copy_from_slice(&buf[..len]);
                        inner.dispatch(data, source);
                    }
                    Some(Err(e)) => {
                        // Errors such as ICMP port unreachable surface here;
                        // they must not stop the loop.
                        tracing::debug!(error = %e, "shared transport recv error");
                    }
                    None => {}
                }

                inner.prune();
            }
        });
    }
}

impl Inner {
    fn dispatch(&self, data: Bytes, source: SocketAddr) {
        let source = SocketAddr::new(source.ip().to_canonical(), source.port());
        tracing::trace!(
            snmp.source = %source,
            snmp.bytes = data.len(),
            "shared transport received packet"
        );

        let Some(request_id) = extract_request_id(&data) else {
            tracing::debug!(
                snmp.source = %source,
                snmp.bytes = data.len(),
                "dropping datagram without a readable request id"
            );
            return;
        };

        let mut pending = self.pending.lock().unwrap();
        let Some((target, sender)) = pending
            .get_mut(&request_id)
            .and_then(|p| Some((p.target, p.sender.take()?)))
        else {
            tracing::debug!(
                snmp.request_id = request_id,
                snmp.source = %source,
                "received response for unknown request_id"
            );
            return;
        };
        // An unclaimed receiver stays in its slot holding the answer until
        // `recv` picks it up.
        if pending.get(&request_id).is_some_and(|p| p.receiver.is_none()) {
            pending.remove(&request_id);
        }
        drop(pending);

        if self.config.warn_on_source_mismatch && source != target {
            tracing::warn!(
                snmp.request_id = request_id,
                snmp.target = %target,
                snmp.source = %source,
                "response source address mismatch"
            );
        }
        // The waiter may have given up already.
        let _ = sender.send((data, source));
    }

    fn prune(&self) {
        let now = Instant::now();
        self.pending.lock().unwrap().retain(|_, p| match (&p.sender, &p.receiver) {
            // Somebody is waiting; keep the slot until they give up.
            (Some(sender), None) => !sender.is_closed(),
            (_, Some(_)) => now.duration_since(p.registered) < UNCLAIMED_SLOT_TTL,
            (None, None) => false,
        });
    }
}

/// Builder for [`SharedUdpTransport`].
pub struct SharedUdpTransportBuilder {
    bind_addr: String,
    config: SharedTransportConfig,
}

impl SharedUdpTransportBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:0".into(),
            config: SharedTransportConfig::default(),
        }
    }

    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    pub fn warn_on_source_mismatch(mut self, warn: bool) -> Self {
        self.config.warn_on_source_mismatch = warn;
        self
    }

    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.config.recv_buffer_size = Some(size);
        self
    }

    pub async fn build(self) -> Result<SharedUdpTransport> {
        let bind_addr: SocketAddr = self.bind_addr.parse().map_err(|_| Error::Io {
            target: None,
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address: {}", self.bind_addr),
            ),
        })?;

        let socket = bind_udp_socket(bind_addr, self.config.recv_buffer_size)
            .await
            .map_err(|e| Error::Io {
                target: Some(bind_addr),
                source: e,
            })?;
        let local_addr = socket.local_addr().map_err(|e| Error::Io {
            target: Some(bind_addr),
            source: e,
        })?;

        let initial_request_id = initial_request_id();
        tracing::debug!(
            snmp.local_addr = %local_addr,
            snmp.initial_request_id = initial_request_id,
            "shared UDP transport bound"
        );

        let inner = Arc::new(Inner {
            socket,
            local_addr,
            pending: Mutex::new(HashMap::new()),
            config: self.config,
            next_request_id: AtomicI32::new(initial_request_id),
        });
        SharedUdpTransport::start_recv_loop(inner.clone());

        Ok(SharedUdpTransport { inner })
    }
}

impl Default for SharedUdpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Transport`] sending to one target over a [`SharedUdpTransport`].
#[derive(Clone)]
pub struct SharedUdpHandle {
    inner: Arc<Inner>,
    target: SocketAddr,
}

impl SharedUdpHandle {
    /// IPv4 targets are reached through their mapped form on a dual-stack
    /// socket.
    fn destination(&self) -> SocketAddr {
        match self.target {
            SocketAddr::V4(v4) if self.inner.local_addr.is_ipv6() => {
                SocketAddr::new(v4.ip().to_ipv6_mapped().into(), v4.port())
            }
            target => target,
        }
    }

    fn timeout_error(&self, request_id: i32, timeout: Duration) -> Error {
        Error::Timeout {
            target: Some(self.target),
            elapsed: timeout,
            request_id,
            retries: 0,
        }
    }
}

impl Transport for SharedUdpHandle {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let request_id = extract_request_id(&Bytes::copy_from_slice(data));
        if let Some(request_id) = request_id {
            let (sender, receiver) = oneshot::channel();
            self.inner.pending.lock().unwrap().insert(
                request_id,
                PendingRequest {
                    target: self.target,
                    sender: Some(sender),
                    receiver: Some(receiver),
                    registered: Instant::now(),
                },
            );
        }

        tracing::trace!(
            snmp.target = %self.target,
            snmp.bytes = data.len(),
            "shared UDP send"
        );
        let sent = self.inner.socket.send_to(data, self.destination()).await;
        if let Err(e) = sent {
            if let Some(request_id) = request_id {
                self.inner.pending.lock().unwrap().remove(&request_id);
            }
            return Err(Error::Io {
                target: Some(self.target),
                source: e,
            });
        }
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let receiver = {
            let mut pending = self.inner.pending.lock().unwrap();
            let receiver = pending
                .get_mut(&request_id)
                .and_then(|p| p.receiver.take());
            // Already answered: the value waits in the receiver.
            if pending.get(&request_id).is_some_and(|p| p.sender.is_none()) {
                pending.remove(&request_id);
            }
            receiver
        };
        let Some(receiver) = receiver else {
            // Nothing was sent under this id.
            return Err(self.timeout_error(request_id, Duration::ZERO));
        };

        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok((data, source))) => {
                tracing::trace!(
                    snmp.target = %self.target,
                    snmp.source = %source,
                    snmp.bytes = data.len(),
                    "shared UDP recv complete"
                );
                Ok((data, source))
            }
            Ok(Err(_)) | Err(_) => {
                tracing::trace!(
                    snmp.target = %self.target,
                    snmp.request_id = request_id,
                    "shared UDP recv timeout"
                );
                self.inner.pending.lock().unwrap().remove(&request_id);
                Err(self.timeout_error(request_id, timeout))
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.target
    }

    fn alloc_request_id(&self) -> i32 {
        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        // Wrap back into the positive range.
        if id <= 0 {
            self.inner.next_request_id.store(2, Ordering::Relaxed);
            1
        } else {
            id
        }
    }
}
