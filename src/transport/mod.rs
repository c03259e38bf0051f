//! Transport layer abstraction.
//!
//! The client talks to a [`Transport`]; production code uses a handle onto a
//! [`SharedUdpTransport`], tests use the in-memory [`MockTransport`].

mod shared;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use shared::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Client-side transport.
///
/// Walk streams own a clone of the client and with it the transport, so
/// implementations must be cheap to clone (an `Arc` inside).
pub trait Transport: Send + Sync + Clone {
    /// Send an encoded request to the peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for the response carrying `request_id`.
    ///
    /// Returns the datagram and the address it came from.
    fn recv(
        &self,
        request_id: i32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The agent this transport talks to.
    fn peer_addr(&self) -> SocketAddr;

    /// Allocate a request id unique among requests sharing this transport.
    fn alloc_request_id(&self) -> i32;
}
