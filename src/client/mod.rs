//! SNMPv2c client.
//!
//! A [`Client`] is a session against one agent: target, community, timeout,
//! retry count and walk page size. It is cheap to clone; clones share the
//! transport.

mod builder;
mod walk;

pub use builder::{SNMP_PORT, V2cClientBuilder, resolve_target};
pub use walk::BulkWalk;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::instrument;

use crate::ber::tag;
use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pdu::{GetBulkRequest, Message, Pdu};
use crate::transport::{SharedUdpHandle, Transport};
use crate::varbind::VarBind;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default number of retransmissions after a timeout.
pub const DEFAULT_RETRIES: u32 = 1;
/// Default GETBULK max-repetitions used by walks.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Session parameters.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub community: Bytes,
    pub timeout: Duration,
    /// Retransmissions after a timeout; 0 sends each request once.
    pub retries: u32,
    /// Entries requested per GETBULK page.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            community: Bytes::from_static(b"public"),
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// SNMPv2c session against one agent.
pub struct Client<T: Transport = SharedUdpHandle> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Client {
    /// Start building a v2c client for `target` (`host` or `host:port`).
    ///
    /// ```rust,no_run
    /// # async fn example() -> dot1q_discovery::Result<()> {
    /// use dot1q_discovery::Client;
    /// use std::time::Duration;
    ///
    /// let client = Client::v2c("192.0.2.10")
    ///     .community(b"public")
    ///     .timeout(Duration::from_secs(3))
    ///     .connect()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn v2c(target: impl Into<String>) -> V2cClientBuilder {
        V2cClientBuilder::new(target)
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner { transport, config }),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.transport.peer_addr()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// One GETBULK round trip starting after `oid`.
    ///
    /// The request is retransmitted with a fresh request id each time it
    /// times out, up to the configured retry count.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.peer_addr()))]
    pub async fn get_bulk(&self, oid: &Oid, max_repetitions: u32) -> Result<Vec<VarBind>> {
        let config = &self.inner.config;
        let max_repetitions = i32::try_from(max_repetitions).unwrap_or(i32::MAX);
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            let request_id = self.inner.transport.alloc_request_id();
            let message = Message::new(
                config.community.clone(),
                Pdu::GetBulk(GetBulkRequest {
                    request_id,
                    non_repeaters: 0,
                    max_repetitions,
                    varbinds: vec![VarBind::null(oid.clone())],
                }),
            );

            tracing::trace!(snmp.request_id = request_id, attempt, "sending GETBULK");
            self.inner.transport.send(&message.encode()).await?;

            match self.inner.transport.recv(request_id, config.timeout).await {
                Ok((data, _source)) => return self.handle_response(request_id, data),
                Err(Error::Timeout { .. }) if attempt < config.retries => {
                    attempt += 1;
                    tracing::debug!(
                        snmp.request_id = request_id,
                        attempt,
                        "request timed out, retrying"
                    );
                }
                Err(Error::Timeout { .. }) => {
                    return Err(Error::Timeout {
                        target: Some(self.peer_addr()),
                        elapsed: start.elapsed(),
                        request_id,
                        retries: config.retries,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn handle_response(&self, request_id: i32, data: Bytes) -> Result<Vec<VarBind>> {
        let message = Message::decode(data)?;
        if message.community != self.inner.config.community {
            return Err(Error::CommunityMismatch {
                target: Some(self.peer_addr()),
            });
        }

        let response = match message.pdu {
            Pdu::Response(response) => response,
            other => {
                return Err(Error::UnexpectedPdu {
                    expected: tag::pdu::RESPONSE,
                    actual: other.tag(),
                });
            }
        };
        if response.request_id != request_id {
            return Err(Error::RequestIdMismatch {
                expected: request_id,
                actual: response.request_id,
            });
        }

        if response.error_status != 0 {
            let index = u32::try_from(response.error_index).unwrap_or(0);
            let oid = index
                .checked_sub(1)
                .and_then(|i| response.varbinds.get(i as usize))
                .map(|vb| vb.oid.clone());
            return Err(Error::Snmp {
                target: Some(self.peer_addr()),
                status: ErrorStatus::from_i32(response.error_status),
                index,
                oid,
            });
        }

        Ok(response.varbinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::oid;
    use crate::transport::{MockTransport, ResponseBuilder, Scripted};
    use crate::value::Value;

    fn client(mock: &MockTransport, retries: u32) -> Client<MockTransport> {
        Client::new(
            mock.clone(),
            ClientConfig {
                retries,
                ..ClientConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_get_bulk_sends_page_size_and_zero_non_repeaters() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("switch"));

        let vbs = client(&mock, 0)
            .get_bulk(&oid!(1, 3, 6, 1, 2, 1, 1), 25)
            .await
            .unwrap();
        assert_eq!(vbs[0].value, Value::from("switch"));

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].non_repeaters, 0);
        assert_eq!(requests[0].max_repetitions, 25);
        assert_eq!(requests[0].varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1));
    }

    #[tokio::test]
    async fn test_retries_after_timeout() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.insert(oid!(1, 3, 6, 1, 2), Value::Integer(1));
        mock.push_script(Scripted::Timeout);

        let vbs = client(&mock, 1)
            .get_bulk(&oid!(1, 3, 6, 1), 10)
            .await
            .unwrap();
        assert_eq!(vbs[0].oid, oid!(1, 3, 6, 1, 2));
        assert_eq!(mock.request_count(), 2);

        // Retransmissions use a new request id.
        let requests = mock.requests();
        assert_ne!(requests[0].request_id, requests[1].request_id);
    }

    #[tokio::test]
    async fn test_timeout_after_retries_is_unreachable() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.push_script(Scripted::Timeout);
        mock.push_script(Scripted::Timeout);

        let err = client(&mock, 1)
            .get_bulk(&oid!(1, 3, 6, 1), 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeviceUnreachable);
        assert!(matches!(err, Error::Timeout { retries: 1, .. }));
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_error_status_is_protocol_error() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.push_script(Scripted::Respond(
            ResponseBuilder::new()
                .error(5, 1)
                .varbind(oid!(1, 3, 6, 1), Value::Null),
        ));

        let err = client(&mock, 0)
            .get_bulk(&oid!(1, 3, 6, 1), 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        match err {
            Error::Snmp { status, index, oid, .. } => {
                assert_eq!(status, ErrorStatus::GenErr);
                assert_eq!(index, 1);
                assert_eq!(oid, Some(oid!(1, 3, 6, 1)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_id_mismatch_rejected() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.push_script(Scripted::Respond(ResponseBuilder::new().request_id(-5)));

        let err = client(&mock, 0)
            .get_bulk(&oid!(1, 3, 6, 1), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RequestIdMismatch { actual: -5, .. }));
    }

    #[tokio::test]
    async fn test_community_mismatch_rejected() {
        let mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
        mock.push_script(Scripted::Respond(ResponseBuilder::new().community(b"other")));

        let err = client(&mock, 0)
            .get_bulk(&oid!(1, 3, 6, 1), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CommunityMismatch { .. }));
    }
}
