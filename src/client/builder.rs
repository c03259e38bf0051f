//! Client builder.
//!
//! ```rust,no_run
//! # use dot1q_discovery::Client;
//! # use std::time::Duration;
//! # async fn example() -> dot1q_discovery::Result<()> {
//! let client = Client::v2c("192.0.2.10:161")
//!     .community(b"monitoring")
//!     .timeout(Duration::from_secs(2))
//!     .retries(2)
//!     .page_size(25)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::transport::{SharedUdpTransport, Transport};

use super::{Client, ClientConfig};

/// Port used when the target does not name one.
pub const SNMP_PORT: u16 = 161;

/// Builder for SNMPv2c clients, created by [`Client::v2c()`].
pub struct V2cClientBuilder {
    target: String,
    config: ClientConfig,
}

impl V2cClientBuilder {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            config: ClientConfig::default(),
        }
    }

    pub fn community(mut self, community: &[u8]) -> Self {
        self.config.community = Bytes::copy_from_slice(community);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Retransmissions after a timeout.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// GETBULK max-repetitions for walks (clamped to at least 1).
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size.max(1);
        self
    }

    /// Resolve the target, bind a transport for it and build the client.
    pub async fn connect(self) -> Result<Client> {
        let addr = resolve_target(&self.target, self.config.timeout).await?;
        let bind = if addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let shared = SharedUdpTransport::bind(bind).await?;
        Ok(self.build(shared.handle(addr)))
    }

    /// Resolve the target and build the client on an existing shared
    /// transport.
    pub async fn connect_with(self, shared: &SharedUdpTransport) -> Result<Client> {
        let addr = resolve_target(&self.target, self.config.timeout).await?;
        Ok(self.build(shared.handle(addr)))
    }

    /// Build the client with a pre-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Client<T> {
        Client::new(transport, self.config)
    }
}

/// Resolve `host` or `host:port`, defaulting the port to 161.
///
/// Address literals are parsed directly; names go through the resolver and
/// fail once `timeout` elapses.
pub async fn resolve_target(target: &str, timeout: Duration) -> Result<SocketAddr> {
    let unresolved = || Error::UnresolvedTarget {
        target: target.into(),
    };

    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    // Bare IPv6 literals and host names get the default port.
    let with_port = match target.parse::<IpAddr>() {
        Ok(ip) => return Ok(SocketAddr::new(ip, SNMP_PORT)),
        Err(_) if target.contains(':') => target.to_string(),
        Err(_) => format!("{target}:{SNMP_PORT}"),
    };

    let mut addrs = tokio::time::timeout(timeout, tokio::net::lookup_host(with_port.as_str()))
        .await
        .map_err(|_| {
            tracing::debug!(snmp.target = target, ?timeout, "name resolution timed out");
            unresolved()
        })?
        .map_err(|e| {
            tracing::debug!(snmp.target = target, error = %e, "name resolution failed");
            unresolved()
        })?;
    addrs.next().ok_or_else(unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const RESOLVE: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_resolve_target_defaults_port() {
        assert_eq!(
            resolve_target("192.0.2.1", RESOLVE).await.unwrap(),
            "192.0.2.1:161".parse().unwrap()
        );
        assert_eq!(
            resolve_target("192.0.2.1:1161", RESOLVE).await.unwrap(),
            "192.0.2.1:1161".parse().unwrap()
        );
        assert_eq!(
            resolve_target("::1", RESOLVE).await.unwrap(),
            "[::1]:161".parse().unwrap()
        );
        assert_eq!(
            resolve_target("localhost:1161", RESOLVE).await.unwrap().port(),
            1161
        );
    }

    #[tokio::test]
    async fn test_unresolvable_target_is_invalid_input() {
        let err = resolve_target("no such host.invalid", RESOLVE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = resolve_target("192.0.2.1:99999", RESOLVE)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_builder_defaults() {
        let builder = Client::v2c("192.0.2.1");
        assert_eq!(builder.config.timeout, Duration::from_secs(5));
        assert_eq!(builder.config.retries, 1);
        assert_eq!(builder.config.page_size, 50);
        assert_eq!(&builder.config.community[..], b"public");
        assert_eq!(builder.page_size(0).config.page_size, 1);
    }
}
