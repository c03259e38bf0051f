use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{DEFAULT_TTL, ResultCache};
use crate::client::{Client, DEFAULT_PAGE_SIZE, DEFAULT_RETRIES, DEFAULT_TIMEOUT, SNMP_PORT};
use crate::discovery::Discovery;
use crate::error::Result;
use crate::forward::ZabbixSender;
use crate::transport::SharedUdpTransport;

/// Per-process settings applied to every query.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Port used when `host` does not name one.
    pub snmp_port: u16,
    pub timeout: Duration,
    pub retries: u32,
    pub page_size: u32,
    pub cache_ttl: Duration,
    pub sender: ZabbixSender,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            snmp_port: SNMP_PORT,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl: DEFAULT_TTL,
            sender: ZabbixSender::default(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub transport: Arc<SharedUdpTransport>,
    pub cache: Arc<ResultCache>,
    pub settings: Arc<ServerSettings>,
}

impl AppState {
    pub fn new(transport: SharedUdpTransport, settings: ServerSettings) -> Self {
        Self {
            transport: Arc::new(transport),
            cache: Arc::new(ResultCache::new()),
            settings: Arc::new(settings),
        }
    }

    /// Discovery against `host` over the shared socket.
    pub async fn discovery(&self, host: &str, community: &str) -> Result<Discovery> {
        let settings = &self.settings;
        let client = Client::v2c(self.target(host))
            .community(community.as_bytes())
            .timeout(settings.timeout)
            .retries(settings.retries)
            .page_size(settings.page_size)
            .connect_with(&self.transport)
            .await?;
        Ok(Discovery::new(client, self.cache.clone()).with_ttl(settings.cache_ttl))
    }

    /// Apply the configured SNMP port to a host given without one.
    fn target(&self, host: &str) -> String {
        let port = self.settings.snmp_port;
        match host.parse::<IpAddr>() {
            Ok(ip) => SocketAddr::new(ip, port).to_string(),
            Err(_) if host.contains(':') => host.to_string(),
            Err(_) => format!("{host}:{port}"),
        }
    }
}
