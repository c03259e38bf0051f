//! HTTP API over the discovery views.
//!
//! | route | answer |
//! |---|---|
//! | `GET /trunkports?host=&community=&format=` | trunk list, or Zabbix LLD with `format=lld` |
//! | `GET /staticvlans?host=&community=&zbxhost=` | VLAN view, or the zabbix_sender output |
//! | `GET /health` | liveness and cache size |
//!
//! All queries share one UDP socket and one table cache.
//!
//! This module is only available with the `server` feature.

pub mod dto;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use routes::create_routes;
pub use state::{AppState, ServerSettings};

use std::net::SocketAddr;

use crate::error::{Error, Result};
use crate::transport::SharedUdpTransport;

/// Bind the shared SNMP socket, dual-stack where the host allows it.
pub async fn bind_snmp_transport() -> Result<SharedUdpTransport> {
    match SharedUdpTransport::bind("[::]:0").await {
        Ok(transport) => Ok(transport),
        Err(e) => {
            tracing::debug!(error = %e, "IPv6 unavailable, binding IPv4 only");
            SharedUdpTransport::bind("0.0.0.0:0").await
        }
    }
}

/// Serve the API on `listen` until Ctrl-C.
pub async fn serve(listen: SocketAddr, state: AppState) -> Result<()> {
    let io_error = |source| Error::Io {
        target: None,
        source,
    };
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(io_error)?;
    tracing::info!(
        http.listen = %listen,
        snmp.local = %state.transport.local_addr(),
        "dot1q-server listening"
    );

    axum::serve(listener, create_routes(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await
        .map_err(io_error)
}
