//! dot1q-server: HTTP API for VLAN and trunk discovery.
//!
//! Part of the dot1q-discovery CLI utilities.

use std::process::ExitCode;

use clap::Parser;
use dot1q_discovery::cli::args::{ServerArgs, init_tracing};
use dot1q_discovery::cli::output::write_error;
use dot1q_discovery::server::{self, AppState, ServerSettings};

/// Serve trunk and static VLAN views of SNMP devices over HTTP.
#[derive(Debug, Parser)]
#[command(name = "dot1q-server", version, about)]
struct Args {
    #[command(flatten)]
    server: ServerArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse().server;
    init_tracing("info", args.verbose);

    let transport = match server::bind_snmp_transport().await {
        Ok(transport) => transport,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let settings = ServerSettings {
        snmp_port: args.snmp_port,
        timeout: args.timeout_duration(),
        retries: args.retries,
        page_size: args.page_size,
        cache_ttl: args.cache_ttl_duration(),
        sender: args.zabbix.sender(),
    };

    match server::serve(args.listen, AppState::new(transport, settings)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}
