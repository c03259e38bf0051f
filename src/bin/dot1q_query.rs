//! dot1q-query: VLAN and trunk discovery from the command line.
//!
//! Part of the dot1q-discovery CLI utilities.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use dot1q_discovery::cli::args::{CommonArgs, OutputArgs, ZabbixArgs};
use dot1q_discovery::cli::hints::parse_oid;
use dot1q_discovery::cli::output::{OutputContext, write_error};
use dot1q_discovery::forward::vlan_items;
use dot1q_discovery::{Discovery, ResultCache};

/// Discover 802.1Q VLAN membership and trunk interfaces over SNMPv2c.
#[derive(Debug, Parser)]
#[command(name = "dot1q-query", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List bridged interfaces that are not plain ethernet.
    Trunks,

    /// Show static VLANs and their access and tagged members.
    Vlans {
        /// Forward the membership to Zabbix under this host name instead of
        /// printing it.
        #[arg(long, value_name = "HOST")]
        zabbix_host: Option<String>,

        #[command(flatten)]
        zabbix: ZabbixArgs,
    },

    /// Walk a subtree (dotted notation or well-known column name).
    Walk {
        #[arg(value_name = "OID")]
        oid: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let client = match args.common.client_builder().connect().await {
        Ok(client) => client,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let mut ctx = OutputContext::new(args.output.format);
    ctx.show_timing = args.output.timing;
    let mut stdout = io::stdout().lock();
    let start = Instant::now();

    let result = match args.command {
        Command::Walk { oid } => {
            let oid = match parse_oid(&oid) {
                Ok(oid) => oid,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            let mut walk = client.bulk_walk(oid);
            let mut varbinds = Vec::new();
            let mut failure = None;
            while let Some(item) = walk.next().await {
                match item {
                    Ok(vb) => varbinds.push(vb),
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            // Print what was walked before the failure.
            let written = ctx.write_walk(
                &mut stdout,
                client.peer_addr(),
                &varbinds,
                Some(start.elapsed()),
            );
            match failure {
                Some(e) => Err(e),
                None => Ok(written),
            }
        }
        Command::Trunks => {
            let discovery = Discovery::new(client, Arc::new(ResultCache::new()));
            discovery
                .trunk_interfaces()
                .await
                .map(|trunks| ctx.write_trunks(&mut stdout, &trunks, Some(start.elapsed())))
        }
        Command::Vlans {
            zabbix_host,
            zabbix,
        } => {
            let discovery = Discovery::new(client, Arc::new(ResultCache::new()));
            match discovery.static_vlans().await {
                Ok(view) => match zabbix_host {
                    Some(host) => zabbix
                        .sender()
                        .send(&host, &vlan_items(&view))
                        .await
                        .map(|out| ctx.write_forwarded(&mut stdout, &out)),
                    None => Ok(ctx.write_vlans(&mut stdout, &view, Some(start.elapsed()))),
                },
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            eprintln!("Error writing output: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}
