//! Command-line arguments shared by the binaries.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::cache::DEFAULT_TTL;
use crate::client::{
    Client, DEFAULT_PAGE_SIZE, DEFAULT_RETRIES, DEFAULT_TIMEOUT, V2cClientBuilder,
};
use crate::forward::{DEFAULT_PORT, DEFAULT_SENDER, DEFAULT_SERVER, ZabbixSender};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned text for terminals.
    #[default]
    Human,
    /// Pretty-printed JSON, the same shapes the HTTP API returns.
    Json,
}

/// SNMP session options.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Device to query (`host` or `host:port`, port defaults to 161).
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Community string.
    #[arg(short = 'c', long, default_value = "public")]
    pub community: String,

    /// Request timeout in seconds.
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    pub timeout: f64,

    /// Retransmissions after a timeout.
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Entries requested per GETBULK page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

impl CommonArgs {
    pub fn timeout_duration(&self) -> Duration {
        timeout_from_secs(self.timeout)
    }

    /// Client builder configured from these arguments.
    pub fn client_builder(&self) -> V2cClientBuilder {
        Client::v2c(self.target.as_str())
            .community(self.community.as_bytes())
            .timeout(self.timeout_duration())
            .retries(self.retries)
            .page_size(self.page_size)
    }
}

/// Output and logging options.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format.
    #[arg(short = 'O', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Print elapsed time after the results.
    #[arg(long)]
    pub timing: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl OutputArgs {
    /// Install a stderr tracing subscriber.
    ///
    /// `RUST_LOG` wins when set; otherwise the level follows `-v`.
    pub fn init_tracing(&self) {
        init_tracing("warn", self.verbose);
    }
}

/// Install a tracing subscriber honouring `RUST_LOG`.
///
/// Without it this crate logs at `default`, or at debug/trace for one or
/// more `-v`.
pub fn init_tracing(default: &str, verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => default,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("dot1q_discovery={level},dot1q_server={level}"))
    });

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Where and how to run `zabbix_sender`.
#[derive(Debug, Clone, Args)]
pub struct ZabbixArgs {
    /// Path of the zabbix_sender binary.
    #[arg(long, default_value = DEFAULT_SENDER)]
    pub zabbix_sender: String,

    /// Zabbix server or proxy receiving the values.
    #[arg(long, default_value = DEFAULT_SERVER)]
    pub zabbix_server: String,

    /// Zabbix trapper port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub zabbix_port: u16,
}

impl ZabbixArgs {
    pub fn sender(&self) -> ZabbixSender {
        ZabbixSender::new(
            self.zabbix_sender.as_str(),
            self.zabbix_server.as_str(),
            self.zabbix_port,
        )
    }
}

/// HTTP server options.
#[derive(Debug, Clone, Args)]
pub struct ServerArgs {
    /// Address the HTTP API listens on.
    #[arg(short = 'l', long, default_value = "127.0.0.1:8888")]
    pub listen: SocketAddr,

    /// UDP port of the devices queried.
    #[arg(long, default_value_t = crate::client::SNMP_PORT)]
    pub snmp_port: u16,

    /// Request timeout in seconds.
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT.as_secs_f64())]
    pub timeout: f64,

    /// Retransmissions after a timeout.
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRIES)]
    pub retries: u32,

    /// Entries requested per GETBULK page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Seconds interface tables stay cached.
    #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
    pub cache_ttl: u64,

    #[command(flatten)]
    pub zabbix: ZabbixArgs,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ServerArgs {
    pub fn timeout_duration(&self) -> Duration {
        timeout_from_secs(self.timeout)
    }

    pub fn cache_ttl_duration(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }
}

fn timeout_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(DEFAULT_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Query {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        output: OutputArgs,
    }

    #[derive(Debug, Parser)]
    struct Server {
        #[command(flatten)]
        server: ServerArgs,
    }

    #[test]
    fn test_common_defaults() {
        let args = Query::try_parse_from(["dot1q-query", "192.0.2.1"]).unwrap();
        assert_eq!(args.common.community, "public");
        assert_eq!(args.common.timeout_duration(), Duration::from_secs(5));
        assert_eq!(args.common.retries, 1);
        assert_eq!(args.common.page_size, 50);
        assert_eq!(args.output.format, OutputFormat::Human);
        assert_eq!(args.output.verbose, 0);
    }

    #[test]
    fn test_common_overrides() {
        let args = Query::try_parse_from([
            "dot1q-query",
            "sw1:1161",
            "-c",
            "private",
            "-t",
            "0.5",
            "-r",
            "0",
            "--page-size",
            "10",
            "-O",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.common.target, "sw1:1161");
        assert_eq!(args.common.timeout_duration(), Duration::from_millis(500));
        assert_eq!(args.common.retries, 0);
        assert_eq!(args.output.format, OutputFormat::Json);
        assert_eq!(args.output.verbose, 2);
    }

    #[test]
    fn test_negative_timeout_falls_back_to_default() {
        assert_eq!(timeout_from_secs(-1.0), DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_server_defaults() {
        let args = Server::try_parse_from(["dot1q-server"]).unwrap().server;
        assert_eq!(args.listen, "127.0.0.1:8888".parse().unwrap());
        assert_eq!(args.snmp_port, 161);
        assert_eq!(args.cache_ttl_duration(), Duration::from_secs(3600));
        assert_eq!(args.zabbix.sender(), ZabbixSender::default());
    }
}
