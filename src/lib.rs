//! # dot1q-discovery
//!
//! Async SNMPv2c discovery of 802.1Q VLAN membership and trunk interfaces.
//!
//! The crate walks a handful of IF-MIB, BRIDGE-MIB and Q-BRIDGE-MIB columns
//! with GETBULK and decodes them into two views of a switch:
//!
//! - the **trunk view**: bridged interfaces whose ifType is not ethernet
//!   (port-channels, LAGs);
//! - the **VLAN view**: for every static VLAN, its untagged (access) and
//!   tagged members split into plain ports and trunks.
//!
//! Interface tables are cached per device for an hour; VLAN tables are
//! always walked afresh.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dot1q_discovery::{Client, Discovery, ResultCache};
//!
//! #[tokio::main]
//! async fn main() -> dot1q_discovery::Result<()> {
//!     let client = Client::v2c("192.0.2.10")
//!         .community(b"public")
//!         .connect()
//!         .await?;
//!
//!     let discovery = Discovery::new(client, Arc::new(ResultCache::new()));
//!     for trunk in discovery.trunk_interfaces().await? {
//!         println!("{} {}", trunk.interface_index, trunk.interface_name);
//!     }
//!     for vlan in discovery.static_vlans().await?.iter() {
//!         println!("{} {:?}", vlan.vlan_id, vlan.access_ports);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `cli` (default): the `dot1q-query` tool.
//! - `server`: the `dot1q-server` HTTP API.
//! - `testing`: exposes [`transport::MockTransport`] for downstream tests.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ber;
pub mod cache;
pub mod client;
pub mod discovery;
pub mod error;
pub mod forward;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod table;
pub mod topology;
pub mod transport;
pub mod value;
pub mod varbind;

pub(crate) mod util;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

#[cfg(feature = "server")]
#[cfg_attr(docsrs, doc(cfg(feature = "server")))]
pub mod server;

pub use cache::ResultCache;
pub use client::{Client, ClientConfig};
pub use discovery::Discovery;
pub use error::{Error, ErrorKind, Result};
pub use oid::Oid;
pub use table::OidTable;
pub use topology::{TrunkInterface, VlanRecord, VlanView};
pub use value::Value;
pub use varbind::VarBind;
