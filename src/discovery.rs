//! Trunk and VLAN views of one device.
//!
//! A [`Discovery`] walks the columns a view needs concurrently, through the
//! shared [`ResultCache`], and hands the joined tables to the decoder. Any
//! failed walk fails the whole view; the remaining walks are dropped.
//!
//! Interface names, types and the bridge port map change rarely and are
//! served from the cache. The Q-BRIDGE columns describe configuration that
//! operators edit, so VLAN queries always walk them afresh.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::cache::{CacheKey, DEFAULT_TTL, ResultCache};
use crate::client::Client;
use crate::error::Result;
use crate::oid::Oid;
use crate::table::OidTable;
use crate::topology::{self, TrunkInterface, VlanView, oids};
use crate::transport::{SharedUdpHandle, Transport};

/// Topology queries against one device.
pub struct Discovery<T: Transport = SharedUdpHandle> {
    client: Client<T>,
    cache: Arc<ResultCache>,
    ttl: Duration,
}

impl<T: Transport + 'static> Discovery<T> {
    pub fn new(client: Client<T>, cache: Arc<ResultCache>) -> Self {
        Self {
            client,
            cache,
            ttl: DEFAULT_TTL,
        }
    }

    /// Override how long cached interface tables stay fresh.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    async fn table(&self, root: Oid, bypass: bool) -> Result<Arc<OidTable>> {
        let key = CacheKey::new(root.clone(), self.client.peer_addr());
        self.cache
            .get_or_fetch(key, self.ttl, bypass, || async move {
                self.client.walk_table(&root).await
            })
            .await
    }

    /// Bridged interfaces that are not plain ethernet.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.client.peer_addr()))]
    pub async fn trunk_interfaces(&self) -> Result<Vec<TrunkInterface>> {
        let (names, types, bridge) = tokio::try_join!(
            self.table(oids::if_name(), false),
            self.table(oids::if_type(), false),
            self.table(oids::dot1d_base_port_if_index(), false),
        )?;

        let bridge = topology::decode_index_map(&bridge)?;
        let trunks = topology::compute_trunk_interfaces(
            &bridge,
            &topology::decode_text_map(&types),
            &topology::decode_text_map(&names),
        )?;
        tracing::debug!(trunks = trunks.len(), "trunk discovery complete");
        Ok(trunks)
    }

    /// Static VLANs with their access and tagged members.
    #[instrument(level = "debug", skip(self), fields(snmp.target = %self.client.peer_addr()))]
    pub async fn static_vlans(&self) -> Result<VlanView> {
        let (vlan_names, egress, untagged, names, types, bridge) = tokio::try_join!(
            self.table(oids::dot1q_vlan_static_name(), true),
            self.table(oids::dot1q_vlan_static_egress_ports(), true),
            self.table(oids::dot1q_vlan_static_untagged_ports(), true),
            self.table(oids::if_name(), false),
            self.table(oids::if_type(), false),
            self.table(oids::dot1d_base_port_if_index(), false),
        )?;

        let view = topology::build_vlan_view(
            &vlan_names,
            &egress,
            &untagged,
            &topology::decode_index_map(&bridge)?,
            &topology::decode_text_map(&types),
            &topology::decode_text_map(&names),
        )?;
        tracing::debug!(vlans = view.len(), "vlan discovery complete");
        Ok(view)
    }
}
