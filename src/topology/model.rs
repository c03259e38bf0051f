//! Decoded topology views.

use std::collections::BTreeMap;

use serde::Serialize;

/// ifType value of `ethernetCsmacd`; every other type counts as a trunk.
pub const ETHERNET_CSMACD: &str = "6";

/// Bridge port number to ifIndex.
pub type BridgeIndexMap = BTreeMap<u32, u32>;
/// ifIndex to interface name.
pub type InterfaceNameMap = BTreeMap<u32, String>;
/// ifIndex to ifType, kept as text for comparison with [`ETHERNET_CSMACD`].
pub type InterfaceTypeMap = BTreeMap<u32, String>;

/// A bridged interface that is not plain ethernet (LAG, port-channel...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrunkInterface {
    pub interface_index: u32,
    pub interface_name: String,
}

/// Bridge ports of one VLAN split by membership type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortClassification {
    /// Untagged members, ascending.
    pub access: Vec<u32>,
    /// Tagged members that are not also untagged, ascending.
    pub tagged: Vec<u32>,
}

/// Membership of one VLAN by interface name.
///
/// A name appears in at most one of the four lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VlanRecord {
    #[serde(skip)]
    pub vlan_id: u32,
    pub name: String,
    pub access_ports: Vec<String>,
    pub access_trunks: Vec<String>,
    pub tagged_ports: Vec<String>,
    pub tagged_trunks: Vec<String>,
}

/// All static VLANs of a device, keyed by VLAN id.
///
/// Serializes as a JSON object whose keys are the VLAN ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VlanView {
    vlans: BTreeMap<u32, VlanRecord>,
}

impl VlanView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: VlanRecord) {
        self.vlans.insert(record.vlan_id, record);
    }

    pub fn get(&self, vlan_id: u32) -> Option<&VlanRecord> {
        self.vlans.get(&vlan_id)
    }

    pub fn len(&self) -> usize {
        self.vlans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vlans.is_empty()
    }

    /// Records in ascending VLAN id order.
    pub fn iter(&self) -> impl Iterator<Item = &VlanRecord> {
        self.vlans.values()
    }
}

impl FromIterator<VlanRecord> for VlanView {
    fn from_iter<I: IntoIterator<Item = VlanRecord>>(iter: I) -> Self {
        let mut view = Self::new();
        for record in iter {
            view.insert(record);
        }
        view
    }
}
