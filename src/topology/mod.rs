//! VLAN and trunk topology derived from walked bridge tables.
//!
//! [`oids`] names the columns, [`decode`] turns walked [`OidTable`](crate::OidTable)s
//! into the views in [`model`].

pub mod decode;
pub mod model;
pub mod oids;

pub use decode::{
    build_vlan_view, classify_ports, compute_trunk_interfaces, decode_bitmap, decode_index_map,
    decode_text_map, encode_bitmap, resolve_names,
};
pub use model::{
    BridgeIndexMap, ETHERNET_CSMACD, InterfaceNameMap, InterfaceTypeMap, PortClassification,
    TrunkInterface, VlanRecord, VlanView,
};
