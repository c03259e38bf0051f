//! A small switch: 52 ethernet ports, two port-channels and an SVI.
//!
//! | ifIndex | name | ifType | bridge port |
//! |---|---|---|---|
//! | 1..=52 | Gi0/n | 6 | n |
//! | 53 | Po1 | 161 | 53 |
//! | 54 | Po2 | 161 | 54 |
//! | 55 | Vlan1 | 53 | - |
//!
//! | VLAN | name | untagged | egress |
//! |---|---|---|---|
//! | 1 | default | 1..=10 | 1..=10, 53, 54 |
//! | 20 | voice | - | 11, 12, 53 |
//! | 30 | servers | 54 | 13, 54 |

use std::collections::BTreeMap;

use bytes::Bytes;
use dot1q_discovery::topology::oids;
use dot1q_discovery::{Oid, Value, oid};

/// Community the fake agent accepts.
pub const COMMUNITY: &[u8] = b"public";

pub const ETHERNET_PORTS: u32 = 52;
const BITMAP_OCTETS: usize = 7;

/// Port bitmap with the given bridge ports set.
pub fn bitmap(ports: impl IntoIterator<Item = u32>) -> Value {
    let mut octets = vec![0u8; BITMAP_OCTETS];
    for port in ports {
        let bit = (port - 1) as usize;
        octets[bit / 8] |= 0x80 >> (bit % 8);
    }
    Value::OctetString(Bytes::from(octets))
}

pub fn switch_mib() -> BTreeMap<Oid, Value> {
    let mut mib = BTreeMap::new();

    // Neighbours on either side of the walked columns.
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("fake switch"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("sw1"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1), Value::from("GigabitEthernet0/1"));
    mib.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 1), Value::Integer(1500));

    for i in 1..=ETHERNET_PORTS {
        mib.insert(oids::if_name().child(i), Value::from(format!("Gi0/{i}").as_str()));
        mib.insert(oids::if_type().child(i), Value::Integer(6));
    }
    for (i, name, if_type) in [(53, "Po1", 161), (54, "Po2", 161), (55, "Vlan1", 53)] {
        mib.insert(oids::if_name().child(i), Value::from(name));
        mib.insert(oids::if_type().child(i), Value::Integer(if_type));
    }
    for port in 1..=54 {
        mib.insert(
            oids::dot1d_base_port_if_index().child(port),
            Value::Integer(i64::from(port)),
        );
    }

    let vlans: [(u32, &str, Vec<u32>, Vec<u32>); 3] = [
        (1, "default", (1..=10).collect(), (1..=10).chain([53, 54]).collect()),
        (20, "voice", vec![], vec![11, 12, 53]),
        (30, "servers", vec![54], vec![13, 54]),
    ];
    for (id, name, untagged, egress) in vlans {
        mib.insert(oids::dot1q_vlan_static_name().child(id), Value::from(name));
        mib.insert(oids::dot1q_vlan_static_egress_ports().child(id), bitmap(egress));
        mib.insert(oids::dot1q_vlan_static_untagged_ports().child(id), bitmap(untagged));
    }
    // dot1qVlanStaticRowStatus follows the untagged column.
    mib.insert(
        oid!(1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 5, 1),
        Value::Integer(1),
    );

    mib
}

pub fn gi(n: u32) -> String {
    format!("Gi0/{n}")
}
