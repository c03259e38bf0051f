//! Well-known columns walked for topology discovery.

use crate::oid;
use crate::oid::Oid;

/// IF-MIB::ifName
pub fn if_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1)
}

/// IF-MIB::ifType
pub fn if_type() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3)
}

/// BRIDGE-MIB::dot1dBasePortIfIndex
pub fn dot1d_base_port_if_index() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 17, 1, 4, 1, 2)
}

/// Q-BRIDGE-MIB::dot1qVlanStaticName
pub fn dot1q_vlan_static_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 1)
}

/// Q-BRIDGE-MIB::dot1qVlanStaticEgressPorts
pub fn dot1q_vlan_static_egress_ports() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 2)
}

/// Q-BRIDGE-MIB::dot1qVlanStaticUntaggedPorts
pub fn dot1q_vlan_static_untagged_ports() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3, 1, 4)
}

const NAMED: &[(&str, fn() -> Oid)] = &[
    ("ifName", if_name),
    ("ifType", if_type),
    ("dot1dBasePortIfIndex", dot1d_base_port_if_index),
    ("dot1qVlanStaticName", dot1q_vlan_static_name),
    ("dot1qVlanStaticEgressPorts", dot1q_vlan_static_egress_ports),
    ("dot1qVlanStaticUntaggedPorts", dot1q_vlan_static_untagged_ports),
];

/// Every known column with its MIB name.
pub fn known() -> impl Iterator<Item = (&'static str, Oid)> {
    NAMED.iter().map(|(name, f)| (*name, f()))
}

/// Look up a column by its MIB name.
pub fn by_name(name: &str) -> Option<Oid> {
    NAMED
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, f)| f())
}

/// MIB name of a known column, used in error messages.
pub fn column_name(oid: &Oid) -> &'static str {
    NAMED
        .iter()
        .find(|(_, f)| f() == *oid)
        .map(|(n, _)| *n)
        .unwrap_or("table")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for (name, f) in NAMED {
            assert_eq!(by_name(name), Some(f()));
            assert_eq!(column_name(&f()), *name);
        }
        assert_eq!(by_name("ifname"), Some(if_name()));
        assert_eq!(by_name("sysDescr"), None);
        assert_eq!(column_name(&oid!(1, 3, 6, 1)), "table");
    }
}
