//! Pure decoding of walked tables into topology.
//!
//! Nothing here performs I/O. Inconsistent input (a bitmap that is not
//! whole octets, an ifIndex the name or type table does not know) is a
//! [`Decode`](crate::ErrorKind::Decode) error for the whole view; the one
//! tolerated inconsistency is a bitmap longer than the bridge port table,
//! whose extra bits are ignored.

use std::collections::BTreeMap;

use super::model::{
    BridgeIndexMap, ETHERNET_CSMACD, InterfaceNameMap, InterfaceTypeMap, PortClassification,
    TrunkInterface, VlanRecord, VlanView,
};
use super::oids;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::table::OidTable;
use crate::value::Value;

/// Decode a table whose values are integer indices (bridge port to ifIndex).
///
/// Integer values are taken as is; octet strings must hold decimal text.
pub fn decode_index_map(table: &OidTable) -> Result<BTreeMap<u32, u32>> {
    table
        .iter()
        .map(|(index, value)| {
            let parsed = match value {
                Value::OctetString(_) => value.to_text().trim().parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed
                .and_then(|v| u32::try_from(v).ok())
                .map(|v| (index, v))
                .ok_or_else(|| {
                    Error::decode(DecodeErrorKind::NotAnInteger {
                        table: oids::column_name(table.root()),
                        index,
                        value: value.to_text(),
                    })
                })
        })
        .collect()
}

/// Decode a table into the text form of each value (names, type codes).
pub fn decode_text_map(table: &OidTable) -> BTreeMap<u32, String> {
    table
        .iter()
        .map(|(index, value)| (index, value.to_text()))
        .collect()
}

/// Expand a hex-encoded port bitmap into one flag per port.
///
/// Each pair of hex digits is one octet, read most significant bit first,
/// so flag `n` is bridge port `n + 1`. A leading `0x` and any whitespace or
/// `:` separators are ignored.
pub fn decode_bitmap(hex: &str) -> Result<Vec<bool>> {
    let body = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .unwrap_or(hex);
    let offset = hex.len() - body.len();

    let mut nibbles = Vec::with_capacity(body.len());
    for (i, c) in body.char_indices() {
        if c.is_ascii_whitespace() || c == ':' {
            continue;
        }
        let digit = c.to_digit(16).ok_or_else(|| {
            Error::decode(DecodeErrorKind::InvalidHexDigit {
                position: offset + i,
                found: c,
            })
        })?;
        nibbles.push(digit as u8);
    }
    if nibbles.len() % 2 != 0 {
        return Err(Error::decode(DecodeErrorKind::OddBitmapLength {
            length: nibbles.len(),
        }));
    }

    let mut bits = Vec::with_capacity(nibbles.len() * 4);
    for pair in nibbles.chunks_exact(2) {
        let octet = (pair[0] << 4) | pair[1];
        bits.extend((0..8).rev().map(|bit| octet & (1 << bit) != 0));
    }
    Ok(bits)
}

/// Inverse of [`decode_bitmap`]: lowercase hex, padded to whole octets.
///
/// Only lowercase input without a prefix or separators comes back
/// unchanged; `"0xFF:00"` decodes to the same bits but encodes as `"ff00"`.
pub fn encode_bitmap(bits: &[bool]) -> String {
    bits.chunks(8)
        .map(|chunk| {
            let octet = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &set)| acc | (u8::from(set) << (7 - i)));
            format!("{octet:02x}")
        })
        .collect()
}

/// Split bridge ports into access and tagged members of one VLAN.
///
/// A port is access when its untagged bit is set, whatever its egress bit
/// says; it is tagged only when egress is set and untagged is not. Ports the
/// bridge table does not know are dropped. Bitmaps of different lengths are
/// compared as if the shorter one were padded with zeros.
pub fn classify_ports(
    access_bits: &[bool],
    egress_bits: &[bool],
    bridge: &BridgeIndexMap,
) -> PortClassification {
    let mut out = PortClassification::default();
    let len = access_bits.len().max(egress_bits.len());

    for n in 0..len {
        let Ok(port) = u32::try_from(n + 1) else {
            break;
        };
        if !bridge.contains_key(&port) {
            continue;
        }
        let access = access_bits.get(n).copied().unwrap_or(false);
        let egress = egress_bits.get(n).copied().unwrap_or(false);
        if access {
            out.access.push(port);
        } else if egress {
            out.tagged.push(port);
        }
    }
    out
}

/// Map bridge ports to interface names, split into ethernet ports and
/// everything else (trunks).
///
/// Ports missing from the bridge table are skipped; an ifIndex missing from
/// the type or name table is an error.
pub fn resolve_names(
    ports: &[u32],
    bridge: &BridgeIndexMap,
    types: &InterfaceTypeMap,
    names: &InterfaceNameMap,
) -> Result<(Vec<String>, Vec<String>)> {
    let mut ethernet = Vec::new();
    let mut other = Vec::new();

    for port in ports {
        let Some(&if_index) = bridge.get(port) else {
            continue;
        };
        let (if_type, name) = lookup_interface(if_index, types, names)?;
        if if_type == ETHERNET_CSMACD {
            ethernet.push(name.clone());
        } else {
            other.push(name.clone());
        }
    }
    Ok((ethernet, other))
}

/// Every bridged interface whose type is not ethernet, in bridge port order.
pub fn compute_trunk_interfaces(
    bridge: &BridgeIndexMap,
    types: &InterfaceTypeMap,
    names: &InterfaceNameMap,
) -> Result<Vec<TrunkInterface>> {
    let mut trunks = Vec::new();
    for &if_index in bridge.values() {
        let (if_type, name) = lookup_interface(if_index, types, names)?;
        if if_type != ETHERNET_CSMACD {
            trunks.push(TrunkInterface {
                interface_index: if_index,
                interface_name: name.clone(),
            });
        }
    }
    Ok(trunks)
}

fn lookup_interface<'a>(
    if_index: u32,
    types: &'a InterfaceTypeMap,
    names: &'a InterfaceNameMap,
) -> Result<(&'a str, &'a String)> {
    let if_type = types.get(&if_index).ok_or_else(|| {
        Error::decode(DecodeErrorKind::MissingIndex {
            table: "ifType",
            index: if_index,
        })
    })?;
    let name = names.get(&if_index).ok_or_else(|| {
        Error::decode(DecodeErrorKind::MissingIndex {
            table: "ifName",
            index: if_index,
        })
    })?;
    Ok((if_type.as_str(), name))
}

fn bitmap(table: &OidTable, vlan_id: u32) -> Result<Vec<bool>> {
    let column = oids::column_name(table.root());
    let value = table.get(vlan_id).ok_or_else(|| {
        Error::decode(DecodeErrorKind::MissingIndex {
            table: column,
            index: vlan_id,
        })
    })?;
    let hex = value.to_hex().ok_or_else(|| {
        Error::decode(DecodeErrorKind::NotABitmap {
            table: column,
            index: vlan_id,
        })
    })?;
    decode_bitmap(&hex)
}

/// Build the VLAN view from the three Q-BRIDGE columns and the interface
/// tables. Every VLAN in `vlan_names` must have both bitmaps.
pub fn build_vlan_view(
    vlan_names: &OidTable,
    egress: &OidTable,
    untagged: &OidTable,
    bridge: &BridgeIndexMap,
    types: &InterfaceTypeMap,
    names: &InterfaceNameMap,
) -> Result<VlanView> {
    vlan_names
        .iter()
        .map(|(vlan_id, name)| {
            let egress_bits = bitmap(egress, vlan_id)?;
            let access_bits = bitmap(untagged, vlan_id)?;
            let ports = classify_ports(&access_bits, &egress_bits, bridge);

            let (access_ports, access_trunks) = resolve_names(&ports.access, bridge, types, names)?;
            let (tagged_ports, tagged_trunks) = resolve_names(&ports.tagged, bridge, types, names)?;
            Ok(VlanRecord {
                vlan_id,
                name: name.to_text(),
                access_ports,
                access_trunks,
                tagged_ports,
                tagged_trunks,
            })
        })
        .collect()
}
