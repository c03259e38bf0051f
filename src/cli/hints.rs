//! Well-known OID name hints.
//!
//! Friendly names for the columns this crate walks, plus a few system
//! objects. This is NOT MIB support.

use crate::Oid;
use crate::topology::oids;

static SYSTEM_OIDS: &[(&[u32], &str)] = &[
    (&[1, 3, 6, 1, 2, 1, 1], "system"),
    (&[1, 3, 6, 1, 2, 1, 1, 1, 0], "sysDescr.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 5, 0], "sysName.0"),
    (&[1, 3, 6, 1, 2, 1, 2, 2], "ifTable"),
    (&[1, 3, 6, 1, 2, 1, 17, 7, 1, 4, 3], "dot1qVlanStaticTable"),
];

/// Look up a friendly name for an OID.
///
/// Rows of known columns render as `column.index`, e.g. `ifName.3`.
pub fn lookup(oid: &Oid) -> Option<String> {
    let arcs = oid.arcs();
    if let Some((_, name)) = SYSTEM_OIDS.iter().find(|(pattern, _)| *pattern == arcs) {
        return Some((*name).to_string());
    }

    oids::known().find_map(|(name, root)| {
        if *oid == root {
            return Some(name.to_string());
        }
        let suffix = oid.suffix(&root)?;
        let suffix: Vec<String> = suffix.iter().map(u32::to_string).collect();
        Some(format!("{}.{}", name, suffix.join(".")))
    })
}

/// Parse an OID from dotted notation or a well-known name.
///
/// Accepts `1.3.6.1.2.1.31.1.1.1.1`, `ifName`, `ifName.3` and the system
/// names above. Name matching ignores case.
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.trim_start_matches('.')
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
    {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    if let Some((arcs, _)) = SYSTEM_OIDS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(s))
    {
        return Ok(Oid::from_slice(arcs));
    }

    let (name, instance) = match s.split_once('.') {
        Some((name, instance)) => (name, Some(instance)),
        None => (s, None),
    };
    let root = oids::by_name(name).ok_or_else(|| {
        format!(
            "unknown OID name '{}'; use dotted notation (e.g., 1.3.6.1.2.1.31.1.1.1.1)",
            s
        )
    })?;

    match instance {
        None => Ok(root),
        Some(instance) => {
            let mut arcs = root.arcs().to_vec();
            for arc in instance.split('.') {
                arcs.push(
                    arc.parse()
                        .map_err(|_| format!("invalid instance '{}' in '{}'", instance, s))?,
                );
            }
            Ok(Oid::from_slice(&arcs))
        }
    }
}
