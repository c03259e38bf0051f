//! Output formatting for CLI tools.
//!
//! Supports human-readable and JSON output. JSON for the topology views is
//! the same document the HTTP API serves.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::topology::{TrunkInterface, VlanView};
use crate::value::is_printable;
use crate::{Oid, Value, VarBind};

/// Result of a walk, ready for output.
#[derive(Debug, Serialize)]
pub struct WalkResult {
    pub target: String,
    pub results: Vec<VarBindResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
}

/// A single varbind result.
#[derive(Debug, Serialize)]
pub struct VarBindResult {
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_timing: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_timing: false,
        }
    }

    /// Write the entries of a walk.
    pub fn write_walk<W: Write>(
        &self,
        w: &mut W,
        target: SocketAddr,
        varbinds: &[VarBind],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let result = WalkResult {
            target: target.to_string(),
            results: varbinds.iter().map(format_varbind).collect(),
            timing_ms: elapsed
                .filter(|_| self.show_timing)
                .map(|d| d.as_secs_f64() * 1000.0),
        };

        match self.format {
            OutputFormat::Json => write_json(w, &result),
            OutputFormat::Human => {
                for vb in &result.results {
                    match &vb.hint {
                        Some(hint) => write!(w, "{} ({})", vb.oid, hint)?,
                        None => write!(w, "{}", vb.oid)?,
                    }
                    write!(w, " = {}: ", vb.value_type)?;
                    if let Some(formatted) = &vb.formatted {
                        writeln!(w, "{}", formatted)?;
                    } else {
                        match &vb.value {
                            serde_json::Value::String(s) => writeln!(w, "\"{}\"", s)?,
                            serde_json::Value::Null => writeln!(w)?,
                            other => writeln!(w, "{}", other)?,
                        }
                    }
                }
                self.write_timing(w, elapsed)
            }
        }
    }

    /// Write the trunk view.
    pub fn write_trunks<W: Write>(
        &self,
        w: &mut W,
        trunks: &[TrunkInterface],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, trunks),
            OutputFormat::Human => {
                if trunks.is_empty() {
                    writeln!(w, "no trunk interfaces")?;
                } else {
                    writeln!(w, "{:>10}  NAME", "IFINDEX")?;
                    for trunk in trunks {
                        writeln!(w, "{:>10}  {}", trunk.interface_index, trunk.interface_name)?;
                    }
                }
                self.write_timing(w, elapsed)
            }
        }
    }

    /// Write the VLAN view.
    pub fn write_vlans<W: Write>(
        &self,
        w: &mut W,
        view: &VlanView,
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, view),
            OutputFormat::Human => {
                for (i, vlan) in view.iter().enumerate() {
                    if i > 0 {
                        writeln!(w)?;
                    }
                    writeln!(w, "VLAN {} ({})", vlan.vlan_id, vlan.name)?;
                    writeln!(w, "  access ports:  {}", names(&vlan.access_ports))?;
                    writeln!(w, "  access trunks: {}", names(&vlan.access_trunks))?;
                    writeln!(w, "  tagged ports:  {}", names(&vlan.tagged_ports))?;
                    writeln!(w, "  tagged trunks: {}", names(&vlan.tagged_trunks))?;
                }
                self.write_timing(w, elapsed)
            }
        }
    }

    /// Write what zabbix_sender printed.
    pub fn write_forwarded<W: Write>(&self, w: &mut W, output: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => write_json(w, &serde_json::json!({ "zbxsender": output })),
            OutputFormat::Human => writeln!(w, "{}", output.trim_end()),
        }
    }

    fn write_timing<W: Write>(&self, w: &mut W, elapsed: Option<Duration>) -> io::Result<()> {
        if self.show_timing
            && let Some(elapsed) = elapsed
        {
            writeln!(w, "\nTiming: {:.1}ms", elapsed.as_secs_f64() * 1000.0)?;
        }
        Ok(())
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    writeln!(w, "{}", json)
}

fn names(list: &[String]) -> String {
    if list.is_empty() {
        "-".to_string()
    } else {
        list.join(", ")
    }
}

fn format_varbind(vb: &VarBind) -> VarBindResult {
    let (value_type, value, formatted) = format_value(&vb.value);
    VarBindResult {
        oid: vb.oid.to_string(),
        hint: hints::lookup(&vb.oid),
        value_type,
        value,
        formatted,
    }
}

/// Format a value, returning (type_name, json_value, formatted_string).
fn format_value(value: &Value) -> (String, serde_json::Value, Option<String>) {
    match value {
        Value::Integer(v) => ("INTEGER".into(), (*v).into(), None),

        Value::OctetString(bytes) if is_printable(bytes) => (
            "STRING".into(),
            serde_json::Value::String(value.to_text()),
            None,
        ),

        Value::OctetString(bytes) => (
            "Hex-STRING".into(),
            serde_json::Value::String(value.to_text()),
            Some(format_hex_string(bytes)),
        ),

        Value::Null => ("NULL".into(), serde_json::Value::Null, None),

        Value::ObjectIdentifier(oid) => {
            let formatted = hints::lookup(oid).map(|h| format!("{} ({})", oid, h));
            ("OID".into(), serde_json::Value::String(format_oid(oid)), formatted)
        }

        Value::IpAddress(bytes) => {
            let s = format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]);
            ("IpAddress".into(), serde_json::Value::String(s), None)
        }

        Value::Counter32(v) => ("Counter32".into(), (*v).into(), None),

        Value::Gauge32(v) => ("Gauge32".into(), (*v).into(), None),

        Value::TimeTicks(v) => (
            "TimeTicks".into(),
            (*v).into(),
            Some(format!("({}) {}", v, format_timeticks(*v))),
        ),

        Value::Opaque(bytes) => (
            "Opaque".into(),
            serde_json::Value::String(value.to_hex().unwrap_or_default()),
            Some(format_hex_string(bytes)),
        ),

        Value::Counter64(v) => ("Counter64".into(), (*v).into(), None),

        Value::NoSuchObject => (
            "NoSuchObject".into(),
            serde_json::Value::Null,
            Some("No Such Object available".into()),
        ),

        Value::NoSuchInstance => (
            "NoSuchInstance".into(),
            serde_json::Value::Null,
            Some("No Such Instance currently exists".into()),
        ),

        Value::EndOfMibView => (
            "EndOfMibView".into(),
            serde_json::Value::Null,
            Some("No more variables left in this MIB View".into()),
        ),

        Value::Unknown { tag, data } => (
            format!("Unknown(0x{:02X})", tag),
            serde_json::Value::String(value.to_hex().unwrap_or_default()),
            Some(format_hex_string(data)),
        ),
    }
}

fn format_oid(oid: &Oid) -> String {
    oid.to_string()
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format TimeTicks as human-readable duration.
fn format_timeticks(centiseconds: u32) -> String {
    let total_seconds = centiseconds / 100;
    let cs = centiseconds % 100;

    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}.{:02}",
            days, hours, minutes, seconds, cs
        )
    } else {
        format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error ({}): {}", err.kind(), err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::VlanRecord;
    use bytes::Bytes;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn view() -> VlanView {
        [VlanRecord {
            vlan_id: 10,
            name: "users".into(),
            access_ports: vec!["Gi0/1".into(), "Gi0/2".into()],
            tagged_trunks: vec!["Po1".into()],
            ..VlanRecord::default()
        }]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_format_timeticks() {
        // 1 day, 10 hours, 17 minutes, 36.78 seconds
        assert_eq!(format_timeticks(12345678), "1d 10:17:36.78");
        assert_eq!(format_timeticks(360000), "01:00:00.00");
        assert_eq!(format_timeticks(0), "00:00:00.00");
    }

    #[test]
    fn test_format_hex_string() {
        assert_eq!(format_hex_string(&[0x00, 0x1A, 0x2B]), "00 1A 2B");
    }

    #[test]
    fn test_human_walk_uses_hints() {
        let ctx = OutputContext::new(OutputFormat::Human);
        let varbinds = [
            VarBind::new(crate::topology::oids::if_name().child(3), Value::from("Gi0/3")),
            VarBind::new(
                crate::topology::oids::dot1q_vlan_static_egress_ports().child(10),
                Value::OctetString(Bytes::from_static(&[0xC0, 0x00])),
            ),
        ];
        let out = render(|w| ctx.write_walk(w, "192.0.2.1:161".parse().unwrap(), &varbinds, None));
        assert_eq!(
            out,
            "1.3.6.1.2.1.31.1.1.1.1.3 (ifName.3) = STRING: \"Gi0/3\"\n\
             1.3.6.1.2.1.17.7.1.4.3.1.2.10 (dot1qVlanStaticEgressPorts.10) = Hex-STRING: C0 00\n"
        );
    }

    #[test]
    fn test_json_vlans_matches_api_shape() {
        let ctx = OutputContext::new(OutputFormat::Json);
        let out = render(|w| ctx.write_vlans(w, &view(), None));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "10": {
                    "name": "users",
                    "access_ports": ["Gi0/1", "Gi0/2"],
                    "access_trunks": [],
                    "tagged_ports": [],
                    "tagged_trunks": ["Po1"]
                }
            })
        );
    }

    #[test]
    fn test_human_vlans() {
        let ctx = OutputContext::new(OutputFormat::Human);
        let out = render(|w| ctx.write_vlans(w, &view(), None));
        assert_eq!(
            out,
            "VLAN 10 (users)\n  access ports:  Gi0/1, Gi0/2\n  access trunks: -\n  \
             tagged ports:  -\n  tagged trunks: Po1\n"
        );
    }

    #[test]
    fn test_trunks_and_timing() {
        let mut ctx = OutputContext::new(OutputFormat::Human);
        ctx.show_timing = true;
        let trunks = [TrunkInterface {
            interface_index: 4,
            interface_name: "Po2".into(),
        }];
        let out = render(|w| ctx.write_trunks(w, &trunks, Some(Duration::from_millis(12))));
        assert_eq!(out, "   IFINDEX  NAME\n         4  Po2\n\nTiming: 12.0ms\n");

        let ctx = OutputContext::new(OutputFormat::Json);
        let out = render(|w| ctx.write_trunks(w, &trunks, None));
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([{ "interface_index": 4, "interface_name": "Po2" }])
        );
    }
}
