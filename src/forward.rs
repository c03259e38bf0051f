//! Forwarding VLAN membership to Zabbix trapper items.
//!
//! Values are pushed with the `zabbix_sender` utility reading an input file
//! from stdin, one `host key value` line per item.

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::instrument;

use crate::error::{Error, Result};
use crate::topology::VlanView;

pub const DEFAULT_SENDER: &str = "/usr/bin/zabbix_sender";
pub const DEFAULT_SERVER: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 10051;

/// Placeholder sent for an empty membership list.
pub const EMPTY: &str = "None";

/// Trapper items for a VLAN view: four per VLAN, in VLAN id order.
///
/// Keys are `VLANStaticUntaggedPorts[id]`, `VLANStaticUntaggedTrunks[id]`,
/// `VLANStaticTaggedPorts[id]` and `VLANStaticTaggedTrunks[id]`; values are
/// the comma separated interface names.
pub fn vlan_items(view: &VlanView) -> Vec<(String, String)> {
    let join = |names: &[String]| {
        if names.is_empty() {
            EMPTY.to_string()
        } else {
            names.join(", ")
        }
    };

    view.iter()
        .flat_map(|vlan| {
            let id = vlan.vlan_id;
            [
                (format!("VLANStaticUntaggedPorts[{id}]"), join(&vlan.access_ports)),
                (format!("VLANStaticUntaggedTrunks[{id}]"), join(&vlan.access_trunks)),
                (format!("VLANStaticTaggedPorts[{id}]"), join(&vlan.tagged_ports)),
                (format!("VLANStaticTaggedTrunks[{id}]"), join(&vlan.tagged_trunks)),
            ]
        })
        .collect()
}

/// Quote a field for the sender input file.
fn quote(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 2);
    out.push('"');
    for c in field.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Render the sender input file for `host`.
pub fn render_input(host: &str, items: &[(String, String)]) -> String {
    items
        .iter()
        .map(|(key, value)| format!("{} {} {}\n", quote(host), key, quote(value)))
        .collect()
}

/// Runs `zabbix_sender` against one Zabbix server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZabbixSender {
    pub binary: String,
    pub server: String,
    pub port: u16,
}

impl Default for ZabbixSender {
    fn default() -> Self {
        Self {
            binary: DEFAULT_SENDER.to_string(),
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ZabbixSender {
    pub fn new(binary: impl Into<String>, server: impl Into<String>, port: u16) -> Self {
        Self {
            binary: binary.into(),
            server: server.into(),
            port,
        }
    }

    fn error(&self, source: std::io::Error) -> Error {
        Error::Forward {
            program: self.binary.as_str().into(),
            source,
        }
    }

    /// Send `items` for the Zabbix host `host` and return the tool's stdout.
    ///
    /// A non-zero exit status is logged but not an error: the tool reports
    /// partially processed batches that way, and its output says which.
    #[instrument(
        level = "debug",
        skip(self, items),
        fields(zabbix.server = %self.server, zabbix.items = items.len())
    )]
    pub async fn send(&self, host: &str, items: &[(String, String)]) -> Result<String> {
        let input = render_input(host, items);
        let port = self.port.to_string();

        let mut child = Command::new(&self.binary)
            .args(["-z", self.server.as_str(), "-p", port.as_str(), "-r", "-i", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.error(e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.error(std::io::Error::other("stdin not captured")))?;
        let write = async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await
        };
        let (_, output) =
            tokio::try_join!(write, child.wait_with_output()).map_err(|e| self.error(e))?;

        if !output.status.success() {
            tracing::warn!(
                zabbix.status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "zabbix_sender exited unsuccessfully"
            );
        }
        String::from_utf8(output.stdout).map_err(|e| {
            self.error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::topology::VlanRecord;

    fn view() -> VlanView {
        [
            VlanRecord {
                vlan_id: 20,
                name: "voice".into(),
                tagged_trunks: vec!["Po1".into(), "Po2".into()],
                ..VlanRecord::default()
            },
            VlanRecord {
                vlan_id: 10,
                name: "users".into(),
                access_ports: vec!["Gi0/1".into()],
                ..VlanRecord::default()
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_vlan_items_keys_and_placeholders() {
        let items = vlan_items(&view());
        let expected = [
            ("VLANStaticUntaggedPorts[10]", "Gi0/1"),
            ("VLANStaticUntaggedTrunks[10]", "None"),
            ("VLANStaticTaggedPorts[10]", "None"),
            ("VLANStaticTaggedTrunks[10]", "None"),
            ("VLANStaticUntaggedPorts[20]", "None"),
            ("VLANStaticUntaggedTrunks[20]", "None"),
            ("VLANStaticTaggedPorts[20]", "None"),
            ("VLANStaticTaggedTrunks[20]", "Po1, Po2"),
        ];
        assert_eq!(items.len(), expected.len());
        for ((key, value), (want_key, want_value)) in items.iter().zip(expected) {
            assert_eq!(key, want_key);
            assert_eq!(value, want_value);
        }
    }

    #[test]
    fn test_render_input_quotes_values() {
        let items = vec![("VLANStaticTaggedTrunks[1]".to_string(), r#"Po1, "x"\"#.to_string())];
        assert_eq!(
            render_input("core sw", &items),
            "\"core sw\" VLANStaticTaggedTrunks[1] \"Po1, \\\"x\\\"\\\\\"\n"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_forward_error() {
        let sender = ZabbixSender::new("/nonexistent/zabbix_sender", "127.0.0.1", 10051);
        let err = sender.send("sw1", &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forward);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_send_pipes_items_to_stdin() {
        use std::os::unix::fs::PermissionsExt;

        // Stand-in sender that echoes its arguments and input.
        let dir = std::env::temp_dir().join(format!("dot1q-forward-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let script = dir.join("fake_sender");
        std::fs::write(&script, "#!/bin/sh\necho \"$@\"\ncat\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let sender = ZabbixSender::new(script.to_string_lossy(), "192.0.2.50", 10052);
        let out = sender
            .send("sw1", &vlan_items(&view())[..1])
            .await
            .unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(
            out,
            "-z 192.0.2.50 -p 10052 -r -i -\n\"sw1\" VLANStaticUntaggedPorts[10] \"Gi0/1\"\n"
        );
    }
}
