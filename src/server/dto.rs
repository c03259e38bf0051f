use serde::{Deserialize, Serialize};

use crate::topology::TrunkInterface;

fn default_community() -> String {
    "public".to_string()
}

#[derive(Deserialize, Debug)]
pub struct TrunkPortsQuery {
    pub host: Option<String>,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default)]
    pub format: TrunkFormat,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrunkFormat {
    #[default]
    Json,
    /// Zabbix low-level discovery document.
    Lld,
}

#[derive(Deserialize, Debug)]
pub struct StaticVlansQuery {
    pub host: Option<String>,
    #[serde(default = "default_community")]
    pub community: String,
    /// Zabbix host name; when set the view is forwarded instead of returned.
    pub zbxhost: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct LldEntry {
    #[serde(rename = "{#IFINDEX}")]
    pub if_index: u32,
    #[serde(rename = "{#IFNAME}")]
    pub if_name: String,
}

#[derive(Serialize, Debug)]
pub struct LldResponse {
    pub data: Vec<LldEntry>,
}

impl From<Vec<TrunkInterface>> for LldResponse {
    fn from(trunks: Vec<TrunkInterface>) -> Self {
        Self {
            data: trunks
                .into_iter()
                .map(|t| LldEntry {
                    if_index: t.interface_index,
                    if_name: t.interface_name,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ForwardResponse {
    pub zbxsender: String,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache_entries: usize,
}
