//! Parser for the text dump printed by `meshtastic --info`.
//!
//! The dump is diagnostic text rather than a committed schema. A typical run
//! looks like:
//!
//! ```text
//! Connected to radio
//! Owner: Gateway (GW01)
//! My info: { "myNodeNum": 3125541328, "rebootCount": 12, "minAppVersion": 30200 }
//! Metadata: { "firmwareVersion": "2.5.6.d55c08d", "hwModel": "HELTEC_V3", ... }
//!
//! Nodes in mesh: {
//!   "!ba4bf9d0": { "num": 3125541328, "user": { ... }, ... },
//!   ...
//! }
//!
//! Preferences: { ... }
//! Primary channel URL: https://meshtastic.org/e/#CgMSAQESCAgBOAFAA0gB
//! ```
//!
//! Lines are matched by prefix, the node list may span any number of physical
//! lines, and every unrecognised line outside the node list is skipped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::errors::MeshError;
use super::node_id::{decode_id, encode_id};

/// Contents of the `My info:` line. Unknown keys are ignored and a field of
/// the wrong type reads as absent without disturbing the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyInfo {
    #[serde(
        default,
        rename = "myNodeNum",
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub node_number: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub min_app_version: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub reboot_count: Option<u32>,
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| u32::try_from(n).ok()))
}

/// Device capability flags and firmware details from the `Metadata:` line.
///
/// Kept as an open record since the firmware adds keys between releases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceMetadata(pub Map<String, Value>);

impl DeviceMetadata {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn firmware_version(&self) -> Option<&str> {
        self.get("firmwareVersion").and_then(Value::as_str)
    }

    pub fn hw_model(&self) -> Option<&str> {
        self.get("hwModel").and_then(Value::as_str)
    }

    pub fn role(&self) -> Option<&str> {
        self.get("role").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeUser {
    pub id: String,
    pub long_name: String,
    pub short_name: String,
    #[serde(rename = "macaddr")]
    pub mac_address: String,
    #[serde(rename = "hwModel")]
    pub hardware_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// Last reported position; every field is zero when the radio has no fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePosition {
    #[serde(rename = "latitudeI")]
    pub latitude_int: i64,
    #[serde(rename = "longitudeI")]
    pub longitude_int: i64,
    pub altitude: i64,
    pub time: u64,
    pub location_source: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceMetrics {
    pub battery_level: u32,
    pub voltage: f64,
    pub channel_utilization: f64,
    pub air_util_tx: f64,
    pub uptime_seconds: u64,
}

/// One entry of the `Nodes in mesh:` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
    pub num: u32,
    #[serde(default)]
    pub user: NodeUser,
    #[serde(default)]
    pub position: NodePosition,
    /// Epoch seconds.
    #[serde(default)]
    pub last_heard: u64,
    #[serde(default)]
    pub device_metrics: DeviceMetrics,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hops_away: Option<u32>,
}

impl NodeEntry {
    /// Long name when the node has announced one, otherwise its `!hex` id.
    pub fn label(&self) -> String {
        let long_name = self.user.long_name.trim();
        if long_name.is_empty() {
            encode_id(self.num)
        } else {
            long_name.to_string()
        }
    }

    pub fn short_label(&self) -> String {
        let short_name = self.user.short_name.trim();
        if short_name.is_empty() {
            encode_id(self.num)
        } else {
            short_name.to_string()
        }
    }
}

/// Everything recovered from one `--info` dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologySnapshot {
    pub owner: String,
    pub my_info: MyInfo,
    pub metadata: DeviceMetadata,
    #[serde(rename = "primaryChannelURL")]
    pub primary_channel_url: String,
    pub nodes: BTreeMap<String, NodeEntry>,
}

impl TopologySnapshot {
    /// The local node's id, when the radio reported its node number.
    pub fn own_id(&self) -> Option<String> {
        self.my_info.node_number.map(encode_id)
    }

    pub fn node_ids(&self) -> BTreeSet<String> {
        self.nodes.keys().cloned().collect()
    }
}

/// Scanner state between lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Scanning,
    InNodesBlock,
}

/// What a single line means, given the current scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction<'a> {
    /// Blank line; closes an open node list.
    Blank,
    Owner(&'a str),
    MyInfo(&'a str),
    Metadata(&'a str),
    ChannelUrl(&'a str),
    /// Text to append to the node list buffer.
    Nodes(&'a str),
    Ignore,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Owner,
    MyInfo,
    Metadata,
    ChannelUrl,
    NodesHeader,
}

const NODES_HEADER: &str = "Nodes in mesh:";

/// Prefix rules in priority order. The node list header comes last so the
/// "still inside the node list" catch-all never shadows a labelled line.
const PREFIX_RULES: [(&str, Field); 5] = [
    ("Owner:", Field::Owner),
    ("My info:", Field::MyInfo),
    ("Metadata:", Field::Metadata),
    ("Primary channel URL:", Field::ChannelUrl),
    (NODES_HEADER, Field::NodesHeader),
];

/// Text after a label, minus the single space the CLI prints after the colon.
fn remainder<'a>(line: &'a str, prefix: &str) -> &'a str {
    let rest = &line[prefix.len()..];
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Classify one physical line (without its line terminator).
pub fn classify_line(line: &str, state: ScanState) -> LineAction<'_> {
    if line.trim().is_empty() {
        return LineAction::Blank;
    }
    for (prefix, field) in PREFIX_RULES {
        if !line.starts_with(prefix) {
            continue;
        }
        let rest = remainder(line, prefix);
        return match field {
            Field::Owner => LineAction::Owner(rest),
            Field::MyInfo => LineAction::MyInfo(rest),
            Field::Metadata => LineAction::Metadata(rest),
            Field::ChannelUrl => LineAction::ChannelUrl(rest),
            Field::NodesHeader => LineAction::Nodes(rest),
        };
    }
    match state {
        ScanState::InNodesBlock => LineAction::Nodes(line),
        ScanState::Scanning => LineAction::Ignore,
    }
}

/// Decode an embedded JSON fragment, falling back to the default on any error.
fn decode_or_default<T: DeserializeOwned + Default>(fragment: &str) -> T {
    serde_json::from_str(fragment).unwrap_or_default()
}

/// Re-encode a node id from the CLI in canonical form, so `!0000002A` and
/// `!2a` name the same node as [`TopologySnapshot::own_id`] does.
fn canonical_id(id: &str) -> Result<String, MeshError> {
    decode_id(id)
        .map(encode_id)
        .map_err(|_| MeshError::MalformedNodeInfo(format!("invalid node id {id:?}")))
}

/// Decode the accumulated node list into a map keyed by canonical node id.
///
/// Accepts the array form (`[{"num": 42, ...}]`), keyed by each entry's own
/// `id` when present and by its encoded `num` otherwise, and the object form
/// printed by the Python CLI (`{"!0000002a": {...}}`), keyed by the object keys.
fn decode_nodes(buffer: &str) -> Result<BTreeMap<String, NodeEntry>, MeshError> {
    let value: Value = serde_json::from_str(buffer)
        .map_err(|e| MeshError::MalformedNodeInfo(format!("node list is not valid JSON: {e}")))?;
    let entry_error = |e: serde_json::Error| {
        MeshError::MalformedNodeInfo(format!("invalid node entry: {e}"))
    };

    let mut nodes = BTreeMap::new();
    match value {
        Value::Array(items) => {
            for item in items {
                let explicit_id = item.get("id").and_then(Value::as_str).map(str::to_string);
                let entry: NodeEntry = serde_json::from_value(item).map_err(entry_error)?;
                let id = match explicit_id {
                    Some(id) => canonical_id(&id)?,
                    None => encode_id(entry.num),
                };
                nodes.insert(id, entry);
            }
        }
        Value::Object(map) => {
            for (id, item) in map {
                let entry: NodeEntry = serde_json::from_value(item).map_err(entry_error)?;
                nodes.insert(canonical_id(&id)?, entry);
            }
        }
        other => {
            return Err(MeshError::MalformedNodeInfo(format!(
                "node list must be a JSON array or object, found {}",
                json_kind(&other)
            )))
        }
    }
    Ok(nodes)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse the full `--info` dump into a [`TopologySnapshot`].
///
/// Fails with [`MeshError::MalformedNodeInfo`] when the node list is absent
/// or is not valid JSON. Broken `My info:` or `Metadata:` lines decode to
/// empty records instead.
pub fn parse_node_info(text: &str) -> Result<TopologySnapshot, MeshError> {
    let mut snapshot = TopologySnapshot::default();
    let mut state = ScanState::Scanning;
    let mut buffer = String::new();
    let mut nodes: Option<BTreeMap<String, NodeEntry>> = None;

    // str::lines strips both "\n" and "\r\n"
    for line in text.lines() {
        match classify_line(line, state) {
            LineAction::Blank => {
                if state == ScanState::InNodesBlock {
                    nodes = Some(decode_nodes(&buffer)?);
                }
                state = ScanState::Scanning;
            }
            LineAction::Owner(rest) => snapshot.owner = rest.to_string(),
            LineAction::MyInfo(rest) => snapshot.my_info = decode_or_default(rest),
            LineAction::Metadata(rest) => snapshot.metadata = decode_or_default(rest),
            LineAction::ChannelUrl(rest) => snapshot.primary_channel_url = rest.to_string(),
            LineAction::Nodes(rest) => {
                if state == ScanState::Scanning {
                    buffer.clear();
                    state = ScanState::InNodesBlock;
                }
                buffer.push_str(rest);
            }
            LineAction::Ignore => {}
        }
    }
    if state == ScanState::InNodesBlock {
        nodes = Some(decode_nodes(&buffer)?);
    }

    snapshot.nodes = nodes.ok_or_else(|| {
        MeshError::MalformedNodeInfo(format!("missing '{NODES_HEADER}' section"))
    })?;
    Ok(snapshot)
}
