//! Tick records as emitted by the simulation engine.
//!
//! One record per tick, JSON shape:
//! {
//!   "tick_id": 42,
//!   "frame_id": 3,
//!   "state_hash": "a91fc02",
//!   "resources": {
//!     "json":    { "viz.graph.v1": "{\"series\":[...]}" },
//!     "fixed64": { "view.zoom": "1.25" },
//!     "value":   { "sim.phase": "warmup" },
//!     "handle":  { "world": 7 }
//!   },
//!   "channels": [ { "key": "u", "dtype": "f64", "role": "state", "unit": "m" } ],
//!   "row":      [ 0.5 ],
//!   "patch":    [ { "op": "set_resource_fixed64", ... } ]   // null => full snapshot
//! }
//!
//! Records are immutable once received. Every field beyond `tick_id` defaults
//! when absent so older engines keep working.

pub mod op;

pub use op::{OpError, PatchOp};

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct TickRecord {
    pub tick_id: u64,

    #[serde(default)]
    pub frame_id: u64,

    #[serde(default)]
    pub state_hash: String,

    #[serde(default)]
    pub resources: ResourceBundle,

    #[serde(default)]
    pub channels: Vec<Channel>,

    #[serde(default)]
    pub row: Vec<serde_json::Value>,

    /// Sparse op list; absence means this record is a full snapshot.
    #[serde(default)]
    pub patch: Option<Vec<serde_json::Value>>,
}

impl TickRecord {
    /// Frame token gating lens sampling: at most one sample per distinct token.
    pub fn frame_token(&self) -> String {
        format!("{}:{}:{}", self.tick_id, self.frame_id, self.state_hash)
    }
}

/// Per-tick resource maps, keyed by resource tag.
///
/// `json` holds raw payload strings (parsed only after schema routing);
/// `fixed64` holds fixed-point decimal strings; `value` holds opaque scalars;
/// `handle` holds opaque integer ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceBundle {
    #[serde(default)]
    pub json: BTreeMap<String, String>,

    #[serde(default)]
    pub fixed64: BTreeMap<String, String>,

    #[serde(default)]
    pub value: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub handle: BTreeMap<String, u64>,
}

/// One observation channel descriptor; paired positionally with `row`.
#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub key: String,

    #[serde(default)]
    pub dtype: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_record_defaults() {
        let tick: TickRecord = serde_json::from_value(json!({ "tick_id": 7 })).unwrap();
        assert_eq!(tick.frame_token(), "7:0:");
        assert!(tick.patch.is_none());
        assert!(tick.resources.json.is_empty());
        assert!(tick.channels.is_empty());
    }

    #[test]
    fn frame_token_includes_all_three_parts() {
        let tick: TickRecord = serde_json::from_value(json!({
            "tick_id": 12, "frame_id": 4, "state_hash": "beef"
        }))
        .unwrap();
        assert_eq!(tick.frame_token(), "12:4:beef");
    }
}
