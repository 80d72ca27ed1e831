//! Observation lens: an ad-hoc (x, y) projection of numeric channels into a
//! bounded time series, independent of the engine's declared views.
//!
//! Each tick contributes at most one sample, gated by the frame token
//! `tick_id:frame_id:state_hash`. The timeline is FIFO-capped; after
//! eviction the sample indices are re-sequenced from 0.

pub mod preset;

pub use preset::{LensPreset, PresetConfig, PresetTable};

use crate::tick::{Channel, TickRecord};
use crate::view::{Axis, Graph, Point, SCHEMA_GRAPH, Series};
use serde::Serialize;
use std::collections::BTreeMap;

/// X key resolving to the tick id.
pub const X_TICK: &str = "__tick__";
/// X key resolving to the sample's ordinal index.
pub const X_INDEX: &str = "__index__";

pub const MIN_CAPACITY: usize = 240;
pub const MAX_CAPACITY: usize = 400;
pub const DEFAULT_CAPACITY: usize = MIN_CAPACITY;

/// One retained observation. Only finite numeric channels are kept; absent
/// or non-numeric channels are omitted, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LensSample {
    pub tick: u64,
    pub index: u64,
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug)]
pub struct Lens {
    enabled: bool,
    x_key: String,
    y_key: Option<String>,
    y2_key: Option<String>,

    capacity: usize,
    timeline: Vec<LensSample>,
    last_frame_token: Option<String>,

    /// Last-seen channel descriptors, for axis labels and units.
    channel_meta: BTreeMap<String, Channel>,

    presets: PresetTable,
}

/// What one `sync` call did.
#[derive(Debug)]
pub struct SyncOutcome {
    pub pushed: bool,
    pub graph: Option<Graph>,
}

impl Default for Lens {
    fn default() -> Lens {
        Lens::new(DEFAULT_CAPACITY)
    }
}

impl Lens {
    pub fn new(capacity: usize) -> Lens {
        let presets = PresetTable::default();
        let active = presets.active_preset();
        Lens {
            enabled: active.enabled,
            x_key: active.x_key.clone(),
            y_key: active.y_key.clone(),
            y2_key: active.y2_key.clone(),
            capacity: capacity.clamp(MIN_CAPACITY, MAX_CAPACITY),
            timeline: Vec::new(),
            last_frame_token: None,
            channel_meta: BTreeMap::new(),
            presets,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn x_key(&self) -> &str {
        &self.x_key
    }

    pub fn y_key(&self) -> Option<&str> {
        self.y_key.as_deref()
    }

    pub fn y2_key(&self) -> Option<&str> {
        self.y2_key.as_deref()
    }

    pub fn samples(&self) -> &[LensSample] {
        &self.timeline
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.timeline.clear();
        self.last_frame_token = None;
    }

    // Field edits demote an active named preset to "custom" (the selection,
    // not the saved preset, changes).

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.demote_to_custom();
    }

    pub fn set_x_key(&mut self, key: impl Into<String>) {
        self.x_key = key.into();
        self.demote_to_custom();
    }

    pub fn set_y_key(&mut self, key: Option<String>) {
        self.y_key = key;
        self.demote_to_custom();
    }

    pub fn set_y2_key(&mut self, key: Option<String>) {
        self.y2_key = key;
        self.demote_to_custom();
    }

    fn current_tuple(&self) -> LensPreset {
        LensPreset {
            enabled: self.enabled,
            x_key: self.x_key.clone(),
            y_key: self.y_key.clone(),
            y2_key: self.y2_key.clone(),
        }
    }

    fn demote_to_custom(&mut self) {
        self.presets.demote(self.current_tuple());
    }

    /// Apply a named preset transactionally: all four fields or none.
    /// Unknown ids are a no-op.
    pub fn select_preset(&mut self, id: &str) -> bool {
        let Some(preset) = self.presets.get(id).cloned() else {
            return false;
        };
        self.enabled = preset.enabled;
        self.x_key = preset.x_key;
        self.y_key = preset.y_key;
        self.y2_key = preset.y2_key;
        self.presets.set_active(id);
        true
    }

    /// Save the current tuple under `name`, overwriting any existing preset.
    pub fn save_preset(&mut self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        self.presets.save(name, self.current_tuple());
        true
    }

    /// Deleting `default` or `custom` is rejected. Deleting the active
    /// preset demotes the selection to `custom`, keeping the current fields.
    pub fn delete_preset(&mut self, name: &str) -> bool {
        let tuple = self.current_tuple();
        self.presets.delete(name, tuple)
    }

    pub fn active_preset_id(&self) -> &str {
        self.presets.active_id()
    }

    pub fn import_presets(&mut self, config: PresetConfig) {
        let active = config.active_id.clone();
        self.presets.replace(config.presets);
        // Unknown active id: keep the current selection and fields.
        self.select_preset(&active);
    }

    pub fn export_presets(&self) -> PresetConfig {
        self.presets.export()
    }

    /// Feed one tick. Pushes at most one sample per distinct frame token
    /// regardless of how many times it is invoked, then synthesizes the lens
    /// graph from the current timeline.
    pub fn sync(&mut self, tick: &TickRecord) -> SyncOutcome {
        let token = tick.frame_token();
        let mut pushed = false;

        if self.last_frame_token.as_deref() != Some(token.as_str()) {
            let sample = extract_sample(tick, self.timeline.len() as u64);
            self.timeline.push(sample);

            if self.timeline.len() > self.capacity {
                let excess = self.timeline.len() - self.capacity;
                self.timeline.drain(..excess);
                for (i, sample) in self.timeline.iter_mut().enumerate() {
                    sample.index = i as u64;
                }
            }

            for channel in &tick.channels {
                self.channel_meta.insert(channel.key.clone(), channel.clone());
            }

            self.last_frame_token = Some(token);
            pushed = true;
        }

        SyncOutcome {
            pushed,
            graph: self.synthesize(),
        }
    }

    /// Build the lens graph: one series per configured y key, pairing each
    /// sample's resolved x value with that channel's value. Samples missing
    /// either coordinate are dropped, never interpolated.
    pub fn synthesize(&self) -> Option<Graph> {
        if !self.enabled || self.timeline.is_empty() {
            return None;
        }
        let y_key = self.y_key.as_deref()?;

        let mut series = Vec::new();
        for key in [Some(y_key), self.y2_key.as_deref()].into_iter().flatten() {
            let points: Vec<Point> = self
                .timeline
                .iter()
                .filter_map(|sample| {
                    let x = self.resolve_x(sample)?;
                    let y = sample.values.get(key).copied()?;
                    Some(Point { x, y })
                })
                .collect();
            if !points.is_empty() {
                series.push(Series {
                    name: key.to_string(),
                    series_id: Some(key.to_string()),
                    points,
                    unit: self.channel_unit(key),
                });
            }
        }
        if series.is_empty() {
            return None;
        }

        let mut meta = serde_json::Map::new();
        meta.insert("kind".to_string(), "xy".into());
        meta.insert("source".to_string(), "lens".into());

        Some(Graph {
            schema: SCHEMA_GRAPH.to_string(),
            axis: Axis {
                x_label: Some(self.x_key.clone()),
                y_label: Some(y_key.to_string()),
                x_unit: self.channel_unit(&self.x_key),
                y_unit: self.channel_unit(y_key),
                ..Axis::default()
            },
            sample: Some(self.x_key.clone()),
            series,
            view: None,
            meta,
        })
    }

    fn resolve_x(&self, sample: &LensSample) -> Option<f64> {
        match self.x_key.as_str() {
            X_TICK => Some(sample.tick as f64),
            X_INDEX => Some(sample.index as f64),
            key => sample.values.get(key).copied(),
        }
    }

    fn channel_unit(&self, key: &str) -> Option<String> {
        self.channel_meta.get(key).and_then(|c| c.unit.clone())
    }
}

/// Pair `channels` with `row` positionally, keeping finite numerics only.
fn extract_sample(tick: &TickRecord, index: u64) -> LensSample {
    let mut values = BTreeMap::new();
    for (i, channel) in tick.channels.iter().enumerate() {
        let Some(value) = tick.row.get(i).and_then(serde_json::Value::as_f64) else {
            continue;
        };
        if value.is_finite() {
            values.insert(channel.key.clone(), value);
        }
    }
    LensSample {
        tick: tick.tick_id,
        index,
        values,
    }
}
