//! Canonical state: latest raw payload per resource/component key, the two
//! scalar maps, the current validated views, and the per-kind raw cache.
//!
//! All maps are `BTreeMap` so iteration, reports and tests stay
//! deterministic.

pub mod viewport;

pub use viewport::{Fixed64Map, Fixed64Target, Rect, Viewport};

use crate::view::{Graph, Space2d, Structure, Table, Text, View, ViewKind};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key for component-scoped payloads. The typed tuple makes key collisions
/// impossible by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComponentKey {
    pub entity: u64,
    pub component: String,
}

/// Created on first write, overwritten on repeat, deleted on remove.
#[derive(Debug, Clone)]
pub struct ComponentEntry {
    pub raw: String,
    /// View kind the router resolved for this payload, if any.
    pub resolved: Option<ViewKind>,
}

#[derive(Debug, Default)]
pub struct Store {
    /// Latest raw JSON payload per resource tag.
    pub resources: BTreeMap<String, String>,
    pub components: BTreeMap<ComponentKey, ComponentEntry>,
    /// Fixed-point decimal strings, last-writer-wins per tag.
    pub fixed64: BTreeMap<String, String>,
    /// Opaque scalars, last-writer-wins per tag.
    pub values: BTreeMap<String, Value>,
    pub handles: BTreeMap<String, u64>,
}

/// Latest validated view per kind. A slot keeps its last good view when a
/// newer payload fails validation.
#[derive(Debug, Default)]
pub struct ViewSet {
    pub graph: Option<Graph>,
    pub space2d: Option<Space2d>,
    pub table: Option<Table>,
    pub text: Option<Text>,
    pub structure: Option<Structure>,
}

impl ViewSet {
    pub fn set(&mut self, view: View) {
        match view {
            View::Graph(v) => self.graph = Some(v),
            View::Space2d(v) => self.space2d = Some(v),
            View::Table(v) => self.table = Some(v),
            View::Text(v) => self.text = Some(v),
            View::Structure(v) => self.structure = Some(v),
        }
    }

    pub fn clear(&mut self, kind: ViewKind) {
        match kind {
            ViewKind::Graph => self.graph = None,
            ViewKind::Space2d => self.space2d = None,
            ViewKind::Table => self.table = None,
            ViewKind::Text => self.text = None,
            ViewKind::Structure => self.structure = None,
        }
    }

    pub fn has(&self, kind: ViewKind) -> bool {
        match kind {
            ViewKind::Graph => self.graph.is_some(),
            ViewKind::Space2d => self.space2d.is_some(),
            ViewKind::Table => self.table.is_some(),
            ViewKind::Text => self.text.is_some(),
            ViewKind::Structure => self.structure.is_some(),
        }
    }
}

/// One slot per view kind holding the last raw string that produced it.
/// Dedup is string identity, not deep equality.
#[derive(Debug, Default)]
pub struct ViewCache {
    slots: BTreeMap<ViewKind, String>,
}

impl ViewCache {
    pub fn matches(&self, kind: ViewKind, raw: &str) -> bool {
        self.slots.get(&kind).is_some_and(|slot| slot == raw)
    }

    pub fn refresh(&mut self, kind: ViewKind, raw: &str) {
        self.slots.insert(kind, raw.to_string());
    }

    pub fn clear(&mut self, kind: ViewKind) {
        self.slots.remove(&kind);
    }

    pub fn slot(&self, kind: ViewKind) -> Option<&str> {
        self.slots.get(&kind).map(String::as_str)
    }
}
