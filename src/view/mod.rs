//! Normalized view objects: the sole contract with the external renderer.
//!
//! Five view kinds, each with a strict validator that turns a raw payload
//! string into a typed, normalized object. Validation failures keep the last
//! good view on screen; they are surfaced as [`ViewError`] and logged by the
//! caller, never fatal.

pub mod graph;
pub mod route;
pub mod space2d;
pub mod structure;
pub mod table;
pub mod text;

pub use graph::{Axis, Graph, Point, Series};
pub use route::{OverrideTable, RouteOutcome, Router};
pub use space2d::{DrawCmd, Shape, Space2d, SpacePoint};
pub use structure::{Structure, StructureEdge, StructureNode};
pub use table::Table;
pub use text::Text;

use serde::{Deserialize, Serialize};

/// The five fixed schema ids recognized without sniffing or overrides.
pub const SCHEMA_GRAPH: &str = "viz.graph.v1";
pub const SCHEMA_SPACE2D: &str = "viz.space2d.v1";
pub const SCHEMA_TABLE: &str = "viz.table.v1";
pub const SCHEMA_TEXT: &str = "viz.text.v1";
pub const SCHEMA_STRUCTURE: &str = "viz.structure.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Graph,
    Space2d,
    Table,
    Text,
    Structure,
}

impl ViewKind {
    pub fn from_schema_id(id: &str) -> Option<Self> {
        match id {
            SCHEMA_GRAPH => Some(Self::Graph),
            SCHEMA_SPACE2D => Some(Self::Space2d),
            SCHEMA_TABLE => Some(Self::Table),
            SCHEMA_TEXT => Some(Self::Text),
            SCHEMA_STRUCTURE => Some(Self::Structure),
            _ => None,
        }
    }

    /// Target names accepted on the right-hand side of an override line.
    pub fn from_override_target(target: &str) -> Option<Self> {
        match target.to_ascii_lowercase().as_str() {
            "graph" => Some(Self::Graph),
            "space2d" => Some(Self::Space2d),
            "table" => Some(Self::Table),
            "text" => Some(Self::Text),
            "structure" => Some(Self::Structure),
            _ => None,
        }
    }
}

/// Why a payload was rejected for a given view kind.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("graph: {0}")]
    Graph(String),

    #[error("space2d: {0}")]
    Space2d(String),

    #[error("table: {0}")]
    Table(String),

    #[error("text: {0}")]
    Text(String),

    #[error("structure: {0}")]
    Structure(String),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One validated view of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Graph(Graph),
    Space2d(Space2d),
    Table(Table),
    Text(Text),
    Structure(Structure),
}

impl View {
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::Graph(_) => ViewKind::Graph,
            Self::Space2d(_) => ViewKind::Space2d,
            Self::Table(_) => ViewKind::Table,
            Self::Text(_) => ViewKind::Text,
            Self::Structure(_) => ViewKind::Structure,
        }
    }
}

/// Validate a raw payload for an already-resolved view kind.
///
/// `schema_tag` is the tag the payload was routed under; the graph validator
/// uses it to cross-check a declared schema.
pub fn validate(kind: ViewKind, schema_tag: &str, raw: &str) -> Result<View, ViewError> {
    match kind {
        ViewKind::Graph => Graph::validate(schema_tag, raw).map(View::Graph),
        ViewKind::Space2d => Space2d::validate(raw).map(View::Space2d),
        ViewKind::Table => Table::validate(raw).map(View::Table),
        ViewKind::Text => Text::validate(raw).map(View::Text),
        ViewKind::Structure => Structure::validate(raw).map(View::Structure),
    }
}
