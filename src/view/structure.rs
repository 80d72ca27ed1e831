//! Node-graph view: nodes plus directed edges.
//!
//! Both `nodes` and `edges` must be present; node ids must be unique. Edges
//! pointing at unknown ids are kept but reported as warnings, since engines
//! commonly emit edges a tick ahead of the nodes they reference.

use crate::view::ViewError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub nodes: Vec<StructureNode>,
    pub edges: Vec<StructureEdge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureNode {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureEdge {
    pub from: String,
    pub to: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawStructure {
    #[serde(default)]
    nodes: Option<Vec<StructureNode>>,
    #[serde(default)]
    edges: Option<Vec<StructureEdge>>,
}

impl Structure {
    pub fn validate(raw: &str) -> Result<Structure, ViewError> {
        let parsed: RawStructure = serde_json::from_str(raw)?;

        let nodes = parsed
            .nodes
            .ok_or_else(|| ViewError::Structure("missing nodes[]".to_string()))?;
        let edges = parsed
            .edges
            .ok_or_else(|| ViewError::Structure("missing edges[]".to_string()))?;

        if nodes.is_empty() {
            return Err(ViewError::Structure("nodes must be non-empty".to_string()));
        }

        let mut ids = BTreeSet::new();
        for node in &nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(ViewError::Structure(format!(
                    "duplicate node id {:?}",
                    node.id
                )));
            }
        }

        for edge in &edges {
            if !ids.contains(edge.from.as_str()) || !ids.contains(edge.to.as_str()) {
                warn!(from = %edge.from, to = %edge.to, "structure edge references unknown node");
            }
        }

        Ok(Structure { nodes, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_lists_required() {
        assert!(Structure::validate(r#"{"nodes":[{"id":"a"}]}"#).is_err());
        assert!(Structure::validate(r#"{"edges":[]}"#).is_err());
    }

    #[test]
    fn dangling_edge_is_kept() {
        let s = Structure::validate(
            r#"{"nodes":[{"id":"a"}],"edges":[{"from":"a","to":"ghost"}]}"#,
        )
        .unwrap();
        assert_eq!(s.edges.len(), 1);
    }

    #[test]
    fn duplicate_node_id_rejected() {
        assert!(
            Structure::validate(r#"{"nodes":[{"id":"a"},{"id":"a"}],"edges":[]}"#).is_err()
        );
    }
}
