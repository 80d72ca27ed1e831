//! Graph view: one or more (x, y) series plus axis metadata.
//!
//! JSON shape:
//! {
//!   "schema": "viz.graph.v1",
//!   "axis": { "x_label": "t", "x_unit": "s", "y_label": "u", "y_unit": "m" },
//!   "sample": "t",
//!   "series": [
//!     { "name": "u", "series_id": "u", "points": [ {"x": 0.0, "y": 1.0} ] }
//!   ],
//!   "meta": { "kind": "xy", "update": "append" }
//! }

use crate::view::{SCHEMA_GRAPH, ViewError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub schema: String,

    #[serde(default)]
    pub axis: Axis,

    /// Name of the sampling variable the x axis runs over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,

    pub series: Vec<Series>,

    /// Renderer hints, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Value>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub meta: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,

    pub points: Vec<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Graph {
    /// Strict validation: a declared schema must match the graph schema id
    /// (or the tag the payload was routed under), the series list must be
    /// non-empty, and every series needs at least one finite point.
    pub fn validate(schema_tag: &str, raw: &str) -> Result<Graph, ViewError> {
        let mut graph: Graph = serde_json::from_str(raw)?;

        if !graph.schema.is_empty() && graph.schema != SCHEMA_GRAPH && graph.schema != schema_tag {
            return Err(ViewError::Graph(format!(
                "declared schema {:?} does not match {:?}",
                graph.schema, schema_tag
            )));
        }
        if graph.series.is_empty() {
            return Err(ViewError::Graph("no series".to_string()));
        }
        for (i, series) in graph.series.iter().enumerate() {
            if series.points.is_empty() {
                return Err(ViewError::Graph(format!(
                    "series {} ({:?}) has no points",
                    i, series.name
                )));
            }
            for p in &series.points {
                if !p.x.is_finite() || !p.y.is_finite() {
                    return Err(ViewError::Graph(format!(
                        "series {} ({:?}) has a non-finite point",
                        i, series.name
                    )));
                }
            }
        }

        if graph.schema.is_empty() {
            graph.schema = SCHEMA_GRAPH.to_string();
        }
        Ok(graph)
    }

    /// Clone into one single-series graph per series, so visibility, opacity
    /// and order stay independently controllable downstream.
    pub fn fan_out(&self) -> Vec<Graph> {
        self.series
            .iter()
            .map(|series| Graph {
                schema: self.schema.clone(),
                axis: self.axis.clone(),
                sample: self.sample.clone(),
                series: vec![series.clone()],
                view: self.view.clone(),
                meta: self.meta.clone(),
            })
            .collect()
    }

    /// Value of a string entry in `meta`, e.g. `meta.update`.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SCHEMA_GRAPH;

    fn raw(series: &str) -> String {
        format!(r#"{{"schema":"{}","series":{}}}"#, SCHEMA_GRAPH, series)
    }

    #[test]
    fn empty_series_rejected() {
        assert!(Graph::validate(SCHEMA_GRAPH, &raw("[]")).is_err());
        assert!(
            Graph::validate(SCHEMA_GRAPH, &raw(r#"[{"name":"a","points":[]}]"#)).is_err()
        );
    }

    #[test]
    fn schema_mismatch_rejected() {
        let payload = r#"{"schema":"viz.table.v1","series":[{"points":[{"x":0,"y":0}]}]}"#;
        assert!(Graph::validate(SCHEMA_GRAPH, payload).is_err());
    }

    #[test]
    fn fan_out_yields_single_series_clones() {
        let payload = raw(
            r#"[{"name":"a","points":[{"x":0,"y":1}]},{"name":"b","points":[{"x":0,"y":2}]}]"#,
        );
        let graph = Graph::validate(SCHEMA_GRAPH, &payload).unwrap();
        let parts = graph.fan_out();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].series.len(), 1);
        assert_eq!(parts[1].series[0].name, "b");
    }
}
