//! Renderable graph runs: z-order, visibility, merge semantics.
//!
//! A Run is one independently toggleable rendered series. Multi-series
//! graphs fan out into one Run per series before they get here.

pub mod compare;

pub use compare::{CompareRole, CompareState, CompareStatus, SequencingStatus};

use crate::view::{Graph, Point};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RunId(pub u64);

/// Axis-compatibility fingerprint recorded for compare gating. Two runs are
/// comparable only when their signatures deep-equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisSignature {
    pub graph_kind: String,
    pub sample_var: Option<String>,
    pub x_unit: Option<String>,
    pub y_unit: Option<String>,
    pub x_kind: Option<String>,
    pub y_kind: Option<String>,
}

impl AxisSignature {
    pub fn of(graph: &Graph) -> AxisSignature {
        AxisSignature {
            graph_kind: graph.meta_str("kind").unwrap_or("xy").to_string(),
            sample_var: graph.sample.clone(),
            x_unit: graph.axis.x_unit.clone(),
            y_unit: graph.axis.y_unit.clone(),
            x_kind: graph.axis.x_kind.clone(),
            y_kind: graph.axis.y_kind.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds {
    pub fn from_points(points: &[Point]) -> Option<Bounds> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            x_min: first.x,
            x_max: first.x,
            y_min: first.y,
            y_max: first.y,
        };
        for p in iter {
            bounds.x_min = bounds.x_min.min(p.x);
            bounds.x_max = bounds.x_max.max(p.x);
            bounds.y_min = bounds.y_min.min(p.y);
            bounds.y_max = bounds.y_max.max(p.y);
        }
        Some(bounds)
    }
}

#[derive(Debug, Clone)]
pub struct Run {
    pub id: RunId,
    pub label: String,
    pub points: Vec<Point>,
    pub layer_index: u32,
    pub opacity: f64,
    pub visible: bool,
    pub compare_role: Option<CompareRole>,
    pub series_id: Option<String>,

    pub signature: AxisSignature,
    /// Raw text of the payload that produced this run; lens-synthesized runs
    /// have none.
    pub source_text: Option<String>,
    pub bounds: Option<Bounds>,
}

/// How `ingest` matches an incoming graph against existing runs when the
/// payload itself doesn't ask to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Always create new runs.
    Fresh,
    /// Replace point data in place for a run with the same source text and
    /// series id (or label), preserving id/layer/visibility/opacity/role.
    AutoReplace,
}

#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: Vec<Run>,
    next_id: u64,
    next_layer: u32,
    active: Option<RunId>,
}

impl RunRegistry {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, id: RunId) -> Option<&Run> {
        self.runs.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: RunId) -> Option<&mut Run> {
        self.runs.iter_mut().find(|r| r.id == id)
    }

    pub fn active(&self) -> Option<RunId> {
        self.active
    }

    pub fn active_run(&self) -> Option<&Run> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn set_active_run(&mut self, id: RunId) -> bool {
        if self.get(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn set_visible(&mut self, id: RunId, visible: bool) -> bool {
        match self.get_mut(id) {
            Some(run) => {
                run.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_opacity(&mut self, id: RunId, opacity: f64) -> bool {
        match self.get_mut(id) {
            Some(run) => {
                run.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    /// All runs ascending by layer index (render order).
    pub fn ordered(&self) -> Vec<&Run> {
        let mut runs: Vec<&Run> = self.runs.iter().collect();
        runs.sort_by_key(|r| r.layer_index);
        runs
    }

    pub fn visible_runs(&self) -> Vec<&Run> {
        self.ordered().into_iter().filter(|r| r.visible).collect()
    }

    pub fn add_run(
        &mut self,
        label: String,
        points: Vec<Point>,
        series_id: Option<String>,
        signature: AxisSignature,
        source_text: Option<String>,
    ) -> RunId {
        let id = RunId(self.next_id);
        self.next_id += 1;
        let layer_index = self.next_layer;
        self.next_layer += 1;

        let bounds = Bounds::from_points(&points);
        self.runs.push(Run {
            id,
            label,
            points,
            layer_index,
            opacity: 1.0,
            visible: true,
            compare_role: None,
            series_id,
            signature,
            source_text,
            bounds,
        });
        if self.active.is_none() {
            self.active = Some(id);
        }
        id
    }

    pub fn remove_run(&mut self, id: RunId) -> bool {
        let before = self.runs.len();
        self.runs.retain(|r| r.id != id);
        if self.runs.len() == before {
            return false;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        true
    }

    pub fn clear(&mut self) {
        self.runs.clear();
        self.active = None;
    }

    /// Swap a run's layer index with its neighbor in render order.
    /// `delta` is +1 (toward front) or -1 (toward back); edges are a no-op.
    pub fn move_layer(&mut self, id: RunId, delta: i32) -> bool {
        let order: Vec<RunId> = self.ordered().iter().map(|r| r.id).collect();
        let Some(pos) = order.iter().position(|r| *r == id) else {
            return false;
        };
        let target = pos as i64 + delta.signum() as i64;
        if target < 0 || target as usize >= order.len() || delta == 0 {
            return false;
        }
        let other = order[target as usize];

        let layer_a = match self.get(id) {
            Some(r) => r.layer_index,
            None => return false,
        };
        let layer_b = match self.get(other) {
            Some(r) => r.layer_index,
            None => return false,
        };
        if let Some(run) = self.get_mut(id) {
            run.layer_index = layer_b;
        }
        if let Some(run) = self.get_mut(other) {
            run.layer_index = layer_a;
        }
        true
    }

    /// Feed one displayed graph into the registry, fanning multi-series
    /// graphs out into one run per series.
    ///
    /// A graph tagged `meta.update = "append"` merges into an existing run
    /// matched by series id (preferred) else label: points are concatenated
    /// and bounds recomputed from the union. Otherwise `mode` decides
    /// between in-place replacement and a fresh run.
    pub fn ingest(&mut self, graph: &Graph, source_text: Option<&str>, mode: MergeMode) -> Vec<RunId> {
        let append = graph.meta_str("update") == Some("append");
        let mut affected = Vec::new();

        for (i, single) in graph.fan_out().into_iter().enumerate() {
            let series = &single.series[0];
            let label = if series.name.is_empty() {
                format!("series{}", i + 1)
            } else {
                series.name.clone()
            };
            let series_id = series.series_id.clone();
            let signature = AxisSignature::of(&single);

            if append {
                if let Some(run) = self.find_append_target(series_id.as_deref(), &label) {
                    run.points.extend(series.points.iter().copied());
                    run.bounds = Bounds::from_points(&run.points);
                    run.source_text = source_text.map(str::to_string);
                    affected.push(run.id);
                    continue;
                }
            } else if mode == MergeMode::AutoReplace {
                if let Some(run) =
                    self.find_replace_target(source_text, series_id.as_deref(), &label)
                {
                    run.points = series.points.clone();
                    run.bounds = Bounds::from_points(&run.points);
                    run.signature = signature;
                    affected.push(run.id);
                    continue;
                }
            }

            let id = self.add_run(
                label,
                series.points.clone(),
                series_id,
                signature,
                source_text.map(str::to_string),
            );
            affected.push(id);
        }

        affected
    }

    fn find_append_target(&mut self, series_id: Option<&str>, label: &str) -> Option<&mut Run> {
        if let Some(sid) = series_id {
            if let Some(pos) = self
                .runs
                .iter()
                .position(|r| r.series_id.as_deref() == Some(sid))
            {
                return self.runs.get_mut(pos);
            }
        }
        let pos = self.runs.iter().position(|r| r.label == label)?;
        self.runs.get_mut(pos)
    }

    fn find_replace_target(
        &mut self,
        source_text: Option<&str>,
        series_id: Option<&str>,
        label: &str,
    ) -> Option<&mut Run> {
        let pos = self.runs.iter().position(|r| {
            if r.source_text.as_deref() != source_text {
                return false;
            }
            match (r.series_id.as_deref(), series_id) {
                (Some(a), Some(b)) => a == b,
                _ => r.label == label,
            }
        })?;
        self.runs.get_mut(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Graph, SCHEMA_GRAPH};
    use pretty_assertions::assert_eq;

    fn graph(series_id: &str, points: &[(f64, f64)], update: Option<&str>) -> Graph {
        let points: Vec<String> = points
            .iter()
            .map(|(x, y)| format!(r#"{{"x":{},"y":{}}}"#, x, y))
            .collect();
        let meta = match update {
            Some(u) => format!(r#","meta":{{"update":"{}"}}"#, u),
            None => String::new(),
        };
        let raw = format!(
            r#"{{"schema":"{}","series":[{{"name":"{}","series_id":"{}","points":[{}]}}]{}}}"#,
            SCHEMA_GRAPH,
            series_id,
            series_id,
            points.join(","),
            meta
        );
        Graph::validate(SCHEMA_GRAPH, &raw).unwrap()
    }

    #[test]
    fn append_merges_by_series_id_and_unions_bounds() {
        let mut registry = RunRegistry::default();
        registry.ingest(
            &graph("v", &[(0.0, 1.0), (1.0, 5.0)], Some("append")),
            None,
            MergeMode::Fresh,
        );
        registry.ingest(
            &graph("v", &[(2.0, -3.0), (3.0, 2.0)], Some("append")),
            None,
            MergeMode::Fresh,
        );

        assert_eq!(registry.len(), 1);
        let run = registry.ordered()[0];
        assert_eq!(run.points.len(), 4);
        let bounds = run.bounds.unwrap();
        assert_eq!((bounds.x_min, bounds.x_max), (0.0, 3.0));
        assert_eq!((bounds.y_min, bounds.y_max), (-3.0, 5.0));
    }

    #[test]
    fn auto_replace_preserves_identity() {
        let mut registry = RunRegistry::default();
        let source = r#"{"series":[...]}"#;
        let first = registry.ingest(
            &graph("v", &[(0.0, 1.0)], None),
            Some(source),
            MergeMode::AutoReplace,
        );
        let id = first[0];
        registry.set_visible(id, false);
        registry.set_opacity(id, 0.5);

        let second = registry.ingest(
            &graph("v", &[(0.0, 2.0), (1.0, 3.0)], None),
            Some(source),
            MergeMode::AutoReplace,
        );

        assert_eq!(second, vec![id]);
        assert_eq!(registry.len(), 1);
        let run = registry.get(id).unwrap();
        assert_eq!(run.points.len(), 2);
        assert!(!run.visible);
        assert_eq!(run.opacity, 0.5);
    }

    #[test]
    fn fresh_mode_creates_a_run_per_ingest() {
        let mut registry = RunRegistry::default();
        registry.ingest(&graph("a", &[(0.0, 0.0)], None), None, MergeMode::Fresh);
        registry.ingest(&graph("a", &[(0.0, 0.0)], None), None, MergeMode::Fresh);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn move_layer_swaps_neighbors() {
        let mut registry = RunRegistry::default();
        let a = registry.ingest(&graph("a", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];
        let b = registry.ingest(&graph("b", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];
        let c = registry.ingest(&graph("c", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];

        assert!(registry.move_layer(a, 1));
        let order: Vec<RunId> = registry.ordered().iter().map(|r| r.id).collect();
        assert_eq!(order, vec![b, a, c]);

        // Edges are no-ops.
        assert!(!registry.move_layer(c, 1));
        assert!(!registry.move_layer(b, -1));
    }

    #[test]
    fn visible_runs_iterate_ascending_layers() {
        let mut registry = RunRegistry::default();
        let a = registry.ingest(&graph("a", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];
        let b = registry.ingest(&graph("b", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];
        registry.set_visible(a, false);

        let visible: Vec<RunId> = registry.visible_runs().iter().map(|r| r.id).collect();
        assert_eq!(visible, vec![b]);
    }

    #[test]
    fn removing_the_active_run_clears_active() {
        let mut registry = RunRegistry::default();
        let a = registry.ingest(&graph("a", &[(0.0, 0.0)], None), None, MergeMode::Fresh)[0];
        assert_eq!(registry.active(), Some(a));
        assert!(registry.remove_run(a));
        assert_eq!(registry.active(), None);
    }
}
