//! The explicit projection context: one record owning the store, router,
//! views, viewport, lens, run registry, and compare state. Every operation
//! is a method on it; there are no globals.
//!
//! Single-threaded cooperative model: engine step, patch apply, and all view
//! updates run synchronously within one host-loop task per tick, so nothing
//! here locks.

use crate::lens::{Lens, SyncOutcome};
use crate::overlay::{CompareState, CompareStatus, MergeMode, RunId, RunRegistry};
use crate::patch::{self, TickEffect};
use crate::store::{Fixed64Map, Store, ViewCache, ViewSet, Viewport};
use crate::tick::TickRecord;
use crate::view::{self, Graph, OverrideTable, RouteOutcome, Router, ViewKind};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ProjectionConfig {
    pub overrides: OverrideTable,
    pub fixed64_map: Fixed64Map,
    pub lens_capacity: usize,
    /// Replace point data in place when the same payload source re-arrives,
    /// keeping run identity stable across engine re-runs.
    pub auto_replace: bool,
}

impl Default for ProjectionConfig {
    fn default() -> ProjectionConfig {
        ProjectionConfig {
            overrides: OverrideTable::default(),
            fixed64_map: Fixed64Map::default(),
            lens_capacity: crate::lens::DEFAULT_CAPACITY,
            auto_replace: true,
        }
    }
}

#[derive(Debug)]
pub struct ProjectionContext {
    pub store: Store,
    pub views: ViewSet,
    pub cache: ViewCache,
    pub viewport: Viewport,
    pub lens: Lens,
    pub runs: RunRegistry,
    pub compare: CompareState,

    router: Router,
    fixed64_map: Fixed64Map,
    auto_replace: bool,
    lens_graph: Option<Graph>,
}

impl Default for ProjectionContext {
    fn default() -> ProjectionContext {
        ProjectionContext::new(ProjectionConfig::default())
    }
}

impl ProjectionContext {
    pub fn new(config: ProjectionConfig) -> ProjectionContext {
        ProjectionContext {
            store: Store::default(),
            views: ViewSet::default(),
            cache: ViewCache::default(),
            viewport: Viewport::default(),
            lens: Lens::new(config.lens_capacity),
            runs: RunRegistry::default(),
            compare: CompareState::default(),
            router: Router::new(config.overrides),
            fixed64_map: config.fixed64_map,
            auto_replace: config.auto_replace,
            lens_graph: None,
        }
    }

    /// Apply one tick: patch replay when the record carries a patch, the
    /// full-snapshot path otherwise, with full reprocessing as the recovery
    /// path whenever a patch demands it. Then sync the lens and feed the
    /// displayed graph into the run registry.
    pub fn apply_tick(&mut self, tick: &TickRecord) -> TickEffect {
        let mut effect = match &tick.patch {
            Some(ops) => patch::apply_ops(self, ops),
            None => self.reprocess_full(tick),
        };

        if effect.require_full && tick.patch.is_some() {
            debug!(tick = tick.tick_id, "patch demanded full reprocessing");
            let full = self.reprocess_full(tick);
            effect.absorb(full);
        }

        let SyncOutcome { pushed, graph } = self.lens.sync(tick);
        self.lens_graph = graph;

        if effect.refreshed.contains(&ViewKind::Graph) || pushed {
            self.ingest_effective_graph();
        }

        effect
    }

    /// Snapshot semantics: route every resource in the record.
    fn reprocess_full(&mut self, tick: &TickRecord) -> TickEffect {
        let mut effect = TickEffect::default();

        for (tag, raw) in &tick.resources.json {
            self.store.resources.insert(tag.clone(), raw.clone());
            let outcome = self.project(tag, raw);
            if let RouteOutcome::Refreshed(kind) = outcome {
                effect.changed = true;
                effect.refreshed.push(kind);
            }
        }

        for (tag, value) in &tick.resources.fixed64 {
            let previous = self.store.fixed64.insert(tag.clone(), value.clone());
            if previous.as_deref() != Some(value.as_str()) {
                effect.fixed64_changed = true;
                self.project_fixed64(tag, value);
            }
        }

        for (tag, value) in &tick.resources.value {
            let previous = self.store.values.insert(tag.clone(), value.clone());
            if previous.as_ref() != Some(value) {
                effect.value_changed = true;
            }
        }

        for (tag, handle) in &tick.resources.handle {
            self.store.handles.insert(tag.clone(), *handle);
        }

        effect
    }

    /// Route one payload through the resolver, dedup against the cache slot
    /// by raw-string identity, then validate. Failures keep the last good
    /// view.
    pub(crate) fn project(&mut self, schema_tag: &str, raw: &str) -> RouteOutcome {
        let Some(kind) = self.router.resolve(schema_tag, raw) else {
            return RouteOutcome::Unroutable;
        };
        if self.cache.matches(kind, raw) {
            return RouteOutcome::Unchanged(kind);
        }
        match view::validate(kind, schema_tag, raw) {
            Ok(view) => {
                self.views.set(view);
                self.cache.refresh(kind, raw);
                RouteOutcome::Refreshed(kind)
            }
            Err(err) => {
                warn!(tag = schema_tag, %err, "view payload rejected, keeping last good view");
                RouteOutcome::Rejected(kind)
            }
        }
    }

    /// Project a changed fixed64 value onto its live target, if mapped.
    pub(crate) fn project_fixed64(&mut self, tag: &str, value: &str) {
        let Ok(parsed) = value.trim().parse::<f64>() else {
            return;
        };
        if !parsed.is_finite() {
            return;
        }
        if let Some(target) = self.fixed64_map.target(tag) {
            crate::store::viewport::apply_fixed64_target(
                &mut self.viewport,
                &mut self.views,
                target,
                parsed,
            );
        }
    }

    /// The graph the renderer should draw: a non-empty lens graph takes
    /// precedence over the engine's schema-declared graph.
    pub fn effective_graph(&self) -> Option<&Graph> {
        self.lens_graph.as_ref().or(self.views.graph.as_ref())
    }

    pub fn lens_graph(&self) -> Option<&Graph> {
        self.lens_graph.as_ref()
    }

    pub fn compare_status(&self) -> CompareStatus {
        self.compare.status(&self.runs)
    }

    /// Remove a run, keeping the compare session coherent.
    pub fn remove_run(&mut self, id: RunId) -> bool {
        if !self.runs.remove_run(id) {
            return false;
        }
        self.compare.on_run_removed(&mut self.runs, id);
        true
    }

    /// Drop all runs and leave compare mode.
    pub fn reset_runs(&mut self) {
        self.compare.exit(&mut self.runs);
        self.runs.clear();
    }

    fn ingest_effective_graph(&mut self) {
        let (graph, source) = if let Some(graph) = &self.lens_graph {
            (graph.clone(), None)
        } else if let Some(graph) = &self.views.graph {
            let source = self.cache.slot(ViewKind::Graph).map(str::to_string);
            (graph.clone(), source)
        } else {
            return;
        };

        let mode = if self.auto_replace {
            MergeMode::AutoReplace
        } else {
            MergeMode::Fresh
        };
        self.runs.ingest(&graph, source.as_deref(), mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SCHEMA_GRAPH;
    use serde_json::json;

    fn graph_tick(id: u64, raw: &str) -> TickRecord {
        serde_json::from_value(json!({
            "tick_id": id,
            "state_hash": format!("h{}", id),
            "resources": { "json": { SCHEMA_GRAPH: raw } }
        }))
        .unwrap()
    }

    const GRAPH_RAW: &str =
        r#"{"schema":"viz.graph.v1","series":[{"name":"u","series_id":"u","points":[{"x":0,"y":1}]}]}"#;

    #[test]
    fn identical_raw_refreshes_once() {
        let mut ctx = ProjectionContext::default();

        let first = ctx.apply_tick(&graph_tick(1, GRAPH_RAW));
        assert!(first.changed);

        let second = ctx.apply_tick(&graph_tick(2, GRAPH_RAW));
        assert!(!second.changed);
        assert!(second.refreshed.is_empty());
    }

    #[test]
    fn rejected_payload_keeps_last_good_view() {
        let mut ctx = ProjectionContext::default();
        ctx.apply_tick(&graph_tick(1, GRAPH_RAW));

        let bad = r#"{"schema":"viz.graph.v1","series":[]}"#;
        let effect = ctx.apply_tick(&graph_tick(2, bad));
        assert!(!effect.changed);
        assert!(ctx.views.graph.is_some());
    }

    #[test]
    fn engine_graph_becomes_a_run_with_stable_identity() {
        let mut ctx = ProjectionContext::default();
        ctx.apply_tick(&graph_tick(1, GRAPH_RAW));
        assert_eq!(ctx.runs.len(), 1);

        // Same payload again: dedup, no new run.
        ctx.apply_tick(&graph_tick(2, GRAPH_RAW));
        assert_eq!(ctx.runs.len(), 1);

        // New points, same shape: auto-replace keeps the run id.
        let updated =
            r#"{"schema":"viz.graph.v1","series":[{"name":"u","series_id":"u","points":[{"x":0,"y":1},{"x":1,"y":2}]}]}"#;
        let id = ctx.runs.ordered()[0].id;
        ctx.apply_tick(&graph_tick(3, updated));
        assert_eq!(ctx.runs.len(), 1);
        assert_eq!(ctx.runs.ordered()[0].id, id);
        assert_eq!(ctx.runs.ordered()[0].points.len(), 2);
    }

    #[test]
    fn lens_graph_takes_precedence() {
        let mut ctx = ProjectionContext::default();
        ctx.lens.set_enabled(true);
        ctx.lens.set_y_key(Some("u".to_string()));

        let tick: TickRecord = serde_json::from_value(json!({
            "tick_id": 5,
            "state_hash": "h5",
            "resources": { "json": { SCHEMA_GRAPH: GRAPH_RAW } },
            "channels": [ { "key": "u" } ],
            "row": [2.5]
        }))
        .unwrap();
        ctx.apply_tick(&tick);

        let effective = ctx.effective_graph().unwrap();
        assert_eq!(effective.meta_str("source"), Some("lens"));
        assert!(ctx.views.graph.is_some());
    }
}
