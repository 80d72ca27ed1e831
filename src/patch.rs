//! Patch replay: apply one tick's ordered op list onto the context.
//!
//! Ops run strictly in array order (last writer wins per key). Malformed ops
//! are skipped and logged, never aborting the rest of the tick; unknown op
//! kinds are ignored for forward compatibility. Reserved tags mark the
//! incremental stream as unreliable and force the caller onto the
//! full-reprocessing path.

use crate::context::ProjectionContext;
use crate::store::{ComponentEntry, ComponentKey};
use crate::tick::{OpError, PatchOp};
use crate::view::{RouteOutcome, ViewKind};
use serde_json::Value;
use tracing::{debug, warn};

/// Fixed64 tags whose writes invalidate incremental patching.
pub const RESERVED_FIXED64_TAGS: [&str; 2] = ["sim.topology", "sim.schema_rev"];
/// Value tag whose write invalidates incremental patching.
pub const RESERVED_VALUE_TAG: &str = "sim.session";

/// Net effect of one tick's ops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEffect {
    /// A visible view refresh (or removal) happened.
    pub changed: bool,
    pub fixed64_changed: bool,
    pub value_changed: bool,
    /// Patch semantics must be discarded for this tick; reprocess fully.
    pub require_full: bool,
    /// View kinds refreshed this tick.
    pub refreshed: Vec<ViewKind>,
}

impl TickEffect {
    pub fn absorb(&mut self, other: TickEffect) {
        self.changed |= other.changed;
        self.fixed64_changed |= other.fixed64_changed;
        self.value_changed |= other.value_changed;
        self.require_full |= other.require_full;
        self.refreshed.extend(other.refreshed);
    }
}

/// Replay one tick's patch array.
pub fn apply_ops(ctx: &mut ProjectionContext, ops: &[Value]) -> TickEffect {
    let mut effect = TickEffect::default();

    for (index, raw_op) in ops.iter().enumerate() {
        let op = match PatchOp::interpret(raw_op) {
            Ok(op) => op,
            Err(OpError::UnknownKind(kind)) => {
                debug!(index, kind = %kind, "ignoring unknown patch op kind");
                continue;
            }
            Err(err) => {
                warn!(index, %err, "skipping malformed patch op");
                continue;
            }
        };
        apply_one(ctx, op, &mut effect);
    }

    effect
}

fn apply_one(ctx: &mut ProjectionContext, op: PatchOp, effect: &mut TickEffect) {
    match op {
        PatchOp::SetResourceJson { tag, raw } => {
            ctx.store.resources.insert(tag.clone(), raw.clone());
            if let RouteOutcome::Refreshed(kind) = ctx.project(&tag, &raw) {
                effect.changed = true;
                effect.refreshed.push(kind);
            }
        }

        PatchOp::SetResourceFixed64 { tag, value } => {
            if RESERVED_FIXED64_TAGS.contains(&tag.as_str()) {
                effect.require_full = true;
            }
            let previous = ctx.store.fixed64.insert(tag.clone(), value.clone());
            if previous.as_deref() != Some(value.as_str()) {
                effect.fixed64_changed = true;
                ctx.project_fixed64(&tag, &value);
            }
        }

        PatchOp::SetResourceValue { tag, value } => {
            if tag == RESERVED_VALUE_TAG {
                effect.require_full = true;
            }
            ctx.store.values.insert(tag, value);
            effect.value_changed = true;
        }

        PatchOp::SetComponentJson {
            entity,
            component,
            raw,
        } => {
            let outcome = ctx.project(&component, &raw);
            if let RouteOutcome::Refreshed(kind) = outcome {
                effect.changed = true;
                effect.refreshed.push(kind);
            }
            ctx.store.components.insert(
                ComponentKey { entity, component },
                ComponentEntry {
                    raw,
                    resolved: outcome.kind(),
                },
            );
        }

        PatchOp::RemoveComponent { entity, component } => {
            let key = ComponentKey { entity, component };
            let Some(entry) = ctx.store.components.remove(&key) else {
                return;
            };
            // Clear the resolved view and cache slot only if this entry's
            // payload is what currently fills them.
            if let Some(kind) = entry.resolved {
                if ctx.cache.slot(kind) == Some(entry.raw.as_str()) {
                    ctx.cache.clear(kind);
                    ctx.views.clear(kind);
                    effect.changed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProjectionContext;
    use crate::tick::TickRecord;
    use serde_json::json;

    fn patch_tick(id: u64, ops: Value) -> TickRecord {
        serde_json::from_value(json!({
            "tick_id": id,
            "state_hash": format!("h{}", id),
            "patch": ops
        }))
        .unwrap()
    }

    #[test]
    fn ops_apply_in_array_order_last_writer_wins() {
        let mut ctx = ProjectionContext::default();
        let tick = patch_tick(
            1,
            json!([
                { "op": "set_resource_value", "tag": "phase", "value": "warmup" },
                { "op": "set_resource_value", "tag": "phase", "value": "steady" }
            ]),
        );
        ctx.apply_tick(&tick);
        assert_eq!(ctx.store.values["phase"], json!("steady"));

        // Reversed order, different result.
        let mut other = ProjectionContext::default();
        let tick = patch_tick(
            1,
            json!([
                { "op": "set_resource_value", "tag": "phase", "value": "steady" },
                { "op": "set_resource_value", "tag": "phase", "value": "warmup" }
            ]),
        );
        other.apply_tick(&tick);
        assert_eq!(other.store.values["phase"], json!("warmup"));
    }

    #[test]
    fn malformed_op_does_not_abort_the_rest() {
        let mut ctx = ProjectionContext::default();
        let tick = patch_tick(
            1,
            json!([
                { "op": "set_resource_value", "value": "no tag here" },
                { "op": "set_resource_blob", "tag": "x", "value": 1 },
                { "op": "set_resource_value", "tag": "ok", "value": 7 }
            ]),
        );
        let effect = ctx.apply_tick(&tick);

        assert!(effect.value_changed);
        assert_eq!(ctx.store.values["ok"], json!(7));
        assert_eq!(ctx.store.values.len(), 1);
    }

    #[test]
    fn reserved_tags_force_full_reprocessing() {
        let mut ctx = ProjectionContext::default();
        let effect = apply_ops(
            &mut ctx,
            &[json!({ "op": "set_resource_fixed64", "tag": "sim.topology", "value": "2" })],
        );
        assert!(effect.require_full);

        let mut ctx = ProjectionContext::default();
        let effect = apply_ops(
            &mut ctx,
            &[json!({ "op": "set_resource_value", "tag": "sim.session", "value": "s2" })],
        );
        assert!(effect.require_full);
    }

    #[test]
    fn fixed64_projects_onto_viewport_without_reprocessing() {
        let mut ctx = ProjectionContext::default();
        let tick = patch_tick(
            1,
            json!([
                { "op": "set_resource_fixed64", "tag": "view.zoom", "value": "2.5" },
                { "op": "set_resource_fixed64", "tag": "view.pan.x", "value": "-10" }
            ]),
        );
        let effect = ctx.apply_tick(&tick);

        assert!(effect.fixed64_changed);
        assert!(!effect.require_full);
        assert_eq!(ctx.viewport.zoom, 2.5);
        assert_eq!(ctx.viewport.pan_x, -10.0);
    }

    #[test]
    fn unchanged_fixed64_value_is_not_a_change() {
        let mut ctx = ProjectionContext::default();
        let op = json!([{ "op": "set_resource_fixed64", "tag": "view.zoom", "value": "2.0" }]);
        ctx.apply_tick(&patch_tick(1, op.clone()));

        let effect = ctx.apply_tick(&patch_tick(2, op));
        assert!(!effect.fixed64_changed);
    }

    #[test]
    fn remove_component_clears_its_view_and_cache_slot() {
        let mut ctx = ProjectionContext::default();
        let raw = r#"{"columns":["a"],"rows":[[1]]}"#;
        let tick = patch_tick(
            1,
            json!([
                { "op": "set_component_json", "entity": 9, "component": "viz.table.v1", "value": raw }
            ]),
        );
        ctx.apply_tick(&tick);
        assert!(ctx.views.table.is_some());

        let tick = patch_tick(
            2,
            json!([{ "op": "remove_component", "entity": 9, "component": "viz.table.v1" }]),
        );
        let effect = ctx.apply_tick(&tick);

        assert!(effect.changed);
        assert!(ctx.views.table.is_none());
        assert!(ctx.cache.slot(ViewKind::Table).is_none());
        assert!(ctx.store.components.is_empty());
    }

    #[test]
    fn remove_of_superseded_component_keeps_current_view() {
        let mut ctx = ProjectionContext::default();
        let old = r#"{"columns":["a"],"rows":[[1]]}"#;
        let new = r#"{"columns":["a"],"rows":[[2]]}"#;

        ctx.apply_tick(&patch_tick(
            1,
            json!([
                { "op": "set_component_json", "entity": 1, "component": "viz.table.v1", "value": old },
                { "op": "set_resource_json", "tag": "viz.table.v1", "value": new }
            ]),
        ));

        // Entity 1's payload no longer fills the table slot, so removing it
        // leaves the resource-backed view alone.
        ctx.apply_tick(&patch_tick(
            2,
            json!([{ "op": "remove_component", "entity": 1, "component": "viz.table.v1" }]),
        ));
        assert!(ctx.views.table.is_some());
        assert_eq!(ctx.cache.slot(ViewKind::Table), Some(new));
    }
}
