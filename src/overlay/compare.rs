//! Compare mode: one frozen baseline run against one gated variant.
//!
//! Incompatibility is a first-class blocked state with a human-readable
//! reason, never an error. Sequenced playback alternates the two runs'
//! visibility on a host-supplied clock; the library owns no timers.

use crate::overlay::{AxisSignature, Run, RunId, RunRegistry};
use serde::Serialize;

pub const MIN_SEQUENCE_MS: u64 = 120;
pub const MAX_SEQUENCE_MS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareRole {
    Baseline,
    Variant,
}

#[derive(Debug)]
struct Sequencer {
    interval_ms: u64,
    last_switch_ms: u64,
    showing: CompareRole,
    prior_baseline_visible: bool,
    prior_variant_visible: bool,
}

#[derive(Debug)]
struct CompareSession {
    baseline: RunId,
    variant: Option<RunId>,
    signature: AxisSignature,
    series_id: Option<String>,
    block_reason: Option<String>,
    sequencer: Option<Sequencer>,
}

#[derive(Debug, Default)]
pub struct CompareState {
    session: Option<CompareSession>,
}

/// Status handed to the renderer/UI.
#[derive(Debug, Clone, Serialize)]
pub struct CompareStatus {
    pub enabled: bool,
    pub baseline_label: Option<String>,
    pub variant_label: Option<String>,
    pub block_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequencing: Option<SequencingStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SequencingStatus {
    pub interval_ms: u64,
    pub showing: CompareRole,
}

impl CompareState {
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    pub fn baseline(&self) -> Option<RunId> {
        self.session.as_ref().map(|s| s.baseline)
    }

    pub fn variant(&self) -> Option<RunId> {
        self.session.as_ref().and_then(|s| s.variant)
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.session.as_ref()?.block_reason.as_deref()
    }

    /// Freeze the registry's active run as the baseline. No active run means
    /// compare mode cannot start.
    pub fn enter(&mut self, registry: &mut RunRegistry) -> bool {
        if self.session.is_some() {
            return true;
        }
        let Some(id) = registry.active() else {
            return false;
        };
        let Some(run) = registry.get_mut(id) else {
            return false;
        };
        run.compare_role = Some(CompareRole::Baseline);
        self.session = Some(CompareSession {
            baseline: id,
            variant: None,
            signature: run.signature.clone(),
            series_id: run.series_id.clone(),
            block_reason: None,
            sequencer: None,
        });
        true
    }

    /// Leave compare mode: stop sequencing, clear roles, drop the session.
    pub fn exit(&mut self, registry: &mut RunRegistry) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        restore_visibility(&mut session, registry);
        if let Some(run) = registry.get_mut(session.baseline) {
            run.compare_role = None;
        }
        if let Some(variant) = session.variant {
            if let Some(run) = registry.get_mut(variant) {
                run.compare_role = None;
            }
        }
    }

    /// Gate a candidate variant. Accepted only when its axis signature
    /// deep-equals the baseline's and the series ids don't disagree;
    /// otherwise the session records a block reason and keeps any previously
    /// installed variant.
    pub fn propose_variant(&mut self, registry: &mut RunRegistry, id: RunId) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if id == session.baseline {
            session.block_reason = Some("candidate variant is the baseline run".to_string());
            return false;
        }
        let Some(candidate) = registry.get(id) else {
            session.block_reason = Some(format!("no run with id {}", id.0));
            return false;
        };
        if let Some(reason) =
            incompatibility(&session.signature, session.series_id.as_deref(), candidate)
        {
            session.block_reason = Some(reason);
            return false;
        }

        if let Some(previous) = session.variant.take() {
            if previous != id {
                if let Some(run) = registry.get_mut(previous) {
                    run.compare_role = None;
                }
            }
        }
        if let Some(run) = registry.get_mut(id) {
            run.compare_role = Some(CompareRole::Variant);
        }
        session.variant = Some(id);
        session.block_reason = None;
        true
    }

    /// Begin alternating baseline/variant visibility. The interval is
    /// clamped into [120, 5000] ms; `now_ms` comes from the host clock.
    pub fn start_sequencing(
        &mut self,
        registry: &mut RunRegistry,
        interval_ms: u64,
        now_ms: u64,
    ) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(variant) = session.variant else {
            return false;
        };
        if session.sequencer.is_some() {
            return true;
        }

        let prior_baseline_visible = registry.get(session.baseline).is_some_and(|r| r.visible);
        let prior_variant_visible = registry.get(variant).is_some_and(|r| r.visible);
        registry.set_visible(session.baseline, true);
        registry.set_visible(variant, false);

        session.sequencer = Some(Sequencer {
            interval_ms: interval_ms.clamp(MIN_SEQUENCE_MS, MAX_SEQUENCE_MS),
            last_switch_ms: now_ms,
            showing: CompareRole::Baseline,
            prior_baseline_visible,
            prior_variant_visible,
        });
        true
    }

    /// Advance the sequencer; returns true when visibility flipped.
    /// Exactly one of the two runs is visible at any instant.
    pub fn advance_sequencing(&mut self, registry: &mut RunRegistry, now_ms: u64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(variant) = session.variant else {
            return false;
        };
        let Some(sequencer) = session.sequencer.as_mut() else {
            return false;
        };
        if now_ms.saturating_sub(sequencer.last_switch_ms) < sequencer.interval_ms {
            return false;
        }

        sequencer.showing = match sequencer.showing {
            CompareRole::Baseline => CompareRole::Variant,
            CompareRole::Variant => CompareRole::Baseline,
        };
        sequencer.last_switch_ms = now_ms;
        let show_baseline = sequencer.showing == CompareRole::Baseline;
        registry.set_visible(session.baseline, show_baseline);
        registry.set_visible(variant, !show_baseline);
        true
    }

    /// Stop sequencing; both runs restore their pre-sequencing visibility.
    pub fn stop_sequencing(&mut self, registry: &mut RunRegistry) {
        if let Some(session) = self.session.as_mut() {
            restore_visibility(session, registry);
        }
    }

    /// Keep the session coherent when a run disappears from the registry.
    pub fn on_run_removed(&mut self, registry: &mut RunRegistry, id: RunId) {
        if self.session.as_ref().is_some_and(|s| s.baseline == id) {
            self.exit(registry);
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.variant == Some(id) {
            restore_visibility(session, registry);
            session.variant = None;
        }
    }

    pub fn status(&self, registry: &RunRegistry) -> CompareStatus {
        match &self.session {
            None => CompareStatus {
                enabled: false,
                baseline_label: None,
                variant_label: None,
                block_reason: None,
                sequencing: None,
            },
            Some(session) => CompareStatus {
                enabled: true,
                baseline_label: registry.get(session.baseline).map(|r| r.label.clone()),
                variant_label: session
                    .variant
                    .and_then(|id| registry.get(id))
                    .map(|r| r.label.clone()),
                block_reason: session.block_reason.clone(),
                sequencing: session.sequencer.as_ref().map(|s| SequencingStatus {
                    interval_ms: s.interval_ms,
                    showing: s.showing,
                }),
            },
        }
    }
}

fn restore_visibility(session: &mut CompareSession, registry: &mut RunRegistry) {
    let Some(sequencer) = session.sequencer.take() else {
        return;
    };
    registry.set_visible(session.baseline, sequencer.prior_baseline_visible);
    if let Some(variant) = session.variant {
        registry.set_visible(variant, sequencer.prior_variant_visible);
    }
}

/// First observable difference between baseline and candidate, or None when
/// compatible. Series ids only disagree when both sides declare one.
fn incompatibility(signature: &AxisSignature, series_id: Option<&str>, run: &Run) -> Option<String> {
    let candidate = &run.signature;

    if signature.graph_kind != candidate.graph_kind {
        return Some(format!(
            "graph kind differs: baseline {:?}, candidate {:?}",
            signature.graph_kind, candidate.graph_kind
        ));
    }
    if signature.sample_var != candidate.sample_var {
        return Some(format!(
            "sample variable differs: baseline {:?}, candidate {:?}",
            signature.sample_var, candidate.sample_var
        ));
    }
    if signature.x_unit != candidate.x_unit {
        return Some(format!(
            "x axis unit differs: baseline {:?}, candidate {:?}",
            signature.x_unit, candidate.x_unit
        ));
    }
    if signature.y_unit != candidate.y_unit {
        return Some(format!(
            "y axis unit differs: baseline {:?}, candidate {:?}",
            signature.y_unit, candidate.y_unit
        ));
    }
    if signature.x_kind != candidate.x_kind {
        return Some(format!(
            "x axis kind differs: baseline {:?}, candidate {:?}",
            signature.x_kind, candidate.x_kind
        ));
    }
    if signature.y_kind != candidate.y_kind {
        return Some(format!(
            "y axis kind differs: baseline {:?}, candidate {:?}",
            signature.y_kind, candidate.y_kind
        ));
    }
    if let (Some(baseline_sid), Some(candidate_sid)) = (series_id, run.series_id.as_deref()) {
        if baseline_sid != candidate_sid {
            return Some(format!(
                "series id differs: baseline {:?}, candidate {:?}",
                baseline_sid, candidate_sid
            ));
        }
    }
    None
}
