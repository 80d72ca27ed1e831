//! Report assembly for the replay harness: a JSON snapshot of the projection
//! state after a stream has been applied (data embedded as one object).

use crate::context::ProjectionContext;
use crate::overlay::{CompareRole, CompareStatus, RunId};
use crate::store::Viewport;
use crate::view::{Graph, Space2d, Structure, Table, Text};
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TotalsView {
    pub ticks: u64,
    pub view_refreshes: u64,
    pub fixed64_changes: u64,
    pub value_changes: u64,
    pub full_reprocesses: u64,
}

#[derive(Debug, Serialize)]
pub struct ViewsReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space2d: Option<Space2d>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,
}

#[derive(Debug, Serialize)]
pub struct LensReport {
    pub enabled: bool,
    pub x_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2_key: Option<String>,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph: Option<Graph>,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub id: RunId,
    pub label: String,
    pub points: usize,
    pub layer_index: u32,
    pub opacity: f64,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_role: Option<CompareRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReportData {
    pub totals: TotalsView,
    pub views: ViewsReport,
    pub viewport: Viewport,
    pub lens: LensReport,
    /// Runs ascending by layer index (render order).
    pub runs: Vec<RunReport>,
    pub compare: CompareStatus,
}

pub fn build_report(ctx: &ProjectionContext, totals: TotalsView) -> ReportData {
    ReportData {
        totals,
        views: ViewsReport {
            graph: ctx.views.graph.clone(),
            space2d: ctx.views.space2d.clone(),
            table: ctx.views.table.clone(),
            text: ctx.views.text.clone(),
            structure: ctx.views.structure.clone(),
        },
        viewport: ctx.viewport.clone(),
        lens: LensReport {
            enabled: ctx.lens.enabled(),
            x_key: ctx.lens.x_key().to_string(),
            y_key: ctx.lens.y_key().map(str::to_string),
            y2_key: ctx.lens.y2_key().map(str::to_string),
            samples: ctx.lens.samples().len(),
            graph: ctx.lens_graph().cloned(),
        },
        runs: ctx
            .runs
            .ordered()
            .into_iter()
            .map(|run| RunReport {
                id: run.id,
                label: run.label.clone(),
                points: run.points.len(),
                layer_index: run.layer_index,
                opacity: run.opacity,
                visible: run.visible,
                compare_role: run.compare_role,
                series_id: run.series_id.clone(),
            })
            .collect(),
        compare: ctx.compare_status(),
    }
}

pub fn render_json_report(data: &ReportData) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}
