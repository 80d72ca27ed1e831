//! Viewport transform and the fixed64 tag-to-target projection.
//!
//! Fixed-point resource writes can land directly on live axis bounds, pan,
//! zoom, or the viewport rect without a full reprocess. The mapping from tag
//! to target is injected config with sensible defaults.

use crate::store::ViewSet;
use serde::Serialize;
use std::collections::BTreeMap;

/// Transform handed to the renderer alongside the views. The renderer decides
/// pixels independently.
#[derive(Debug, Clone, Serialize)]
pub struct Viewport {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub auto_fit: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
}

impl Default for Viewport {
    fn default() -> Viewport {
        Viewport {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
            auto_fit: true,
            rect: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Where a fixed64 write lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixed64Target {
    AxisXMin,
    AxisXMax,
    AxisYMin,
    AxisYMax,
    PanX,
    PanY,
    Zoom,
    RectX,
    RectY,
    RectW,
    RectH,
}

/// Injected tag-to-target mapping.
#[derive(Debug, Clone)]
pub struct Fixed64Map {
    map: BTreeMap<String, Fixed64Target>,
}

impl Default for Fixed64Map {
    fn default() -> Fixed64Map {
        let mut map = BTreeMap::new();
        map.insert("axis.x.min".to_string(), Fixed64Target::AxisXMin);
        map.insert("axis.x.max".to_string(), Fixed64Target::AxisXMax);
        map.insert("axis.y.min".to_string(), Fixed64Target::AxisYMin);
        map.insert("axis.y.max".to_string(), Fixed64Target::AxisYMax);
        map.insert("view.pan.x".to_string(), Fixed64Target::PanX);
        map.insert("view.pan.y".to_string(), Fixed64Target::PanY);
        map.insert("view.zoom".to_string(), Fixed64Target::Zoom);
        map.insert("view.rect.x".to_string(), Fixed64Target::RectX);
        map.insert("view.rect.y".to_string(), Fixed64Target::RectY);
        map.insert("view.rect.w".to_string(), Fixed64Target::RectW);
        map.insert("view.rect.h".to_string(), Fixed64Target::RectH);
        Fixed64Map { map }
    }
}

impl Fixed64Map {
    pub fn target(&self, tag: &str) -> Option<Fixed64Target> {
        self.map.get(tag).copied()
    }

    pub fn bind(&mut self, tag: impl Into<String>, target: Fixed64Target) {
        self.map.insert(tag.into(), target);
    }
}

/// Project one fixed64 value onto its live target. Axis targets mutate the
/// live graph's axis and drop auto-fit; pan/zoom/rect mutate the viewport.
/// Axis writes with no live graph land nowhere; the next full validation
/// recomputes the axis from the payload anyway.
pub fn apply_fixed64_target(
    viewport: &mut Viewport,
    views: &mut ViewSet,
    target: Fixed64Target,
    value: f64,
) {
    use Fixed64Target::*;

    match target {
        PanX => viewport.pan_x = value,
        PanY => viewport.pan_y = value,
        Zoom => viewport.zoom = value,
        RectX => rect_mut(viewport).x = value,
        RectY => rect_mut(viewport).y = value,
        RectW => rect_mut(viewport).w = value,
        RectH => rect_mut(viewport).h = value,
        AxisXMin | AxisXMax | AxisYMin | AxisYMax => {
            if let Some(graph) = views.graph.as_mut() {
                match target {
                    AxisXMin => graph.axis.x_min = Some(value),
                    AxisXMax => graph.axis.x_max = Some(value),
                    AxisYMin => graph.axis.y_min = Some(value),
                    AxisYMax => graph.axis.y_max = Some(value),
                    _ => {}
                }
                viewport.auto_fit = false;
            }
        }
    }
}

fn rect_mut(viewport: &mut Viewport) -> &mut Rect {
    viewport.rect.get_or_insert_with(Rect::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Graph, SCHEMA_GRAPH};

    #[test]
    fn rect_components_build_up_a_rect() {
        let mut viewport = Viewport::default();
        let mut views = ViewSet::default();

        apply_fixed64_target(&mut viewport, &mut views, Fixed64Target::RectW, 640.0);
        apply_fixed64_target(&mut viewport, &mut views, Fixed64Target::RectH, 480.0);

        let rect = viewport.rect.unwrap();
        assert_eq!((rect.w, rect.h), (640.0, 480.0));
        assert_eq!((rect.x, rect.y), (0.0, 0.0));
    }

    #[test]
    fn axis_target_lands_on_live_graph_and_drops_auto_fit() {
        let mut viewport = Viewport::default();
        let mut views = ViewSet::default();
        views.graph = Some(
            Graph::validate(
                SCHEMA_GRAPH,
                r#"{"schema":"viz.graph.v1","series":[{"points":[{"x":0,"y":0}]}]}"#,
            )
            .unwrap(),
        );

        apply_fixed64_target(&mut viewport, &mut views, Fixed64Target::AxisXMax, 9.5);

        assert_eq!(views.graph.as_ref().unwrap().axis.x_max, Some(9.5));
        assert!(!viewport.auto_fit);
    }

    #[test]
    fn axis_target_without_live_graph_is_a_no_op() {
        let mut viewport = Viewport::default();
        let mut views = ViewSet::default();
        apply_fixed64_target(&mut viewport, &mut views, Fixed64Target::AxisYMin, 1.0);
        assert!(viewport.auto_fit);
    }
}
