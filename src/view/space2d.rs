//! 2D scene view: scatter points, primitive shapes, or a raw draw list.

use crate::view::ViewError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Space2d {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<SpacePoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Shape>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drawlist: Vec<DrawCmd>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacePoint {
    pub x: f64,
    pub y: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: String,
    pub x: f64,
    pub y: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCmd {
    pub op: String,

    #[serde(default)]
    pub args: Vec<f64>,
}

impl Space2d {
    /// Strict validation: at least one of points/shapes/drawlist must be
    /// non-empty, and every required numeric field must be finite.
    pub fn validate(raw: &str) -> Result<Space2d, ViewError> {
        let scene: Space2d = serde_json::from_str(raw)?;

        if scene.points.is_empty() && scene.shapes.is_empty() && scene.drawlist.is_empty() {
            return Err(ViewError::Space2d(
                "needs at least one of points, shapes, drawlist".to_string(),
            ));
        }

        for (i, p) in scene.points.iter().enumerate() {
            let size_ok = p.size.is_none_or(f64::is_finite);
            if !p.x.is_finite() || !p.y.is_finite() || !size_ok {
                return Err(ViewError::Space2d(format!("point {} has a non-finite field", i)));
            }
        }
        for (i, s) in scene.shapes.iter().enumerate() {
            let opt_ok = s.w.is_none_or(f64::is_finite)
                && s.h.is_none_or(f64::is_finite)
                && s.r.is_none_or(f64::is_finite);
            if !s.x.is_finite() || !s.y.is_finite() || !opt_ok {
                return Err(ViewError::Space2d(format!(
                    "shape {} ({:?}) has a non-finite field",
                    i, s.kind
                )));
            }
        }
        for (i, cmd) in scene.drawlist.iter().enumerate() {
            if cmd.args.iter().any(|a| !a.is_finite()) {
                return Err(ViewError::Space2d(format!(
                    "draw command {} ({:?}) has a non-finite arg",
                    i, cmd.op
                )));
            }
        }

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_rejected() {
        assert!(Space2d::validate("{}").is_err());
        assert!(Space2d::validate(r#"{"points":[],"shapes":[]}"#).is_err());
    }

    #[test]
    fn any_non_empty_list_accepted() {
        let scene = Space2d::validate(r#"{"shapes":[{"kind":"rect","x":0,"y":0,"w":2,"h":3}]}"#)
            .unwrap();
        assert_eq!(scene.shapes.len(), 1);
        assert!(scene.points.is_empty());
    }
}
