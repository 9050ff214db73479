//! Presentation rules: fluid colors, edge stroke styles, label placement
//!
//! Persistence stores only process attributes; stroke weight, dash, and color
//! are re-derived from fluid and insulation on every load.

use crate::geometry::{Point, Size};
use crate::model::LabelPosition;
use serde::{Deserialize, Serialize};

/// Distance between a node's rotated extent and its tag label
const LABEL_PADDING: f64 = 15.0;

/// Stroke color for a process fluid
pub fn fluid_color(fluid: &str) -> &'static str {
    match fluid {
        "Water" => "#1890ff",
        "Steam" => "#ff4d4f",
        "Air" => "#52c41a",
        "N2" => "#13c2c2",
        "Oil" => "#fa8c16",
        "Salt" => "#722ed1",
        "Naphthalene" => "#8c8c8c",
        "PA" => "#eb2f96",
        "CrudePA" => "#f759ab",
        "ProductGas" => "#faad14",
        "TailGas" => "#bfbfbf",
        "Signal" => "#888888",
        _ => "#5F95FF",
    }
}

/// Rendered stroke of an edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeStyle {
    pub stroke: String,
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke: "#5F95FF".to_string(),
            width: 2.0,
            dash: None,
        }
    }
}

impl EdgeStyle {
    /// Style for a pipe run. Jacketed pipes render heavy in the heating-oil
    /// color; trace-heated pipes render dashed.
    pub fn for_pipe(attrs: &crate::model::PipeAttrs) -> Self {
        let mut style = Self {
            stroke: fluid_color(&attrs.fluid).to_string(),
            width: 2.0,
            dash: None,
        };
        if attrs.insulation.starts_with("Jacket") {
            style.width = 4.0;
            style.stroke = fluid_color("Oil").to_string();
        } else if matches!(attrs.insulation.as_str(), "ST" | "ET" | "OT") {
            style.dash = Some("5 5".to_string());
        }
        style
    }

    /// Thin dashed grey style for signal lines
    pub fn signal() -> Self {
        Self {
            stroke: fluid_color("Signal").to_string(),
            width: 1.0,
            dash: Some("4 4".to_string()),
        }
    }
}

/// Offset of a node's tag label in the node's unrotated local frame.
///
/// The label sits outside the node's rotated visual extent (plus padding) on
/// the requested side, then the offset is counter-rotated into the local
/// frame so the label stays put visually as the node rotates.
pub fn label_offset(position: LabelPosition, size: Size, rotation_deg: f64) -> Point {
    let rad = rotation_deg.to_radians();
    let sin = rad.sin().abs();
    let cos = rad.cos().abs();
    let visual_half_w = (size.w * cos + size.h * sin) / 2.0;
    let visual_half_h = (size.w * sin + size.h * cos) / 2.0;

    let (vx, vy) = match position {
        LabelPosition::Top => (0.0, -(visual_half_h + LABEL_PADDING)),
        LabelPosition::Bottom => (0.0, visual_half_h + LABEL_PADDING),
        LabelPosition::Left => (-(visual_half_w + LABEL_PADDING), 0.0),
        LabelPosition::Right => (visual_half_w + LABEL_PADDING, 0.0),
        LabelPosition::Center => (0.0, 0.0),
    };

    let local_rad = (-rotation_deg).to_radians();
    Point::new(
        vx * local_rad.cos() - vy * local_rad.sin(),
        vx * local_rad.sin() + vy * local_rad.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PipeAttrs;

    #[test]
    fn test_fluid_colors() {
        assert_eq!(fluid_color("Steam"), "#ff4d4f");
        assert_eq!(fluid_color("Signal"), "#888888");
        assert_eq!(fluid_color("SomethingElse"), "#5F95FF");
    }

    #[test]
    fn test_jacketed_pipe_renders_heavy() {
        let attrs = PipeAttrs {
            insulation: "JacketSteam".to_string(),
            ..Default::default()
        };
        let style = EdgeStyle::for_pipe(&attrs);
        assert_eq!(style.width, 4.0);
        assert_eq!(style.stroke, fluid_color("Oil"));
        assert!(style.dash.is_none());
    }

    #[test]
    fn test_traced_pipe_renders_dashed() {
        let attrs = PipeAttrs {
            insulation: "ST".to_string(),
            ..Default::default()
        };
        let style = EdgeStyle::for_pipe(&attrs);
        assert_eq!(style.dash.as_deref(), Some("5 5"));
        assert_eq!(style.width, 2.0);
    }

    #[test]
    fn test_signal_style() {
        let style = EdgeStyle::signal();
        assert_eq!(style.width, 1.0);
        assert_eq!(style.dash.as_deref(), Some("4 4"));
    }

    #[test]
    fn test_label_offset_unrotated_bottom() {
        let p = label_offset(LabelPosition::Bottom, Size::new(40.0, 40.0), 0.0);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_label_offset_counter_rotated() {
        // Rotated 90°, a "bottom" label must still appear below visually:
        // the local offset rotates to the local +x axis.
        let p = label_offset(LabelPosition::Bottom, Size::new(40.0, 40.0), 90.0);
        assert!((p.x - 35.0).abs() < 1e-6);
        assert!(p.y.abs() < 1e-6);
    }
}
