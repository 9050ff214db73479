//! Diagram node representation: equipment, instruments, connectors, fittings

use crate::geometry::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a diagram node
///
/// Serializes as a plain string. Stable across sessions: the same id is
/// written to and read back from the persisted graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Semantic type of a diagram node
///
/// Drives splice eligibility, the persistence label taxonomy, attribute
/// flattening, and the default-shape fallback on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Reactor,
    FixedBedReactor,
    Exchanger,
    VerticalExchanger,
    Evaporator,
    GasCooler,
    Pump,
    LiquidPump,
    CentrifugalPump,
    DiaphragmPump,
    PistonPump,
    GearPump,
    JetPump,
    Compressor,
    Fan,
    Valve,
    ControlValve,
    Tank,
    Separator,
    Fitting,
    Instrument,
    TappingPoint,
    SafetyValve,
    RuptureDisc,
    BreatherValve,
    Trap,
    Filter,
    FlameArrester,
    SightGlass,
    Silencer,
    OffPageConnector,
    Frame,
    Other,
}

impl NodeKind {
    /// Inline-capable kinds sit "on" a pipe run: they are splice targets and
    /// are excluded from routing obstacles for the pipes terminating on them.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::ControlValve | NodeKind::Valve | NodeKind::Fitting | NodeKind::TappingPoint
        )
    }

    /// Fittings connect in any orientation; they bypass the splice
    /// orientation gate.
    pub fn is_omnidirectional(&self) -> bool {
        matches!(self, NodeKind::Fitting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Reactor => "Reactor",
            NodeKind::FixedBedReactor => "FixedBedReactor",
            NodeKind::Exchanger => "Exchanger",
            NodeKind::VerticalExchanger => "VerticalExchanger",
            NodeKind::Evaporator => "Evaporator",
            NodeKind::GasCooler => "GasCooler",
            NodeKind::Pump => "Pump",
            NodeKind::LiquidPump => "LiquidPump",
            NodeKind::CentrifugalPump => "CentrifugalPump",
            NodeKind::DiaphragmPump => "DiaphragmPump",
            NodeKind::PistonPump => "PistonPump",
            NodeKind::GearPump => "GearPump",
            NodeKind::JetPump => "JetPump",
            NodeKind::Compressor => "Compressor",
            NodeKind::Fan => "Fan",
            NodeKind::Valve => "Valve",
            NodeKind::ControlValve => "ControlValve",
            NodeKind::Tank => "Tank",
            NodeKind::Separator => "Separator",
            NodeKind::Fitting => "Fitting",
            NodeKind::Instrument => "Instrument",
            NodeKind::TappingPoint => "TappingPoint",
            NodeKind::SafetyValve => "SafetyValve",
            NodeKind::RuptureDisc => "RuptureDisc",
            NodeKind::BreatherValve => "BreatherValve",
            NodeKind::Trap => "Trap",
            NodeKind::Filter => "Filter",
            NodeKind::FlameArrester => "FlameArrester",
            NodeKind::SightGlass => "SightGlass",
            NodeKind::Silencer => "Silencer",
            NodeKind::OffPageConnector => "OffPageConnector",
            NodeKind::Frame => "Frame",
            NodeKind::Other => "Other",
        }
    }

    /// Parse a persisted kind string; unrecognized kinds map to `Other`.
    pub fn parse(s: &str) -> NodeKind {
        match s {
            "Reactor" => NodeKind::Reactor,
            "FixedBedReactor" => NodeKind::FixedBedReactor,
            "Exchanger" => NodeKind::Exchanger,
            "VerticalExchanger" => NodeKind::VerticalExchanger,
            "Evaporator" => NodeKind::Evaporator,
            "GasCooler" => NodeKind::GasCooler,
            "Pump" => NodeKind::Pump,
            "LiquidPump" => NodeKind::LiquidPump,
            "CentrifugalPump" => NodeKind::CentrifugalPump,
            "DiaphragmPump" => NodeKind::DiaphragmPump,
            "PistonPump" => NodeKind::PistonPump,
            "GearPump" => NodeKind::GearPump,
            "JetPump" => NodeKind::JetPump,
            "Compressor" => NodeKind::Compressor,
            "Fan" => NodeKind::Fan,
            "Valve" => NodeKind::Valve,
            "ControlValve" => NodeKind::ControlValve,
            "Tank" => NodeKind::Tank,
            "Separator" => NodeKind::Separator,
            "Fitting" => NodeKind::Fitting,
            "Instrument" => NodeKind::Instrument,
            "TappingPoint" => NodeKind::TappingPoint,
            "SafetyValve" => NodeKind::SafetyValve,
            "RuptureDisc" => NodeKind::RuptureDisc,
            "BreatherValve" => NodeKind::BreatherValve,
            "Trap" => NodeKind::Trap,
            "Filter" => NodeKind::Filter,
            "FlameArrester" => NodeKind::FlameArrester,
            "SightGlass" => NodeKind::SightGlass,
            "Silencer" => NodeKind::Silencer,
            "OffPageConnector" => NodeKind::OffPageConnector,
            "Frame" => NodeKind::Frame,
            _ => NodeKind::Other,
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow direction a port accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    In,
    Out,
    #[serde(rename = "bi")]
    #[default]
    Bidirectional,
}

/// One axis of a port's position in the node's unrotated local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum PortOffset {
    /// Fraction of the node's size along this axis (0.0..=1.0)
    Percent(f64),
    /// Absolute offset from the node origin, in canvas units
    Absolute(f64),
}

impl PortOffset {
    /// Resolve against the node extent along this axis
    pub fn resolve(&self, extent: f64) -> f64 {
        match self {
            PortOffset::Percent(f) => f * extent,
            PortOffset::Absolute(v) => *v,
        }
    }
}

/// A connection point on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Unique within the owning node
    pub id: String,
    /// Visual group the port renders with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub x: PortOffset,
    pub y: PortOffset,
    #[serde(default)]
    pub direction: PortDirection,
    /// Semantic zone, e.g. "ShellSide"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Sub-zone within the region, e.g. "Vapor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Port {
    pub fn new(id: impl Into<String>, x: PortOffset, y: PortOffset) -> Self {
        Self {
            id: id.into(),
            group: None,
            x,
            y,
            direction: PortDirection::Bidirectional,
            region: None,
            section: None,
            description: None,
        }
    }

    pub fn with_direction(mut self, direction: PortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Position in the node's unrotated local frame
    pub fn local_position(&self, size: Size) -> Point {
        Point::new(self.x.resolve(size.w), self.y.resolve(size.h))
    }
}

/// Where a node's tag label renders relative to its rotated extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
    Center,
}

/// Semantic attributes, selected by the node's type class
///
/// Replaces the loosely-typed per-node attribute bag of ad hoc presence
/// checks with exhaustive matching. Every field is optional: forms fill in
/// what they know and persistence flattens only what is present.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum NodeAttrs {
    /// Vessels, reactors, separators
    Vessel {
        spec: Option<String>,
        volume: Option<String>,
        material: Option<String>,
        design_pressure: Option<String>,
        design_temp: Option<String>,
        internals: Option<String>,
    },
    /// Pumps, compressors, fans
    Machine {
        spec: Option<String>,
        flow: Option<String>,
        head: Option<String>,
        power: Option<String>,
        material: Option<String>,
    },
    Exchanger {
        spec: Option<String>,
        area: Option<String>,
        material: Option<String>,
        design_pressure: Option<String>,
        tube_pressure: Option<String>,
    },
    Valve {
        spec: Option<String>,
        size: Option<String>,
        valve_class: Option<String>,
        fail_position: Option<String>,
    },
    Instrument {
        spec: Option<String>,
        range: Option<String>,
        unit: Option<String>,
        /// Tag function letters, e.g. "FIC"
        tag_function: Option<String>,
        loop_number: Option<String>,
    },
    /// Cross-page connector
    Connector {
        spec: Option<String>,
        target_drawing_id: Option<String>,
        connector_label: Option<String>,
    },
    #[default]
    Generic,
}

impl NodeAttrs {
    /// The empty attribute set appropriate for a node kind
    pub fn for_kind(kind: NodeKind) -> NodeAttrs {
        match kind {
            NodeKind::Reactor
            | NodeKind::FixedBedReactor
            | NodeKind::Tank
            | NodeKind::Separator => NodeAttrs::Vessel {
                spec: None,
                volume: None,
                material: None,
                design_pressure: None,
                design_temp: None,
                internals: None,
            },
            NodeKind::Pump
            | NodeKind::LiquidPump
            | NodeKind::CentrifugalPump
            | NodeKind::DiaphragmPump
            | NodeKind::PistonPump
            | NodeKind::GearPump
            | NodeKind::JetPump
            | NodeKind::Compressor
            | NodeKind::Fan => NodeAttrs::Machine {
                spec: None,
                flow: None,
                head: None,
                power: None,
                material: None,
            },
            NodeKind::Exchanger
            | NodeKind::VerticalExchanger
            | NodeKind::Evaporator
            | NodeKind::GasCooler => NodeAttrs::Exchanger {
                spec: None,
                area: None,
                material: None,
                design_pressure: None,
                tube_pressure: None,
            },
            NodeKind::Valve | NodeKind::ControlValve => NodeAttrs::Valve {
                spec: None,
                size: None,
                valve_class: None,
                fail_position: None,
            },
            NodeKind::Instrument => NodeAttrs::Instrument {
                spec: None,
                range: None,
                unit: None,
                tag_function: None,
                loop_number: None,
            },
            NodeKind::OffPageConnector => NodeAttrs::Connector {
                spec: None,
                target_drawing_id: None,
                connector_label: None,
            },
            _ => NodeAttrs::Generic,
        }
    }
}

/// A node on the diagram canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Visual shape kind from the catalog, e.g. "p-cv-manual"
    pub shape_kind: String,
    pub position: Point,
    pub size: Size,
    pub rotation_deg: f64,
    pub ports: Vec<Port>,
    /// Equipment/instrument tag, e.g. "P-101"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub label_position: LabelPosition,
    pub attrs: NodeAttrs,
    /// Background nodes are never edge endpoints and are never persisted
    #[serde(default)]
    pub is_background: bool,
}

impl DiagramNode {
    pub fn new(kind: NodeKind, shape_kind: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            shape_kind: shape_kind.into(),
            position: Point::default(),
            size: Size::default(),
            rotation_deg: 0.0,
            ports: Vec::new(),
            tag: None,
            description: None,
            label_position: LabelPosition::default(),
            attrs: NodeAttrs::for_kind(kind),
            is_background: false,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_size(mut self, w: f64, h: f64) -> Self {
        self.size = Size::new(w, h);
        self
    }

    pub fn with_rotation(mut self, deg: f64) -> Self {
        self.rotation_deg = deg;
        self
    }

    /// Add a port, dropping it with a warning if the id is already taken.
    /// Port ids must be unique within a node.
    pub fn with_port(mut self, port: Port) -> Self {
        if self.ports.iter().any(|p| p.id == port.id) {
            tracing::warn!(node = %self.id, port = %port.id, "duplicate port id dropped");
        } else {
            self.ports.push(port);
        }
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_attrs(mut self, attrs: NodeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn background(mut self) -> Self {
        self.is_background = true;
        self
    }

    pub fn bbox(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bbox().center()
    }

    pub fn port(&self, id: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    pub fn is_inline(&self) -> bool {
        self.kind.is_inline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_port_id_dropped() {
        let node = DiagramNode::new(NodeKind::Valve, "p-cv-manual")
            .with_port(Port::new("left", PortOffset::Percent(0.0), PortOffset::Percent(0.5)))
            .with_port(Port::new("left", PortOffset::Percent(1.0), PortOffset::Percent(0.5)))
            .with_port(Port::new("right", PortOffset::Percent(1.0), PortOffset::Percent(0.5)));

        assert_eq!(node.ports.len(), 2);
        let mut seen = std::collections::HashSet::new();
        assert!(node.ports.iter().all(|p| seen.insert(p.id.clone())));
    }

    #[test]
    fn test_inline_kinds() {
        assert!(NodeKind::Valve.is_inline());
        assert!(NodeKind::ControlValve.is_inline());
        assert!(NodeKind::Fitting.is_inline());
        assert!(NodeKind::TappingPoint.is_inline());
        assert!(!NodeKind::Pump.is_inline());
        assert!(!NodeKind::Instrument.is_inline());
    }

    #[test]
    fn test_kind_roundtrip() {
        for kind in [NodeKind::Reactor, NodeKind::OffPageConnector, NodeKind::TappingPoint] {
            assert_eq!(NodeKind::parse(kind.as_str()), kind);
        }
        assert_eq!(NodeKind::parse("SomethingNew"), NodeKind::Other);
    }

    #[test]
    fn test_port_offset_resolution() {
        let port = Port::new("top", PortOffset::Percent(0.5), PortOffset::Absolute(-4.0));
        let local = port.local_position(Size::new(80.0, 40.0));
        assert_eq!(local, crate::geometry::Point::new(40.0, -4.0));
    }

    #[test]
    fn test_attrs_for_kind() {
        assert!(matches!(NodeAttrs::for_kind(NodeKind::Instrument), NodeAttrs::Instrument { .. }));
        assert!(matches!(NodeAttrs::for_kind(NodeKind::Tank), NodeAttrs::Vessel { .. }));
        assert!(matches!(NodeAttrs::for_kind(NodeKind::Fitting), NodeAttrs::Generic));
    }
}
