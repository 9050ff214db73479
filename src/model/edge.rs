//! Diagram edge representation: pipes and instrument signals

use super::node::NodeId;
use crate::geometry::Point;
use crate::style::EdgeStyle;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a diagram edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Create a new random EdgeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create an EdgeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subtype of a signal edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// Instrument reads a process value from a tapping point
    Measures,
    /// Instrument drives an actuator
    Controls,
}

/// Kind of a diagram edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "relation")]
pub enum EdgeKind {
    Pipe,
    Signal(SignalKind),
}

impl EdgeKind {
    pub fn is_pipe(&self) -> bool {
        matches!(self, EdgeKind::Pipe)
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, EdgeKind::Signal(_))
    }
}

/// One end of an edge: a node, optionally pinned to a specific port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

impl Endpoint {
    pub fn node(node: NodeId) -> Self {
        Self { node, port: None }
    }

    pub fn port(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: Some(port.into()),
        }
    }
}

/// Process attributes carried by a pipe run
///
/// Signal edges carry the same struct with `fluid = "Signal"`; only the fluid
/// is persisted for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeAttrs {
    /// Line tag rendered on the pipe label, e.g. "P-1001-50-CS"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub material: String,
    pub fluid: String,
    /// Diameter class, e.g. "DN50"
    pub diameter: String,
    /// Pressure class, e.g. "PN16"
    pub pressure: String,
    /// Insulation kind: "None", trace classes "ST"/"ET"/"OT", or "Jacket*"
    pub insulation: String,
}

impl Default for PipeAttrs {
    fn default() -> Self {
        Self {
            tag: None,
            material: "CS".to_string(),
            fluid: "Water".to_string(),
            diameter: "DN50".to_string(),
            pressure: "PN16".to_string(),
            insulation: "None".to_string(),
        }
    }
}

impl PipeAttrs {
    /// Attributes for a signal line
    pub fn signal() -> Self {
        Self {
            fluid: "Signal".to_string(),
            ..Default::default()
        }
    }
}

/// An edge on the diagram canvas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramEdge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Ordered bend points between the endpoints
    pub waypoints: Vec<Point>,
    pub attrs: PipeAttrs,
    pub style: EdgeStyle,
    /// Routing obstacle exclusions, maintained by the routing policy
    #[serde(default)]
    pub route_exclusions: Vec<NodeId>,
}

impl DiagramEdge {
    pub fn new(kind: EdgeKind, source: Endpoint, target: Endpoint) -> Self {
        let attrs = match kind {
            EdgeKind::Pipe => PipeAttrs::default(),
            EdgeKind::Signal(_) => PipeAttrs::signal(),
        };
        let style = match kind {
            EdgeKind::Pipe => EdgeStyle::for_pipe(&attrs),
            EdgeKind::Signal(_) => EdgeStyle::signal(),
        };
        Self {
            id: EdgeId::new(),
            kind,
            source,
            target,
            waypoints: Vec::new(),
            attrs,
            style,
            route_exclusions: Vec::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: PipeAttrs) -> Self {
        if self.kind.is_pipe() {
            self.style = EdgeStyle::for_pipe(&attrs);
        }
        self.attrs = attrs;
        self
    }

    pub fn with_style(mut self, style: EdgeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_waypoints(mut self, waypoints: Vec<Point>) -> Self {
        self.waypoints = waypoints;
        self
    }

    /// True when this edge touches the given node
    pub fn touches(&self, node: &NodeId) -> bool {
        self.source.node == *node || self.target.node == *node
    }
}
