//! Shape catalog: immutable library of shape definitions
//!
//! Loaded once at startup and passed by reference to anything needing shape
//! metadata. Registration is defensive about malformed definitions: a
//! duplicate port id within a shape is logged and dropped rather than
//! rejected.

use crate::geometry::Size;
use crate::model::{DiagramNode, NodeAttrs, NodeKind, Port, PortDirection, PortOffset};
use std::collections::HashMap;
use tracing::warn;

/// Well-known shape kind of the tapping-point marker
pub const TAPPING_POINT_SHAPE: &str = "tapping-point";

/// Well-known shape kind of the background sheet frame
pub const FRAME_SHAPE: &str = "drawing-frame-a2";

/// A registered shape: visual kind plus default size, ports, and semantics
#[derive(Debug, Clone)]
pub struct ShapeDef {
    pub shape_kind: String,
    pub kind: NodeKind,
    pub size: Size,
    pub ports: Vec<Port>,
}

impl ShapeDef {
    pub fn new(shape_kind: impl Into<String>, kind: NodeKind, size: Size) -> Self {
        Self {
            shape_kind: shape_kind.into(),
            kind,
            size,
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }
}

/// Immutable library of shape definitions keyed by shape kind
#[derive(Debug, Default)]
pub struct ShapeCatalog {
    shapes: HashMap<String, ShapeDef>,
}

impl ShapeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape definition. Duplicate port ids within the shape are
    /// dropped with a warning; a re-registered shape kind replaces the
    /// earlier definition.
    pub fn register(&mut self, mut def: ShapeDef) {
        let mut seen = std::collections::HashSet::new();
        def.ports.retain(|p| {
            let fresh = seen.insert(p.id.clone());
            if !fresh {
                warn!(shape = %def.shape_kind, port = %p.id, "duplicate port id in shape definition, dropping");
            }
            fresh
        });
        self.shapes.insert(def.shape_kind.clone(), def);
    }

    pub fn get(&self, shape_kind: &str) -> Option<&ShapeDef> {
        self.shapes.get(shape_kind)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Instantiate a fresh diagram node from a registered shape
    pub fn instantiate(&self, shape_kind: &str) -> Option<DiagramNode> {
        let def = self.shapes.get(shape_kind)?;
        let mut node = DiagramNode::new(def.kind, def.shape_kind.clone())
            .with_size(def.size.w, def.size.h)
            .with_attrs(NodeAttrs::for_kind(def.kind));
        for port in &def.ports {
            node = node.with_port(port.clone());
        }
        if def.kind == NodeKind::Frame {
            node = node.background();
        }
        Some(node)
    }

    /// The built-in shape library used when no external catalog is supplied
    pub fn builtin() -> Self {
        let mut catalog = Self::new();

        let inline_two_port = |id: &str, kind: NodeKind| {
            ShapeDef::new(id, kind, Size::new(40.0, 40.0))
                .with_port(Port::new(
                    "left",
                    PortOffset::Percent(0.0),
                    PortOffset::Percent(0.5),
                ))
                .with_port(Port::new(
                    "right",
                    PortOffset::Percent(1.0),
                    PortOffset::Percent(0.5),
                ))
        };

        catalog.register(inline_two_port("p-cv-manual", NodeKind::Valve));
        catalog.register(
            inline_two_port("p-cv-pneumatic", NodeKind::ControlValve).with_port(
                Port::new("actuator", PortOffset::Percent(0.5), PortOffset::Percent(0.0))
                    .with_direction(PortDirection::In)
                    .with_description("actuator signal"),
            ),
        );
        catalog.register(
            ShapeDef::new("p-tee", NodeKind::Fitting, Size::new(30.0, 30.0))
                .with_port(Port::new("left", PortOffset::Percent(0.0), PortOffset::Percent(0.5)))
                .with_port(Port::new("right", PortOffset::Percent(1.0), PortOffset::Percent(0.5)))
                .with_port(Port::new("branch", PortOffset::Percent(0.5), PortOffset::Percent(1.0))),
        );
        catalog.register(ShapeDef::new(
            TAPPING_POINT_SHAPE,
            NodeKind::TappingPoint,
            Size::new(12.0, 12.0),
        ));
        catalog.register(
            ShapeDef::new("p-inst-remote", NodeKind::Instrument, Size::new(40.0, 40.0)).with_port(
                Port::new("signal", PortOffset::Percent(0.5), PortOffset::Percent(1.0)),
            ),
        );
        catalog.register(
            ShapeDef::new("p-centrifugalpump", NodeKind::CentrifugalPump, Size::new(60.0, 60.0))
                .with_port(
                    Port::new("suction", PortOffset::Percent(0.0), PortOffset::Percent(0.5))
                        .with_direction(PortDirection::In),
                )
                .with_port(
                    Port::new("discharge", PortOffset::Percent(1.0), PortOffset::Percent(0.2))
                        .with_direction(PortDirection::Out),
                ),
        );
        catalog.register(
            ShapeDef::new("p-tank", NodeKind::Tank, Size::new(100.0, 140.0))
                .with_port(
                    Port::new("inlet", PortOffset::Percent(0.5), PortOffset::Percent(0.0))
                        .with_direction(PortDirection::In)
                        .with_region("Top"),
                )
                .with_port(
                    Port::new("outlet", PortOffset::Percent(0.5), PortOffset::Percent(1.0))
                        .with_direction(PortDirection::Out)
                        .with_region("Bottom"),
                ),
        );
        catalog.register(
            ShapeDef::new("p-opc", NodeKind::OffPageConnector, Size::new(60.0, 30.0)).with_port(
                Port::new("flow", PortOffset::Percent(0.0), PortOffset::Percent(0.5)),
            ),
        );
        catalog.register(ShapeDef::new(
            FRAME_SHAPE,
            NodeKind::Frame,
            Size::new(2245.0, 1587.0),
        ));

        catalog
    }
}

/// Default shape kind for a semantic type, used when a persisted node
/// predates the packed layout field and carries no shape of its own.
pub fn default_shape_kind(kind: NodeKind, spec: Option<&str>) -> &'static str {
    match kind {
        NodeKind::Reactor => "p-r101",
        NodeKind::FixedBedReactor => "p-fixedbedreactor",
        NodeKind::Exchanger => "p-e101",
        NodeKind::VerticalExchanger => "p-exchangervertical",
        NodeKind::Evaporator => "p-e13",
        NodeKind::GasCooler => "p-gascooler",
        NodeKind::Pump | NodeKind::CentrifugalPump => "p-centrifugalpump",
        NodeKind::LiquidPump => "p-p101",
        NodeKind::DiaphragmPump => "p-diaphragmpump",
        NodeKind::PistonPump => "p-pistonpump",
        NodeKind::GearPump => "p-gearpump",
        NodeKind::JetPump => "p-jetpump",
        NodeKind::Compressor => "p-compressor",
        NodeKind::Fan => "p-fan",
        NodeKind::ControlValve => "p-cv-pneumatic",
        NodeKind::Valve => "p-cv-manual",
        NodeKind::Fitting => "p-tee",
        NodeKind::Tank => match spec {
            Some("Vertical") => "p-tankvertical",
            _ => "p-tank",
        },
        NodeKind::Trap => "p-trap",
        NodeKind::Instrument => match spec {
            Some("Local") => "p-inst-local",
            Some("Panel") => "p-inst-panel",
            _ => "p-inst-remote",
        },
        NodeKind::TappingPoint => TAPPING_POINT_SHAPE,
        NodeKind::OffPageConnector => "p-opc",
        _ => "p-valve",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_drops_duplicate_port_ids() {
        let mut catalog = ShapeCatalog::new();
        let def = ShapeDef::new("p-bad", NodeKind::Valve, Size::new(40.0, 40.0))
            .with_port(Port::new("a", PortOffset::Percent(0.0), PortOffset::Percent(0.5)))
            .with_port(Port::new("a", PortOffset::Percent(1.0), PortOffset::Percent(0.5)));
        catalog.register(def);
        assert_eq!(catalog.get("p-bad").unwrap().ports.len(), 1);
    }

    #[test]
    fn test_instantiate_builtin_valve() {
        let catalog = ShapeCatalog::builtin();
        let node = catalog.instantiate("p-cv-manual").unwrap();
        assert_eq!(node.kind, NodeKind::Valve);
        assert_eq!(node.ports.len(), 2);
        assert!(node.is_inline());
    }

    #[test]
    fn test_instantiate_frame_is_background() {
        let catalog = ShapeCatalog::builtin();
        let node = catalog.instantiate(FRAME_SHAPE).unwrap();
        assert!(node.is_background);
    }

    #[test]
    fn test_tapping_point_has_no_configurable_ports() {
        let catalog = ShapeCatalog::builtin();
        let node = catalog.instantiate(TAPPING_POINT_SHAPE).unwrap();
        assert!(node.ports.is_empty());
    }

    #[test]
    fn test_default_shape_kind_spec_variants() {
        assert_eq!(default_shape_kind(NodeKind::Tank, Some("Vertical")), "p-tankvertical");
        assert_eq!(default_shape_kind(NodeKind::Tank, None), "p-tank");
        assert_eq!(default_shape_kind(NodeKind::Instrument, Some("Local")), "p-inst-local");
        assert_eq!(default_shape_kind(NodeKind::Other, None), "p-valve");
    }
}
