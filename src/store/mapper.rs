//! Mapping between the diagram model and persisted graph rows
//!
//! The persisted form is a property graph: assets labelled by a type
//! taxonomy, relationships classified as PIPE / CONTROLS / MEASURES, and a
//! packed layout blob carrying everything the canvas needs to re-render.
//! Process semantics live in flattened properties; presentation never does.

use super::traits::{StorageError, StorageResult};
use crate::catalog::{default_shape_kind, ShapeCatalog};
use crate::geometry::Point;
use crate::model::{
    Diagram, DiagramEdge, DiagramNode, EdgeKind, Endpoint, NodeAttrs, NodeId, NodeKind, PipeAttrs,
    SignalKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Base label carried by every persisted asset
pub const BASE_LABEL: &str = "Asset";

pub const REL_PIPE: &str = "PIPE";
pub const REL_CONTROLS: &str = "CONTROLS";
pub const REL_MEASURES: &str = "MEASURES";

/// Label carried only by cross-page connector assets; the link pass
/// matches on it so ordinary tagged equipment is never paired.
pub const CONNECTOR_LABEL: &str = "OffPageConnector";

/// Label taxonomy for a node kind, from general to specific. The base
/// `Asset` label always comes first; the last label is the concrete type.
pub fn type_labels(kind: NodeKind) -> Vec<&'static str> {
    let tail: &[&'static str] = match kind {
        NodeKind::Reactor => &["Equipment", "Reactor"],
        NodeKind::FixedBedReactor => &["Equipment", "Reactor", "FixedBedReactor"],
        NodeKind::Exchanger => &["Equipment", "Exchanger"],
        NodeKind::VerticalExchanger => &["Equipment", "Exchanger", "VerticalExchanger"],
        NodeKind::Evaporator => &["Equipment", "Exchanger", "Evaporator"],
        NodeKind::GasCooler => &["Equipment", "Exchanger", "GasCooler"],
        NodeKind::Pump => &["Equipment", "Pump"],
        NodeKind::LiquidPump => &["Equipment", "Pump", "LiquidPump"],
        NodeKind::CentrifugalPump => &["Equipment", "Pump", "CentrifugalPump"],
        NodeKind::DiaphragmPump => &["Equipment", "Pump", "DiaphragmPump"],
        NodeKind::PistonPump => &["Equipment", "Pump", "PistonPump"],
        NodeKind::GearPump => &["Equipment", "Pump", "GearPump"],
        NodeKind::JetPump => &["Equipment", "Pump", "JetPump"],
        NodeKind::Compressor => &["Equipment", "Pump", "Compressor"],
        NodeKind::Fan => &["Equipment", "Pump", "Fan"],
        NodeKind::Valve => &["Equipment", "Valve"],
        NodeKind::ControlValve => &["Equipment", "Valve", "ControlValve"],
        NodeKind::SafetyValve => &["Equipment", "Valve", "SafetyValve"],
        NodeKind::RuptureDisc => &["Equipment", "Valve", "RuptureDisc"],
        NodeKind::BreatherValve => &["Equipment", "Valve", "BreatherValve"],
        NodeKind::Tank => &["Equipment", "Tank"],
        NodeKind::Separator => &["Equipment", "Tank", "Separator"],
        NodeKind::Fitting => &["Equipment", "Fitting"],
        NodeKind::Trap => &["Equipment", "Fitting", "Trap"],
        NodeKind::Filter => &["Equipment", "Fitting", "Filter"],
        NodeKind::FlameArrester => &["Equipment", "Fitting", "FlameArrester"],
        NodeKind::SightGlass => &["Equipment", "Fitting", "SightGlass"],
        NodeKind::Silencer => &["Equipment", "Fitting", "Silencer"],
        NodeKind::Instrument => &["Instrument"],
        NodeKind::TappingPoint => &["Instrument", "Connection"],
        NodeKind::OffPageConnector => &["Instrument", "Connector", "OffPageConnector"],
        NodeKind::Frame | NodeKind::Other => &["Equipment", "Other"],
    };
    let mut labels = Vec::with_capacity(tail.len() + 1);
    labels.push(BASE_LABEL);
    labels.extend_from_slice(tail);
    labels
}

/// Compact canvas layout persisted alongside each asset.
///
/// Coordinates are rounded to whole canvas units on pack; sub-pixel noise
/// from drag gestures never reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedLayout {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Rotation in degrees
    #[serde(default)]
    pub a: f64,
    /// Shape kind, e.g. "p-cv-manual"
    pub s: String,
}

impl PackedLayout {
    pub fn pack(node: &DiagramNode) -> Self {
        Self {
            x: node.position.x.round(),
            y: node.position.y.round(),
            w: node.size.w.round(),
            h: node.size.h.round(),
            a: node.rotation_deg.round(),
            s: node.shape_kind.clone(),
        }
    }
}

/// One persisted asset
#[derive(Debug, Clone)]
pub struct AssetRow {
    pub id: String,
    pub labels: Vec<String>,
    /// Absent on rows written before layout packing existed
    pub layout: Option<PackedLayout>,
    pub props: Map<String, Value>,
}

/// One persisted relationship
#[derive(Debug, Clone)]
pub struct RelationshipRow {
    pub id: String,
    pub kind: String,
    pub source: String,
    pub target: String,
    pub props: Map<String, Value>,
}

fn put(props: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        props.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn put_opt(props: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        put(props, key, v);
    }
}

fn get_str(props: &Map<String, Value>, key: &str) -> Option<String> {
    props.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn get_f64(props: &Map<String, Value>, key: &str) -> Option<f64> {
    props.get(key).and_then(Value::as_f64)
}

/// Flatten a node into an asset row. Background nodes are presentation
/// scaffolding and must be filtered out by the caller.
pub fn node_to_row(node: &DiagramNode) -> AssetRow {
    let mut props = Map::new();
    props.insert("type".to_string(), Value::String(node.kind.as_str().to_string()));
    put_opt(&mut props, "tag", &node.tag);
    put_opt(&mut props, "description", &node.description);

    match &node.attrs {
        NodeAttrs::Vessel {
            spec,
            volume,
            material,
            design_pressure,
            design_temp,
            internals,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "volume", volume);
            put_opt(&mut props, "material", material);
            put_opt(&mut props, "design_pressure", design_pressure);
            put_opt(&mut props, "design_temp", design_temp);
            put_opt(&mut props, "internals", internals);
        }
        NodeAttrs::Machine {
            spec,
            flow,
            head,
            power,
            material,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "flow", flow);
            put_opt(&mut props, "head", head);
            put_opt(&mut props, "power", power);
            put_opt(&mut props, "material", material);
        }
        NodeAttrs::Exchanger {
            spec,
            area,
            material,
            design_pressure,
            tube_pressure,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "area", area);
            put_opt(&mut props, "material", material);
            put_opt(&mut props, "design_pressure", design_pressure);
            put_opt(&mut props, "tube_pressure", tube_pressure);
        }
        NodeAttrs::Valve {
            spec,
            size,
            valve_class,
            fail_position,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "size", size);
            put_opt(&mut props, "valve_class", valve_class);
            put_opt(&mut props, "fail_position", fail_position);
        }
        NodeAttrs::Instrument {
            spec,
            range,
            unit,
            tag_function,
            loop_number,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "range", range);
            put_opt(&mut props, "unit", unit);
            put_opt(&mut props, "tag_function", tag_function);
            put_opt(&mut props, "loop_number", loop_number);
            // The instrument tag is composed, never hand-entered.
            if let (Some(f), Some(l)) = (tag_function, loop_number) {
                if !f.is_empty() && !l.is_empty() {
                    props.insert("tag".to_string(), Value::String(format!("{}-{}", f, l)));
                }
            }
        }
        NodeAttrs::Connector {
            spec,
            target_drawing_id,
            connector_label,
        } => {
            put_opt(&mut props, "spec", spec);
            put_opt(&mut props, "target_drawing_id", target_drawing_id);
            put_opt(&mut props, "connector_label", connector_label);
        }
        NodeAttrs::Generic => {}
    }

    AssetRow {
        id: node.id.as_str().to_string(),
        labels: type_labels(node.kind).iter().map(|s| s.to_string()).collect(),
        layout: Some(PackedLayout::pack(node)),
        props,
    }
}

/// Port annotations for one relationship end: the pinned port id and its
/// semantic zone, composed as "region:section" when both are set.
fn put_endpoint_props(
    props: &mut Map<String, Value>,
    diagram: &Diagram,
    endpoint: &Endpoint,
    port_key: &str,
    region_key: &str,
) {
    let Some(pid) = endpoint.port.as_deref() else {
        return;
    };
    put(props, port_key, pid);
    let Some(port) = diagram.node(&endpoint.node).and_then(|n| n.port(pid)) else {
        return;
    };
    // Region precedence: "region:section", then region, then the visual
    // group, then the catch-all zone.
    let region = match (&port.region, &port.section) {
        (Some(r), Some(s)) => format!("{}:{}", r, s),
        (Some(r), None) => r.clone(),
        _ => port.group.clone().unwrap_or_else(|| "default".to_string()),
    };
    put(props, region_key, &region);
    let desc = port.description.clone().unwrap_or_else(|| pid.to_string());
    put(props, &format!("{}_desc", port_key), &desc);
}

/// Map one diagram edge to its persisted relationship.
///
/// On the diagram a measurement runs from the tapping point toward the
/// instrument; in the graph it is stored the other way, instrument
/// MEASURES process, so queries read naturally. The mapping inverts the
/// endpoints on save and load re-inverts them.
pub fn edge_to_row(diagram: &Diagram, edge: &DiagramEdge) -> RelationshipRow {
    let (kind, source, target) = match edge.kind {
        EdgeKind::Pipe => (REL_PIPE, &edge.source, &edge.target),
        EdgeKind::Signal(SignalKind::Controls) => (REL_CONTROLS, &edge.source, &edge.target),
        EdgeKind::Signal(SignalKind::Measures) => (REL_MEASURES, &edge.target, &edge.source),
    };

    let mut props = Map::new();
    if edge.kind.is_pipe() {
        put_opt(&mut props, "tag", &edge.attrs.tag);
        put(&mut props, "material", &edge.attrs.material);
        put(&mut props, "fluid", &edge.attrs.fluid);
        put(&mut props, "diameter", &edge.attrs.diameter);
        put(&mut props, "pressure", &edge.attrs.pressure);
        put(&mut props, "insulation", &edge.attrs.insulation);
    } else {
        // Signal rows carry the synthetic fluid so graph queries can
        // filter on it like any pipe.
        put(&mut props, "fluid", &edge.attrs.fluid);
    }
    put_endpoint_props(&mut props, diagram, source, "from_port", "from_region");
    put_endpoint_props(&mut props, diagram, target, "to_port", "to_region");
    if !edge.waypoints.is_empty() {
        if let Ok(v) = serde_json::to_value(&edge.waypoints) {
            props.insert("waypoints".to_string(), v);
        }
    }

    RelationshipRow {
        id: edge.id.as_str().to_string(),
        kind: kind.to_string(),
        source: source.node.as_str().to_string(),
        target: target.node.as_str().to_string(),
        props,
    }
}

/// Flatten a diagram for persistence. The background frame never leaves
/// the canvas.
pub fn diagram_to_rows(diagram: &Diagram) -> (Vec<AssetRow>, Vec<RelationshipRow>) {
    let mut assets: Vec<AssetRow> = diagram
        .nodes()
        .filter(|n| !n.is_background)
        .map(node_to_row)
        .collect();
    // Deterministic output regardless of map iteration order.
    assets.sort_by(|a, b| a.id.cmp(&b.id));
    let rels = diagram.edges().map(|e| edge_to_row(diagram, e)).collect();
    (assets, rels)
}

fn kind_from_row(row: &AssetRow) -> NodeKind {
    if let Some(t) = get_str(&row.props, "type") {
        return NodeKind::parse(&t);
    }
    // Fallback for rows without a type property: the most specific label.
    row.labels
        .iter()
        .rev()
        .find(|l| *l != BASE_LABEL)
        .map(|l| NodeKind::parse(l))
        .unwrap_or(NodeKind::Other)
}

fn attrs_from_props(kind: NodeKind, props: &Map<String, Value>) -> NodeAttrs {
    match NodeAttrs::for_kind(kind) {
        NodeAttrs::Vessel { .. } => NodeAttrs::Vessel {
            spec: get_str(props, "spec"),
            volume: get_str(props, "volume"),
            material: get_str(props, "material"),
            design_pressure: get_str(props, "design_pressure"),
            design_temp: get_str(props, "design_temp"),
            internals: get_str(props, "internals"),
        },
        NodeAttrs::Machine { .. } => NodeAttrs::Machine {
            spec: get_str(props, "spec"),
            flow: get_str(props, "flow"),
            head: get_str(props, "head"),
            power: get_str(props, "power"),
            material: get_str(props, "material"),
        },
        NodeAttrs::Exchanger { .. } => NodeAttrs::Exchanger {
            spec: get_str(props, "spec"),
            area: get_str(props, "area"),
            material: get_str(props, "material"),
            design_pressure: get_str(props, "design_pressure"),
            tube_pressure: get_str(props, "tube_pressure"),
        },
        NodeAttrs::Valve { .. } => NodeAttrs::Valve {
            spec: get_str(props, "spec"),
            size: get_str(props, "size"),
            valve_class: get_str(props, "valve_class"),
            fail_position: get_str(props, "fail_position"),
        },
        NodeAttrs::Instrument { .. } => NodeAttrs::Instrument {
            spec: get_str(props, "spec"),
            range: get_str(props, "range"),
            unit: get_str(props, "unit"),
            tag_function: get_str(props, "tag_function"),
            loop_number: get_str(props, "loop_number"),
        },
        NodeAttrs::Connector { .. } => NodeAttrs::Connector {
            spec: get_str(props, "spec"),
            target_drawing_id: get_str(props, "target_drawing_id"),
            connector_label: get_str(props, "connector_label"),
        },
        NodeAttrs::Generic => NodeAttrs::Generic,
    }
}

/// Rebuild one node from its persisted row.
///
/// Rows written before layout packing carry discrete x/y coordinates in
/// their properties and no shape; those fall back to the default shape for
/// the kind. Ports come from the catalog definition of the shape.
pub fn node_from_row(row: &AssetRow, catalog: &ShapeCatalog) -> DiagramNode {
    let kind = kind_from_row(row);
    let spec = get_str(&row.props, "spec");
    let (position, size, rotation, shape_kind) = match &row.layout {
        Some(l) => (
            Point::new(l.x, l.y),
            crate::geometry::Size::new(l.w, l.h),
            l.a,
            l.s.clone(),
        ),
        None => {
            let shape = default_shape_kind(kind, spec.as_deref()).to_string();
            let fallback_size = catalog
                .get(&shape)
                .map(|d| d.size)
                .unwrap_or_else(|| crate::geometry::Size::new(40.0, 40.0));
            (
                Point::new(
                    get_f64(&row.props, "x").unwrap_or(0.0),
                    get_f64(&row.props, "y").unwrap_or(0.0),
                ),
                fallback_size,
                0.0,
                shape,
            )
        }
    };

    let mut node = DiagramNode::new(kind, shape_kind.clone());
    node.id = NodeId::from_string(row.id.clone());
    node.position = position;
    node.size = size;
    node.rotation_deg = rotation;
    node.tag = get_str(&row.props, "tag");
    node.description = get_str(&row.props, "description");
    node.attrs = attrs_from_props(kind, &row.props);
    if let Some(def) = catalog.get(&shape_kind) {
        node.ports = def.ports.clone();
    }
    node
}

fn pipe_attrs_from_props(props: &Map<String, Value>) -> PipeAttrs {
    let defaults = PipeAttrs::default();
    PipeAttrs {
        tag: get_str(props, "tag"),
        material: get_str(props, "material").unwrap_or(defaults.material),
        fluid: get_str(props, "fluid").unwrap_or(defaults.fluid),
        diameter: get_str(props, "diameter").unwrap_or(defaults.diameter),
        pressure: get_str(props, "pressure").unwrap_or(defaults.pressure),
        insulation: get_str(props, "insulation").unwrap_or(defaults.insulation),
    }
}

/// An endpoint from persisted ids: the port pin is kept only when the node
/// still exposes that port, so a changed shape library degrades to a
/// node-level connection instead of a load failure.
fn endpoint_from_row(diagram: &Diagram, node_id: &str, port: Option<String>) -> Endpoint {
    let node_id = NodeId::from_string(node_id);
    match port.filter(|p| {
        diagram
            .node(&node_id)
            .map(|n| n.port(p).is_some())
            .unwrap_or(false)
    }) {
        Some(p) => Endpoint::port(node_id, p),
        None => Endpoint::node(node_id),
    }
}

/// Rebuild a diagram from persisted rows. The loaded diagram starts clean.
pub fn diagram_from_rows(
    assets: &[AssetRow],
    rels: &[RelationshipRow],
    catalog: &ShapeCatalog,
) -> StorageResult<Diagram> {
    let mut diagram = Diagram::new();
    for row in assets {
        diagram.add_node(node_from_row(row, catalog));
    }

    for row in rels {
        let kind = match row.kind.as_str() {
            REL_PIPE => EdgeKind::Pipe,
            REL_CONTROLS => EdgeKind::Signal(SignalKind::Controls),
            REL_MEASURES => EdgeKind::Signal(SignalKind::Measures),
            other => {
                return Err(StorageError::InvalidGraph(format!(
                    "unknown relationship kind: {}",
                    other
                )))
            }
        };

        let from = endpoint_from_row(&diagram, &row.source, get_str(&row.props, "from_port"));
        let to = endpoint_from_row(&diagram, &row.target, get_str(&row.props, "to_port"));
        // Measurements were stored instrument-first; the diagram draws them
        // process-first.
        let (source, target) = match kind {
            EdgeKind::Signal(SignalKind::Measures) => (to, from),
            _ => (from, to),
        };

        let mut edge = DiagramEdge::new(kind, source, target);
        edge.id = crate::model::EdgeId::from_string(row.id.clone());
        if kind.is_pipe() {
            edge = edge.with_attrs(pipe_attrs_from_props(&row.props));
        }
        if let Some(w) = row.props.get("waypoints") {
            match serde_json::from_value::<Vec<Point>>(w.clone()) {
                Ok(waypoints) => edge = edge.with_waypoints(waypoints),
                Err(e) => warn!(edge = %row.id, error = %e, "discarding unparseable waypoints"),
            }
        }
        diagram
            .add_edge(edge)
            .map_err(|e| StorageError::InvalidGraph(e.to_string()))?;
    }

    crate::topology::routing::refresh_all(&mut diagram);
    diagram.clear_dirty();
    Ok(diagram)
}
