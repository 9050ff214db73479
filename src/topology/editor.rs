//! Editor: canvas gestures applied to a diagram
//!
//! Owns the diagram for the active drawing and turns canvas events into
//! topology mutations: shape drops, splice-on-release, connection
//! classification, and tap insertion. The shape catalog is shared and
//! passed in by reference.

use super::{
    insert_tap, ports, routing, splice_inline, ConnectionDrop, SpliceOutcome, TapOutcome,
    TopologyError, TopologyResult, ACTUATOR_PORT,
};
use crate::catalog::ShapeCatalog;
use crate::geometry::Point;
use crate::model::{
    Diagram, DiagramEdge, EdgeId, EdgeKind, Endpoint, NodeId, NodeKind, SignalKind,
};
use tracing::debug;

/// A canvas gesture, as reported by the rendering layer
#[derive(Debug, Clone)]
pub enum CanvasEvent {
    /// A shape from the palette was dropped onto the canvas
    ShapeDropped { shape_kind: String, position: Point },
    /// A node drag ended
    NodeReleased(NodeId),
    /// A connection was drawn between two endpoints
    EdgeConnected { source: Endpoint, target: Endpoint },
    /// A connection drag was released, possibly over empty canvas or a pipe
    ConnectionReleased(ConnectionDrop),
}

/// The editing session for one drawing
#[derive(Debug, Default)]
pub struct Editor {
    diagram: Diagram,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagram(diagram: Diagram) -> Self {
        Self { diagram }
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn diagram_mut(&mut self) -> &mut Diagram {
        &mut self.diagram
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    /// Apply one canvas event
    pub fn handle_event(
        &mut self,
        catalog: &ShapeCatalog,
        event: CanvasEvent,
    ) -> TopologyResult<()> {
        match event {
            CanvasEvent::ShapeDropped { shape_kind, position } => {
                self.add_shape(catalog, &shape_kind, position)?;
            }
            CanvasEvent::NodeReleased(id) => {
                self.release_node(&id)?;
            }
            CanvasEvent::EdgeConnected { source, target } => {
                self.connect(source, target)?;
            }
            CanvasEvent::ConnectionReleased(drop) => {
                self.release_connection(catalog, &drop)?;
            }
        }
        Ok(())
    }

    /// Instantiate a catalog shape at the given canvas position (snapped to
    /// grid) and add it to the diagram.
    pub fn add_shape(
        &mut self,
        catalog: &ShapeCatalog,
        shape_kind: &str,
        position: Point,
    ) -> TopologyResult<NodeId> {
        let node = catalog
            .instantiate(shape_kind)
            .ok_or_else(|| TopologyError::ShapeNotFound(shape_kind.to_string()))?;
        let snapped = position.snapped();
        let id = self.diagram.add_node(node.with_position(snapped.x, snapped.y));
        debug!(node = %id, shape = shape_kind, "shape added");
        Ok(id)
    }

    /// A node drag ended: attempt an inline splice.
    pub fn release_node(&mut self, node_id: &NodeId) -> TopologyResult<SpliceOutcome> {
        splice_inline(&mut self.diagram, node_id)
    }

    /// Create an edge between two endpoints, classifying it by what it
    /// connects.
    ///
    /// A connection into a control valve's actuator port is a control
    /// signal. A connection with an instrument at either end is a
    /// measurement signal. Everything else is a pipe, which inherits its
    /// process attributes from the most recent pipe already connected to
    /// the source node.
    pub fn connect(&mut self, source: Endpoint, target: Endpoint) -> TopologyResult<EdgeId> {
        let kind = self.classify(&source, &target);
        let mut edge = DiagramEdge::new(kind, source, target);
        if kind.is_pipe() {
            if let Some(attrs) = self.inherited_pipe_attrs(&edge.source.node) {
                edge = edge.with_attrs(attrs);
            }
        }
        let id = self.diagram.add_edge(edge)?;
        routing::refresh_all(&mut self.diagram);
        Ok(id)
    }

    /// A connection drag was released: insert a tap when it came from an
    /// instrument and landed on a pipe, otherwise fall back to an ordinary
    /// connection onto whatever node it ended on.
    pub fn release_connection(
        &mut self,
        catalog: &ShapeCatalog,
        drop: &ConnectionDrop,
    ) -> TopologyResult<TapOutcome> {
        match insert_tap(&mut self.diagram, catalog, drop)? {
            TapOutcome::NotApplicable => {
                if let Some(target) = &drop.target_node {
                    self.connect(drop.source.clone(), target.clone())?;
                }
                Ok(TapOutcome::NotApplicable)
            }
            outcome => Ok(outcome),
        }
    }

    fn classify(&self, source: &Endpoint, target: &Endpoint) -> EdgeKind {
        if target.port.as_deref() == Some(ACTUATOR_PORT) {
            return EdgeKind::Signal(SignalKind::Controls);
        }
        let touches_instrument = [source, target].iter().any(|ep| {
            self.diagram
                .node(&ep.node)
                .map(|n| n.kind == NodeKind::Instrument)
                .unwrap_or(false)
        });
        if touches_instrument {
            EdgeKind::Signal(SignalKind::Measures)
        } else {
            EdgeKind::Pipe
        }
    }

    /// Attributes of the most recently connected pipe on the given node
    fn inherited_pipe_attrs(&self, node: &NodeId) -> Option<crate::model::PipeAttrs> {
        self.diagram
            .edges()
            .filter(|e| e.kind.is_pipe() && e.touches(node))
            .last()
            .map(|e| e.attrs.clone())
    }

    /// Rendered path of an edge in the current diagram, for hit-testing by
    /// the rendering layer.
    pub fn edge_path(&self, edge_id: &EdgeId) -> Option<Vec<Point>> {
        let edge = self.diagram.edge(edge_id)?;
        Some(ports::rendered_path(&self.diagram, edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PipeAttrs;

    fn rig() -> (Editor, ShapeCatalog, NodeId, NodeId) {
        let catalog = ShapeCatalog::builtin();
        let mut editor = Editor::new();
        let a = editor
            .add_shape(&catalog, "p-tank", Point::new(0.0, 100.0))
            .unwrap();
        let b = editor
            .add_shape(&catalog, "p-tank", Point::new(400.0, 100.0))
            .unwrap();
        (editor, catalog, a, b)
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let catalog = ShapeCatalog::builtin();
        let mut editor = Editor::new();
        let err = editor.add_shape(&catalog, "p-flux-capacitor", Point::new(0.0, 0.0));
        assert!(matches!(err, Err(TopologyError::ShapeNotFound(_))));
    }

    #[test]
    fn test_connect_classifies_actuator_as_controls() {
        let (mut editor, catalog, _, _) = rig();
        let inst = editor
            .add_shape(&catalog, "p-inst-remote", Point::new(100.0, 300.0))
            .unwrap();
        let cv = editor
            .add_shape(&catalog, "p-cv-pneumatic", Point::new(200.0, 100.0))
            .unwrap();
        let id = editor
            .connect(
                Endpoint::port(inst, "signal"),
                Endpoint::port(cv, ACTUATOR_PORT),
            )
            .unwrap();
        let edge = editor.diagram().edge(&id).unwrap();
        assert_eq!(edge.kind, EdgeKind::Signal(SignalKind::Controls));
        assert_eq!(edge.attrs.fluid, "Signal");
    }

    #[test]
    fn test_connect_classifies_instrument_as_measures() {
        let (mut editor, catalog, a, _) = rig();
        let inst = editor
            .add_shape(&catalog, "p-inst-remote", Point::new(100.0, 300.0))
            .unwrap();
        let id = editor
            .connect(Endpoint::port(inst, "signal"), Endpoint::port(a, "inlet"))
            .unwrap();
        assert_eq!(
            editor.diagram().edge(&id).unwrap().kind,
            EdgeKind::Signal(SignalKind::Measures)
        );
    }

    #[test]
    fn test_pipe_inherits_attrs_from_previous_run() {
        let (mut editor, catalog, a, b) = rig();
        let first = editor
            .connect(Endpoint::port(a.clone(), "outlet"), Endpoint::port(b, "inlet"))
            .unwrap();
        editor.diagram_mut().edge_mut(&first).unwrap().attrs = PipeAttrs {
            fluid: "Steam".to_string(),
            diameter: "DN80".to_string(),
            ..Default::default()
        };

        let c = editor
            .add_shape(&catalog, "p-tank", Point::new(400.0, 400.0))
            .unwrap();
        let second = editor
            .connect(Endpoint::port(a, "outlet"), Endpoint::port(c, "inlet"))
            .unwrap();
        let edge = editor.diagram().edge(&second).unwrap();
        assert_eq!(edge.attrs.fluid, "Steam");
        assert_eq!(edge.attrs.diameter, "DN80");
    }

    #[test]
    fn test_release_on_node_connects_instead_of_tapping() {
        let (mut editor, catalog, a, b) = rig();
        editor
            .connect(Endpoint::port(a, "outlet"), Endpoint::port(b, "inlet"))
            .unwrap();
        let inst = editor
            .add_shape(&catalog, "p-inst-remote", Point::new(100.0, 300.0))
            .unwrap();
        let cv = editor
            .add_shape(&catalog, "p-cv-pneumatic", Point::new(200.0, 100.0))
            .unwrap();
        let nodes_before = editor.diagram().node_count();

        // Released on the valve's actuator with the pipe run underneath:
        // no tapping point, just the control signal.
        let drop = ConnectionDrop {
            source: Endpoint::port(inst, "signal"),
            target_node: Some(Endpoint::port(cv, ACTUATOR_PORT)),
            target_edge: None,
            point: Point::new(250.0, 170.0),
        };
        let outcome = editor.release_connection(&catalog, &drop).unwrap();
        assert_eq!(outcome, TapOutcome::NotApplicable);
        assert_eq!(editor.diagram().node_count(), nodes_before);
        assert_eq!(editor.diagram().edge_count(), 2);
        assert!(editor
            .diagram()
            .edges()
            .any(|e| e.kind == EdgeKind::Signal(SignalKind::Controls)));
    }

    #[test]
    fn test_drop_and_release_splices_fitting() {
        let catalog = ShapeCatalog::builtin();
        let mut editor = Editor::new();
        let a = editor
            .add_shape(&catalog, "p-tank", Point::new(0.0, 0.0))
            .unwrap();
        let b = editor
            .add_shape(&catalog, "p-tank", Point::new(0.0, 400.0))
            .unwrap();
        // Vertical run from A.outlet (50, 140) down to B.inlet (50, 400).
        editor
            .connect(Endpoint::port(a, "outlet"), Endpoint::port(b, "inlet"))
            .unwrap();
        let tee = editor
            .add_shape(&catalog, "p-tee", Point::new(40.0, 260.0))
            .unwrap();
        editor
            .handle_event(&catalog, CanvasEvent::NodeReleased(tee.clone()))
            .unwrap();
        assert_eq!(editor.diagram().connected_edges(&tee).len(), 2);
        assert_eq!(editor.diagram().edge_count(), 2);
    }
}
