//! Routing Exclusion Policy
//!
//! An inline component sits visually "on" its pipe run, so the pipes
//! terminating on it must not treat it as a routing obstacle. Each pipe
//! edge's exclusion set is the background frame plus any inline-capable
//! endpoint, recomputed whenever topology changes.

use crate::model::{Diagram, DiagramEdge, NodeId};

/// Compute the obstacle-exclusion set for one edge
pub fn exclusions_for_edge(diagram: &Diagram, edge: &DiagramEdge) -> Vec<NodeId> {
    let mut exclude = Vec::new();
    if let Some(frame) = diagram.background() {
        exclude.push(frame.id.clone());
    }
    for endpoint in [&edge.source, &edge.target] {
        if let Some(node) = diagram.node(&endpoint.node) {
            if node.is_inline() {
                exclude.push(node.id.clone());
            }
        }
    }
    exclude
}

/// Recompute exclusion sets for every pipe edge in the diagram
pub fn refresh_all(diagram: &mut Diagram) {
    let updates: Vec<_> = diagram
        .edges()
        .filter(|e| e.kind.is_pipe())
        .map(|e| (e.id.clone(), exclusions_for_edge(diagram, e)))
        .collect();
    for (id, exclusions) in updates {
        if let Some(edge) = diagram.edge_mut(&id) {
            edge.route_exclusions = exclusions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DiagramEdge, DiagramNode, EdgeKind, Endpoint, NodeKind, Port, PortOffset,
    };

    fn plain_node(kind: NodeKind) -> DiagramNode {
        DiagramNode::new(kind, "p-test")
            .with_size(40.0, 40.0)
            .with_port(Port::new("left", PortOffset::Percent(0.0), PortOffset::Percent(0.5)))
            .with_port(Port::new("right", PortOffset::Percent(1.0), PortOffset::Percent(0.5)))
    }

    #[test]
    fn test_inline_endpoints_are_excluded() {
        let mut diagram = Diagram::new();
        let frame = diagram.add_node(
            DiagramNode::new(NodeKind::Frame, "drawing-frame-a2").background(),
        );
        let pump = diagram.add_node(plain_node(NodeKind::Pump));
        let valve = diagram.add_node(plain_node(NodeKind::Valve));

        let id = diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Pipe,
                Endpoint::port(pump.clone(), "right"),
                Endpoint::port(valve.clone(), "left"),
            ))
            .unwrap();
        refresh_all(&mut diagram);

        let exclusions = &diagram.edge(&id).unwrap().route_exclusions;
        assert!(exclusions.contains(&frame));
        assert!(exclusions.contains(&valve));
        assert!(!exclusions.contains(&pump));
    }

    #[test]
    fn test_ordinary_endpoints_exclude_only_frame() {
        let mut diagram = Diagram::new();
        let frame = diagram.add_node(
            DiagramNode::new(NodeKind::Frame, "drawing-frame-a2").background(),
        );
        let pump = diagram.add_node(plain_node(NodeKind::Pump));
        let tank = diagram.add_node(plain_node(NodeKind::Tank));

        let id = diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Pipe,
                Endpoint::port(pump, "right"),
                Endpoint::port(tank, "left"),
            ))
            .unwrap();
        refresh_all(&mut diagram);

        assert_eq!(diagram.edge(&id).unwrap().route_exclusions, vec![frame]);
    }

    #[test]
    fn test_signal_edges_are_not_touched() {
        let mut diagram = Diagram::new();
        let tap = diagram.add_node(plain_node(NodeKind::TappingPoint));
        let inst = diagram.add_node(plain_node(NodeKind::Instrument));
        let id = diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Signal(crate::model::SignalKind::Measures),
                Endpoint::node(tap),
                Endpoint::node(inst),
            ))
            .unwrap();
        refresh_all(&mut diagram);
        assert!(diagram.edge(&id).unwrap().route_exclusions.is_empty());
    }
}
