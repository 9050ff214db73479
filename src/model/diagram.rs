//! The diagram: a bounded network of nodes and edges for one drawing
//!
//! Exclusively owned by the editor thread; all topology mutations run
//! synchronously against it. Tracks a dirty flag that persistence clears on
//! successful save.

use super::edge::{DiagramEdge, EdgeId};
use super::node::{DiagramNode, NodeId, PortDirection};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised by diagram mutations
#[derive(Debug, Error)]
pub enum DiagramError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Port '{port}' not found on node {node}")]
    PortNotFound { node: NodeId, port: String },

    #[error("Background node {0} cannot be an edge endpoint")]
    BackgroundEndpoint(NodeId),

    #[error("Port direction conflict: source '{source_port}' cannot feed target '{target_port}'")]
    DirectionConflict {
        source_port: String,
        target_port: String,
    },
}

/// Result type for diagram mutations
pub type DiagramResult<T> = Result<T, DiagramError>;

/// In-memory diagram model for a single drawing
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    nodes: HashMap<NodeId, DiagramNode>,
    edges: Vec<DiagramEdge>,
    dirty: bool,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the diagram
    pub fn add_node(&mut self, node: DiagramNode) -> NodeId {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        self.dirty = true;
        id
    }

    /// Remove a node along with every edge touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Option<DiagramNode> {
        let removed = self.nodes.remove(id);
        if removed.is_some() {
            self.edges.retain(|e| !e.touches(id));
            self.dirty = true;
        }
        removed
    }

    pub fn node(&self, id: &NodeId) -> Option<&DiagramNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut DiagramNode> {
        let node = self.nodes.get_mut(id);
        if node.is_some() {
            self.dirty = true;
        }
        node
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DiagramNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The background frame node, if one is present
    pub fn background(&self) -> Option<&DiagramNode> {
        self.nodes.values().find(|n| n.is_background)
    }

    /// Add an edge after validating both endpoints.
    ///
    /// An endpoint must reference an existing, non-background node, and a
    /// named port must exist on it. A connection is only legal when the
    /// source port can emit (not `in`) and the target port can accept
    /// (not `out`); portless endpoints count as bidirectional.
    pub fn add_edge(&mut self, edge: DiagramEdge) -> DiagramResult<EdgeId> {
        let source_dir = self.endpoint_direction(&edge.source.node, edge.source.port.as_deref())?;
        let target_dir = self.endpoint_direction(&edge.target.node, edge.target.port.as_deref())?;

        if source_dir == PortDirection::In || target_dir == PortDirection::Out {
            return Err(DiagramError::DirectionConflict {
                source_port: edge.source.port.clone().unwrap_or_default(),
                target_port: edge.target.port.clone().unwrap_or_default(),
            });
        }

        let id = edge.id.clone();
        self.edges.push(edge);
        self.dirty = true;
        Ok(id)
    }

    fn endpoint_direction(
        &self,
        node_id: &NodeId,
        port_id: Option<&str>,
    ) -> DiagramResult<PortDirection> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| DiagramError::NodeNotFound(node_id.clone()))?;
        if node.is_background {
            return Err(DiagramError::BackgroundEndpoint(node_id.clone()));
        }
        match port_id {
            Some(pid) => node
                .port(pid)
                .map(|p| p.direction)
                .ok_or_else(|| DiagramError::PortNotFound {
                    node: node_id.clone(),
                    port: pid.to_string(),
                }),
            None => Ok(PortDirection::Bidirectional),
        }
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<DiagramEdge> {
        let idx = self.edges.iter().position(|e| e.id == *id)?;
        self.dirty = true;
        Some(self.edges.remove(idx))
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&DiagramEdge> {
        self.edges.iter().find(|e| e.id == *id)
    }

    pub fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut DiagramEdge> {
        let edge = self.edges.iter_mut().find(|e| e.id == *id);
        if edge.is_some() {
            self.dirty = true;
        }
        edge
    }

    /// Edges in first-discovered (insertion) order
    pub fn edges(&self) -> impl Iterator<Item = &DiagramEdge> {
        self.edges.iter()
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = &mut DiagramEdge> {
        self.dirty = true;
        self.edges.iter_mut()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges with either endpoint on the given node
    pub fn connected_edges(&self, node_id: &NodeId) -> Vec<&DiagramEdge> {
        self.edges.iter().filter(|e| e.touches(node_id)).collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Called after a successful save or an explicit discard
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DiagramEdge, DiagramNode, EdgeKind, Endpoint, NodeKind, Port, PortDirection, PortOffset,
    };

    fn two_port_node(kind: NodeKind) -> DiagramNode {
        DiagramNode::new(kind, "p-test")
            .with_size(40.0, 40.0)
            .with_port(
                Port::new("left", PortOffset::Percent(0.0), PortOffset::Percent(0.5))
                    .with_direction(PortDirection::In),
            )
            .with_port(
                Port::new("right", PortOffset::Percent(1.0), PortOffset::Percent(0.5))
                    .with_direction(PortDirection::Out),
            )
    }

    #[test]
    fn test_add_edge_validates_direction() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(two_port_node(NodeKind::Pump));
        let b = diagram.add_node(two_port_node(NodeKind::Tank));

        // out -> in is legal
        let ok = DiagramEdge::new(
            EdgeKind::Pipe,
            Endpoint::port(a.clone(), "right"),
            Endpoint::port(b.clone(), "left"),
        );
        assert!(diagram.add_edge(ok).is_ok());

        // in-port as source is rejected
        let bad = DiagramEdge::new(
            EdgeKind::Pipe,
            Endpoint::port(a.clone(), "left"),
            Endpoint::port(b.clone(), "left"),
        );
        assert!(matches!(
            diagram.add_edge(bad),
            Err(DiagramError::DirectionConflict { .. })
        ));

        // out-port as target is rejected
        let bad = DiagramEdge::new(
            EdgeKind::Pipe,
            Endpoint::port(a, "right"),
            Endpoint::port(b, "right"),
        );
        assert!(matches!(
            diagram.add_edge(bad),
            Err(DiagramError::DirectionConflict { .. })
        ));
    }

    #[test]
    fn test_background_node_never_an_endpoint() {
        let mut diagram = Diagram::new();
        let frame = diagram.add_node(
            DiagramNode::new(NodeKind::Frame, "drawing-frame-a2").background(),
        );
        let a = diagram.add_node(two_port_node(NodeKind::Pump));

        let edge = DiagramEdge::new(EdgeKind::Pipe, Endpoint::port(a, "right"), Endpoint::node(frame));
        assert!(matches!(
            diagram.add_edge(edge),
            Err(DiagramError::BackgroundEndpoint(_))
        ));
    }

    #[test]
    fn test_missing_port_rejected() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(two_port_node(NodeKind::Pump));
        let b = diagram.add_node(two_port_node(NodeKind::Tank));

        let edge = DiagramEdge::new(
            EdgeKind::Pipe,
            Endpoint::port(a, "nope"),
            Endpoint::port(b, "left"),
        );
        assert!(matches!(
            diagram.add_edge(edge),
            Err(DiagramError::PortNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_node_detaches_edges() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(two_port_node(NodeKind::Pump));
        let b = diagram.add_node(two_port_node(NodeKind::Tank));
        diagram
            .add_edge(DiagramEdge::new(
                EdgeKind::Pipe,
                Endpoint::port(a.clone(), "right"),
                Endpoint::port(b, "left"),
            ))
            .unwrap();
        assert_eq!(diagram.edge_count(), 1);

        diagram.remove_node(&a);
        assert_eq!(diagram.edge_count(), 0);
    }

    #[test]
    fn test_dirty_tracking() {
        let mut diagram = Diagram::new();
        assert!(!diagram.is_dirty());
        diagram.add_node(two_port_node(NodeKind::Pump));
        assert!(diagram.is_dirty());
        diagram.clear_dirty();
        assert!(!diagram.is_dirty());
    }

    #[test]
    fn test_missing_lookup_stays_clean() {
        let mut diagram = Diagram::new();
        let a = diagram.add_node(two_port_node(NodeKind::Pump));
        diagram.clear_dirty();

        assert!(diagram.node_mut(&NodeId::from_string("nope")).is_none());
        assert!(diagram.edge_mut(&EdgeId::from_string("nope")).is_none());
        assert!(!diagram.is_dirty());

        assert!(diagram.node_mut(&a).is_some());
        assert!(diagram.is_dirty());
    }
}
