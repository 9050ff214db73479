//! Port Geometry Resolver: rotation-aware nearest-port lookup

use crate::geometry::Point;
use crate::model::{Diagram, DiagramEdge, DiagramNode, Endpoint, Port};

/// True visual position of a port on the canvas.
///
/// The port's relative coordinate is decoded in the node's unrotated local
/// frame, translated to an absolute coordinate, then rotated about the node
/// center by the node's rotation.
pub fn port_visual_position(node: &DiagramNode, port: &Port) -> Point {
    let local = port.local_position(node.size);
    let absolute = Point::new(node.position.x + local.x, node.position.y + local.y);
    absolute.rotate_about(node.center(), node.rotation_deg)
}

/// The port with minimum Euclidean distance to `query`, or `None` when the
/// node has no ports. Equal distances resolve to the first-declared port.
pub fn closest_port<'a>(node: &'a DiagramNode, query: Point) -> Option<&'a Port> {
    let mut best: Option<(f64, &Port)> = None;
    for port in &node.ports {
        let dist = port_visual_position(node, port).distance_to(query);
        // Strict comparison keeps the first-declared port on ties.
        if best.map(|(d, _)| dist < d).unwrap_or(true) {
            best = Some((dist, port));
        }
    }
    best.map(|(_, p)| p)
}

/// Canvas position of an edge endpoint: its port's visual position when
/// pinned to a port, otherwise the node center.
pub fn endpoint_position(diagram: &Diagram, endpoint: &Endpoint) -> Option<Point> {
    let node = diagram.node(&endpoint.node)?;
    match endpoint.port.as_deref().and_then(|pid| node.port(pid)) {
        Some(port) => Some(port_visual_position(node, port)),
        None => Some(node.center()),
    }
}

/// The rendered path of an edge: source point, bend points, target point.
/// Empty when either endpoint no longer resolves.
pub fn rendered_path(diagram: &Diagram, edge: &DiagramEdge) -> Vec<Point> {
    let (Some(src), Some(tgt)) = (
        endpoint_position(diagram, &edge.source),
        endpoint_position(diagram, &edge.target),
    ) else {
        return Vec::new();
    };
    let mut path = Vec::with_capacity(edge.waypoints.len() + 2);
    path.push(src);
    path.extend(edge.waypoints.iter().copied());
    path.push(tgt);
    path
}
