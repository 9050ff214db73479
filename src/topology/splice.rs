//! Pipe Splice Engine
//!
//! Inserts a freshly placed, still-unconnected inline component into the
//! pipe run it geometrically overlaps: snap the component onto the pipe
//! centerline, remove the run, and reconnect it as two edges through the
//! component's nearest ports.

use super::{ports, routing, TopologyError, TopologyResult};
use crate::geometry::{
    self, grid_round, Orientation, Point, Rect,
};
use crate::model::{
    Diagram, DiagramEdge, EdgeId, EdgeKind, Endpoint, NodeId, PortDirection,
};
use tracing::debug;

/// Perpendicular offset between the snapped component origin and the pipe
/// centerline.
const SPLICE_OFFSET: f64 = 20.0;

/// Result of a splice attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The run was replaced by two edges through the component
    Spliced {
        removed: EdgeId,
        upstream: EdgeId,
        downstream: EdgeId,
    },
    /// Preconditions not met (not inline, already wired, no overlapping
    /// pipe, or orientation mismatch); the diagram is unchanged.
    NotApplicable,
}

/// Attempt to splice the given component into an overlapping pipe run.
///
/// Preconditions: the component's kind is inline-capable and it has no
/// connected edges — a wired component being moved around is never
/// re-spliced. An orientation mismatch between component and pipe segment
/// is a silent no-op. If no reconnection port resolves the diagram is left
/// untouched and an error is returned for the caller to surface.
pub fn splice_inline(diagram: &mut Diagram, node_id: &NodeId) -> TopologyResult<SpliceOutcome> {
    let node = diagram
        .node(node_id)
        .ok_or_else(|| TopologyError::NodeNotFound(node_id.clone()))?;
    if !node.kind.is_inline() || !diagram.connected_edges(node_id).is_empty() {
        return Ok(SpliceOutcome::NotApplicable);
    }

    let bbox = node.bbox();
    let center = bbox.center();

    // Candidate pipe: first edge (in discovery order) whose rendered
    // bounding box intersects the component. Signal edges never qualify.
    let candidate = diagram.edges().find_map(|e| {
        if e.kind.is_signal() {
            return None;
        }
        let path = ports::rendered_path(diagram, e);
        if !path.is_empty() && Rect::bounding(&path).intersects(&bbox) {
            Some((e.id.clone(), path))
        } else {
            None
        }
    });
    let Some((target_id, path)) = candidate else {
        return Ok(SpliceOutcome::NotApplicable);
    };

    let closest = geometry::closest_point_on_polyline(&path, center).unwrap_or(center);

    // Containing segment of the rendered path, so multi-bend runs splice at
    // the correct bend. Falls back to the overall endpoints.
    let (seg_start, seg_end, pipe_orientation) =
        match geometry::containing_segment(&path, closest) {
            Some((a, b)) => (a, b, geometry::segment_orientation(a, b)),
            None => {
                let src = path[0];
                let tgt = *path.last().expect("non-empty path");
                let orientation = if (src.x - tgt.x).abs() > (src.y - tgt.y).abs() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                (src, tgt, orientation)
            }
        };

    // Orientation gate: a two-port valve only splices into a run parallel
    // to its own axis. Omnidirectional fittings bypass the check. Mismatch
    // is a silent no-op by design, not an error.
    if !node.kind.is_omnidirectional()
        && geometry::rotation_orientation(node.rotation_deg) != pipe_orientation
    {
        return Ok(SpliceOutcome::NotApplicable);
    }

    // Snap onto the centerline: align the perpendicular axis to the pipe
    // coordinate with the standard offset, grid-round both axes.
    let new_pos = match pipe_orientation {
        Orientation::Horizontal => {
            Point::new(grid_round(bbox.x), grid_round(closest.y - SPLICE_OFFSET))
        }
        Orientation::Vertical => {
            Point::new(grid_round(closest.x + SPLICE_OFFSET), grid_round(bbox.y))
        }
    };

    // Resolve the two reconnection ports against the segment endpoints (not
    // the edge's global endpoints), using the component at its snapped
    // position. Nothing has been mutated yet, so failure aborts cleanly.
    let mut moved = node.clone();
    moved.position = new_pos;
    let port_a = ports::closest_port(&moved, seg_start);
    let port_b = ports::closest_port(&moved, seg_end);
    let (Some(port_a), Some(port_b)) = (port_a, port_b) else {
        return Err(TopologyError::NoReconnectionPort(node_id.clone()));
    };
    if port_a.direction == PortDirection::Out || port_b.direction == PortDirection::In {
        // The nearest ports cannot legally carry the reconnected flow.
        return Err(TopologyError::NoReconnectionPort(node_id.clone()));
    }
    let (port_a, port_b) = (port_a.id.clone(), port_b.id.clone());

    // Commit: move the component, replace the run with two edges carrying
    // the original process attributes and presentation style.
    if let Some(n) = diagram.node_mut(node_id) {
        n.position = new_pos;
    }
    let removed = diagram
        .remove_edge(&target_id)
        .ok_or_else(|| TopologyError::EdgeNotFound(target_id.clone()))?;

    let upstream = diagram.add_edge(
        DiagramEdge::new(
            EdgeKind::Pipe,
            removed.source.clone(),
            Endpoint::port(node_id.clone(), port_a),
        )
        .with_attrs(removed.attrs.clone())
        .with_style(removed.style.clone()),
    )?;
    let downstream = diagram.add_edge(
        DiagramEdge::new(
            EdgeKind::Pipe,
            Endpoint::port(node_id.clone(), port_b),
            removed.target.clone(),
        )
        .with_attrs(removed.attrs.clone())
        .with_style(removed.style.clone()),
    )?;

    routing::refresh_all(diagram);
    debug!(node = %node_id, removed = %removed.id, "inline component spliced into pipe run");

    Ok(SpliceOutcome::Spliced {
        removed: removed.id,
        upstream,
        downstream,
    })
}
