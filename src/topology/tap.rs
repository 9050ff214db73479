//! Instrument Tap Insertion
//!
//! Dropping a signal line from an instrument onto a pipe materializes a
//! tapping point on the run: the pipe is split through the marker and a
//! measurement signal is drawn from the tapping point to the instrument.

use super::{ports, routing, TopologyError, TopologyResult};
use crate::catalog::{ShapeCatalog, TAPPING_POINT_SHAPE};
use crate::geometry::{self, grid_round, Point, SEGMENT_TOLERANCE};
use crate::model::{
    Diagram, DiagramEdge, DiagramError, EdgeId, EdgeKind, Endpoint, NodeId, NodeKind, SignalKind,
};
use tracing::debug;

/// A released connection gesture: where it started, and what (if anything)
/// it was dropped on.
#[derive(Debug, Clone)]
pub struct ConnectionDrop {
    /// The endpoint the gesture started from
    pub source: Endpoint,
    /// The node the gesture ended on, when it ended on one
    pub target_node: Option<Endpoint>,
    /// The edge the gesture ended on, when it ended on one
    pub target_edge: Option<EdgeId>,
    /// Canvas position where the gesture was released
    pub point: Point,
}

/// Result of a tap-insertion attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// A tapping point was created and wired in
    Tapped {
        tap: NodeId,
        signal: EdgeId,
        upstream: EdgeId,
        downstream: EdgeId,
    },
    /// The gesture did not land on a pipe; nothing was created
    Cancelled,
    /// The gesture did not start from an instrument; the caller should
    /// treat it as an ordinary connection instead.
    NotApplicable,
}

/// Insert a tapping point where an instrument's signal line was dropped
/// onto a pipe run.
///
/// Validation happens before any mutation, so a failed attempt leaves the
/// diagram exactly as it was. On the diagram the measurement signal runs
/// from the tapping point to the instrument.
pub fn insert_tap(
    diagram: &mut Diagram,
    catalog: &ShapeCatalog,
    drop: &ConnectionDrop,
) -> TopologyResult<TapOutcome> {
    let instrument = diagram
        .node(&drop.source.node)
        .ok_or_else(|| TopologyError::NodeNotFound(drop.source.node.clone()))?;
    if instrument.kind != NodeKind::Instrument {
        return Ok(TapOutcome::NotApplicable);
    }
    // A release onto a valid node is an ordinary connection, not a tap.
    if drop.target_node.is_some() && drop.target_edge.is_none() {
        return Ok(TapOutcome::NotApplicable);
    }
    if let Some(pid) = drop.source.port.as_deref() {
        if instrument.port(pid).is_none() {
            return Err(DiagramError::PortNotFound {
                node: drop.source.node.clone(),
                port: pid.to_string(),
            }
            .into());
        }
    }
    let marker_def = catalog
        .get(TAPPING_POINT_SHAPE)
        .ok_or_else(|| TopologyError::ShapeNotFound(TAPPING_POINT_SHAPE.to_string()))?;
    let marker_size = marker_def.size;

    // The pipe being tapped: the edge under the drop when it is a pipe,
    // otherwise a hit-test against every pipe's rendered path.
    let hit = drop
        .target_edge
        .as_ref()
        .and_then(|id| diagram.edge(id))
        .filter(|e| e.kind.is_pipe())
        .map(|e| e.id.clone())
        .or_else(|| {
            diagram
                .edges()
                .filter(|e| e.kind.is_pipe())
                .find(|e| {
                    let path = ports::rendered_path(diagram, e);
                    geometry::polyline_hit_test(&path, drop.point, SEGMENT_TOLERANCE)
                })
                .map(|e| e.id.clone())
        });
    let Some(pipe_id) = hit else {
        return Ok(TapOutcome::Cancelled);
    };

    let pipe = diagram
        .edge(&pipe_id)
        .ok_or_else(|| TopologyError::EdgeNotFound(pipe_id.clone()))?;
    let path = ports::rendered_path(diagram, pipe);
    let on_pipe = geometry::closest_point_on_polyline(&path, drop.point).unwrap_or(drop.point);

    // Tap coordinate: on a single straight run the perpendicular axis
    // keeps the pipe's own coordinate exactly, so the marker sits on the
    // centerline even when the run is off-grid; only the parallel axis
    // snaps to grid. Bent runs snap both axes.
    let tap_point = match (path.first(), path.last()) {
        (Some(start), Some(end)) if pipe.waypoints.is_empty() => {
            if (start.y - end.y).abs() < SEGMENT_TOLERANCE {
                Point::new(grid_round(on_pipe.x), start.y)
            } else if (start.x - end.x).abs() < SEGMENT_TOLERANCE {
                Point::new(start.x, grid_round(on_pipe.y))
            } else {
                on_pipe.snapped()
            }
        }
        _ => on_pipe.snapped(),
    };

    // All checks passed; mutations from here on cannot fail.
    let marker = catalog
        .instantiate(TAPPING_POINT_SHAPE)
        .ok_or_else(|| TopologyError::ShapeNotFound(TAPPING_POINT_SHAPE.to_string()))?
        .with_position(
            tap_point.x - marker_size.w / 2.0,
            tap_point.y - marker_size.h / 2.0,
        );
    let tap = diagram.add_node(marker);

    let removed = diagram
        .edge(&pipe_id)
        .cloned()
        .ok_or_else(|| TopologyError::EdgeNotFound(pipe_id.clone()))?;
    diagram.remove_edge(&pipe_id);
    let upstream = diagram.add_edge(
        DiagramEdge::new(EdgeKind::Pipe, removed.source.clone(), Endpoint::node(tap.clone()))
            .with_attrs(removed.attrs.clone())
            .with_style(removed.style.clone()),
    )?;
    let downstream = diagram.add_edge(
        DiagramEdge::new(EdgeKind::Pipe, Endpoint::node(tap.clone()), removed.target.clone())
            .with_attrs(removed.attrs.clone())
            .with_style(removed.style.clone()),
    )?;

    // Measurement signal, drawn from the process toward the instrument.
    let signal = diagram.add_edge(DiagramEdge::new(
        EdgeKind::Signal(SignalKind::Measures),
        Endpoint::node(tap.clone()),
        drop.source.clone(),
    ))?;

    routing::refresh_all(diagram);
    debug!(tap = %tap, pipe = %pipe_id, "tapping point inserted");

    Ok(TapOutcome::Tapped {
        tap,
        signal,
        upstream,
        downstream,
    })
}
