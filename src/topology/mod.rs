//! Topology engine: geometric reasoning over the diagram
//!
//! Everything that turns raw canvas gestures into consistent topology lives
//! here: rotation-aware port resolution, inline pipe splicing, instrument
//! tap insertion, connection classification, and routing exclusions.

mod editor;
pub mod ports;
pub mod routing;
mod splice;
mod tap;

pub use editor::{CanvasEvent, Editor};
pub use splice::{splice_inline, SpliceOutcome};
pub use tap::{insert_tap, ConnectionDrop, TapOutcome};

use crate::model::{DiagramError, EdgeId, NodeId};
use thiserror::Error;

/// Port id reserved for a control valve's actuator signal input
pub const ACTUATOR_PORT: &str = "actuator";

/// Errors raised by topology operations
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("No reconnection port resolves on node {0}")]
    NoReconnectionPort(NodeId),

    #[error("Shape not found in catalog: {0}")]
    ShapeNotFound(String),

    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;
