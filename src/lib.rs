//! Flowsheet: P&ID topology engine with graph persistence
//!
//! An engine for piping & instrumentation diagrams: a typed diagram model,
//! geometric topology operations (rotation-aware port resolution, inline
//! pipe splicing, instrument tap insertion, routing exclusions), and a
//! property-graph persistence layer with cross-page connector linking.
//!
//! # Core Concepts
//!
//! - **Nodes**: equipment, valves, instruments, connectors on one drawing
//! - **Edges**: pipe runs carrying process attributes, and instrument signals
//! - **Drawings**: bounded diagrams persisted independently, linked across
//!   pages by shared connector tags
//!
//! # Example
//!
//! ```
//! use flowsheet::{Editor, ShapeCatalog};
//! use flowsheet::geometry::Point;
//!
//! let catalog = ShapeCatalog::builtin();
//! let mut editor = Editor::new();
//! let tank = editor.add_shape(&catalog, "p-tank", Point::new(100.0, 100.0)).unwrap();
//! assert!(editor.diagram().node(&tank).is_some());
//! ```

pub mod catalog;
pub mod geometry;
mod model;
pub mod store;
pub mod style;
pub mod topology;
mod workspace;

pub use catalog::{ShapeCatalog, ShapeDef};
pub use model::{
    Diagram, DiagramEdge, DiagramError, DiagramNode, DiagramResult, EdgeId, EdgeKind, Endpoint,
    LabelPosition, NodeAttrs, NodeId, NodeKind, PipeAttrs, Port, PortDirection, PortOffset,
    SignalKind,
};
pub use store::{
    AssetLink, AssetStore, DrawingId, DrawingMeta, OpenStore, SqliteStore, StorageError,
    StorageResult,
};
pub use style::EdgeStyle;
pub use topology::{
    CanvasEvent, ConnectionDrop, Editor, SpliceOutcome, TapOutcome, TopologyError, TopologyResult,
};
pub use workspace::{SwitchDecision, Workspace};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
