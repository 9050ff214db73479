//! Core diagram data structures

mod diagram;
mod edge;
mod node;

pub use diagram::{Diagram, DiagramError, DiagramResult};
pub use edge::{DiagramEdge, EdgeId, EdgeKind, Endpoint, PipeAttrs, SignalKind};
pub use node::{
    DiagramNode, LabelPosition, NodeAttrs, NodeId, NodeKind, Port, PortDirection, PortOffset,
};
