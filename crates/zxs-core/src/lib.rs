pub mod codec;
pub mod graph;
pub mod id;
pub mod phase;

pub use codec::{CodecError, DiagramDoc, EdgeDoc, NodeDoc};
pub use graph::{
    DiagramGraph, DiagramSnapshot, GraphError, Pos, Spider, SpiderKind, Wire, WireKind,
};
pub use id::{EdgeId, NodeId};
pub use phase::{Phase, PhaseParseError};
