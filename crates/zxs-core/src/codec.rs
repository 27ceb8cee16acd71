//! Serialized diagram description.
//!
//! The persisted form is a flat listing of nodes (ids, kinds, phases,
//! positions) and wires (endpoint ids plus kind), encodable as JSON or
//! as compact MessagePack. Node ids round-trip losslessly; wire handles
//! are re-keyed in listing order on load.

use crate::graph::{DiagramGraph, GraphError, Pos, SpiderKind, WireKind};
use crate::id::NodeId;
use crate::phase::Phase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: NodeId,
    pub kind: SpiderKind,
    #[serde(default)]
    pub phase: Phase,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDoc {
    pub src: NodeId,
    pub dst: NodeId,
    pub kind: WireKind,
}

/// The on-disk diagram document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramDoc {
    pub nodes: Vec<NodeDoc>,
    pub edges: Vec<EdgeDoc>,
}

/// A document failed to encode, decode, or validate.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed diagram document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed diagram document: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("failed to encode diagram document: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl DiagramDoc {
    pub fn to_json(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

impl DiagramGraph {
    /// Export the current graph. Nodes are listed by ascending id and
    /// wires by ascending handle so equal graphs produce equal documents.
    pub fn to_doc(&self) -> DiagramDoc {
        let mut nodes: Vec<NodeDoc> = self
            .nodes()
            .map(|s| NodeDoc {
                id: s.id,
                kind: s.kind,
                phase: s.phase,
                x: s.pos.x,
                y: s.pos.y,
            })
            .collect();
        nodes.sort_by_key(|n| n.id);

        let mut wires: Vec<_> = self.wires().collect();
        wires.sort_by_key(|(_, _, w)| w.id);
        let edges = wires
            .into_iter()
            .map(|(src, dst, w)| EdgeDoc {
                src,
                dst,
                kind: w.kind,
            })
            .collect();

        DiagramDoc { nodes, edges }
    }

    /// Build a fresh graph from a document. Validation runs through the
    /// normal mutators, so a document with unknown endpoints or duplicate
    /// wires is rejected as a whole.
    pub fn from_doc(doc: &DiagramDoc) -> Result<Self, GraphError> {
        let mut graph = DiagramGraph::new();
        for n in &doc.nodes {
            graph.add_node_with_id(n.id, n.kind, Pos::new(n.x, n.y), n.phase)?;
        }
        for e in &doc.edges {
            graph.add_edge(e.src, e.dst, e.kind)?;
        }
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        self.to_doc().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Ok(Self::from_doc(&DiagramDoc::from_json(json)?)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, CodecError> {
        self.to_doc().to_msgpack()
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(Self::from_doc(&DiagramDoc::from_msgpack(bytes)?)?)
    }
}
