//! Core diagram model: spiders connected by wires.
//!
//! The graph is an arena: payloads live in a `StableUnGraph` whose
//! indices stay valid across removals, and an id table maps the public
//! integer handles onto those indices. Cloning the whole structure is a
//! structural copy, which is what snapshots and the undo history rely on.
//!
//! Every mutator either succeeds completely or returns an error with the
//! graph untouched. Failed operations never leave partial state behind.

use crate::id::{EdgeId, NodeId};
use crate::phase::Phase;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

// ─── Positions ───────────────────────────────────────────────────────────

/// A position in diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: f64,
    pub y: f64,
}

impl Pos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Pos) -> Pos {
        Pos::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn dist(self, other: Pos) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Round both coordinates to the nearest `1/division` grid line.
    pub fn snapped(self, division: f64) -> Pos {
        Pos::new(
            (self.x * division).round() / division,
            (self.y * division).round() / division,
        )
    }
}

// ─── Element kinds ───────────────────────────────────────────────────────

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiderKind {
    /// Z spider (green), carries a phase.
    Z,
    /// X spider (red), carries a phase.
    X,
    /// Hadamard box.
    HBox,
    /// External input/output wire endpoint. Phaseless.
    Boundary,
}

impl SpiderKind {
    pub fn is_boundary(self) -> bool {
        matches!(self, SpiderKind::Boundary)
    }
}

/// Wire kinds: a plain wire or a Hadamard-decorated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireKind {
    Plain,
    Hadamard,
}

impl std::fmt::Display for WireKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireKind::Plain => write!(f, "plain"),
            WireKind::Hadamard => write!(f, "hadamard"),
        }
    }
}

// ─── Payloads ────────────────────────────────────────────────────────────

/// A single node in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spider {
    pub id: NodeId,
    pub kind: SpiderKind,
    pub phase: Phase,
    pub pos: Pos,
}

/// A wire's payload. Endpoints live in the underlying graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub id: EdgeId,
    pub kind: WireKind,
}

// ─── Errors ──────────────────────────────────────────────────────────────

/// A rejected graph mutation. The graph is unchanged when one of these
/// is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("no node {0}")]
    NodeNotFound(NodeId),
    #[error("no wire {0}")]
    WireNotFound(EdgeId),
    #[error("no {kind} wire between {a} and {b}")]
    NoWireBetween { a: NodeId, b: NodeId, kind: WireKind },
    #[error("unknown endpoint {0}")]
    InvalidEndpoint(NodeId),
    #[error("duplicate {kind} wire between {a} and {b}")]
    DuplicateEdge { a: NodeId, b: NodeId, kind: WireKind },
    #[error("node id {0} already in use")]
    DuplicateNode(NodeId),
}

// ─── Snapshot ────────────────────────────────────────────────────────────

/// An immutable full copy of the graph at one point in history.
#[derive(Debug, Clone)]
pub struct DiagramSnapshot(DiagramGraph);

impl DiagramSnapshot {
    pub fn graph(&self) -> &DiagramGraph {
        &self.0
    }
}

// ─── Graph ───────────────────────────────────────────────────────────────

/// The diagram under edit: all spiders and wires at one point in time.
///
/// Node and wire handles are allocated from monotone counters and never
/// reused, so an id that survives an edit still names the same logical
/// element.
#[derive(Debug, Clone, Default)]
pub struct DiagramGraph {
    graph: StableUnGraph<Spider, Wire>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    next_node: u32,
    next_edge: u32,
}

impl DiagramGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_index.is_empty()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edge_index.contains_key(&id)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Add a spider, allocating a fresh id.
    pub fn add_node(&mut self, kind: SpiderKind, pos: Pos, phase: Phase) -> NodeId {
        let id = NodeId::from_raw(self.next_node);
        self.next_node += 1;
        let ix = self.graph.add_node(Spider {
            id,
            kind,
            phase,
            pos,
        });
        self.node_index.insert(id, ix);
        id
    }

    /// Add a spider under a caller-chosen id. Used when loading a document
    /// or translating a rewrite result back into this graph's id space.
    pub fn add_node_with_id(
        &mut self,
        id: NodeId,
        kind: SpiderKind,
        pos: Pos,
        phase: Phase,
    ) -> Result<NodeId, GraphError> {
        if self.node_index.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let ix = self.graph.add_node(Spider {
            id,
            kind,
            phase,
            pos,
        });
        self.node_index.insert(id, ix);
        self.next_node = self.next_node.max(id.raw() + 1);
        Ok(id)
    }

    /// Add a wire between `a` and `b`. At most one wire of each kind may
    /// join an unordered pair; self-loops (`a == b`) are always valid.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, kind: WireKind) -> Result<EdgeId, GraphError> {
        let ia = self
            .node_index
            .get(&a)
            .copied()
            .ok_or(GraphError::InvalidEndpoint(a))?;
        let ib = self
            .node_index
            .get(&b)
            .copied()
            .ok_or(GraphError::InvalidEndpoint(b))?;
        if self.find_wire(a, b, kind).is_some() {
            return Err(GraphError::DuplicateEdge { a, b, kind });
        }
        let id = EdgeId::from_raw(self.next_edge);
        self.next_edge += 1;
        let ix = self.graph.add_edge(ia, ib, Wire { id, kind });
        self.edge_index.insert(id, ix);
        Ok(id)
    }

    /// Remove a spider and every wire incident to it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Spider, GraphError> {
        let ix = self
            .node_index
            .get(&id)
            .copied()
            .ok_or(GraphError::NodeNotFound(id))?;
        let incident: SmallVec<[EdgeId; 8]> =
            self.graph.edges(ix).map(|e| e.weight().id).collect();
        for eid in incident {
            self.edge_index.remove(&eid);
        }
        // StableGraph removes incident edges along with the node.
        let spider = self
            .graph
            .remove_node(ix)
            .ok_or(GraphError::NodeNotFound(id))?;
        self.node_index.remove(&id);
        log::trace!("removed {id} and its incident wires");
        Ok(spider)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Wire, GraphError> {
        let ix = self
            .edge_index
            .get(&id)
            .copied()
            .ok_or(GraphError::WireNotFound(id))?;
        let wire = self
            .graph
            .remove_edge(ix)
            .ok_or(GraphError::WireNotFound(id))?;
        self.edge_index.remove(&id);
        Ok(wire)
    }

    /// Remove the wire of the given kind joining `a` and `b`.
    pub fn remove_edge_between(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: WireKind,
    ) -> Result<Wire, GraphError> {
        if !self.contains_node(a) {
            return Err(GraphError::InvalidEndpoint(a));
        }
        if !self.contains_node(b) {
            return Err(GraphError::InvalidEndpoint(b));
        }
        let id = self
            .find_wire(a, b, kind)
            .ok_or(GraphError::NoWireBetween { a, b, kind })?;
        self.remove_edge(id)
    }

    pub fn set_phase(&mut self, id: NodeId, phase: Phase) -> Result<(), GraphError> {
        self.spider_mut(id)?.phase = phase;
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, pos: Pos) -> Result<(), GraphError> {
        self.spider_mut(id)?.pos = pos;
        Ok(())
    }

    pub fn set_kind(&mut self, id: NodeId, kind: SpiderKind) -> Result<(), GraphError> {
        self.spider_mut(id)?.kind = kind;
        Ok(())
    }

    /// Change a wire's kind. Rejected if the pair already carries a wire
    /// of the target kind.
    pub fn set_wire_kind(&mut self, id: EdgeId, kind: WireKind) -> Result<(), GraphError> {
        let ix = self
            .edge_index
            .get(&id)
            .copied()
            .ok_or(GraphError::WireNotFound(id))?;
        let (a, b) = self
            .endpoints(id)
            .ok_or(GraphError::WireNotFound(id))?;
        match self.find_wire(a, b, kind) {
            Some(existing) if existing != id => Err(GraphError::DuplicateEdge { a, b, kind }),
            _ => {
                if let Some(wire) = self.graph.edge_weight_mut(ix) {
                    wire.kind = kind;
                }
                Ok(())
            }
        }
    }

    // ─── Access ──────────────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Spider> {
        self.node_index.get(&id).map(|ix| &self.graph[*ix])
    }

    pub fn wire(&self, id: EdgeId) -> Option<&Wire> {
        self.edge_index.get(&id).and_then(|ix| self.graph.edge_weight(*ix))
    }

    /// Endpoints of a wire, in the orientation it was added.
    pub fn endpoints(&self, id: EdgeId) -> Option<(NodeId, NodeId)> {
        let ix = self.edge_index.get(&id)?;
        let (ia, ib) = self.graph.edge_endpoints(*ix)?;
        Some((self.graph[ia].id, self.graph[ib].id))
    }

    /// Read-only iteration over all spiders, for the rendering layer.
    pub fn nodes(&self) -> impl Iterator<Item = &Spider> {
        self.graph.node_weights()
    }

    /// Read-only iteration over all wires with their endpoints.
    pub fn wires(&self) -> impl Iterator<Item = (NodeId, NodeId, &Wire)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id,
                self.graph[e.target()].id,
                e.weight(),
            )
        })
    }

    /// Neighbor ids of a node, sorted and deduplicated.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(ix) = self.node_index.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<NodeId> = self
            .graph
            .neighbors(*ix)
            .map(|n| self.graph[n].id)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Ids of all wires incident to a node, sorted.
    pub fn incident_edges(&self, id: NodeId) -> Vec<EdgeId> {
        let Some(ix) = self.node_index.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<EdgeId> = self.graph.edges(*ix).map(|e| e.weight().id).collect();
        out.sort();
        out
    }

    /// All wires joining `a` and `b` (at most one per kind).
    pub fn wires_between(&self, a: NodeId, b: NodeId) -> SmallVec<[EdgeId; 2]> {
        let (Some(&ia), Some(&ib)) = (self.node_index.get(&a), self.node_index.get(&b)) else {
            return SmallVec::new();
        };
        let mut out: SmallVec<[EdgeId; 2]> = self
            .graph
            .edges(ia)
            .filter(|e| {
                let other = if e.source() == ia { e.target() } else { e.source() };
                other == ib
            })
            .map(|e| e.weight().id)
            .collect();
        out.sort();
        out
    }

    fn find_wire(&self, a: NodeId, b: NodeId, kind: WireKind) -> Option<EdgeId> {
        self.wires_between(a, b)
            .into_iter()
            .find(|id| self.wire(*id).is_some_and(|w| w.kind == kind))
    }

    fn spider_mut(&mut self, id: NodeId) -> Result<&mut Spider, GraphError> {
        let ix = self
            .node_index
            .get(&id)
            .copied()
            .ok_or(GraphError::NodeNotFound(id))?;
        Ok(&mut self.graph[ix])
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> DiagramSnapshot {
        DiagramSnapshot(self.clone())
    }

    pub fn restore(&mut self, snapshot: &DiagramSnapshot) {
        *self = snapshot.0.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn z(g: &mut DiagramGraph, x: f64, y: f64) -> NodeId {
        g.add_node(SpiderKind::Z, Pos::new(x, y), Phase::ZERO)
    }

    #[test]
    fn add_and_query_nodes() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = g.add_node(SpiderKind::X, Pos::new(1.0, 0.0), Phase::new(1, 2));

        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node(a).unwrap().kind, SpiderKind::Z);
        assert_eq!(g.node(b).unwrap().phase, Phase::new(1, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_wire_rejected_but_other_kind_allowed() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = z(&mut g, 1.0, 0.0);

        g.add_edge(a, b, WireKind::Plain).unwrap();
        assert_eq!(
            g.add_edge(b, a, WireKind::Plain),
            Err(GraphError::DuplicateEdge {
                a: b,
                b: a,
                kind: WireKind::Plain
            })
        );
        // A Hadamard wire on the same pair is a different edge.
        g.add_edge(a, b, WireKind::Hadamard).unwrap();
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn self_loops_are_valid() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let e = g.add_edge(a, a, WireKind::Plain).unwrap();
        assert_eq!(g.endpoints(e), Some((a, a)));
        assert_eq!(
            g.add_edge(a, a, WireKind::Plain),
            Err(GraphError::DuplicateEdge {
                a,
                b: a,
                kind: WireKind::Plain
            })
        );
    }

    #[test]
    fn unknown_endpoint_rejected() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let ghost = NodeId::from_raw(99);
        assert_eq!(
            g.add_edge(a, ghost, WireKind::Plain),
            Err(GraphError::InvalidEndpoint(ghost))
        );
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn remove_node_cascades_wires() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = z(&mut g, 1.0, 0.0);
        let c = z(&mut g, 2.0, 0.0);
        let ab = g.add_edge(a, b, WireKind::Plain).unwrap();
        let bc = g.add_edge(b, c, WireKind::Hadamard).unwrap();

        g.remove_node(b).unwrap();
        assert!(!g.contains_node(b));
        assert!(!g.contains_edge(ab));
        assert!(!g.contains_edge(bc));
        assert_eq!(g.edge_count(), 0);
        assert_eq!(
            g.remove_node(b),
            Err(GraphError::NodeNotFound(b))
        );
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = z(&mut g, 1.0, 0.0);
        g.remove_node(a).unwrap();
        let c = z(&mut g, 2.0, 0.0);
        assert!(c > b);
        assert_ne!(c, a);
    }

    #[test]
    fn set_wire_kind_respects_duplicates() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = z(&mut g, 1.0, 0.0);
        let plain = g.add_edge(a, b, WireKind::Plain).unwrap();
        let had = g.add_edge(a, b, WireKind::Hadamard).unwrap();

        assert_eq!(
            g.set_wire_kind(plain, WireKind::Hadamard),
            Err(GraphError::DuplicateEdge {
                a,
                b,
                kind: WireKind::Hadamard
            })
        );
        g.remove_edge(had).unwrap();
        g.set_wire_kind(plain, WireKind::Hadamard).unwrap();
        assert_eq!(g.wire(plain).unwrap().kind, WireKind::Hadamard);
    }

    #[test]
    fn snapshot_restore_roundtrip() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let b = z(&mut g, 1.0, 1.0);
        g.add_edge(a, b, WireKind::Plain).unwrap();
        let snap = g.snapshot();

        g.remove_node(a).unwrap();
        g.set_phase(b, Phase::PI).unwrap();
        assert_eq!(g.node_count(), 1);

        g.restore(&snap);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.node(b).unwrap().phase, Phase::ZERO);
        assert_eq!(g.wires_between(a, b).len(), 1);
    }

    #[test]
    fn restored_graph_allocates_fresh_ids() {
        let mut g = DiagramGraph::new();
        let a = z(&mut g, 0.0, 0.0);
        let snap = g.snapshot();
        g.remove_node(a).unwrap();
        g.restore(&snap);
        let b = z(&mut g, 1.0, 0.0);
        assert_ne!(a, b);
    }

    #[test]
    fn explicit_id_insertion() {
        let mut g = DiagramGraph::new();
        g.add_node_with_id(NodeId::from_raw(5), SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO)
            .unwrap();
        assert_eq!(
            g.add_node_with_id(NodeId::from_raw(5), SpiderKind::X, Pos::new(1.0, 0.0), Phase::ZERO),
            Err(GraphError::DuplicateNode(NodeId::from_raw(5)))
        );
        // Fresh allocation continues past the explicit id.
        let next = g.add_node(SpiderKind::Z, Pos::new(2.0, 0.0), Phase::ZERO);
        assert_eq!(next, NodeId::from_raw(6));
    }
}
