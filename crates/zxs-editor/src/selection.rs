//! The transient set of highlighted elements.
//!
//! Owned by the session, cleared or replaced by most edits. It is never
//! persisted across undo boundaries: after a restore it is re-validated
//! against the restored graph and anything gone is dropped.

use std::collections::BTreeSet;
use zxs_core::{DiagramGraph, EdgeId, NodeId};
use zxs_spatial::Element;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    nodes: BTreeSet<NodeId>,
    edges: BTreeSet<EdgeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    pub fn contains(&self, element: Element) -> bool {
        match element {
            Element::Node(id) => self.contains_node(id),
            Element::Edge(id) => self.contains_edge(id),
        }
    }

    pub fn insert(&mut self, element: Element) {
        match element {
            Element::Node(id) => {
                self.nodes.insert(id);
            }
            Element::Edge(id) => {
                self.edges.insert(id);
            }
        }
    }

    pub fn remove(&mut self, element: Element) {
        match element {
            Element::Node(id) => {
                self.nodes.remove(&id);
            }
            Element::Edge(id) => {
                self.edges.remove(&id);
            }
        }
    }

    /// Add the element if absent, drop it if present. Other selected
    /// elements stay untouched.
    pub fn toggle(&mut self, element: Element) {
        if self.contains(element) {
            self.remove(element);
        } else {
            self.insert(element);
        }
    }

    /// Make `element` the only selected element.
    pub fn replace(&mut self, element: Element) {
        self.clear();
        self.insert(element);
    }

    pub fn set_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.clear();
        self.nodes.extend(ids);
    }

    /// Select every node and wire of the graph.
    pub fn select_all(&mut self, graph: &DiagramGraph) {
        self.clear();
        self.nodes.extend(graph.nodes().map(|s| s.id));
        self.edges.extend(graph.wires().map(|(_, _, w)| w.id));
    }

    /// Best-effort restore after undo/redo: keep ids that still exist in
    /// the graph, drop the rest.
    pub fn retain_valid(&mut self, graph: &DiagramGraph) {
        self.nodes.retain(|id| graph.contains_node(*id));
        self.edges.retain(|id| graph.contains_edge(*id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zxs_core::{Phase, Pos, SpiderKind, WireKind};

    #[test]
    fn toggle_leaves_other_elements_untouched() {
        let mut sel = Selection::new();
        let a = Element::Node(NodeId::from_raw(1));
        let b = Element::Node(NodeId::from_raw(2));
        sel.insert(a);
        sel.insert(b);

        sel.toggle(a);
        assert!(!sel.contains(a));
        assert!(sel.contains(b));

        sel.toggle(a);
        assert!(sel.contains(a));
    }

    #[test]
    fn retain_valid_drops_stale_ids() {
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO);
        let b = g.add_node(SpiderKind::Z, Pos::new(1.0, 0.0), Phase::ZERO);
        let e = g.add_edge(a, b, WireKind::Plain).unwrap();

        let mut sel = Selection::new();
        sel.insert(Element::Node(a));
        sel.insert(Element::Node(b));
        sel.insert(Element::Edge(e));

        g.remove_node(b).unwrap();
        sel.retain_valid(&g);

        assert!(sel.contains_node(a));
        assert!(!sel.contains_node(b));
        assert!(!sel.contains_edge(e));
        assert_eq!(sel.len(), 1);
    }
}
