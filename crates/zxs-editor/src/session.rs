//! The editing session: one diagram under interactive editing.
//!
//! `EditorSession` is the single explicit context object holding the
//! graph, the derived spatial index, the transient selection, the undo
//! history, and the gesture state. Every committed edit pushes exactly
//! one history entry and rebuilds the spatial index before returning, so
//! the index is never read stale. A failed operation restores the graph
//! to its prior state and leaves no history entry behind.

use crate::history::{History, HistoryEntry};
use crate::rewrite::{self, RewriteError, RuleRegistry};
use crate::selection::Selection;
use crate::tools::{GestureState, ToolKind};
use log::debug;
use thiserror::Error;
use zxs_core::{
    CodecError, DiagramGraph, EdgeId, GraphError, NodeId, Phase, Pos, SpiderKind, WireKind,
};
use zxs_spatial::{Element, SpatialIndex};

/// A rejected editor operation. The session is unchanged when one of
/// these is returned, and no history entry is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error("nothing selected")]
    EmptySelection,
    #[error("history boundary reached")]
    HistoryEmpty,
}

/// Tunable interaction parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Hit-test tolerance in diagram units.
    pub hit_tolerance: f64,
    /// Net pointer travel below this counts as a click, not a drag.
    pub click_threshold: f64,
    /// Newly placed spiders snap to multiples of `1/snap_division`.
    pub snap_division: f64,
    /// Maximum undo depth.
    pub max_undo: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hit_tolerance: 0.3,
            click_threshold: 0.1,
            snap_division: 4.0,
            max_undo: 100,
        }
    }
}

/// One diagram under edit, with everything the interaction layer needs.
pub struct EditorSession {
    pub(crate) graph: DiagramGraph,
    pub(crate) spatial: SpatialIndex,
    pub(crate) selection: Selection,
    pub(crate) history: History,
    pub(crate) gesture: GestureState,
    pub(crate) tool: ToolKind,
    pub(crate) current_spider_kind: SpiderKind,
    pub(crate) current_wire_kind: WireKind,
    pub(crate) config: SessionConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    pub fn new() -> Self {
        Self::from_graph(DiagramGraph::new())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        Self::from_graph_with_config(DiagramGraph::new(), config)
    }

    pub fn from_graph(graph: DiagramGraph) -> Self {
        Self::from_graph_with_config(graph, SessionConfig::default())
    }

    pub fn from_graph_with_config(graph: DiagramGraph, config: SessionConfig) -> Self {
        let mut spatial = SpatialIndex::new();
        spatial.rebuild(&graph);
        Self {
            graph,
            spatial,
            selection: Selection::new(),
            history: History::new(config.max_undo),
            gesture: GestureState::Idle,
            tool: ToolKind::Select,
            current_spider_kind: SpiderKind::Z,
            current_wire_kind: WireKind::Plain,
            config,
        }
    }

    /// Load a session from a serialized diagram description.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Ok(Self::from_graph(DiagramGraph::from_json(json)?))
    }

    pub fn to_json(&self) -> Result<String, CodecError> {
        self.graph.to_json()
    }

    // ─── Read access for the rendering layer ─────────────────────────────

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Programmatic selection access for the shell. The selection is
    /// transient; edits may clear or replace it.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Current gesture, exposed so the shell can draw marquee rectangles
    /// and wire previews.
    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools, cancelling any gesture in flight.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            let _ = self.cancel_gesture();
            self.tool = tool;
        }
    }

    pub fn current_spider_kind(&self) -> SpiderKind {
        self.current_spider_kind
    }

    pub fn set_current_spider_kind(&mut self, kind: SpiderKind) {
        self.current_spider_kind = kind;
    }

    pub fn current_wire_kind(&self) -> WireKind {
        self.current_wire_kind
    }

    pub fn set_current_wire_kind(&mut self, kind: WireKind) {
        self.current_wire_kind = kind;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.history.undo_label()
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.history.redo_label()
    }

    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Hit test with the session's configured tolerance.
    pub fn hit_test(&self, pos: Pos) -> Option<Element> {
        self.spatial.hit_test_point(pos, self.config.hit_tolerance)
    }

    pub fn hit_test_region(&self, a: Pos, b: Pos) -> Vec<Element> {
        self.spatial.hit_test_rect(a, b)
    }

    // ─── Committed edits ─────────────────────────────────────────────────

    /// Run one edit against the graph. On success, push exactly one
    /// history entry and refresh the spatial index; on failure, restore
    /// the pre-edit graph and surface the error.
    fn commit<T>(
        &mut self,
        label: &str,
        edit: impl FnOnce(&mut DiagramGraph) -> Result<T, GraphError>,
    ) -> Result<T, EditorError> {
        let before = self.graph.snapshot();
        match edit(&mut self.graph) {
            Ok(value) => {
                let after = self.graph.snapshot();
                self.history.push(HistoryEntry::new(label, before, after));
                self.spatial.rebuild(&self.graph);
                debug!("committed {label:?}");
                Ok(value)
            }
            Err(err) => {
                self.graph.restore(&before);
                Err(err.into())
            }
        }
    }

    /// Add a spider of the current kind at the grid-snapped position.
    pub fn add_node_at(&mut self, pos: Pos) -> Result<NodeId, EditorError> {
        let kind = self.current_spider_kind;
        let snapped = pos.snapped(self.config.snap_division);
        self.commit("add node", |g| Ok(g.add_node(kind, snapped, Phase::ZERO)))
    }

    /// Add a wire of the current kind between two nodes.
    pub fn add_edge_between(&mut self, a: NodeId, b: NodeId) -> Result<EdgeId, EditorError> {
        let kind = self.current_wire_kind;
        self.commit("add edge", |g| g.add_edge(a, b, kind))
    }

    /// Remove everything selected. Selected wires go first; node removal
    /// cascades the rest.
    pub fn delete_selection(&mut self) -> Result<(), EditorError> {
        if self.selection.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        let edges: Vec<EdgeId> = self.selection.edges().collect();
        let nodes: Vec<NodeId> = self.selection.nodes().collect();
        self.commit("delete", move |g| {
            for e in edges {
                g.remove_edge(e)?;
            }
            for n in nodes {
                g.remove_node(n)?;
            }
            Ok(())
        })?;
        self.selection.clear();
        Ok(())
    }

    pub fn set_node_phase(&mut self, id: NodeId, phase: Phase) -> Result<(), EditorError> {
        self.commit("set phase", |g| g.set_phase(id, phase))
    }

    /// Retype every selected node.
    pub fn set_selection_node_kind(&mut self, kind: SpiderKind) -> Result<(), EditorError> {
        let nodes: Vec<NodeId> = self.selection.nodes().collect();
        if nodes.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        self.commit("set node type", move |g| {
            for id in nodes {
                g.set_kind(id, kind)?;
            }
            Ok(())
        })
    }

    /// Retype every selected wire. Rejected as a whole if any change
    /// would duplicate an existing wire.
    pub fn set_selection_wire_kind(&mut self, kind: WireKind) -> Result<(), EditorError> {
        let edges: Vec<EdgeId> = self.selection.edges().collect();
        if edges.is_empty() {
            return Err(EditorError::EmptySelection);
        }
        self.commit("set edge type", move |g| {
            for id in edges {
                g.set_wire_kind(id, kind)?;
            }
            Ok(())
        })
    }

    /// Split a wire with a fresh phaseless Z spider at its midpoint. The
    /// new spider joins one side with a plain wire and keeps the original
    /// kind on the other.
    pub fn add_identity(&mut self, edge: EdgeId) -> Result<NodeId, EditorError> {
        let wire = self
            .graph
            .wire(edge)
            .ok_or(GraphError::WireNotFound(edge))?;
        let kind = wire.kind;
        let (a, b) = self
            .graph
            .endpoints(edge)
            .ok_or(GraphError::WireNotFound(edge))?;
        let (pa, pb) = match (self.graph.node(a), self.graph.node(b)) {
            (Some(sa), Some(sb)) => (sa.pos, sb.pos),
            _ => return Err(GraphError::NodeNotFound(a).into()),
        };
        let mid = pa.midpoint(pb);
        self.commit("add identity", move |g| {
            g.remove_edge(edge)?;
            let v = g.add_node(SpiderKind::Z, mid, Phase::ZERO);
            g.add_edge(a, v, WireKind::Plain)?;
            g.add_edge(v, b, kind)?;
            Ok(v)
        })
    }

    // ─── History navigation ──────────────────────────────────────────────

    /// Step back one committed edit. Returns its label. Any gesture in
    /// flight is abandoned first.
    pub fn undo(&mut self) -> Result<String, EditorError> {
        let _ = self.cancel_gesture();
        let entry = self.history.undo().ok_or(EditorError::HistoryEmpty)?;
        let label = entry.label().to_string();
        self.graph.restore(entry.before());
        self.spatial.rebuild(&self.graph);
        self.selection.retain_valid(&self.graph);
        debug!("undo {label:?}");
        Ok(label)
    }

    /// Step forward one undone edit. Returns its label. Any gesture in
    /// flight is abandoned first.
    pub fn redo(&mut self) -> Result<String, EditorError> {
        let _ = self.cancel_gesture();
        let entry = self.history.redo().ok_or(EditorError::HistoryEmpty)?;
        let label = entry.label().to_string();
        self.graph.restore(entry.after());
        self.spatial.rebuild(&self.graph);
        self.selection.retain_valid(&self.graph);
        debug!("redo {label:?}");
        Ok(label)
    }

    // ─── Rewrites ────────────────────────────────────────────────────────

    /// Apply a registered rewrite rule to the current selection. Success
    /// replaces the graph and pushes an entry labeled with the rule name;
    /// selection becomes the preserved nodes. Failure changes nothing.
    pub fn apply_rewrite(
        &mut self,
        registry: &RuleRegistry,
        rule_id: &str,
    ) -> Result<String, EditorError> {
        // A rewrite command may arrive in any state; uncommitted gesture
        // previews are abandoned before matching.
        let _ = self.cancel_gesture();
        let applied = rewrite::invoke(registry, rule_id, &self.graph, &self.selection)?;
        let before = self.graph.snapshot();
        self.graph = applied.graph;
        let after = self.graph.snapshot();
        self.history
            .push(HistoryEntry::new(applied.rule_name.as_str(), before, after));
        self.spatial.rebuild(&self.graph);
        self.selection.set_nodes(applied.preserved);
        debug!("committed rewrite {:?}", applied.rule_name);
        Ok(applied.rule_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session_with_pair() -> (EditorSession, NodeId, NodeId) {
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO);
        let b = g.add_node(SpiderKind::X, Pos::new(2.0, 0.0), Phase::ZERO);
        (EditorSession::from_graph(g), a, b)
    }

    #[test]
    fn add_node_snaps_and_pushes_one_entry() {
        let mut session = EditorSession::new();
        let id = session.add_node_at(Pos::new(0.26, 0.74)).unwrap();

        assert_eq!(session.history_depth(), 1);
        assert_eq!(session.undo_label(), Some("add node"));
        let spider = session.graph().node(id).unwrap();
        assert_eq!(spider.pos, Pos::new(0.25, 0.75));
        // Committed edits refresh the spatial index.
        assert!(session.hit_test(Pos::new(0.25, 0.75)).is_some());
    }

    #[test]
    fn rejected_edit_leaves_no_trace() {
        let (mut session, a, b) = session_with_pair();
        session.add_edge_between(a, b).unwrap();
        let doc = session.graph().to_doc();

        let err = session.add_edge_between(a, b).unwrap_err();
        assert!(matches!(err, EditorError::Graph(GraphError::DuplicateEdge { .. })));
        assert_eq!(session.graph().to_doc(), doc);
        assert_eq!(session.history_depth(), 1);
    }

    #[test]
    fn delete_selection_cascades_and_clears() {
        let (mut session, a, b) = session_with_pair();
        let e = session.add_edge_between(a, b).unwrap();
        session.selection_mut().insert(Element::Node(a));

        session.delete_selection().unwrap();
        assert!(!session.graph().contains_node(a));
        assert!(!session.graph().contains_edge(e));
        assert!(session.graph().contains_node(b));
        assert!(session.selection().is_empty());
        assert_eq!(session.undo_label(), Some("delete"));
    }

    #[test]
    fn delete_with_empty_selection_is_reported() {
        let mut session = EditorSession::new();
        assert_eq!(
            session.delete_selection().unwrap_err(),
            EditorError::EmptySelection
        );
        assert_eq!(session.history_depth(), 0);
    }

    #[test]
    fn wire_retype_rolls_back_wholesale_on_duplicate() {
        let (mut session, a, b) = session_with_pair();
        let plain = session.add_edge_between(a, b).unwrap();
        session.set_current_wire_kind(WireKind::Hadamard);
        let had = session.add_edge_between(a, b).unwrap();

        session.selection_mut().insert(Element::Edge(plain));
        let err = session.set_selection_wire_kind(WireKind::Hadamard).unwrap_err();
        assert!(matches!(err, EditorError::Graph(GraphError::DuplicateEdge { .. })));
        assert_eq!(session.graph().wire(plain).unwrap().kind, WireKind::Plain);
        assert_eq!(session.graph().wire(had).unwrap().kind, WireKind::Hadamard);
    }

    #[test]
    fn add_identity_splits_the_wire() {
        let (mut session, a, b) = session_with_pair();
        session.set_current_wire_kind(WireKind::Hadamard);
        let e = session.add_edge_between(a, b).unwrap();

        let v = session.add_identity(e).unwrap();
        assert!(!session.graph().contains_edge(e));
        assert_eq!(session.graph().node(v).unwrap().pos, Pos::new(1.0, 0.0));
        assert_eq!(session.graph().neighbors(v), vec![a, b]);
        // Original kind survives on one side.
        let kinds: Vec<WireKind> = session
            .graph()
            .wires_between(v, b)
            .into_iter()
            .map(|w| session.graph().wire(w).unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![WireKind::Hadamard]);
    }

    #[test]
    fn undo_restores_selection_best_effort() {
        let (mut session, a, _) = session_with_pair();
        session.selection_mut().insert(Element::Node(a));
        session.set_node_phase(a, Phase::PI).unwrap();

        session.undo().unwrap();
        // `a` survives the restore, so the selection keeps it.
        assert!(session.selection().contains_node(a));
        assert_eq!(session.graph().node(a).unwrap().phase, Phase::ZERO);
    }

    #[test]
    fn undo_at_bottom_reports_history_empty() {
        let mut session = EditorSession::new();
        assert_eq!(session.undo().unwrap_err(), EditorError::HistoryEmpty);
        assert_eq!(session.redo().unwrap_err(), EditorError::HistoryEmpty);
    }
}
