//! Rewrite invocation: the bridge to an external rule library.
//!
//! Rules are opaque capabilities registered under string ids; the editor
//! never inspects their internals. The invoker's job is to validate the
//! selection before delegating, translate the rule's result back into
//! the session's identity space, and surface exactly one error kind on
//! any failure, never a partial graph.

use crate::selection::Selection;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use zxs_core::{DiagramGraph, NodeId};

/// A rule application failed. The graph, selection, and history are
/// unchanged when this is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("no matching rule for the current selection")]
    NoMatchingRule,
}

/// What a rule returns: a transformed graph in the rule's own id space,
/// plus the correspondence for nodes that are semantically the same
/// before and after.
pub struct RewriteOutcome {
    /// The rewritten graph. Node ids are local to this outcome.
    pub graph: DiagramGraph,
    /// Pairs of `(outcome id, source id)` for preserved nodes.
    pub retained: Vec<(NodeId, NodeId)>,
}

/// A single match-and-rewrite capability.
pub trait RewriteRule {
    /// Human-readable rule name, used as the history label.
    fn name(&self) -> &str;

    /// Attempt to match the selection and transform the graph. `None`
    /// when the selection is not a legal match region for this rule.
    fn apply(&self, graph: &DiagramGraph, selection: &Selection) -> Option<RewriteOutcome>;
}

/// Externally-registered rule set, keyed by rule id.
#[derive(Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, Box<dyn RewriteRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule_id: impl Into<String>, rule: Box<dyn RewriteRule>) {
        self.rules.insert(rule_id.into(), rule);
    }

    pub fn get(&self, rule_id: &str) -> Option<&dyn RewriteRule> {
        self.rules.get(rule_id).map(|r| r.as_ref())
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(|k| k.as_str())
    }
}

/// A rewrite translated back into the session's identity space.
pub struct AppliedRewrite {
    pub graph: DiagramGraph,
    /// Source-space ids of the nodes that survived the rewrite.
    pub preserved: Vec<NodeId>,
    pub rule_name: String,
}

/// Validate the selection, run the rule, and re-key the result.
///
/// Retained nodes keep their source ids so the spatial index and any
/// position-based affordances stay stable; fresh nodes get ids past the
/// source graph's highest. Any failure (unknown rule, empty or stale
/// selection, matcher refusal, an inconsistent outcome) collapses to
/// [`RewriteError::NoMatchingRule`] with nothing mutated.
pub fn invoke(
    registry: &RuleRegistry,
    rule_id: &str,
    graph: &DiagramGraph,
    selection: &Selection,
) -> Result<AppliedRewrite, RewriteError> {
    let rule = registry.get(rule_id).ok_or(RewriteError::NoMatchingRule)?;

    if selection.is_empty() {
        return Err(RewriteError::NoMatchingRule);
    }
    let stale = selection.nodes().any(|id| !graph.contains_node(id))
        || selection.edges().any(|id| !graph.contains_edge(id));
    if stale {
        return Err(RewriteError::NoMatchingRule);
    }

    let outcome = rule
        .apply(graph, selection)
        .ok_or(RewriteError::NoMatchingRule)?;

    let translated = translate(graph, outcome).ok_or(RewriteError::NoMatchingRule)?;
    log::debug!(
        "applied rule {rule_id:?}: {} nodes preserved",
        translated.preserved.len()
    );
    Ok(AppliedRewrite {
        graph: translated.graph,
        preserved: translated.preserved,
        rule_name: rule.name().to_string(),
    })
}

struct Translated {
    graph: DiagramGraph,
    preserved: Vec<NodeId>,
}

fn translate(source: &DiagramGraph, outcome: RewriteOutcome) -> Option<Translated> {
    let mut id_map: HashMap<NodeId, NodeId> = HashMap::new();
    for (outcome_id, source_id) in &outcome.retained {
        // A retained pair must point at real nodes on both sides.
        if !outcome.graph.contains_node(*outcome_id) || !source.contains_node(*source_id) {
            return None;
        }
        if id_map.insert(*outcome_id, *source_id).is_some() {
            return None;
        }
    }

    let mut next_fresh = source.nodes().map(|s| s.id.raw() + 1).max().unwrap_or(0);
    let mut translated = DiagramGraph::new();

    let mut spiders: Vec<_> = outcome.graph.nodes().collect();
    spiders.sort_by_key(|s| s.id);
    for spider in spiders {
        let final_id = *id_map.entry(spider.id).or_insert_with(|| {
            let id = NodeId::from_raw(next_fresh);
            next_fresh += 1;
            id
        });
        translated
            .add_node_with_id(final_id, spider.kind, spider.pos, spider.phase)
            .ok()?;
    }

    let mut wires: Vec<_> = outcome.graph.wires().collect();
    wires.sort_by_key(|(_, _, w)| w.id);
    for (a, b, wire) in wires {
        let (fa, fb) = (id_map.get(&a)?, id_map.get(&b)?);
        translated.add_edge(*fa, *fb, wire.kind).ok()?;
    }

    let preserved = outcome
        .retained
        .iter()
        .map(|(_, source_id)| *source_id)
        .collect();
    Some(Translated {
        graph: translated,
        preserved,
    })
}
