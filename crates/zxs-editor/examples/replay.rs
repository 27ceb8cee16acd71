//! Scripted editing session: builds a small diagram, drags a spider,
//! applies a color-change rewrite, and walks the history back and forth.
//!
//! Run with: `RUST_LOG=debug cargo run -p zxs-editor --example replay`

use std::collections::HashMap;
use zxs_core::{DiagramGraph, NodeId, Pos, SpiderKind};
use zxs_editor::{
    EditorSession, InputEvent, RewriteOutcome, RewriteRule, RuleRegistry, Selection,
};
use zxs_spatial::Element;

/// Stand-in for an external rule: flips selected Z spiders to X and
/// vice versa, preserving every identity.
struct ColorChange;

impl RewriteRule for ColorChange {
    fn name(&self) -> &str {
        "color change"
    }

    fn apply(&self, graph: &DiagramGraph, selection: &Selection) -> Option<RewriteOutcome> {
        let flippable = selection.nodes().all(|id| {
            graph
                .node(id)
                .is_some_and(|s| matches!(s.kind, SpiderKind::Z | SpiderKind::X))
        });
        if selection.nodes().next().is_none() || !flippable {
            return None;
        }

        let mut out = DiagramGraph::new();
        let mut to_out: HashMap<NodeId, NodeId> = HashMap::new();
        let mut retained = Vec::new();
        for spider in graph.nodes() {
            let kind = if selection.contains_node(spider.id) {
                match spider.kind {
                    SpiderKind::Z => SpiderKind::X,
                    SpiderKind::X => SpiderKind::Z,
                    other => other,
                }
            } else {
                spider.kind
            };
            let out_id = out.add_node(kind, spider.pos, spider.phase);
            to_out.insert(spider.id, out_id);
            retained.push((out_id, spider.id));
        }
        for (a, b, wire) in graph.wires() {
            out.add_edge(to_out[&a], to_out[&b], wire.kind).ok()?;
        }
        Some(RewriteOutcome {
            graph: out,
            retained,
        })
    }
}

fn dump(session: &EditorSession, heading: &str) {
    println!("== {heading}");
    for spider in session.graph().nodes() {
        println!(
            "   {} {:?} phase {} at ({:.2}, {:.2})",
            spider.id, spider.kind, spider.phase, spider.pos.x, spider.pos.y
        );
    }
    println!(
        "   {} wires, history depth {}",
        session.graph().edge_count(),
        session.history_depth()
    );
}

fn main() {
    env_logger::init();

    let mut registry = RuleRegistry::new();
    registry.register("color_change", Box::new(ColorChange));

    let mut session = EditorSession::new();

    // Build boundary - Z(π/2) - boundary by committed edits.
    session.set_current_spider_kind(SpiderKind::Boundary);
    let input = session.add_node_at(Pos::new(0.0, 0.0)).expect("add input");
    session.set_current_spider_kind(SpiderKind::Z);
    let spider = session.add_node_at(Pos::new(1.0, 0.0)).expect("add spider");
    session.set_current_spider_kind(SpiderKind::Boundary);
    let output = session.add_node_at(Pos::new(2.0, 0.0)).expect("add output");
    session
        .add_edge_between(input, spider)
        .expect("wire input");
    session
        .add_edge_between(spider, output)
        .expect("wire output");
    session
        .set_node_phase(spider, "1/2".parse().expect("phase"))
        .expect("set phase");
    dump(&session, "built");

    // Drag the spider up by one unit; one history entry regardless of
    // how many move events arrive.
    session.handle_input(&InputEvent::pointer_down(1.0, 0.0));
    for step in 1..=8 {
        session.handle_input(&InputEvent::pointer_move(1.0, f64::from(step) / 8.0));
    }
    session.handle_input(&InputEvent::pointer_up(1.0, 1.0));
    dump(&session, "after drag");

    // Flip the spider's color through the rewrite invoker.
    session.selection_mut().replace(Element::Node(spider));
    match session.apply_rewrite(&registry, "color_change") {
        Ok(label) => println!("applied rewrite: {label}"),
        Err(err) => println!("rewrite failed: {err}"),
    }
    dump(&session, "after rewrite");

    // Walk the whole history down and back up.
    while let Ok(label) = session.undo() {
        println!("undo: {label}");
    }
    dump(&session, "fully undone");
    while let Ok(label) = session.redo() {
        println!("redo: {label}");
    }
    dump(&session, "fully redone");

    let json = session.to_json().expect("serialize");
    println!("serialized document:\n{json}");
}
