//! Hit testing: point/region queries → diagram elements.
//!
//! The index is derived data, rebuilt in O(n) from the graph's positions
//! after every committed mutation or restore. It never owns graph state
//! and is never read while stale.

use kurbo::{Line, ParamCurveNearest, Point, Rect};
use zxs_core::{DiagramGraph, EdgeId, NodeId, Pos};

/// A pickable diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Element {
    Node(NodeId),
    Edge(EdgeId),
}

/// Point and segment tables derived from the current graph.
///
/// Entries are kept sorted by id so equal-distance ties always resolve
/// to the lowest identity.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    nodes: Vec<(NodeId, Point)>,
    wires: Vec<(EdgeId, Line)>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full O(n) rebuild from the graph's positions.
    pub fn rebuild(&mut self, graph: &DiagramGraph) {
        self.nodes.clear();
        self.wires.clear();

        for spider in graph.nodes() {
            self.nodes.push((spider.id, pt(spider.pos)));
        }
        self.nodes.sort_by_key(|(id, _)| *id);

        for (a, b, wire) in graph.wires() {
            // Positions exist for both endpoints by construction.
            if let (Some(sa), Some(sb)) = (graph.node(a), graph.node(b)) {
                self.wires
                    .push((wire.id, Line::new(pt(sa.pos), pt(sb.pos))));
            }
        }
        self.wires.sort_by_key(|(id, _)| *id);

        log::trace!(
            "spatial index rebuilt: {} nodes, {} wires",
            self.nodes.len(),
            self.wires.len()
        );
    }

    /// The nearest element within `tolerance` of `pos`.
    ///
    /// Any node within tolerance beats any edge: nodes draw above wires,
    /// so they pick first. Within a class the nearest wins; equal
    /// distances resolve to the lowest id.
    pub fn hit_test_point(&self, pos: Pos, tolerance: f64) -> Option<Element> {
        let p = pt(pos);

        let mut best: Option<(f64, NodeId)> = None;
        for (id, point) in &self.nodes {
            let d = point.distance(p);
            if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, *id));
            }
        }
        if let Some((_, id)) = best {
            return Some(Element::Node(id));
        }

        let mut best: Option<(f64, EdgeId)> = None;
        for (id, line) in &self.wires {
            let d = segment_distance(*line, p);
            if d <= tolerance && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, *id));
            }
        }
        best.map(|(_, id)| Element::Edge(id))
    }

    /// Every element whose geometry intersects the rectangle spanned by
    /// the two corners (given in either order). Nodes hit by
    /// point-in-rect, wires by segment-intersects-rect.
    pub fn hit_test_rect(&self, a: Pos, b: Pos) -> Vec<Element> {
        let rect = Rect::from_points(pt(a), pt(b));
        let mut out = Vec::new();

        for (id, point) in &self.nodes {
            if rect.contains(*point) {
                out.push(Element::Node(*id));
            }
        }
        for (id, line) in &self.wires {
            if segment_intersects_rect(*line, rect) {
                out.push(Element::Edge(*id));
            }
        }
        out
    }
}

fn pt(pos: Pos) -> Point {
    Point::new(pos.x, pos.y)
}

/// Distance from `p` to the closed segment `line`.
fn segment_distance(line: Line, p: Point) -> f64 {
    // Self-loops degenerate to their anchor point.
    if line.p0 == line.p1 {
        return line.p0.distance(p);
    }
    line.nearest(p, 1e-9).distance_sq.sqrt()
}

fn segment_intersects_rect(line: Line, rect: Rect) -> bool {
    if rect.contains(line.p0) || rect.contains(line.p1) {
        return true;
    }
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    (0..4).any(|i| segments_cross(line, Line::new(corners[i], corners[(i + 1) % 4])))
}

/// Signed area of the triangle (a, b, c); sign gives orientation.
fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) && c.x <= a.x.max(b.x) && c.y >= a.y.min(b.y) && c.y <= a.y.max(b.y)
}

/// Closed-segment intersection test, including collinear overlap.
fn segments_cross(s1: Line, s2: Line) -> bool {
    let d1 = orient(s2.p0, s2.p1, s1.p0);
    let d2 = orient(s2.p0, s2.p1, s1.p1);
    let d3 = orient(s1.p0, s1.p1, s2.p0);
    let d4 = orient(s1.p0, s1.p1, s2.p1);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(s2.p0, s2.p1, s1.p0))
        || (d2 == 0.0 && on_segment(s2.p0, s2.p1, s1.p1))
        || (d3 == 0.0 && on_segment(s1.p0, s1.p1, s2.p0))
        || (d4 == 0.0 && on_segment(s1.p0, s1.p1, s2.p1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use zxs_core::{Phase, SpiderKind, WireKind};

    fn indexed(graph: &DiagramGraph) -> SpatialIndex {
        let mut index = SpatialIndex::new();
        index.rebuild(graph);
        index
    }

    fn line_graph() -> (DiagramGraph, NodeId, NodeId, EdgeId) {
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO);
        let b = g.add_node(SpiderKind::X, Pos::new(4.0, 0.0), Phase::ZERO);
        let e = g.add_edge(a, b, WireKind::Plain).unwrap();
        (g, a, b, e)
    }

    #[test]
    fn point_hits_nearest_node() {
        let (g, a, _, _) = line_graph();
        let index = indexed(&g);
        assert_eq!(
            index.hit_test_point(Pos::new(0.1, 0.1), 0.3),
            Some(Element::Node(a))
        );
        assert_eq!(index.hit_test_point(Pos::new(0.1, 2.0), 0.3), None);
    }

    #[test]
    fn point_hits_wire_between_nodes() {
        let (g, _, _, e) = line_graph();
        let index = indexed(&g);
        assert_eq!(
            index.hit_test_point(Pos::new(2.0, 0.1), 0.3),
            Some(Element::Edge(e))
        );
    }

    #[test]
    fn node_beats_wire_when_both_in_tolerance() {
        // Wire passes straight through the query point; node sits slightly
        // off but still within tolerance. The node must win.
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(0.0, 0.0), Phase::ZERO);
        let b = g.add_node(SpiderKind::Z, Pos::new(4.0, 0.0), Phase::ZERO);
        let c = g.add_node(SpiderKind::X, Pos::new(2.0, 0.2), Phase::ZERO);
        g.add_edge(a, b, WireKind::Plain).unwrap();
        let index = indexed(&g);

        assert_eq!(
            index.hit_test_point(Pos::new(2.0, 0.0), 0.3),
            Some(Element::Node(c))
        );
    }

    #[test]
    fn equal_distance_ties_resolve_to_lowest_id() {
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(1.0, 0.0), Phase::ZERO);
        let _b = g.add_node(SpiderKind::Z, Pos::new(-1.0, 0.0), Phase::ZERO);
        let index = indexed(&g);

        assert_eq!(
            index.hit_test_point(Pos::new(0.0, 0.0), 1.5),
            Some(Element::Node(a))
        );
    }

    #[test]
    fn region_collects_nodes_and_crossing_wires() {
        let (g, a, b, e) = line_graph();
        let index = indexed(&g);

        // Both endpoints plus the wire.
        let mut all = index.hit_test_rect(Pos::new(-1.0, -1.0), Pos::new(5.0, 1.0));
        all.sort();
        assert_eq!(
            all,
            vec![Element::Node(a), Element::Node(b), Element::Edge(e)]
        );

        // A thin band across the middle catches only the wire.
        let crossing = index.hit_test_rect(Pos::new(1.5, -0.5), Pos::new(2.5, 0.5));
        assert_eq!(crossing, vec![Element::Edge(e)]);

        // Corner order must not matter.
        let flipped = index.hit_test_rect(Pos::new(2.5, 0.5), Pos::new(1.5, -0.5));
        assert_eq!(flipped, vec![Element::Edge(e)]);
    }

    #[test]
    fn self_loop_degenerates_to_anchor_point() {
        let mut g = DiagramGraph::new();
        let a = g.add_node(SpiderKind::Z, Pos::new(1.0, 1.0), Phase::ZERO);
        let b = g.add_node(SpiderKind::Z, Pos::new(5.0, 5.0), Phase::ZERO);
        let loop_e = g.add_edge(a, a, WireKind::Plain).unwrap();
        let _ = b;
        let index = indexed(&g);

        // The loop anchors at the node, so both share geometry; node wins.
        assert_eq!(
            index.hit_test_point(Pos::new(1.1, 1.0), 0.3),
            Some(Element::Node(a))
        );
        let region = index.hit_test_rect(Pos::new(0.5, 0.5), Pos::new(1.5, 1.5));
        assert!(region.contains(&Element::Edge(loop_e)));
        assert!(!region.contains(&Element::Node(b)));
    }

    #[test]
    fn rebuild_tracks_position_changes() {
        let (mut g, a, _, _) = line_graph();
        let mut index = indexed(&g);
        assert_eq!(
            index.hit_test_point(Pos::new(0.0, 0.0), 0.2),
            Some(Element::Node(a))
        );

        g.set_position(a, Pos::new(10.0, 10.0)).unwrap();
        index.rebuild(&g);
        assert_eq!(index.hit_test_point(Pos::new(0.0, 0.0), 0.2), None);
        assert_eq!(
            index.hit_test_point(Pos::new(10.0, 10.0), 0.2),
            Some(Element::Node(a))
        );
    }

    #[test]
    fn removed_elements_stop_hit_testing() {
        let (mut g, a, b, e) = line_graph();
        g.remove_node(a).unwrap();
        let index = indexed(&g);

        assert_eq!(index.hit_test_point(Pos::new(0.0, 0.0), 0.3), None);
        assert_eq!(index.hit_test_point(Pos::new(2.0, 0.0), 0.3), None);
        assert!(!g.contains_edge(e));
        assert_eq!(
            index.hit_test_point(Pos::new(4.0, 0.0), 0.3),
            Some(Element::Node(b))
        );
    }
}
