//! Interactive tools and the pointer gesture state machine.
//!
//! Three tools: `Select` (click, toggle, drag, marquee), `Vertex`
//! (click to place a spider), and `Edge` (press on a node, release on a
//! node to wire them). Gestures are transactional: a drag previews
//! positions live but commits exactly one history entry on release, and
//! `Escape` abandons it with the pre-drag graph restored.

use crate::history::HistoryEntry;
use crate::input::{InputEvent, Modifiers};
use crate::session::{EditorError, EditorSession};
use crate::shortcuts::{Action, ShortcutMap};
use smallvec::{SmallVec, smallvec};
use zxs_core::{DiagramSnapshot, NodeId, Pos};
use zxs_spatial::Element;

/// The active tool determines how pointer events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Vertex,
    Edge,
}

/// Gesture in flight. `Idle` is both the initial and the resting state.
#[derive(Debug, Default)]
pub enum GestureState {
    #[default]
    Idle,

    /// Pointer held after pressing an element. Resolves to a click
    /// (below the travel threshold) or a committed move on release.
    Dragging {
        pressed: Element,
        anchor: Pos,
        last: Pos,
        /// Nodes moved by this drag; empty when an edge was pressed.
        targets: SmallVec<[NodeId; 8]>,
        /// Pre-drag graph, restored on cancel and stored on commit.
        before: DiagramSnapshot,
        /// Modifiers captured at press; they decide click semantics.
        modifiers: Modifiers,
    },

    /// Rubber-band selection from an empty-canvas press.
    BoxSelecting { anchor: Pos, current: Pos },

    /// Edge tool: wire preview from a pressed node.
    EdgeDraw { from: NodeId, current: Pos },
}

/// What an input event did, so the shell knows whether to repaint or
/// refresh menus.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// Nothing observable changed.
    Ignored,
    /// Selection changed; graph untouched.
    SelectionChanged,
    /// A gesture is in progress (drag preview, marquee, wire preview).
    GestureUpdated,
    /// The active tool changed.
    ToolChanged(ToolKind),
    /// An edit was committed and pushed onto the history.
    Committed { label: String },
    /// History stepped back one entry.
    Undone { label: String },
    /// History stepped forward one entry.
    Redone { label: String },
    /// A gesture was abandoned; the graph is as before it started.
    Cancelled,
    /// The event mapped to an operation that was rejected; nothing
    /// changed.
    Rejected(EditorError),
}

impl EditorSession {
    /// Feed one input event through the gesture state machine.
    pub fn handle_input(&mut self, event: &InputEvent) -> EventOutcome {
        match event {
            InputEvent::Key { key, modifiers } => self.handle_key(key, *modifiers),
            InputEvent::PointerDown { pos, modifiers } => self.handle_pointer_down(*pos, *modifiers),
            InputEvent::PointerMove { pos, .. } => self.handle_pointer_move(*pos),
            InputEvent::PointerUp { pos, modifiers } => self.handle_pointer_up(*pos, *modifiers),
        }
    }

    /// Abandon any gesture in flight, restoring pre-gesture positions.
    /// Neither the graph (post-restore) nor the history is affected.
    pub fn cancel_gesture(&mut self) -> EventOutcome {
        match std::mem::take(&mut self.gesture) {
            GestureState::Idle => EventOutcome::Ignored,
            GestureState::Dragging { before, .. } => {
                self.graph.restore(&before);
                self.spatial.rebuild(&self.graph);
                EventOutcome::Cancelled
            }
            GestureState::BoxSelecting { .. } | GestureState::EdgeDraw { .. } => {
                EventOutcome::Cancelled
            }
        }
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> EventOutcome {
        // Escape mid-gesture always cancels, regardless of bindings.
        if key == "Escape" && !matches!(self.gesture, GestureState::Idle) {
            return self.cancel_gesture();
        }

        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return EventOutcome::Ignored;
        };
        match action {
            Action::Undo => match self.undo() {
                Ok(label) => EventOutcome::Undone { label },
                Err(_) => EventOutcome::Ignored,
            },
            Action::Redo => match self.redo() {
                Ok(label) => EventOutcome::Redone { label },
                Err(_) => EventOutcome::Ignored,
            },
            Action::Delete => {
                let _ = self.cancel_gesture();
                match self.delete_selection() {
                    Ok(()) => EventOutcome::Committed {
                        label: "delete".to_string(),
                    },
                    Err(EditorError::EmptySelection) => EventOutcome::Ignored,
                    Err(err) => EventOutcome::Rejected(err),
                }
            }
            Action::SelectAll => {
                self.selection.select_all(&self.graph);
                EventOutcome::SelectionChanged
            }
            Action::Deselect => {
                if self.selection.is_empty() {
                    EventOutcome::Ignored
                } else {
                    self.selection.clear();
                    EventOutcome::SelectionChanged
                }
            }
            Action::ToolSelect => self.switch_tool(ToolKind::Select),
            Action::ToolVertex => self.switch_tool(ToolKind::Vertex),
            Action::ToolEdge => self.switch_tool(ToolKind::Edge),
        }
    }

    fn switch_tool(&mut self, tool: ToolKind) -> EventOutcome {
        if self.tool == tool {
            return EventOutcome::Ignored;
        }
        self.set_tool(tool);
        EventOutcome::ToolChanged(tool)
    }

    fn handle_pointer_down(&mut self, pos: Pos, modifiers: Modifiers) -> EventOutcome {
        match self.tool {
            ToolKind::Select => {
                if let Some(element) = self.hit_test(pos) {
                    let targets: SmallVec<[NodeId; 8]> = match element {
                        Element::Node(n) if self.selection.contains_node(n) => {
                            self.selection.nodes().collect()
                        }
                        Element::Node(n) => smallvec![n],
                        Element::Edge(_) => SmallVec::new(),
                    };
                    self.gesture = GestureState::Dragging {
                        pressed: element,
                        anchor: pos,
                        last: pos,
                        targets,
                        before: self.graph.snapshot(),
                        modifiers,
                    };
                } else {
                    self.gesture = GestureState::BoxSelecting {
                        anchor: pos,
                        current: pos,
                    };
                }
                EventOutcome::GestureUpdated
            }
            ToolKind::Vertex => match self.add_node_at(pos) {
                Ok(_) => EventOutcome::Committed {
                    label: "add node".to_string(),
                },
                Err(err) => EventOutcome::Rejected(err),
            },
            ToolKind::Edge => {
                if let Some(Element::Node(from)) = self.hit_test(pos) {
                    self.gesture = GestureState::EdgeDraw { from, current: pos };
                    EventOutcome::GestureUpdated
                } else {
                    EventOutcome::Ignored
                }
            }
        }
    }

    fn handle_pointer_move(&mut self, pos: Pos) -> EventOutcome {
        match &mut self.gesture {
            GestureState::Dragging { last, targets, .. } => {
                let dx = pos.x - last.x;
                let dy = pos.y - last.y;
                *last = pos;
                if targets.is_empty() {
                    return EventOutcome::Ignored;
                }
                let targets = targets.clone();
                for id in targets {
                    if let Some(spider) = self.graph.node(id) {
                        let moved = Pos::new(spider.pos.x + dx, spider.pos.y + dy);
                        let _ = self.graph.set_position(id, moved);
                    }
                }
                EventOutcome::GestureUpdated
            }
            GestureState::BoxSelecting { current, .. } => {
                *current = pos;
                EventOutcome::GestureUpdated
            }
            GestureState::EdgeDraw { current, .. } => {
                *current = pos;
                EventOutcome::GestureUpdated
            }
            GestureState::Idle => EventOutcome::Ignored,
        }
    }

    fn handle_pointer_up(&mut self, pos: Pos, modifiers: Modifiers) -> EventOutcome {
        match std::mem::take(&mut self.gesture) {
            GestureState::Idle => EventOutcome::Ignored,

            GestureState::Dragging {
                pressed,
                anchor,
                targets,
                before,
                modifiers: press_mods,
                ..
            } => {
                if anchor.dist(pos) < self.config.click_threshold {
                    // A click. Sub-threshold wiggles may have nudged
                    // positions; restore the press-time graph exactly.
                    self.graph.restore(&before);
                    self.spatial.rebuild(&self.graph);
                    if press_mods.shift {
                        self.selection.toggle(pressed);
                    } else {
                        self.selection.replace(pressed);
                    }
                    EventOutcome::SelectionChanged
                } else if targets.is_empty() {
                    EventOutcome::Ignored
                } else {
                    let after = self.graph.snapshot();
                    self.history.push(HistoryEntry::new("move", before, after));
                    self.spatial.rebuild(&self.graph);
                    log::debug!("committed \"move\" ({} nodes)", targets.len());
                    EventOutcome::Committed {
                        label: "move".to_string(),
                    }
                }
            }

            GestureState::BoxSelecting { anchor, .. } => {
                let hits = self.spatial.hit_test_rect(anchor, pos);
                if !modifiers.shift {
                    self.selection.clear();
                }
                for element in hits {
                    self.selection.insert(element);
                }
                EventOutcome::SelectionChanged
            }

            GestureState::EdgeDraw { from, .. } => match self.hit_test(pos) {
                Some(Element::Node(to)) => match self.add_edge_between(from, to) {
                    Ok(_) => EventOutcome::Committed {
                        label: "add edge".to_string(),
                    },
                    Err(err) => EventOutcome::Rejected(err),
                },
                _ => EventOutcome::Cancelled,
            },
        }
    }
}
