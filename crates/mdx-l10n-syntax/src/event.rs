//! # Flattened Events
//!
//! A tree can be flattened into a **flat sequence** of events, and a flat
//! sequence can be turned back into a tree by the [`Sink`](crate::sink::Sink).
//! The localization engine works on this flat form: a run of inline nodes is
//! a contiguous slice of events, so replacing a sentence with its
//! translation is a splice rather than a tree surgery.
//!
//! ```text
//! Paragraph[Text("Hi "), Emphasis[Text("there")]]
//!
//! Start(Paragraph)
//!   Leaf(Text "Hi ")
//!   Start(Emphasis)
//!     Leaf(Text "there")
//!   Finish
//! Finish
//! ```
//!
//! A node with children produces a `Start`/`Finish` pair; a node without
//! children produces one `Leaf`. The root itself is not part of the stream.

use crate::tree::{Node, NodeId, Tree};

/// Where the node behind an event comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A node of the source tree, copied without its children.
    Existing(NodeId),
    /// A node that does not exist in the source tree, such as a run of
    /// translated text.
    New(Node),
}

/// One step of a flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Open a node; following events become its children.
    Start(Origin),
    /// A childless node.
    Leaf(Origin),
    /// Close the most recently started node.
    Finish,
}

impl Event {
    pub fn start(id: NodeId) -> Self {
        Event::Start(Origin::Existing(id))
    }

    pub fn leaf(id: NodeId) -> Self {
        Event::Leaf(Origin::Existing(id))
    }

    /// The source node this event was produced from, if any.
    pub fn source(&self) -> Option<NodeId> {
        match self {
            Event::Start(Origin::Existing(id)) | Event::Leaf(Origin::Existing(id)) => Some(*id),
            _ => None,
        }
    }
}

/// Flatten everything below the root, pre-order.
pub fn flatten(tree: &Tree) -> Vec<Event> {
    let mut events = Vec::with_capacity(tree.len() * 2);
    for &child in tree.children(tree.root()) {
        flatten_into(tree, child, &mut events);
    }
    events
}

fn flatten_into(tree: &Tree, id: NodeId, events: &mut Vec<Event>) {
    let children = tree.children(id);
    if children.is_empty() {
        events.push(Event::leaf(id));
        return;
    }
    events.push(Event::start(id));
    for &child in children {
        flatten_into(tree, child, events);
    }
    events.push(Event::Finish);
}

/// Index of the `Finish` matching the `Start` at `start`, or the last index
/// if the stream is unbalanced.
pub fn matching_finish(events: &[Event], start: usize) -> usize {
    let mut depth = 0usize;
    for (i, event) in events.iter().enumerate().skip(start) {
        match event {
            Event::Start(_) => depth += 1,
            Event::Finish => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i;
                }
            }
            Event::Leaf(_) => {}
        }
    }
    events.len().saturating_sub(1)
}
