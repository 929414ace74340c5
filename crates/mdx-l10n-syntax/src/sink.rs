//! Sink for turning a flat event stream back into a [`Tree`].

use crate::event::{Event, Origin};
use crate::tree::{NodeId, Tree};

/// Rebuilds a tree from events that refer to nodes of a source tree.
///
/// The sink is forgiving about balance: a stray `Finish` at the top level is
/// ignored and nodes still open at the end are closed implicitly.
pub struct Sink<'t> {
    source: &'t Tree,
    tree: Tree,
    stack: Vec<NodeId>,
}

impl<'t> Sink<'t> {
    pub fn new(source: &'t Tree) -> Self {
        let tree = Tree::new();
        let stack = vec![tree.root()];
        Self {
            source,
            tree,
            stack,
        }
    }

    pub fn event(&mut self, event: Event) {
        match event {
            Event::Start(origin) => {
                let parent = self.top();
                let node = self.materialize(origin);
                let id = self.tree.append(parent, node);
                self.stack.push(id);
            }
            Event::Leaf(origin) => {
                let parent = self.top();
                let node = self.materialize(origin);
                self.tree.append(parent, node);
            }
            Event::Finish => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
            }
        }
    }

    /// Feed every event and return the finished tree.
    pub fn finish(mut self, events: impl IntoIterator<Item = Event>) -> Tree {
        for event in events {
            self.event(event);
        }
        self.tree
    }

    fn top(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn materialize(&self, origin: Origin) -> crate::tree::Node {
        match origin {
            Origin::Existing(id) => self.source[id].detached(),
            Origin::New(node) => node,
        }
    }
}
