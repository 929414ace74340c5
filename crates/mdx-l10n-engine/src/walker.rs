//! # Segmentation Walk
//!
//! Extraction and localization must cut a document into exactly the same
//! runs, with exactly the same placeholder numbering, or translations would
//! land on the wrong text. Both go through this one walk and differ only in
//! the [`Visitor`] they plug in.
//!
//! ## Two Passes
//!
//! [`prepare`] clones the tree and marks every node that can be folded into
//! a run (`localizable`): text, inline leaves, and inline wrappers whose
//! whole subtree is localizable. [`walk`] then goes over the flattened
//! events of the prepared tree:
//!
//! ```text
//! Start(Paragraph)          not localizable → flush, nothing open
//!   Leaf(Text "Hello ")     starts a run at event 1
//!   Start(Link)             push c0
//!     Leaf(Text "world")
//!   Finish                  pop c0
//!   Leaf(Text ".")
//! Finish                    not localizable → flush run 1..6
//! ```
//!
//! A flushed run is reported together with its event range, so the
//! localizer can splice translated events in its place.

use std::ops::Range;

use mdx_l10n_syntax::{Event, Node, NodeId, NodeKind, Origin, Tree, event::matching_finish};

use crate::accumulator::{Message, MessageAccumulator};
use crate::attributes::localizable_attributes;
use crate::classify::{Class, TagRules, classify, is_pinned};
use crate::directives::{DirectiveState, parse_directive};
use crate::normalize::is_translatable;

/// A translatable property of a node outside the text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Title,
    Alt,
    Url,
    /// Literal value of the attribute at this index.
    Attribute(usize),
}

/// Receives what the walk finds, in document order.
pub trait Visitor {
    fn field(&mut self, node: NodeId, field: Field, value: &str);

    /// Raw front matter, handed over as is.
    fn frontmatter(&mut self, node: NodeId, raw: &str);

    /// A translatable run spanning `events`.
    fn message(&mut self, events: Range<usize>, message: Message<NodeId>, comment: Option<String>);
}

/// Clone `tree` and annotate it for segmentation.
pub fn prepare(tree: &Tree, rules: &TagRules) -> Tree {
    let mut tree = tree.clone();
    for id in tree.descendants() {
        let node = &tree[id];
        if matches!(node.kind, NodeKind::LinkReference(_))
            && node.children.is_empty()
            && let Some(label) = node.label.clone()
        {
            tree.append(id, Node::text(label));
        }
    }
    let root = tree.root();
    mark(&mut tree, root, rules);
    tree
}

fn mark(tree: &mut Tree, id: NodeId, rules: &TagRules) -> bool {
    let children = tree.children(id).to_vec();
    let mut all = true;
    for child in children {
        all &= mark(tree, child, rules);
    }
    let localizable = match classify(tree, id, rules) {
        Class::Text | Class::Leaf => true,
        Class::Wrap => all,
        Class::Breaking | Class::Container | Class::Opaque => false,
    };
    tree[id].localizable = localizable;
    localizable
}

struct Run {
    start: usize,
    acc: MessageAccumulator<NodeId>,
}

/// Walk the events of a [`prepare`]d tree.
pub fn walk<V: Visitor>(
    tree: &Tree,
    events: &[Event],
    rules: &TagRules,
    links: bool,
    visitor: &mut V,
) {
    let mut walker = Walker {
        tree,
        rules,
        state: DirectiveState::new(links),
        run: None,
        open: Vec::new(),
        visitor,
    };
    walker.events(events);
}

struct Walker<'a, V> {
    tree: &'a Tree,
    rules: &'a TagRules,
    state: DirectiveState,
    run: Option<Run>,
    /// One entry per open `Start`: whether it belongs to the current run.
    open: Vec<bool>,
    visitor: &'a mut V,
}

impl<V: Visitor> Walker<'_, V> {
    fn events(&mut self, events: &[Event]) {
        let mut i = 0;
        while i < events.len() {
            match &events[i] {
                Event::Start(origin) | Event::Leaf(origin) => {
                    let starts = matches!(events[i], Event::Start(_));
                    let Origin::Existing(id) = origin else {
                        log::debug!("skipping synthesized node at event {i}");
                        if starts {
                            self.open.push(false);
                        }
                        i += 1;
                        continue;
                    };
                    if self.tree[*id].localizable {
                        self.inline(i, *id, starts);
                        if starts {
                            self.open.push(true);
                        }
                    } else {
                        self.flush(i);
                        if self.block(*id) == Class::Opaque {
                            if starts {
                                i = matching_finish(events, i);
                            }
                        } else if starts {
                            self.open.push(false);
                        }
                    }
                }
                Event::Finish => {
                    if self.open.pop().unwrap_or(false) {
                        if let Some(run) = &mut self.run {
                            run.acc.pop();
                        }
                    } else {
                        self.flush(i);
                    }
                }
            }
            i += 1;
        }
        self.flush(events.len());
    }

    fn inline(&mut self, index: usize, id: NodeId, starts: bool) {
        let node = &self.tree[id];
        let run = self.run.get_or_insert_with(|| Run {
            start: index,
            acc: MessageAccumulator::new(),
        });
        if node.kind == NodeKind::Text {
            run.acc.add_text(node.value.as_deref().unwrap_or_default());
            return;
        }
        if is_pinned(&node.kind) {
            run.acc.push_pinned(id);
        } else {
            run.acc.push(id);
        }
        if !starts {
            run.acc.pop();
        }
        self.fields(id);
    }

    /// Handle a node outside any run. Returns its class.
    fn block(&mut self, id: NodeId) -> Class {
        let node = &self.tree[id];
        let class = classify(self.tree, id, self.rules);
        match &node.kind {
            NodeKind::FlowExpression | NodeKind::Html { .. } => {
                if let Some(directive) = node.value.as_deref().and_then(parse_directive) {
                    self.state.apply(directive);
                }
            }
            NodeKind::Frontmatter => {
                self.visitor
                    .frontmatter(id, node.value.as_deref().unwrap_or_default());
            }
            NodeKind::Element(element) if class == Class::Opaque => {
                log::debug!("not descending into <{}>", element.name);
            }
            _ => self.fields(id),
        }
        class
    }

    fn fields(&mut self, id: NodeId) {
        let node = &self.tree[id];
        match &node.kind {
            NodeKind::Link(_) => {
                self.field(id, Field::Title, node.title.as_deref());
                self.url(id, node.url.as_deref());
            }
            // A definition is only looked at when its link is localizable.
            NodeKind::Definition if self.state.links => {
                self.field(id, Field::Title, node.title.as_deref());
                self.url(id, node.url.as_deref());
            }
            NodeKind::Image => {
                self.field(id, Field::Alt, node.alt.as_deref());
                self.field(id, Field::Title, node.title.as_deref());
                self.url(id, node.url.as_deref());
            }
            NodeKind::ImageReference(_) => self.field(id, Field::Alt, node.alt.as_deref()),
            NodeKind::Element(element) => {
                for (index, value) in localizable_attributes(element) {
                    self.field(id, Field::Attribute(index), Some(&value));
                }
            }
            _ => {}
        }
    }

    fn field(&mut self, id: NodeId, field: Field, value: Option<&str>) {
        if let Some(value) = value
            && is_translatable(value, self.state.links)
        {
            self.visitor.field(id, field, value);
        }
    }

    fn url(&mut self, id: NodeId, url: Option<&str>) {
        if self.state.links {
            self.field(id, Field::Url, url);
        }
    }

    fn flush(&mut self, end: usize) {
        let Some(run) = self.run.take() else {
            return;
        };
        if run.acc.text_length() == 0 {
            return;
        }

        let message = run.acc.finish();
        let mut notes: Vec<String> = self.state.take_comment().into_iter().collect();
        for (n, &id) in message.mapping().iter().enumerate() {
            let node = &self.tree[id];
            let value = node.value.as_deref().unwrap_or_default();
            match node.kind {
                NodeKind::InlineCode => {
                    notes.push(format!("c{n} will be replaced with the inline code `{value}`."))
                }
                NodeKind::InlineExpression => notes.push(format!(
                    "c{n} will be replaced with the inline expression {{{value}}}."
                )),
                _ => {}
            }
        }

        if is_translatable(message.minimal_string(), self.state.links) {
            let comment = (!notes.is_empty()).then(|| notes.join(" "));
            self.visitor.message(run.start..end, message, comment);
        }
    }
}
