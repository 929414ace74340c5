//! # Message Accumulator
//!
//! Builds the string a translator sees from a run of inline nodes. Text is
//! kept verbatim and every non-text node becomes a numbered placeholder:
//!
//! ```text
//! Hello *big* `code` world   →   Hello <c0>big</c0> <c1/> world
//! ```
//!
//! ## Minimization
//!
//! Markup at the edges of a run carries no meaning for the translator, so
//! [`MessageAccumulator::finish`] moves it out of the message into a prefix
//! and a suffix that are re-emitted untouched on reconstruction:
//!
//! ```text
//! **Note: read this**   →   prefix [Open(strong)]
//!                           text   "Note: read this"
//!                           suffix [Close(strong)]
//! ```
//!
//! Three rules repeat until nothing changes:
//!
//! 1. A single component wrapping the whole message is unwrapped.
//! 2. A leading or trailing component that holds no text is demoted, unless
//!    it is pinned (inline code, expressions, footnote references).
//! 3. Leading and trailing whitespace moves out of the edge text.
//!
//! The remaining components are then numbered from 0 in document order, and
//! the numbering defines the [`Message::mapping`].

mod placeholder;

pub use placeholder::{Resolved, Token, tokenize};

use crate::normalize::is_whitespace;

/// One piece of a reconstructed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece<T> {
    Text(String),
    /// Start of a component whose children follow.
    Open(T),
    Close(T),
    /// A component without children.
    Whole(T),
}

#[derive(Debug, Clone)]
enum Item<T> {
    Text(String),
    Component {
        value: T,
        pinned: bool,
        children: Vec<Item<T>>,
    },
}

/// Builds one message; see the module docs.
#[derive(Debug, Clone)]
pub struct MessageAccumulator<T> {
    root: Vec<Item<T>>,
    /// Path of child indices from the root to the open component.
    open: Vec<usize>,
    text_length: usize,
}

impl<T> Default for MessageAccumulator<T> {
    fn default() -> Self {
        Self {
            root: Vec::new(),
            open: Vec::new(),
            text_length: 0,
        }
    }
}

impl<T: Clone> MessageAccumulator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.text_length += text.chars().filter(|&c| !is_whitespace(c)).count();
        let items = self.current();
        if let Some(Item::Text(last)) = items.last_mut() {
            last.push_str(text);
        } else {
            items.push(Item::Text(text.to_string()));
        }
    }

    /// Open a demotable component.
    pub fn push(&mut self, value: T) {
        self.open_component(value, false);
    }

    /// Open a component that is never moved to the prefix or suffix.
    pub fn push_pinned(&mut self, value: T) {
        self.open_component(value, true);
    }

    /// Close the most recently opened component. Returns `false` when none
    /// is open.
    pub fn pop(&mut self) -> bool {
        self.open.pop().is_some()
    }

    /// Non-whitespace characters added so far, placeholders excluded.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Minimize and number the accumulated run.
    pub fn finish(self) -> Message<T> {
        let mut items = self.root;
        let mut prefix = Vec::new();
        let mut suffix = Vec::new();

        loop {
            let wrapped = matches!(
                items.as_slice(),
                [Item::Component { children, pinned: false, .. }] if !children.is_empty()
            );
            if wrapped
                && let Some(Item::Component {
                    value, children, ..
                }) = items.pop()
            {
                prefix.push(Piece::Open(value.clone()));
                suffix.push(Piece::Close(value));
                items = children;
                continue;
            }

            let mut changed = false;

            if items.first().is_some_and(is_decorative) {
                let item = items.remove(0);
                flatten_into(item, &mut prefix);
                changed = true;
            }
            if items.last().is_some_and(is_decorative)
                && let Some(item) = items.pop()
            {
                let mut pieces = Vec::new();
                flatten_into(item, &mut pieces);
                suffix.extend(pieces.into_iter().rev());
                changed = true;
            }

            if let Some(Item::Text(text)) = items.first_mut() {
                let body = text.trim_start_matches(is_whitespace);
                if body.len() < text.len() {
                    let moved = text[..text.len() - body.len()].to_string();
                    *text = body.to_string();
                    push_text(&mut prefix, moved);
                    if text.is_empty() {
                        items.remove(0);
                    }
                    changed = true;
                }
            }
            if let Some(Item::Text(text)) = items.last_mut() {
                let body = text.trim_end_matches(is_whitespace);
                if body.len() < text.len() {
                    let moved = text[body.len()..].to_string();
                    text.truncate(body.len());
                    suffix.push(Piece::Text(moved));
                    if text.is_empty() {
                        items.pop();
                    }
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        suffix.reverse();
        let mut mapping = Vec::new();
        let mut leaves = Vec::new();
        let mut text = String::new();
        render(&items, &mut mapping, &mut leaves, &mut text);

        Message {
            text,
            prefix,
            suffix,
            mapping,
            leaves,
        }
    }

    fn open_component(&mut self, value: T, pinned: bool) {
        let items = self.current();
        items.push(Item::Component {
            value,
            pinned,
            children: Vec::new(),
        });
        let index = items.len() - 1;
        self.open.push(index);
    }

    fn current(&mut self) -> &mut Vec<Item<T>> {
        let mut items = &mut self.root;
        for &index in &self.open {
            items = match &mut items[index] {
                Item::Component { children, .. } => children,
                Item::Text(_) => unreachable!("open path only records components"),
            };
        }
        items
    }
}

/// A minimized run ready to be stored or reconstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<T> {
    text: String,
    prefix: Vec<Piece<T>>,
    suffix: Vec<Piece<T>>,
    mapping: Vec<T>,
    /// Whether placeholder `n` was rendered self-closing.
    leaves: Vec<bool>,
}

impl<T: Clone> Message<T> {
    /// The placeholder string, e.g. `Hello <c0>world</c0>.`
    pub fn minimal_string(&self) -> &str {
        &self.text
    }

    pub fn prefix(&self) -> &[Piece<T>] {
        &self.prefix
    }

    pub fn suffix(&self) -> &[Piece<T>] {
        &self.suffix
    }

    /// Placeholder index → component.
    pub fn mapping(&self) -> &[T] {
        &self.mapping
    }
}

/// Whitespace-only text or a non-pinned component without real content.
fn is_decorative<T>(item: &Item<T>) -> bool {
    match item {
        Item::Text(_) => false,
        Item::Component {
            pinned, children, ..
        } => !pinned && children.iter().all(is_blank),
    }
}

fn is_blank<T>(item: &Item<T>) -> bool {
    match item {
        Item::Text(text) => text.chars().all(is_whitespace),
        Item::Component {
            pinned, children, ..
        } => !pinned && children.iter().all(is_blank),
    }
}

fn flatten_into<T>(item: Item<T>, out: &mut Vec<Piece<T>>)
where
    T: Clone,
{
    match item {
        Item::Text(text) => push_text(out, text),
        Item::Component {
            value, children, ..
        } if children.is_empty() => out.push(Piece::Whole(value)),
        Item::Component {
            value, children, ..
        } => {
            out.push(Piece::Open(value.clone()));
            for child in children {
                flatten_into(child, out);
            }
            out.push(Piece::Close(value));
        }
    }
}

fn push_text<T>(out: &mut Vec<Piece<T>>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Piece::Text(last)) = out.last_mut() {
        last.push_str(&text);
    } else {
        out.push(Piece::Text(text));
    }
}

fn render<T: Clone>(
    items: &[Item<T>],
    mapping: &mut Vec<T>,
    leaves: &mut Vec<bool>,
    out: &mut String,
) {
    for item in items {
        match item {
            Item::Text(text) => out.push_str(text),
            Item::Component {
                value, children, ..
            } => {
                let index = mapping.len();
                mapping.push(value.clone());
                leaves.push(children.is_empty());
                if children.is_empty() {
                    out.push_str(&format!("<c{index}/>"));
                } else {
                    out.push_str(&format!("<c{index}>"));
                    render(children, mapping, leaves, out);
                    out.push_str(&format!("</c{index}>"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_has_no_placeholders() {
        let mut acc = MessageAccumulator::<&str>::new();
        acc.add_text("This is a test");

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "This is a test");
        assert!(message.mapping().is_empty());
        assert!(message.prefix().is_empty());
    }

    #[test]
    fn inline_components_become_numbered_placeholders() {
        let mut acc = MessageAccumulator::new();
        acc.add_text("This is a ");
        acc.push("em");
        acc.add_text("test");
        acc.pop();
        acc.add_text(" of the ");
        acc.push_pinned("code");
        acc.pop();
        acc.add_text(" system.");

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "This is a <c0>test</c0> of the <c1/> system.");
        assert_eq!(message.mapping(), &["em", "code"]);
    }

    #[test]
    fn outer_wrapper_moves_to_prefix_and_suffix() {
        let mut acc = MessageAccumulator::new();
        acc.push("strong");
        acc.add_text("Note: read ");
        acc.push("em");
        acc.add_text("this");
        acc.pop();
        acc.pop();

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "Note: read <c0>this</c0>");
        assert_eq!(message.prefix(), &[Piece::Open("strong")]);
        assert_eq!(message.suffix(), &[Piece::Close("strong")]);
        assert_eq!(message.mapping(), &["em"]);
    }

    #[test]
    fn leading_decorative_component_is_demoted() {
        // Given: an empty span and an image before the text
        let mut acc = MessageAccumulator::new();
        acc.push("span");
        acc.add_text(" ");
        acc.pop();
        acc.push("img");
        acc.pop();
        acc.add_text(" Click ");
        acc.push("em");
        acc.add_text("here");
        acc.pop();

        // When
        let message = acc.finish();

        // Then: both leave the message and numbering restarts at 0
        assert_eq!(message.minimal_string(), "Click <c0>here</c0>");
        assert_eq!(
            message.prefix(),
            &[
                Piece::Open("span"),
                Piece::Text(" ".to_string()),
                Piece::Close("span"),
                Piece::Whole("img"),
                Piece::Text(" ".to_string()),
            ]
        );
        assert_eq!(message.mapping(), &["em"]);
    }

    #[test]
    fn pinned_components_stay_at_the_edges() {
        let mut acc = MessageAccumulator::new();
        acc.push_pinned("code");
        acc.pop();
        acc.add_text(" is the command.");

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "<c0/> is the command.");
        assert!(message.prefix().is_empty());
    }

    #[test]
    fn edge_whitespace_moves_out() {
        let mut acc = MessageAccumulator::<&str>::new();
        acc.add_text("\n  Hello world \u{200B}");

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "Hello world");
        assert_eq!(message.prefix(), &[Piece::Text("\n  ".to_string())]);
        assert_eq!(message.suffix(), &[Piece::Text(" \u{200B}".to_string())]);
    }

    #[test]
    fn trailing_decorations_keep_document_order() {
        let mut acc = MessageAccumulator::new();
        acc.add_text("Done.");
        acc.push("br");
        acc.pop();
        acc.push("img");
        acc.pop();

        let message = acc.finish();

        assert_eq!(message.minimal_string(), "Done.");
        assert_eq!(message.suffix(), &[Piece::Whole("br"), Piece::Whole("img")]);
    }

    #[test]
    fn text_length_ignores_whitespace_and_placeholders() {
        let mut acc = MessageAccumulator::new();
        acc.add_text(" a b ");
        acc.push("em");
        acc.pop();

        assert_eq!(acc.text_length(), 2);
        assert!(!acc.is_empty());
    }

    #[test]
    fn pop_without_push_is_reported() {
        let mut acc = MessageAccumulator::<&str>::new();
        assert!(!acc.pop());
    }
}
