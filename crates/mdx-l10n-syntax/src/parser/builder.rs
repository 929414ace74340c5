//! Builds a [`Tree`] from pulldown-cmark events.
//!
//! # Event Flow
//!
//! pulldown-cmark emits a flat stream: `Start(tag)` opens a node, `End(tag)`
//! closes it, and leaf events (`Text`, `Code`, `InlineHtml`, ...) appear in
//! between. The builder keeps a stack of open frames and appends each node to
//! the frame on top:
//!
//! ```text
//! Start(Paragraph)          push Paragraph
//!   Text("Hello ")          buffer text
//!   Start(Emphasis)         flush text, push Emphasis
//!     Text("world")         buffer text
//!   End(Emphasis)           flush text, pop
//! End(Paragraph)            pop
//! ```
//!
//! Two things CommonMark leaves raw are decomposed here:
//!
//! - **Inline HTML** arrives one tag per event. An opening tag pushes an
//!   element frame; the matching closing tag pops it. A closing tag that
//!   does not match the top frame stays raw HTML.
//! - **HTML blocks** arrive as one string. A lone opening tag starts a flow
//!   element whose children are the following blocks, up to a lone closing
//!   tag. A tag whose body and closing tag share the block is parsed
//!   recursively. Anything else keeps its first tag structured and the rest
//!   verbatim.
//!
//! Text is buffered until the next non-text event so adjacent text events
//! merge into one node, then split around expression islands.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event as MdEvent, LinkType, Parser, Tag, TagEnd};

use super::islands::{IslandKind, Islands, Piece};
use super::options;
use super::tags::{self, is_void};
use crate::tree::{
    Align, Block, Element, LinkStyle, Node, NodeId, NodeKind, ReferenceKind, TagForm, Tree,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum FrameKind {
    /// Opened by a pulldown-cmark `Start`, closed by its `End`.
    Markdown,
    /// Opened by an inline HTML tag.
    InlineElement(String),
    /// Opened by a lone HTML block tag.
    FlowElement(String),
    /// A pulldown-cmark container we do not model; children go to the parent.
    Transparent,
}

#[derive(Debug)]
struct Frame {
    id: NodeId,
    kind: FrameKind,
}

/// Events whose text belongs to a field rather than to child nodes.
enum Capture {
    Alt(NodeId, String),
    Code(NodeId, String),
    Metadata(NodeId, String),
    Html(String),
}

struct PendingDefinition {
    offset: usize,
    node: Node,
}

pub struct Builder<'i> {
    islands: &'i Islands,
    tree: Tree,
    stack: Vec<Frame>,
    text: String,
    capture: Option<Capture>,
    /// Source of the top-level reference definitions, appended to nested
    /// fragments so their references still resolve.
    definition_source: String,
}

impl<'i> Builder<'i> {
    pub fn new(islands: &'i Islands) -> Self {
        Self {
            islands,
            tree: Tree::new(),
            stack: Vec::new(),
            text: String::new(),
            capture: None,
            definition_source: String::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn finish(self) -> Tree {
        self.tree
    }

    /// Parse `text` as a sequence of blocks appended to `parent`.
    pub fn fragment(&mut self, text: &str, parent: NodeId) {
        let base = self.stack.len();
        let nested = base > 0;
        self.stack.push(Frame {
            id: parent,
            kind: FrameKind::Markdown,
        });

        let source = if nested && !self.definition_source.is_empty() {
            format!("{text}\n\n{}", self.definition_source)
        } else {
            text.to_string()
        };
        let parser = Parser::new_ext(&source, options());

        let mut definitions: Vec<PendingDefinition> = parser
            .reference_definitions()
            .iter()
            .filter(|(_, def)| def.span.start < text.len())
            .map(|(label, def)| PendingDefinition {
                offset: def.span.start,
                node: Node::new(NodeKind::Definition)
                    .with_label(written_label(&source, def.span.clone(), label))
                    .with_url(self.islands.restore(&def.dest))
                    .with_title(def.title.as_ref().map(|t| self.islands.restore(t))),
            })
            .collect();
        definitions.sort_by_key(|d| d.offset);
        if !nested {
            let mut spans: Vec<_> = parser
                .reference_definitions()
                .iter()
                .map(|(_, def)| def.span.clone())
                .collect();
            spans.sort_by_key(|span| span.start);
            self.definition_source = spans
                .into_iter()
                .map(|span| source[span].trim_end().to_string())
                .collect::<Vec<_>>()
                .join("\n");
        }
        let mut definitions = definitions.into_iter().peekable();

        for (event, range) in parser.into_offset_iter() {
            if self.capture.is_none() && self.at_block_level(base) {
                while let Some(def) = definitions.next_if(|d| d.offset < range.start) {
                    self.leaf(def.node);
                }
            }
            self.event(event);
        }

        self.flush_text();
        for def in definitions {
            self.leaf(def.node);
        }
        while self.stack.len() > base {
            if let Some(frame) = self.stack.pop() {
                self.mark_unclosed(&frame);
            }
        }
    }

    fn at_block_level(&self, base: usize) -> bool {
        self.stack.len() == base + 1
            || matches!(
                self.stack.last(),
                Some(Frame {
                    kind: FrameKind::FlowElement(_),
                    ..
                })
            )
    }

    fn event(&mut self, event: MdEvent<'_>) {
        if self.capture.is_some() {
            self.captured(event);
            return;
        }
        match event {
            MdEvent::Start(tag) => self.start(tag),
            MdEvent::End(end) => self.end(end),
            MdEvent::Text(text) => self.text.push_str(&text),
            MdEvent::Code(code) => {
                self.flush_text();
                let value = self.islands.restore(&code);
                self.leaf(Node::new(NodeKind::InlineCode).with_value(value));
            }
            MdEvent::Html(html) => {
                self.flush_text();
                self.html_block(&html);
            }
            MdEvent::InlineHtml(html) => {
                self.flush_text();
                self.inline_html(&html);
            }
            MdEvent::FootnoteReference(label) => {
                self.flush_text();
                self.leaf(Node::new(NodeKind::FootnoteReference).with_label(label.to_string()));
            }
            MdEvent::SoftBreak => self.text.push('\n'),
            MdEvent::HardBreak => {
                self.flush_text();
                self.leaf(Node::new(NodeKind::Break));
            }
            MdEvent::Rule => {
                self.flush_text();
                self.leaf(Node::new(NodeKind::Container(Block::ThematicBreak)));
            }
            _ => {}
        }
    }

    fn captured(&mut self, event: MdEvent<'_>) {
        let Some(capture) = &mut self.capture else {
            return;
        };
        let done = match (capture, &event) {
            (Capture::Alt(_, alt), MdEvent::Text(t) | MdEvent::Code(t)) => {
                alt.push_str(t);
                false
            }
            (Capture::Alt(_, alt), MdEvent::SoftBreak | MdEvent::HardBreak) => {
                alt.push(' ');
                false
            }
            (Capture::Alt(..), MdEvent::End(end)) => *end == TagEnd::Image,
            (Capture::Alt(..), _) => false,
            (
                Capture::Code(_, buf) | Capture::Metadata(_, buf) | Capture::Html(buf),
                MdEvent::Text(t) | MdEvent::Html(t),
            ) => {
                buf.push_str(t);
                false
            }
            (_, MdEvent::End(_)) => true,
            _ => false,
        };
        if done {
            self.end_capture();
        }
    }

    fn end_capture(&mut self) {
        match self.capture.take() {
            Some(Capture::Alt(id, alt)) => self.tree[id].alt = Some(self.islands.restore(&alt)),
            Some(Capture::Code(id, code)) => {
                self.tree[id].value = Some(self.islands.restore(&code))
            }
            Some(Capture::Metadata(id, raw)) => self.tree[id].value = Some(raw),
            Some(Capture::Html(raw)) => self.html_block(&raw),
            None => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        self.flush_text();
        let container = |block| Node::new(NodeKind::Container(block));
        match tag {
            Tag::Paragraph => self.open(container(Block::Paragraph)),
            Tag::Heading { level, .. } => self.open(container(Block::Heading(level as u8))),
            Tag::BlockQuote(_) => self.open(container(Block::BlockQuote)),
            Tag::CodeBlock(kind) => {
                let (fenced, info) = match kind {
                    CodeBlockKind::Fenced(info) => (true, info.to_string()),
                    CodeBlockKind::Indented => (false, String::new()),
                };
                let mut node = container(Block::CodeBlock { fenced });
                if !info.is_empty() {
                    node.label = Some(info);
                }
                let id = self.leaf(node);
                self.capture = Some(Capture::Code(id, String::new()));
            }
            Tag::HtmlBlock => self.capture = Some(Capture::Html(String::new())),
            Tag::List(start) => self.open(container(Block::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            })),
            Tag::Item => self.open(container(Block::ListItem)),
            Tag::FootnoteDefinition(label) => {
                self.open(Node::new(NodeKind::FootnoteDefinition).with_label(label.to_string()))
            }
            Tag::Table(aligns) => {
                self.open(container(Block::Table(aligns.iter().map(align).collect())))
            }
            Tag::TableHead => self.open(container(Block::TableHead)),
            Tag::TableRow => self.open(container(Block::TableRow)),
            Tag::TableCell => self.open(container(Block::TableCell)),
            Tag::Emphasis => self.open(Node::new(NodeKind::Emphasis)),
            Tag::Strong => self.open(Node::new(NodeKind::Strong)),
            Tag::Strikethrough => self.open(Node::new(NodeKind::Delete)),
            Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            } => {
                let node = self.link(link_type, &dest_url, &title, &id);
                self.open(node);
            }
            Tag::Image {
                link_type,
                dest_url,
                title,
                id,
            } => {
                let node = self.image(link_type, &dest_url, &title, &id);
                let id = self.leaf(node);
                self.capture = Some(Capture::Alt(id, String::new()));
            }
            Tag::MetadataBlock(_) => {
                let id = self.leaf(Node::new(NodeKind::Frontmatter));
                self.capture = Some(Capture::Metadata(id, String::new()));
            }
            _ => {
                let id = self.top();
                self.stack.push(Frame {
                    id,
                    kind: FrameKind::Transparent,
                });
            }
        }
    }

    fn end(&mut self, end: TagEnd) {
        if end == TagEnd::Paragraph && self.lone_island() {
            self.stack.pop();
            return;
        }
        self.flush_text();
        while let Some(frame) = self.stack.pop() {
            if frame.kind == FrameKind::Markdown || frame.kind == FrameKind::Transparent {
                break;
            }
            self.mark_unclosed(&frame);
        }
    }

    /// Turn a paragraph holding nothing but one island into a flow
    /// expression or module statement.
    fn lone_island(&mut self) -> bool {
        let Some(frame) = self.stack.last() else {
            return false;
        };
        let id = frame.id;
        if !self.tree.children(id).is_empty() {
            return false;
        }
        let islands = self.islands;
        let Some(island) = islands.lone(&self.text) else {
            return false;
        };
        let kind = match island.kind {
            IslandKind::Expression => NodeKind::FlowExpression,
            IslandKind::Module => NodeKind::ModuleStatement,
        };
        self.tree[id] = Node::new(kind).with_value(island.source.clone());
        self.text.clear();
        true
    }

    fn link(&self, link_type: LinkType, dest: &str, title: &str, label: &str) -> Node {
        let title = (!title.is_empty()).then(|| self.islands.restore(title));
        match reference_kind(link_type) {
            Some(kind) => Node::new(NodeKind::LinkReference(kind)).with_label(label),
            None => {
                let style = match link_type {
                    LinkType::Autolink => LinkStyle::Autolink,
                    LinkType::Email => LinkStyle::Email,
                    _ => LinkStyle::Inline,
                };
                Node::new(NodeKind::Link(style))
                    .with_url(self.islands.restore(dest))
                    .with_title(title)
            }
        }
    }

    fn image(&self, link_type: LinkType, dest: &str, title: &str, label: &str) -> Node {
        let title = (!title.is_empty()).then(|| self.islands.restore(title));
        match reference_kind(link_type) {
            Some(kind) => Node::new(NodeKind::ImageReference(kind)).with_label(label),
            None => Node::new(NodeKind::Image)
                .with_url(self.islands.restore(dest))
                .with_title(title),
        }
    }

    fn inline_html(&mut self, raw: &str) {
        let islands = self.islands;
        let tag = match tags::parse_tag(raw, islands) {
            Some(tag) if !raw.starts_with("<!--") => tag,
            _ => {
                self.leaf(Node::new(NodeKind::Html { flow: false }).with_value(islands.restore(raw)));
                return;
            }
        };

        if tag.closing {
            let matches_top = matches!(
                self.stack.last(),
                Some(Frame { kind: FrameKind::InlineElement(name), .. }) if *name == tag.name
            );
            if matches_top {
                self.flush_text();
                self.stack.pop();
            } else {
                self.leaf(Node::new(NodeKind::Html { flow: false }).with_value(islands.restore(raw)));
            }
            return;
        }

        let mut element = Element::new(tag.name.clone(), false);
        element.attributes = tag.attributes;
        if tag.self_closing || is_void(&tag.name) {
            element.form = TagForm::SelfClosing;
            self.leaf(Node::new(NodeKind::Element(element)));
        } else {
            let id = self.leaf(Node::new(NodeKind::Element(element)));
            self.stack.push(Frame {
                id,
                kind: FrameKind::InlineElement(tag.name),
            });
        }
    }

    fn html_block(&mut self, raw: &str) {
        let islands = self.islands;
        let trimmed = raw.trim();
        let raw_node = || Node::new(NodeKind::Html { flow: true }).with_value(islands.restore(trimmed));

        let tag = match tags::parse_tag(trimmed, islands) {
            Some(tag) if !trimmed.starts_with("<!--") => tag,
            _ => {
                self.leaf(raw_node());
                return;
            }
        };
        let rest = &trimmed[tag.len..];

        if tag.closing {
            let matches_top = matches!(
                self.stack.last(),
                Some(Frame { kind: FrameKind::FlowElement(name), .. }) if *name == tag.name
            );
            if matches_top && rest.trim().is_empty() {
                self.stack.pop();
            } else {
                self.leaf(raw_node());
            }
            return;
        }

        let mut element = Element::new(tag.name.clone(), true);
        element.attributes = tag.attributes;

        if rest.trim().is_empty() {
            if tag.self_closing || is_void(&tag.name) {
                element.form = TagForm::SelfClosing;
                self.leaf(Node::new(NodeKind::Element(element)));
            } else {
                let id = self.leaf(Node::new(NodeKind::Element(element)));
                self.stack.push(Frame {
                    id,
                    kind: FrameKind::FlowElement(tag.name),
                });
            }
            return;
        }

        let close = format!("</{}>", tag.name);
        if !tag.self_closing
            && let Some(inner) = rest.strip_suffix(close.as_str())
            && balanced(inner, &tag.name)
        {
            let id = self.leaf(Node::new(NodeKind::Element(element)));
            self.fragment(inner, id);
            return;
        }

        element.form = TagForm::Raw {
            rest: islands.restore(rest),
        };
        self.leaf(Node::new(NodeKind::Element(element)));
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        let islands = self.islands;
        for piece in islands.split(&text) {
            let node = match piece {
                Piece::Text(t) => Node::text(t),
                Piece::Island(island) if island.kind == IslandKind::Expression => {
                    Node::new(NodeKind::InlineExpression).with_value(island.source.clone())
                }
                Piece::Island(island) => Node::text(island.original()),
            };
            self.leaf(node);
        }
    }

    fn top(&self) -> NodeId {
        self.stack
            .last()
            .map(|frame| frame.id)
            .unwrap_or_else(|| self.tree.root())
    }

    fn leaf(&mut self, node: Node) -> NodeId {
        let parent = self.top();
        self.tree.append(parent, node)
    }

    fn open(&mut self, node: Node) {
        let id = self.leaf(node);
        self.stack.push(Frame {
            id,
            kind: FrameKind::Markdown,
        });
    }

    fn mark_unclosed(&mut self, frame: &Frame) {
        if matches!(frame.kind, FrameKind::InlineElement(_) | FrameKind::FlowElement(_))
            && let NodeKind::Element(element) = &mut self.tree[frame.id].kind
        {
            element.form = TagForm::Unclosed;
        }
    }
}

fn reference_kind(link_type: LinkType) -> Option<ReferenceKind> {
    match link_type {
        LinkType::Reference | LinkType::ReferenceUnknown => Some(ReferenceKind::Full),
        LinkType::Collapsed | LinkType::CollapsedUnknown => Some(ReferenceKind::Collapsed),
        LinkType::Shortcut | LinkType::ShortcutUnknown => Some(ReferenceKind::Shortcut),
        _ => None,
    }
}

fn align(alignment: &Alignment) -> Align {
    match alignment {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}

/// The label as the author wrote it; pulldown-cmark only hands out the
/// normalized form.
fn written_label(source: &str, span: Range<usize>, normalized: &str) -> String {
    source
        .get(span)
        .and_then(|raw| raw.trim_start().strip_prefix('['))
        .and_then(|raw| raw.find("]:").map(|end| raw[..end].to_string()))
        .unwrap_or_else(|| normalized.to_string())
}

/// Whether every `</name>` in `inner` closes a `<name` opened inside it.
fn balanced(inner: &str, name: &str) -> bool {
    let open = format!("<{name}");
    let close = format!("</{name}>");
    let mut depth = 0i32;
    let mut i = 0;
    while i < inner.len() {
        let rest = &inner[i..];
        if rest.starts_with(&close) {
            depth -= 1;
            if depth < 0 {
                return false;
            }
            i += close.len();
        } else if rest.starts_with(&open)
            && rest[open.len()..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c == '/' || c.is_whitespace())
        {
            depth += 1;
            i += open.len();
        } else {
            i += rest.chars().next().map_or(1, char::len_utf8);
        }
    }
    depth == 0
}
