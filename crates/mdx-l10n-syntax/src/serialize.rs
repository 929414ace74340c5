//! # Serializer
//!
//! Renders a [`Tree`] back to MDX text.
//!
//! The output is canonical rather than a byte-for-byte copy of the input:
//! bullets are always `*`, emphasis is always `*…*`, blocks are separated by
//! one blank line. What is guaranteed is that parsing the output yields the
//! same tree, so serializing twice gives the same text.
//!
//! Text is escaped wherever a character would otherwise start Markdown or MDX
//! syntax, which matters once translated strings are spliced into the tree.

use crate::tree::{
    Align, AttrValue, Attribute, Block, Element, LinkStyle, Node, NodeId, NodeKind, Quote,
    ReferenceKind, TagForm, Tree,
};

/// Render a document tree as MDX.
pub fn serialize(tree: &Tree) -> String {
    let serializer = Serializer { tree };
    let mut out = serializer.blocks(tree.children(tree.root()));
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    /// Inside a table cell: `|` must be escaped.
    table: bool,
    /// Single-line construct: newlines become spaces.
    flat: bool,
}

struct Serializer<'t> {
    tree: &'t Tree,
}

impl Serializer<'_> {
    fn blocks(&self, ids: &[NodeId]) -> String {
        self.groups(ids).join("\n\n")
    }

    /// Each block renders alone; consecutive inline nodes render as one run.
    fn groups(&self, ids: &[NodeId]) -> Vec<String> {
        let mut groups = Vec::new();
        let mut run = Vec::new();
        for &id in ids {
            if is_block(&self.tree[id]) {
                if !run.is_empty() {
                    groups.push(self.inline(&run, Context::default()));
                    run.clear();
                }
                groups.push(self.block(id));
            } else {
                run.push(id);
            }
        }
        if !run.is_empty() {
            groups.push(self.inline(&run, Context::default()));
        }
        groups.retain(|group| !group.is_empty());
        groups
    }

    fn block(&self, id: NodeId) -> String {
        let node = &self.tree[id];
        let children = node.children.as_slice();
        match &node.kind {
            NodeKind::Container(block) => match block {
                Block::Root | Block::ListItem => self.blocks(children),
                Block::Paragraph => self.inline(children, Context::default()),
                Block::Heading(level) => {
                    let flat = Context {
                        flat: true,
                        ..Context::default()
                    };
                    format!("{} {}", "#".repeat(*level as usize), self.inline(children, flat))
                }
                Block::BlockQuote => {
                    let body = self.blocks(children);
                    if body.is_empty() {
                        ">".to_string()
                    } else {
                        prefix_lines(&body, "> ", ">")
                    }
                }
                Block::List { ordered, start } => self.list(children, *ordered, *start),
                Block::Table(aligns) => self.table(children, aligns),
                Block::TableHead | Block::TableRow => self.row(children),
                Block::TableCell => self.inline(children, cell_context()),
                Block::CodeBlock { fenced } => code_block(node, *fenced),
                Block::ThematicBreak => "***".to_string(),
            },
            NodeKind::FootnoteDefinition => {
                let first = format!("[^{}]: ", node.label.as_deref().unwrap_or_default());
                indent(&first, &self.blocks(children), "    ")
            }
            NodeKind::Definition => format!(
                "[{}]: {}{}",
                node.label.as_deref().unwrap_or_default(),
                destination(node.url.as_deref().unwrap_or_default()),
                title_suffix(node.title.as_deref())
            ),
            NodeKind::FlowExpression => format!("{{{}}}", value(node)),
            NodeKind::ModuleStatement | NodeKind::Html { .. } => value(node).to_string(),
            NodeKind::Frontmatter => {
                let raw = value(node);
                let newline = if raw.is_empty() || raw.ends_with('\n') {
                    ""
                } else {
                    "\n"
                };
                format!("---\n{raw}{newline}---")
            }
            NodeKind::Element(element) => self.flow_element(element, children),
            _ => self.inline(&[id], Context::default()),
        }
    }

    fn list(&self, items: &[NodeId], ordered: bool, start: u64) -> String {
        let loose = items.iter().any(|&item| {
            self.tree
                .children(item)
                .iter()
                .any(|&child| self.tree[child].kind == NodeKind::Container(Block::Paragraph))
        });
        let separator = if loose { "\n\n" } else { "\n" };

        items
            .iter()
            .enumerate()
            .map(|(i, &item)| {
                let marker = if ordered {
                    format!("{}.", start + i as u64)
                } else {
                    "*".to_string()
                };
                let body = self.groups(self.tree.children(item)).join(separator);
                indent(&format!("{marker} "), &body, &" ".repeat(marker.len() + 1))
            })
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn table(&self, sections: &[NodeId], aligns: &[Align]) -> String {
        let mut lines = Vec::new();
        for &section in sections {
            lines.push(self.row(self.tree.children(section)));
            if self.tree[section].kind == NodeKind::Container(Block::TableHead) {
                let cells: Vec<&str> = aligns
                    .iter()
                    .map(|align| match align {
                        Align::None => "---",
                        Align::Left => ":--",
                        Align::Center => ":-:",
                        Align::Right => "--:",
                    })
                    .collect();
                lines.push(format!("| {} |", cells.join(" | ")));
            }
        }
        lines.join("\n")
    }

    fn row(&self, cells: &[NodeId]) -> String {
        let cells: Vec<String> = cells
            .iter()
            .map(|&cell| self.inline(self.tree.children(cell), cell_context()))
            .collect();
        format!("| {} |", cells.join(" | "))
    }

    fn flow_element(&self, element: &Element, children: &[NodeId]) -> String {
        match &element.form {
            TagForm::SelfClosing => open_tag(element, true),
            TagForm::Raw { rest } => format!("{}{rest}", open_tag(element, false)),
            form => {
                let mut parts = vec![open_tag(element, false)];
                let body = self.blocks(children);
                if !body.is_empty() {
                    parts.push(body);
                }
                if *form == TagForm::Paired {
                    parts.push(format!("</{}>", element.name));
                }
                parts.join("\n\n")
            }
        }
    }

    fn inline(&self, ids: &[NodeId], cx: Context) -> String {
        let mut out = String::new();
        for &id in ids {
            self.inline_node(id, cx, &mut out);
        }
        out
    }

    fn inline_children(&self, node: &Node, cx: Context, out: &mut String) {
        for &child in &node.children {
            self.inline_node(child, cx, out);
        }
    }

    fn inline_node(&self, id: NodeId, cx: Context, out: &mut String) {
        let node = &self.tree[id];
        match &node.kind {
            NodeKind::Text => escape_text(value(node), cx, out),
            NodeKind::Emphasis => self.delimited(node, "*", cx, out),
            NodeKind::Strong => self.delimited(node, "**", cx, out),
            NodeKind::Delete => self.delimited(node, "~~", cx, out),
            NodeKind::Link(LinkStyle::Inline) => {
                guard_bang(out);
                out.push('[');
                self.inline_children(node, cx, out);
                out.push_str("](");
                out.push_str(&destination(node.url.as_deref().unwrap_or_default()));
                out.push_str(&title_suffix(node.title.as_deref()));
                out.push(')');
            }
            NodeKind::Link(_) => {
                out.push('<');
                out.push_str(node.url.as_deref().unwrap_or_default());
                out.push('>');
            }
            NodeKind::LinkReference(kind) => {
                guard_bang(out);
                let text = self.inline(&node.children, cx);
                out.push_str(&reference(&text, *kind, node.label.as_deref()));
            }
            NodeKind::Image => {
                out.push_str("![");
                escape_text(node.alt.as_deref().unwrap_or_default(), flat(cx), out);
                out.push_str("](");
                out.push_str(&destination(node.url.as_deref().unwrap_or_default()));
                out.push_str(&title_suffix(node.title.as_deref()));
                out.push(')');
            }
            NodeKind::ImageReference(kind) => {
                let mut alt = String::new();
                escape_text(node.alt.as_deref().unwrap_or_default(), flat(cx), &mut alt);
                out.push('!');
                out.push_str(&reference(&alt, *kind, node.label.as_deref()));
            }
            NodeKind::FootnoteReference => {
                out.push_str(&format!("[^{}]", node.label.as_deref().unwrap_or_default()))
            }
            NodeKind::InlineCode => out.push_str(&code_span(value(node))),
            NodeKind::InlineExpression | NodeKind::FlowExpression => {
                out.push_str(&format!("{{{}}}", value(node)))
            }
            NodeKind::Element(element) => match &element.form {
                TagForm::SelfClosing => out.push_str(&open_tag(element, true)),
                TagForm::Paired => {
                    out.push_str(&open_tag(element, false));
                    self.inline_children(node, cx, out);
                    out.push_str(&format!("</{}>", element.name));
                }
                TagForm::Unclosed => {
                    out.push_str(&open_tag(element, false));
                    self.inline_children(node, cx, out);
                }
                TagForm::Raw { rest } => {
                    out.push_str(&open_tag(element, false));
                    out.push_str(rest);
                }
            },
            NodeKind::Html { .. } | NodeKind::ModuleStatement => out.push_str(value(node)),
            NodeKind::Break => out.push_str("\\\n"),
            _ => out.push_str(&self.block(id)),
        }
    }

    fn delimited(&self, node: &Node, delimiter: &str, cx: Context, out: &mut String) {
        out.push_str(delimiter);
        self.inline_children(node, cx, out);
        out.push_str(delimiter);
    }
}

fn is_block(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Container(_)
        | NodeKind::FootnoteDefinition
        | NodeKind::Definition
        | NodeKind::FlowExpression
        | NodeKind::ModuleStatement
        | NodeKind::Frontmatter => true,
        NodeKind::Html { flow } => *flow,
        NodeKind::Element(element) => element.flow,
        _ => false,
    }
}

fn value(node: &Node) -> &str {
    node.value.as_deref().unwrap_or_default()
}

fn cell_context() -> Context {
    Context {
        table: true,
        flat: true,
    }
}

fn flat(cx: Context) -> Context {
    Context { flat: true, ..cx }
}

/// Prefix the first line with `first` and every other non-empty line with
/// `rest`.
fn indent(first: &str, body: &str, rest: &str) -> String {
    if body.is_empty() {
        return first.trim_end().to_string();
    }
    body.split('\n')
        .enumerate()
        .map(|(i, line)| match i {
            0 => format!("{first}{line}"),
            _ if line.is_empty() => String::new(),
            _ => format!("{rest}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn prefix_lines(body: &str, prefix: &str, blank: &str) -> String {
    body.split('\n')
        .map(|line| {
            if line.is_empty() {
                blank.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn code_block(node: &Node, fenced: bool) -> String {
    let mut code = value(node).to_string();
    if !code.is_empty() && !code.ends_with('\n') {
        code.push('\n');
    }
    if !fenced {
        return code
            .lines()
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("    {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
    }
    let fence = "`".repeat(longest_run(&code, '`').max(2) + 1);
    let info = node.label.as_deref().unwrap_or_default();
    format!("{fence}{info}\n{code}{fence}")
}

fn code_span(code: &str) -> String {
    if code.is_empty() {
        return "` `".to_string();
    }
    let fence = "`".repeat(longest_run(code, '`') + 1);
    let pad = code.starts_with('`')
        || code.ends_with('`')
        || (code.starts_with(' ') && code.ends_with(' ') && !code.trim().is_empty());
    let space = if pad { " " } else { "" };
    format!("{fence}{space}{code}{space}{fence}")
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn destination(url: &str) -> String {
    let needs_brackets = url.is_empty()
        || url
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>'));
    if needs_brackets {
        format!("<{}>", url.replace('<', "\\<").replace('>', "\\>"))
    } else {
        url.to_string()
    }
}

fn title_suffix(title: Option<&str>) -> String {
    match title {
        Some(title) => format!(
            " \"{}\"",
            title.replace('\\', "\\\\").replace('"', "\\\"")
        ),
        None => String::new(),
    }
}

/// `[text][label]`, shortened to the collapsed or shortcut form only while
/// the text still spells the label.
fn reference(text: &str, kind: ReferenceKind, label: Option<&str>) -> String {
    let label = label.unwrap_or(text);
    match kind {
        ReferenceKind::Shortcut if text == label => format!("[{text}]"),
        ReferenceKind::Collapsed if text == label => format!("[{text}][]"),
        _ => format!("[{text}][{label}]"),
    }
}

/// A `!` right before `[` would turn a link into an image.
fn guard_bang(out: &mut String) {
    if out.ends_with('!') && !out.ends_with("\\!") {
        out.pop();
        out.push_str("\\!");
    }
}

pub(crate) fn open_tag(element: &Element, self_closing: bool) -> String {
    let mut out = format!("<{}", element.name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&render_attribute(attribute));
    }
    out.push_str(if self_closing { " />" } else { ">" });
    out
}

fn render_attribute(attribute: &Attribute) -> String {
    let name = &attribute.name;
    match &attribute.value {
        AttrValue::Absent => name.clone(),
        AttrValue::Expression(source) if name.is_empty() => format!("{{{source}}}"),
        AttrValue::Expression(source) => format!("{name}={{{source}}}"),
        AttrValue::Literal { value, quote } => {
            let quote = match quote {
                Quote::Bare
                    if value.is_empty()
                        || value.chars().any(|c| {
                            c.is_whitespace() || matches!(c, '"' | '\'' | '=' | '<' | '>' | '`')
                        }) =>
                {
                    Quote::Double
                }
                Quote::Double if value.contains('"') && !value.contains('\'') => Quote::Single,
                Quote::Single if value.contains('\'') && !value.contains('"') => Quote::Double,
                quote => *quote,
            };
            match quote {
                Quote::Double => format!("{name}=\"{}\"", value.replace('"', "&quot;")),
                Quote::Single => format!("{name}='{}'", value.replace('\'', "&#39;")),
                Quote::Bare => format!("{name}={value}"),
            }
        }
    }
}

fn escape_text(text: &str, cx: Context, out: &mut String) {
    let chars: Vec<char> = text.chars().collect();
    let mut line_start = out.is_empty() || out.ends_with('\n');
    for (i, &c) in chars.iter().enumerate() {
        let c = if cx.flat && c == '\n' { ' ' } else { c };
        let prev = out.chars().next_back();
        let next = chars.get(i + 1).copied();
        let escape = match c {
            '\\' | '`' | '*' | '[' | ']' | '<' | '{' | '}' | '~' => true,
            '_' => !(prev.is_some_and(char::is_alphanumeric) && next.is_some_and(char::is_alphanumeric)),
            '|' => cx.table,
            '&' => entity_like(&chars[i + 1..]),
            '#' | '>' | '+' | '-' | '=' => line_start,
            '.' | ')' => ends_with_list_number(out),
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);
        line_start = c == '\n' || (line_start && c == ' ');
    }
}

/// `&name;` or `&#123;` would be decoded as an entity.
fn entity_like(rest: &[char]) -> bool {
    let body: Vec<char> = rest
        .iter()
        .copied()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '#')
        .collect();
    !body.is_empty() && rest.get(body.len()) == Some(&';')
}

/// The current line so far is an ordered list number such as `12`.
fn ends_with_list_number(out: &str) -> bool {
    let line = out.rsplit('\n').next().unwrap_or_default().trim_start_matches(' ');
    !line.is_empty() && line.len() <= 9 && line.chars().all(|c| c.is_ascii_digit())
}
