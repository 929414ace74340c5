//! Node classification: which nodes end a translatable run, which are folded
//! into it as placeholders, and which are never looked inside.

use std::collections::BTreeSet;

use mdx_l10n_syntax::{Element, Node, NodeId, NodeKind, Tree};

/// Role of a node during segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Text,
    /// Ends the current run; its children start fresh runs.
    Breaking,
    /// Folded into the run as `<cN>…</cN>`.
    Wrap,
    /// Folded into the run as `<cN/>`.
    Leaf,
    /// Block structure such as paragraphs, lists and tables.
    Container,
    /// Never emitted and never descended into for text.
    Opaque,
}

/// Inline HTML tags that stay inside a run of text.
const NON_BREAKING_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "dfn", "del", "em", "i", "ins", "mark", "ruby", "rt",
    "span", "strong", "sub", "sup", "time", "u", "var", "wbr",
];

/// Tags whose content is code or data, not prose.
const IGNORE_TAGS: &[&str] = &["code", "output", "samp", "script", "style"];

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hgroup", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label",
    "legend", "li", "link", "main", "map", "mark", "menu", "meta", "meter", "nav", "noscript",
    "object", "ol", "optgroup", "option", "output", "p", "param", "picture", "pre", "progress",
    "q", "rp", "rt", "ruby", "s", "samp", "script", "search", "section", "select", "slot",
    "small", "source", "span", "strong", "style", "sub", "summary", "sup", "table", "tbody", "td",
    "template", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track", "u", "ul",
    "var", "video", "wbr",
];

pub fn is_html_tag(name: &str) -> bool {
    HTML_TAGS.binary_search(&name).is_ok()
}

/// JSX components start with an uppercase letter or use member syntax.
pub fn is_component(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase()) || name.contains('.')
}

/// Placeholders for these kinds are never demoted to a prefix or suffix.
pub fn is_pinned(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::InlineCode
            | NodeKind::InlineExpression
            | NodeKind::FootnoteReference
            | NodeKind::LinkReference(_)
    )
}

/// Breaking/non-breaking tag lists, defaults plus configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRules {
    breaking: BTreeSet<String>,
    non_breaking: BTreeSet<String>,
}

impl Default for TagRules {
    fn default() -> Self {
        Self {
            breaking: BTreeSet::new(),
            non_breaking: NON_BREAKING_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl TagRules {
    /// Default rules extended with configured tags. A tag listed as
    /// breaking wins over the built-in non-breaking list.
    pub fn new<S: AsRef<str>>(breaking: &[S], non_breaking: &[S]) -> Self {
        let mut rules = Self::default();
        for tag in non_breaking {
            rules.non_breaking.insert(tag.as_ref().to_string());
        }
        for tag in breaking {
            rules.non_breaking.remove(tag.as_ref());
            rules.breaking.insert(tag.as_ref().to_string());
        }
        rules
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        IGNORE_TAGS.contains(&name)
    }

    fn element(&self, element: &Element, has_children: bool) -> Class {
        let name = element.name.as_str();
        if self.is_ignored(name) {
            return Class::Opaque;
        }
        if element.flow || self.breaking.contains(name) {
            return Class::Breaking;
        }
        let inline = is_component(name) || self.non_breaking.contains(name) || !is_html_tag(name);
        match (inline, has_children) {
            (true, true) => Class::Wrap,
            (true, false) => Class::Leaf,
            (false, _) => Class::Breaking,
        }
    }
}

/// Classify one node of `tree`.
pub fn classify(tree: &Tree, id: NodeId, rules: &TagRules) -> Class {
    let node: &Node = &tree[id];
    let has_children = !node.children.is_empty();
    match &node.kind {
        NodeKind::Text => Class::Text,
        NodeKind::Container(_) => Class::Container,
        NodeKind::Emphasis | NodeKind::Strong | NodeKind::Delete | NodeKind::LinkReference(_) => {
            Class::Wrap
        }
        NodeKind::Link(_) if has_children => Class::Wrap,
        NodeKind::Link(_)
        | NodeKind::Image
        | NodeKind::ImageReference(_)
        | NodeKind::FootnoteReference
        | NodeKind::InlineCode
        | NodeKind::InlineExpression => Class::Leaf,
        NodeKind::FootnoteDefinition
        | NodeKind::Definition
        | NodeKind::Break
        | NodeKind::FlowExpression
        | NodeKind::Frontmatter => Class::Breaking,
        NodeKind::ModuleStatement | NodeKind::Html { .. } => Class::Opaque,
        NodeKind::Element(element) => rules.element(element, has_children),
    }
}
