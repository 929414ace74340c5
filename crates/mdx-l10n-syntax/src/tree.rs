//! # Document Tree
//!
//! The document is an arena: every [`Node`] lives in one `Vec` owned by the
//! [`Tree`], and parents refer to their children through [`NodeId`] handles.
//! Handles are plain indices, so a structural clone of the tree is just a
//! clone of the arena and every handle stays valid in the copy.
//!
//! ```
//! use mdx_l10n_syntax::{Block, Node, NodeKind, Tree};
//!
//! let mut tree = Tree::new();
//! let para = tree.append(tree.root(), Node::new(NodeKind::Container(Block::Paragraph)));
//! tree.append(para, Node::text("Hello"));
//!
//! assert_eq!(tree.children(para).len(), 1);
//! assert_eq!(tree[tree.children(para)[0]].value.as_deref(), Some("Hello"));
//! ```

use std::ops::{Index, IndexMut};

/// Handle to a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Column alignment of a GFM table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

/// Block-level structure. These are the "container" nodes: they never carry
/// translatable text themselves, only children that do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Root,
    Paragraph,
    Heading(u8),
    BlockQuote,
    List { ordered: bool, start: u64 },
    ListItem,
    Table(Vec<Align>),
    TableHead,
    TableRow,
    TableCell,
    /// Code content lives in `value`, the info string in `label`.
    CodeBlock { fenced: bool },
    ThematicBreak,
}

/// How a link reference spells its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `[text][label]`
    Full,
    /// `[label][]`
    Collapsed,
    /// `[label]`
    Shortcut,
}

/// How an inline link was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle {
    /// `[text](url "title")`
    Inline,
    /// `<https://example.com>`
    Autolink,
    /// `<someone@example.com>`
    Email,
}

/// Quote character used around a literal attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Bare,
}

/// Value of an element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Boolean attribute, `<input disabled>`.
    Absent,
    Literal { value: String, quote: Quote },
    /// `name={expression}`, stored without the braces.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

impl Attribute {
    /// The literal string value, if the attribute has one.
    pub fn literal(&self) -> Option<&str> {
        match &self.value {
            AttrValue::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// How an element's tags appear in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagForm {
    /// `<b>…</b>`
    Paired,
    /// `<br />`, or a void HTML tag such as `<br>`
    SelfClosing,
    /// An opening tag whose close never arrived. Children follow it.
    Unclosed,
    /// A flow HTML block the parser could not decompose. Only the first tag
    /// is structured; `rest` is everything after it, verbatim.
    Raw { rest: String },
}

/// A JSX component or HTML tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Block position (its own paragraph) rather than inside a run of text.
    pub flow: bool,
    pub form: TagForm,
}

impl Element {
    pub fn new(name: impl Into<String>, flow: bool) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            flow,
            form: TagForm::Paired,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Closed set of node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Container(Block),
    Text,
    Emphasis,
    Strong,
    Delete,
    Link(LinkStyle),
    /// Label in `label`.
    LinkReference(ReferenceKind),
    Image,
    ImageReference(ReferenceKind),
    FootnoteReference,
    FootnoteDefinition,
    /// `[label]: url "title"`
    Definition,
    InlineCode,
    InlineExpression,
    FlowExpression,
    ModuleStatement,
    Element(Element),
    /// YAML header, raw text in `value`.
    Frontmatter,
    /// Raw HTML comment or unparseable HTML, verbatim in `value`.
    Html { flow: bool },
    /// Hard line break.
    Break,
}

/// One node of the document.
///
/// Fields that do not apply to a kind are left as `None`. `localizable` is an
/// annotation owned by the localization engine and is never set by the
/// parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub alt: Option<String>,
    pub label: Option<String>,
    pub children: Vec<NodeId>,
    pub localizable: bool,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            value: None,
            url: None,
            title: None,
            alt: None,
            label: None,
            children: Vec::new(),
            localizable: false,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::new(NodeKind::Text).with_value(value)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Copy of this node without its children.
    pub fn detached(&self) -> Self {
        Self {
            children: Vec::new(),
            ..self.clone()
        }
    }

    pub fn element(&self) -> Option<&Element> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// Arena holding every node of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty document: just a root container.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Container(Block::Root))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[self.root.index()].children.is_empty()
    }

    /// Add a node to the arena without attaching it anywhere.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Add a node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.alloc(node);
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].children.push(child);
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Every node reachable from the root, pre-order.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        out
    }

    /// Concatenated text of all `Text` descendants of `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    /// Indented one-line-per-node rendering, handy in tests and logs.
    ///
    /// ```text
    /// Paragraph
    ///   Text "Hello "
    ///   Emphasis
    ///     Text "world"
    /// ```
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root) {
            self.outline_node(child, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self[id];
        out.push_str(&"  ".repeat(depth));
        match &node.kind {
            NodeKind::Container(block) => out.push_str(&format!("{block:?}")),
            NodeKind::Element(element) => out.push_str(&format!("<{}>", element.name)),
            kind => out.push_str(&format!("{kind:?}")),
        }
        if let Some(value) = &node.value {
            out.push_str(&format!(" {value:?}"));
        }
        if let Some(url) = &node.url {
            out.push_str(&format!(" url={url:?}"));
        }
        out.push('\n');
        for &child in &node.children {
            self.outline_node(child, depth + 1, out);
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self[id];
        match node.kind {
            NodeKind::Text | NodeKind::InlineCode => {
                out.push_str(node.value.as_deref().unwrap_or_default())
            }
            _ => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }
}
