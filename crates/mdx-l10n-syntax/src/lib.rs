//! # mdx-l10n-syntax
//!
//! Document model, parser and serializer for MDX: Markdown with embedded
//! `{expressions}`, `import`/`export` statements and JSX components.
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Islands → pulldown-cmark → Builder → Tree → Serializer → Text
//!               (mask)    (events)         (stack)   (arena)
//! ```
//!
//! ### 1. Tree ([`tree`] module)
//!
//! An arena of [`Node`]s addressed by [`NodeId`]. The node kinds form a
//! closed enum, so every consumer matches on them exhaustively.
//!
//! ### 2. Parser ([`parser`] module)
//!
//! MDX islands are masked, CommonMark does the heavy lifting, and the
//! builder turns its event stream into a tree. Raw HTML is decomposed into
//! [`Element`] nodes with the [`lexer`].
//!
//! ### 3. Events and Sink ([`event`], [`sink`] modules)
//!
//! A tree can be flattened into Start/Leaf/Finish [`Event`]s and rebuilt by
//! a [`Sink`]. Editing the flat sequence and sinking it again is how
//! translated runs replace original ones without touching their siblings.
//!
//! ### 4. Serializer ([`serialize`] module)
//!
//! Canonical MDX output. Parsing serialized output yields the same tree.
//!
//! ## Quick Start
//!
//! ```
//! use mdx_l10n_syntax::{DocumentCodec, MdxCodec, NodeKind};
//!
//! let codec = MdxCodec;
//! let tree = codec.parse("Hello *world*\n").unwrap();
//!
//! let para = tree.children(tree.root())[0];
//! assert_eq!(tree[tree.children(para)[1]].kind, NodeKind::Emphasis);
//! assert_eq!(codec.serialize(&tree), "Hello *world*\n");
//! ```

pub mod codec;
pub mod error;
pub mod event;
pub mod lexer;
pub mod parser;
pub mod serialize;
pub mod sink;
pub mod tree;

pub use codec::{DocumentCodec, MdxCodec};
pub use error::ParseError;
pub use event::{Event, Origin, flatten};
pub use parser::parse;
pub use serialize::serialize;
pub use sink::Sink;
pub use tree::{
    Align, AttrValue, Attribute, Block, Element, LinkStyle, Node, NodeId, NodeKind, Quote,
    ReferenceKind, TagForm, Tree,
};

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    const GUIDE: &str = r#"import {Callout} from '../components'

# Getting started

Install the **CLI** with `npm i -g tool`, then run it in {props.dir}.

<Callout type="warning" title="Heads up">

Do *not* skip [the setup][setup].

</Callout>

* First <span class="k">step</span>
* Second step

{/* i18n This heading is a product name */}

## Tool

[setup]: https://example.com/setup "Setup"
"#;

    #[test]
    fn snapshot_guide_outline() {
        let tree = parse(GUIDE).unwrap();
        assert_snapshot!(tree.outline(), @r#"
        ModuleStatement "import {Callout} from '../components'"
        Heading(1)
          Text "Getting started"
        Paragraph
          Text "Install the "
          Strong
            Text "CLI"
          Text " with "
          InlineCode "npm i -g tool"
          Text ", then run it in "
          InlineExpression "props.dir"
          Text "."
        <Callout>
          Paragraph
            Text "Do "
            Emphasis
              Text "not"
            Text " skip "
            LinkReference(Full)
              Text "the setup"
            Text "."
        List { ordered: false, start: 1 }
          ListItem
            Text "First "
            <span>
              Text "step"
          ListItem
            Text "Second step"
        FlowExpression "/* i18n This heading is a product name */"
        Heading(2)
          Text "Tool"
        Definition url="https://example.com/setup"
        "#);
    }

    #[test]
    fn guide_serializes_canonically() {
        let tree = parse(GUIDE).unwrap();
        assert_eq!(serialize(&tree), GUIDE);
    }

    #[test]
    fn flatten_and_sink_rebuild_the_guide() {
        let tree = parse(GUIDE).unwrap();
        let rebuilt = Sink::new(&tree).finish(flatten(&tree));

        assert_eq!(serialize(&rebuilt), serialize(&tree));
        assert_eq!(rebuilt.outline(), tree.outline());
    }
}
