//! # Parser
//!
//! Turns MDX source into a [`Tree`] in three steps:
//!
//! ```text
//! Source → Islands::mask → CommonMark events → Builder → Tree
//!          (islands.rs)    (pulldown-cmark)    (builder.rs)
//! ```
//!
//! 1. [`islands`] cuts `{expressions}` and `import`/`export` blocks out of the
//!    source so CommonMark cannot mangle them.
//! 2. [pulldown-cmark] produces a flat stream of Start/End/Text events.
//! 3. [`builder`] consumes the events with a stack of open nodes, the same
//!    way a sink consumes parser events, and decomposes raw HTML into
//!    elements using [`tags`].
//!
//! [pulldown-cmark]: https://docs.rs/pulldown-cmark

pub mod builder;
pub mod islands;
pub mod tags;

use pulldown_cmark::Options;

use crate::error::ParseError;
use crate::tree::Tree;
use builder::Builder;
use islands::Islands;

/// CommonMark extensions MDX documents rely on.
pub fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Parse MDX source into a document tree.
pub fn parse(input: &str) -> Result<Tree, ParseError> {
    let (masked, islands) = Islands::mask(input)?;
    let mut builder = Builder::new(&islands);
    let root = builder.root();
    builder.fragment(&masked, root);
    Ok(builder.finish())
}
