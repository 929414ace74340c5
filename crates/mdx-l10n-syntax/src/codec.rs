use crate::error::ParseError;
use crate::tree::Tree;

/// Converts between document text and a [`Tree`].
///
/// The localization engine only ever talks to a codec, so a different
/// grammar can be plugged in without touching extraction or reconstruction.
pub trait DocumentCodec {
    fn parse(&self, source: &str) -> Result<Tree, ParseError>;
    fn serialize(&self, tree: &Tree) -> String;
}

/// The default codec: CommonMark via pulldown-cmark plus the MDX islands.
#[derive(Debug, Clone, Copy, Default)]
pub struct MdxCodec;

impl DocumentCodec for MdxCodec {
    fn parse(&self, source: &str) -> Result<Tree, ParseError> {
        crate::parser::parse(source)
    }

    fn serialize(&self, tree: &Tree) -> String {
        crate::serialize::serialize(tree)
    }
}
