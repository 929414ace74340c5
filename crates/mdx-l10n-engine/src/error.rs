use mdx_l10n_syntax::ParseError;

use crate::frontmatter::FrontMatterError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Front matter error: {0}")]
    FrontMatter(#[from] FrontMatterError),
}
