/// Failure to turn source text into a [`Tree`](crate::Tree).
///
/// CommonMark itself never fails; the MDX layer does when an expression
/// brace is never closed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unterminated expression starting at line {line}, column {column}")]
    UnterminatedExpression { line: usize, column: usize },
}
