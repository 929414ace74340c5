//! # Lexer - Tokenizing JSX and HTML Tags
//!
//! CommonMark hands us HTML as opaque strings: one string per inline tag, or
//! one string per HTML block. This module breaks such a string into tokens
//! using the [Logos] lexer generator so the tag parser in
//! [`parser::tags`](crate::parser::tags) can pick out names and attributes.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token. Nothing is skipped,
//! which lets the tag parser report how many bytes a tag consumed and leave
//! the rest of an HTML block untouched:
//!
//! ```
//! use mdx_l10n_syntax::lexer::lex;
//!
//! let input = r#"<img alt="A cat" src='cat.png' />"#;
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are **context-free**. The lexer does not know whether a word is a
//! tag name, an attribute name or an unquoted value; the tag parser decides
//! from position. Expression islands (`{…}` masked by the parser's pre-pass)
//! arrive as a single [`TokenKind::Expression`] token.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Spaces, tabs and line endings
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("/")]
    Slash,

    #[token("=")]
    Eq,

    /// `"value"`
    #[regex(r#""[^"]*""#)]
    DoubleQuoted,

    /// `'value'`
    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// A masked `{…}` island
    #[regex(r"\u{E000}[0-9]+\u{E001}")]
    Expression,

    /// Names, unquoted values and anything else
    #[regex(r#"[^ \t\r\n<>/="'\u{E000}\u{E001}]+"#)]
    Word,

    /// A quote that never closes, or a stray island marker
    #[regex(r#"["'\u{E000}\u{E001}]"#)]
    Stray,
}

/// A lexed token with its kind, text slice and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub offset: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let kind = result.unwrap_or(TokenKind::Stray);
        tokens.push(Token {
            kind,
            text: lexer.slice(),
            offset: lexer.span().start,
        });
    }

    tokens
}
