//! Tag parsing on top of the [`lexer`](crate::lexer) tokens.

use crate::lexer::{Token, TokenKind, lex};
use crate::parser::islands::Islands;
use crate::tree::{AttrValue, Attribute, Quote};

/// HTML elements that never have content or a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_TAGS.contains(&name)
}

/// One opening, closing or self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub closing: bool,
    pub self_closing: bool,
    /// Bytes of the input the tag occupies.
    pub len: usize,
}

/// Parse the tag at the very start of `input`.
///
/// Returns `None` when `input` does not start with a well-formed tag, e.g.
/// a comment, a doctype or a tag with an unterminated attribute value.
pub fn parse_tag(input: &str, islands: &Islands) -> Option<Tag> {
    let tokens = lex(input);
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
    };

    cursor.expect(TokenKind::Lt)?;
    let closing = cursor.eat(TokenKind::Slash).is_some();
    let name = cursor.expect(TokenKind::Word)?.text;
    if !is_tag_name(name) {
        return None;
    }

    let mut attributes = Vec::new();
    loop {
        cursor.skip_whitespace();
        let token = cursor.bump()?;
        match token.kind {
            TokenKind::Gt => {
                return Some(Tag {
                    name: name.to_string(),
                    attributes,
                    closing,
                    self_closing: false,
                    len: token.end(),
                });
            }
            TokenKind::Slash => {
                cursor.skip_whitespace();
                let gt = cursor.expect(TokenKind::Gt)?;
                return Some(Tag {
                    name: name.to_string(),
                    attributes,
                    closing,
                    self_closing: true,
                    len: gt.end(),
                });
            }
            TokenKind::Expression => attributes.push(Attribute {
                name: String::new(),
                value: AttrValue::Expression(expression_source(token.text, islands)),
            }),
            TokenKind::Word => {
                let value = attribute_value(&mut cursor, islands)?;
                attributes.push(Attribute {
                    name: token.text.to_string(),
                    value,
                });
            }
            _ => return None,
        }
    }
}

fn attribute_value(cursor: &mut Cursor<'_, '_>, islands: &Islands) -> Option<AttrValue> {
    let save = cursor.pos;
    cursor.skip_whitespace();
    if cursor.eat(TokenKind::Eq).is_none() {
        cursor.pos = save;
        return Some(AttrValue::Absent);
    }
    cursor.skip_whitespace();
    let token = cursor.bump()?;
    let inner = |t: &str| islands.restore(&t[1..t.len() - 1]);
    let value = match token.kind {
        TokenKind::DoubleQuoted => AttrValue::Literal {
            value: inner(token.text),
            quote: Quote::Double,
        },
        TokenKind::SingleQuoted => AttrValue::Literal {
            value: inner(token.text),
            quote: Quote::Single,
        },
        TokenKind::Word => AttrValue::Literal {
            value: islands.restore(token.text),
            quote: Quote::Bare,
        },
        TokenKind::Expression => AttrValue::Expression(expression_source(token.text, islands)),
        _ => return None,
    };
    Some(value)
}

fn expression_source(text: &str, islands: &Islands) -> String {
    islands
        .lone(text)
        .map(|island| island.source.clone())
        .unwrap_or_else(|| text.to_string())
}

fn is_tag_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

struct Cursor<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
}

impl<'a> Cursor<'_, 'a> {
    fn bump(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => self.bump(),
            _ => None,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        self.eat(kind)
    }

    fn skip_whitespace(&mut self) {
        while self.eat(TokenKind::Whitespace).is_some() {}
    }
}
