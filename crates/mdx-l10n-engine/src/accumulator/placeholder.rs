//! Mapping a translated placeholder string back onto the original components.

use std::sync::LazyLock;

use regex::Regex;

use super::{Message, Piece, push_text};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)c(\d+)(/?)>").expect("placeholder regex"));

/// Lexical unit of a placeholder string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Open(usize),
    Close(usize),
    SelfClosing(usize),
}

/// Split a placeholder string into text and `<cN>`, `</cN>`, `<cN/>` tags.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        // Out-of-range indices stay text rather than failing the whole string.
        let Ok(index) = caps[2].parse::<usize>() else {
            continue;
        };
        if whole.start() > last {
            tokens.push(Token::Text(&text[last..whole.start()]));
        }
        let closing = !caps[1].is_empty();
        let self_closing = !caps[3].is_empty();
        tokens.push(match (closing, self_closing) {
            (true, _) => Token::Close(index),
            (false, true) => Token::SelfClosing(index),
            (false, false) => Token::Open(index),
        });
        last = whole.end();
    }
    if last < text.len() {
        tokens.push(Token::Text(&text[last..]));
    }
    tokens
}

/// A translation resolved against a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// Prefix, translated body and suffix, in document order.
    pub pieces: Vec<Piece<T>>,
    /// The translation did not use the placeholders exactly as the source
    /// did. The pieces are still usable.
    pub mismatched: bool,
}

impl<T: Clone> Message<T> {
    /// Rebuild the run from a translated placeholder string.
    ///
    /// Recovery for translations that do not match the source:
    ///
    /// * an unknown `<cN>` with a later `</cN>` is dropped with its content
    /// * an unknown tag without a partner is dropped on its own
    /// * a stray or misnested `</cN>` is dropped
    /// * an open `<cN>` left at the end is closed there
    pub fn from_translation(&self, translated: &str) -> Resolved<T> {
        let tokens = tokenize(translated);
        let mut pieces = self.prefix.clone();
        let mut stack: Vec<usize> = Vec::new();
        let mut used = vec![0usize; self.mapping.len()];
        let mut mismatched = false;

        let mut i = 0;
        while i < tokens.len() {
            match tokens[i] {
                Token::Text(text) => push_text(&mut pieces, text.to_string()),
                Token::SelfClosing(n) if n < self.mapping.len() => {
                    used[n] += 1;
                    let value = self.mapping[n].clone();
                    if self.leaves[n] {
                        pieces.push(Piece::Whole(value));
                    } else {
                        mismatched = true;
                        pieces.push(Piece::Open(value.clone()));
                        pieces.push(Piece::Close(value));
                    }
                }
                Token::Open(n) if n < self.mapping.len() => {
                    used[n] += 1;
                    let value = self.mapping[n].clone();
                    if self.leaves[n] {
                        // Content stays as siblings; the close becomes stray.
                        mismatched = true;
                        pieces.push(Piece::Whole(value));
                    } else {
                        pieces.push(Piece::Open(value));
                        stack.push(n);
                    }
                }
                Token::Close(n) if stack.last() == Some(&n) => {
                    stack.pop();
                    pieces.push(Piece::Close(self.mapping[n].clone()));
                }
                Token::Open(n) => {
                    mismatched = true;
                    if let Some(close) = tokens[i + 1..]
                        .iter()
                        .position(|t| *t == Token::Close(n))
                    {
                        i += close + 1;
                    }
                }
                Token::SelfClosing(_) | Token::Close(_) => mismatched = true,
            }
            i += 1;
        }

        while let Some(n) = stack.pop() {
            mismatched = true;
            pieces.push(Piece::Close(self.mapping[n].clone()));
        }
        // Dropping a component is allowed, repeating one is not.
        if used.iter().any(|&count| count > 1) {
            mismatched = true;
        }

        for piece in self.suffix.iter().cloned() {
            match piece {
                Piece::Text(text) => push_text(&mut pieces, text),
                other => pieces.push(other),
            }
        }

        Resolved { pieces, mismatched }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::MessageAccumulator;
    use pretty_assertions::assert_eq;

    /// "A *B* C."
    fn message() -> Message<&'static str> {
        let mut acc = MessageAccumulator::new();
        acc.add_text("A ");
        acc.push("em");
        acc.add_text("B");
        acc.pop();
        acc.add_text(" C.");
        acc.finish()
    }

    fn text(s: &str) -> Piece<&'static str> {
        Piece::Text(s.to_string())
    }

    #[test]
    fn tokenize_splits_tags_from_text() {
        assert_eq!(
            tokenize("a <c0>b</c0> <c1/>"),
            vec![
                Token::Text("a "),
                Token::Open(0),
                Token::Text("b"),
                Token::Close(0),
                Token::Text(" "),
                Token::SelfClosing(1),
            ]
        );
    }

    #[test]
    fn faithful_translation_resolves_cleanly() {
        let message = message();
        assert_eq!(message.minimal_string(), "A <c0>B</c0> C.");

        let resolved = message.from_translation("X <c0>Y</c0> Z.");

        assert!(!resolved.mismatched);
        assert_eq!(
            resolved.pieces,
            vec![text("X "), Piece::Open("em"), text("Y"), Piece::Close("em"), text(" Z.")]
        );
    }

    #[test]
    fn components_may_be_reordered() {
        let resolved = message().from_translation("<c0>Y</c0> X Z.");

        assert!(!resolved.mismatched);
        assert_eq!(resolved.pieces[0], Piece::Open("em"));
    }

    #[test]
    fn unknown_placeholder_is_dropped_with_its_content() {
        // Given: the translator invented <c1>
        let resolved = message().from_translation("X <c0>Y</c0> <c1>Z</c1>.");

        // Then: the known part survives and the invented one disappears
        assert!(resolved.mismatched);
        assert_eq!(
            resolved.pieces,
            vec![text("X "), Piece::Open("em"), text("Y"), Piece::Close("em"), text(" .")]
        );
    }

    #[test]
    fn unclosed_placeholder_is_closed_at_the_end() {
        let resolved = message().from_translation("X <c0>Y Z.");

        assert!(resolved.mismatched);
        assert_eq!(
            resolved.pieces,
            vec![text("X "), Piece::Open("em"), text("Y Z."), Piece::Close("em")]
        );
    }

    #[test]
    fn stray_close_is_dropped() {
        let resolved = message().from_translation("X </c0><c0>Y</c0>.");

        assert!(resolved.mismatched);
        assert_eq!(
            resolved.pieces,
            vec![text("X "), Piece::Open("em"), text("Y"), Piece::Close("em"), text(".")]
        );
    }

    #[test]
    fn missing_placeholder_is_accepted() {
        let resolved = message().from_translation("X Y Z.");

        assert!(!resolved.mismatched);
        assert_eq!(resolved.pieces, vec![text("X Y Z.")]);
    }

    #[test]
    fn prefix_and_suffix_are_restored() {
        let mut acc = MessageAccumulator::new();
        acc.push("strong");
        acc.add_text("Hello ");
        acc.push_pinned("code");
        acc.pop();
        acc.pop();
        let message = acc.finish();
        assert_eq!(message.minimal_string(), "Hello <c0/>");

        let resolved = message.from_translation("Bonjour <c0/>");

        assert!(!resolved.mismatched);
        assert_eq!(
            resolved.pieces,
            vec![
                Piece::Open("strong"),
                text("Bonjour "),
                Piece::Whole("code"),
                Piece::Close("strong"),
            ]
        );
    }
}
