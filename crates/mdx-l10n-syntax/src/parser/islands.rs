//! # Islands - Masking MDX Syntax Before CommonMark Sees It
//!
//! MDX adds two constructs CommonMark knows nothing about: `{expression}`
//! islands anywhere in the text, and top-level `import`/`export` blocks.
//! Left in place, CommonMark would split an expression across emphasis
//! markers or table pipes. So before parsing, each island is cut out and
//! replaced with a short private-use sentinel:
//!
//! ```text
//! "Hello {user.name}!"  →  "Hello \u{E000}0\u{E001}!"
//! ```
//!
//! The sentinel contains no Markdown punctuation, so it survives CommonMark
//! as ordinary text. The tree builder then turns sentinels back into
//! expression nodes, or restores the original text where a field holds
//! plain source (URLs, code, raw HTML).
//!
//! Code spans, fenced code, HTML comments, backslash escapes and the YAML
//! front matter are copied through untouched.

use crate::error::ParseError;

pub const OPEN: char = '\u{E000}';
pub const CLOSE: char = '\u{E001}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IslandKind {
    /// `{…}`; the source is stored without the braces.
    Expression,
    /// A top-level `import`/`export` block, stored verbatim.
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    pub kind: IslandKind,
    pub source: String,
}

impl Island {
    /// The island as it appeared in the document.
    pub fn original(&self) -> String {
        match self.kind {
            IslandKind::Expression => format!("{{{}}}", self.source),
            IslandKind::Module => self.source.clone(),
        }
    }
}

/// A piece of masked text: plain text or a reference to an island.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'s, 't> {
    Text(&'t str),
    Island(&'s Island),
}

/// Islands cut out of one document, indexed by sentinel number.
#[derive(Debug, Default, Clone)]
pub struct Islands {
    islands: Vec<Island>,
}

impl Islands {
    /// Replace every island in `input` with a sentinel.
    pub fn mask(input: &str) -> Result<(String, Islands), ParseError> {
        let mut masker = Masker {
            input,
            pos: 0,
            out: String::with_capacity(input.len()),
            islands: Islands::default(),
            fence: None,
            prev_blank: true,
        };
        masker.run()?;
        Ok((masker.out, masker.islands))
    }

    pub fn get(&self, index: usize) -> Option<&Island> {
        self.islands.get(index)
    }

    pub fn len(&self) -> usize {
        self.islands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }

    fn push(&mut self, kind: IslandKind, source: &str) -> String {
        let index = self.islands.len();
        self.islands.push(Island {
            kind,
            source: source.to_string(),
        });
        format!("{OPEN}{index}{CLOSE}")
    }

    /// Split masked text into text and island pieces.
    pub fn split<'s, 't>(&'s self, text: &'t str) -> Vec<Piece<'s, 't>> {
        let mut pieces = Vec::new();
        let mut rest = text;
        while let Some(start) = rest.find(OPEN) {
            let after = &rest[start + OPEN.len_utf8()..];
            let Some(end) = after.find(CLOSE) else {
                break;
            };
            let island = after[..end]
                .parse::<usize>()
                .ok()
                .and_then(|i| self.islands.get(i));
            match island {
                Some(island) => {
                    if start > 0 {
                        pieces.push(Piece::Text(&rest[..start]));
                    }
                    pieces.push(Piece::Island(island));
                }
                None => pieces.push(Piece::Text(
                    &rest[..start + OPEN.len_utf8() + end + CLOSE.len_utf8()],
                )),
            }
            rest = &after[end + CLOSE.len_utf8()..];
        }
        if !rest.is_empty() {
            pieces.push(Piece::Text(rest));
        }
        pieces
    }

    /// The island if `text` is exactly one sentinel, ignoring surrounding
    /// whitespace.
    pub fn lone(&self, text: &str) -> Option<&Island> {
        match self.split(text.trim()).as_slice() {
            [Piece::Island(island)] => Some(*island),
            _ => None,
        }
    }

    /// Put the original source back in place of every sentinel.
    pub fn restore(&self, text: &str) -> String {
        if !text.contains(OPEN) {
            return text.to_string();
        }
        self.split(text)
            .into_iter()
            .map(|piece| match piece {
                Piece::Text(t) => t.to_string(),
                Piece::Island(island) => island.original(),
            })
            .collect()
    }
}

struct Masker<'a> {
    input: &'a str,
    pos: usize,
    out: String,
    islands: Islands,
    /// Open code fence: marker char and length.
    fence: Option<(u8, usize)>,
    prev_blank: bool,
}

impl<'a> Masker<'a> {
    fn run(&mut self) -> Result<(), ParseError> {
        self.copy_front_matter();
        while self.pos < self.input.len() {
            self.line()?;
        }
        Ok(())
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn copy(&mut self, len: usize) {
        let end = (self.pos + len).min(self.input.len());
        self.out.push_str(&self.input[self.pos..end]);
        self.pos = end;
    }

    fn copy_front_matter(&mut self) {
        let rest = self.rest();
        if !(rest.starts_with("---\n") || rest.starts_with("---\r\n")) {
            return;
        }
        let body_start = rest.find('\n').map_or(rest.len(), |i| i + 1);
        let mut offset = body_start;
        for line in rest[body_start..].split_inclusive('\n') {
            offset += line.len();
            let trimmed = line.trim_end();
            if trimmed == "---" || trimmed == "..." {
                self.copy(offset);
                return;
            }
        }
    }

    fn line_len(&self) -> usize {
        self.rest().find('\n').map_or(self.rest().len(), |i| i + 1)
    }

    /// Process one line, or more when an island spans lines.
    fn line(&mut self) -> Result<(), ParseError> {
        let line = &self.rest()[..self.line_len()];
        let blank = line.trim().is_empty();

        if let Some((marker, len)) = self.fence {
            if fence_of(line).is_some_and(|(m, l, info)| m == marker && l >= len && info.is_empty())
            {
                self.fence = None;
            }
            self.copy(line.len());
            self.prev_blank = false;
            return Ok(());
        }

        if let Some((marker, len, _)) = fence_of(line) {
            self.fence = Some((marker, len));
            self.copy(line.len());
            self.prev_blank = false;
            return Ok(());
        }

        if self.prev_blank && (line.starts_with("import ") || line.starts_with("export ")) {
            self.module();
            return Ok(());
        }

        self.prev_blank = blank;
        self.inline()
    }

    /// Swallow an import/export block up to the next blank line.
    fn module(&mut self) {
        let rest = self.rest();
        let mut len = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim().is_empty() {
                break;
            }
            len += line.len();
        }
        let block = rest[..len].trim_end_matches(['\r', '\n']).to_string();
        let sentinel = self.islands.push(IslandKind::Module, &block);
        self.out.push_str(&sentinel);
        self.pos += block.len();
        self.prev_blank = false;
    }

    /// Scan inline content until the end of the current line.
    fn inline(&mut self) -> Result<(), ParseError> {
        while self.pos < self.input.len() {
            let bytes = self.rest().as_bytes();
            match bytes[0] {
                b'\n' => {
                    self.copy(1);
                    return Ok(());
                }
                b'\\' => {
                    let len = self.rest().chars().take(2).map(char::len_utf8).sum();
                    self.copy(len);
                }
                b'`' => {
                    let len = code_span_len(self.rest());
                    self.copy(len);
                }
                b'<' if self.rest().starts_with("<!--") => {
                    let len = self.rest().find("-->").map_or(self.rest().len(), |i| i + 3);
                    self.copy(len);
                }
                b'{' => {
                    let Some(end) = expression_end(self.rest()) else {
                        return Err(self.unterminated());
                    };
                    let source = self.rest()[1..end].to_string();
                    let sentinel = self.islands.push(IslandKind::Expression, &source);
                    self.out.push_str(&sentinel);
                    self.pos += end + 1;
                }
                _ => {
                    let len = self.rest().chars().next().map_or(1, char::len_utf8);
                    self.copy(len);
                }
            }
        }
        Ok(())
    }

    fn unterminated(&self) -> ParseError {
        let before = &self.input[..self.pos];
        let line = before.matches('\n').count() + 1;
        let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        ParseError::UnterminatedExpression { line, column }
    }
}

/// A code fence opener/closer: marker byte, run length, info string.
fn fence_of(line: &str) -> Option<(u8, usize, &str)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let body = &line[indent..];
    let marker = *body.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = body.bytes().take_while(|&b| b == marker).count();
    if len < 3 {
        return None;
    }
    let info = body[len..].trim();
    if marker == b'`' && info.contains('`') {
        return None;
    }
    Some((marker, len, info))
}

/// Length of the code span starting at `text`, or of the bare backtick run
/// when it never closes.
fn code_span_len(text: &str) -> usize {
    let run = text.bytes().take_while(|&b| b == b'`').count();
    let mut i = run;
    let bytes = text.as_bytes();
    while i < bytes.len() {
        if bytes[i] == b'`' {
            let close = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            if close == run {
                return i + close;
            }
            i += close;
        } else {
            i += 1;
        }
    }
    run
}

/// Byte index of the `}` closing the `{` at the start of `text`.
fn expression_end(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = text[i + 2..].find("*/").map_or(bytes.len(), |j| i + 2 + j + 1);
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = text[i..].find('\n').map_or(bytes.len(), |j| i + j);
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn masks_inline_expression() {
        let (masked, islands) = Islands::mask("Hello {user.name}!").unwrap();

        assert_eq!(masked, "Hello \u{E000}0\u{E001}!");
        assert_eq!(islands.get(0).map(|i| i.source.as_str()), Some("user.name"));
        assert_eq!(islands.restore(&masked), "Hello {user.name}!");
    }

    #[test]
    fn nested_braces_and_strings() {
        let (masked, islands) = Islands::mask("{ {a: '}'} } tail").unwrap();

        assert_eq!(masked, "\u{E000}0\u{E001} tail");
        assert_eq!(islands.get(0).unwrap().source, " {a: '}'} ");
    }

    #[test]
    fn comments_may_contain_apostrophes() {
        let (masked, islands) = Islands::mask("{/* i18n don't split */}\n").unwrap();

        assert_eq!(masked, "\u{E000}0\u{E001}\n");
        assert_eq!(islands.get(0).unwrap().source, "/* i18n don't split */");
    }

    #[rstest]
    #[case::code_span("Use `{x}` here")]
    #[case::escaped("Literal \\{ brace")]
    #[case::html_comment("<!-- {not an island} -->")]
    #[case::fenced_code("```js\nconst a = {b};\n```\n")]
    #[case::front_matter("---\ntitle: {x}\n---\n\nBody\n")]
    fn leaves_non_islands_alone(#[case] input: &str) {
        let (masked, islands) = Islands::mask(input).unwrap();

        assert_eq!(masked, input);
        assert!(islands.is_empty());
    }

    #[test]
    fn masks_module_blocks() {
        let input = "import {Chart} from './chart'\nexport const x = 1\n\n# Title\n";
        let (masked, islands) = Islands::mask(input).unwrap();

        assert_eq!(masked, "\u{E000}0\u{E001}\n\n# Title\n");
        assert_eq!(islands.get(0).unwrap().kind, IslandKind::Module);
        assert_eq!(
            islands.get(0).unwrap().source,
            "import {Chart} from './chart'\nexport const x = 1"
        );
    }

    #[test]
    fn import_inside_paragraph_is_text() {
        let (masked, islands) = Islands::mask("Please\nimport the data\n").unwrap();

        assert_eq!(masked, "Please\nimport the data\n");
        assert!(islands.is_empty());
    }

    #[test]
    fn unterminated_expression_is_an_error() {
        let err = Islands::mask("line one\nbroken { here\n").unwrap_err();

        assert_eq!(err, ParseError::UnterminatedExpression { line: 2, column: 8 });
    }

    #[test]
    fn lone_detects_single_sentinel() {
        let (masked, islands) = Islands::mask("{a}\n\ntext {b}\n").unwrap();
        let mut paragraphs = masked.split("\n\n");

        assert!(islands.lone(paragraphs.next().unwrap()).is_some());
        assert!(islands.lone(paragraphs.next().unwrap()).is_none());
    }

    #[test]
    fn lone_island_outlives_the_text() {
        let (masked, islands) = Islands::mask("{props.title}\n").unwrap();

        let island = {
            let text = masked.clone();
            islands.lone(&text)
        };

        assert_eq!(island.map(|i| i.source.as_str()), Some("props.title"));
    }
}
