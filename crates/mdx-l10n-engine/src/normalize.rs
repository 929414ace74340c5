//! Text normalization for resource keys and translatability checks.
//!
//! Two strings that differ only in entity spelling, backslash escapes or
//! whitespace runs produce the same key, so translators never see them
//! twice.

use std::sync::LazyLock;

use regex::Regex;

static LEADING_DOUBLE_BACKSLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\\\\").expect("leading backslash regex"));
static DOUBLE_BACKSLASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\\])\\\\").expect("double backslash regex"));
static ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(.)").expect("escape regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \n\t\r\x0C]+").expect("whitespace regex"));
static URL_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?|github|ftps?|mailto|file|data|irc)://\S+$").expect("url regex")
});
static WHOLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<("(\\"|[^"])*"|'(\\'|[^'])*'|[^>])*>"#).expect("tag regex")
});
static NAMED_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[a-zA-Z]+;").expect("entity regex"));

/// Decode character references, then resolve backslash escapes.
pub fn unescape(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    let step = LEADING_DOUBLE_BACKSLASH.replace(&decoded, r"\");
    let step = DOUBLE_BACKSLASH.replace_all(&step, r"${1}\");
    ESCAPE.replace_all(&step, "${1}").into_owned()
}

/// Unescape, collapse whitespace runs to one space and trim.
pub fn clean(text: &str) -> String {
    WHITESPACE_RUN
        .replace_all(&unescape(text), " ")
        .trim()
        .to_string()
}

/// Replace control characters that are not allowed in XML with numeric
/// character references.
pub fn escape_invalid_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code < 0x09 || (0x0D < code && code < 0x20) {
            out.push_str(&format!("&#x{code:X};"));
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether anything other than tags, entities, punctuation and whitespace
/// is left in `text`.
pub fn contains_actual_text(text: &str) -> bool {
    let stripped = WHOLE_TAG.replace_all(text, "");
    let stripped = NAMED_ENTITY.replace_all(&stripped, "");
    stripped.chars().any(char::is_alphanumeric)
}

pub fn is_url_only(text: &str) -> bool {
    URL_ONLY.is_match(text)
}

/// Whether a minimal string is worth sending to translators.
pub fn is_translatable(text: &str, links_localizable: bool) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if !links_localizable && is_url_only(text) {
        return false;
    }
    contains_actual_text(text)
}

/// Whitespace for trimming purposes, including the invisible joiners.
pub fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FEFF}')
}
