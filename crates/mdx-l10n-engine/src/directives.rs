//! In-document directives and translator comments.
//!
//! ```mdx
//! {/* i18n-enable localize-links */}
//! {/* i18n The button label in the toolbar */}
//! <!-- i18n-disable localize-links -->
//! ```

use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"i18n-(en|dis)able\s+(\S*)").expect("directive regex"));
static JS_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*/\*\s*[iI]18[nN]\s(.*?)\s*\*/\s*$").expect("comment regex")
});
static HTML_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*<!--\s*[iI]18[nN]\s(.*?)\s*-->\s*$").expect("html comment regex")
});

/// What a comment node asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Enable(String),
    Disable(String),
    /// Context for the translator of the next unit.
    Comment(String),
}

/// Recognize a directive in the value of a flow expression
/// (`/* … */`) or an HTML comment (`<!-- … -->`).
pub fn parse_directive(value: &str) -> Option<Directive> {
    let trimmed = value.trim_start();
    if !trimmed.starts_with("/*") && !trimmed.starts_with("<!--") {
        return None;
    }
    if let Some(caps) = DIRECTIVE.captures(value) {
        let name = caps[2].to_string();
        return Some(if &caps[1] == "en" {
            Directive::Enable(name)
        } else {
            Directive::Disable(name)
        });
    }
    let caps = JS_COMMENT
        .captures(value)
        .or_else(|| HTML_COMMENT.captures(value))?;
    let text = caps[1].trim();
    (!text.is_empty()).then(|| Directive::Comment(text.to_string()))
}

/// Flags and pending comment carried through one document walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveState {
    pub links: bool,
    comment: Option<String>,
}

impl DirectiveState {
    pub fn new(links: bool) -> Self {
        Self {
            links,
            comment: None,
        }
    }

    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Enable(name) | Directive::Disable(name) if name != "localize-links" => {
                log::debug!("ignoring unknown i18n directive {name:?}");
            }
            Directive::Enable(_) => self.links = true,
            Directive::Disable(_) => self.links = false,
            Directive::Comment(text) => match &mut self.comment {
                Some(pending) => {
                    pending.push(' ');
                    pending.push_str(&text);
                }
                None => self.comment = Some(text),
            },
        }
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Hand the pending comment to the unit being emitted.
    pub fn take_comment(&mut self) -> Option<String> {
        self.comment.take()
    }
}
