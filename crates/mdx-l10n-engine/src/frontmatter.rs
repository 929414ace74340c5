//! # Front Matter
//!
//! The YAML header of a document is localized field by field rather than as
//! prose. Only string scalars under the selected top-level fields are
//! touched; everything else is written back as parsed.
//!
//! ```yaml
//! title: Getting started        # "title"
//! sidebar:
//!   label: Start here           # "sidebar.label"
//! tags: [intro, setup]          # "tags.0", "tags.1"
//! ```

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const FULLY_TRANSLATED: &str = "fullyTranslated";

#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("Invalid YAML front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Front matter is not a mapping")]
    NotAMapping,
}

/// Which front matter fields are localized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    All,
    #[default]
    None,
    /// Top-level field names, or full dotted paths.
    Fields(Vec<String>),
}

impl Selection {
    pub fn includes(&self, path: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::None => false,
            Selection::Fields(fields) => {
                let top = path.split('.').next().unwrap_or(path);
                fields.iter().any(|f| f == path || f == top)
            }
        }
    }
}

/// A localizable string found in the front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldText {
    /// Dotted path from the top-level mapping.
    pub path: String,
    pub source: String,
}

/// Parses and rewrites the raw front matter of a document.
pub trait FrontMatterHandler {
    /// Datatype recorded on units from this handler.
    fn datatype(&self) -> &str;

    fn extract(
        &self,
        raw: &str,
        selection: &Selection,
    ) -> Result<Vec<FieldText>, FrontMatterError>;

    /// Replace selected strings with what `lookup` returns. `None` keeps the
    /// source text; when nothing is replaced `raw` comes back untouched.
    fn localize(
        &self,
        raw: &str,
        selection: &Selection,
        lookup: &mut dyn FnMut(&FieldText) -> Option<String>,
    ) -> Result<String, FrontMatterError>;

    /// Record that the document is fully translated.
    fn mark_fully_translated(&self, raw: &str) -> Result<String, FrontMatterError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFrontMatter;

impl YamlFrontMatter {
    fn parse(raw: &str) -> Result<Mapping, FrontMatterError> {
        if raw.trim().is_empty() {
            return Ok(Mapping::new());
        }
        match serde_yaml::from_str::<Value>(raw)? {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            _ => Err(FrontMatterError::NotAMapping),
        }
    }
}

impl FrontMatterHandler for YamlFrontMatter {
    fn datatype(&self) -> &str {
        "x-yaml"
    }

    fn extract(
        &self,
        raw: &str,
        selection: &Selection,
    ) -> Result<Vec<FieldText>, FrontMatterError> {
        let mapping = Self::parse(raw)?;
        let mut out = Vec::new();
        for (key, value) in &mapping {
            if let Some(name) = key_name(key) {
                collect(value, name, selection, &mut out);
            }
        }
        Ok(out)
    }

    fn localize(
        &self,
        raw: &str,
        selection: &Selection,
        lookup: &mut dyn FnMut(&FieldText) -> Option<String>,
    ) -> Result<String, FrontMatterError> {
        let mut mapping = Self::parse(raw)?;
        let mut replaced = false;
        for (key, value) in mapping.iter_mut() {
            if let Some(name) = key_name(key) {
                replaced |= replace(value, name, selection, lookup);
            }
        }
        if !replaced {
            return Ok(raw.to_string());
        }
        Ok(serde_yaml::to_string(&mapping)?)
    }

    fn mark_fully_translated(&self, raw: &str) -> Result<String, FrontMatterError> {
        let mut mapping = Self::parse(raw)?;
        if !mapping.contains_key(FULLY_TRANSLATED) {
            let line = format!("{FULLY_TRANSLATED}: true");
            return Ok(match raw {
                "" => line,
                _ if raw.ends_with('\n') => format!("{raw}{line}\n"),
                _ => format!("{raw}\n{line}"),
            });
        }
        mapping.insert(Value::from(FULLY_TRANSLATED), Value::Bool(true));
        Ok(serde_yaml::to_string(&mapping)?)
    }
}

fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn collect(value: &Value, path: String, selection: &Selection, out: &mut Vec<FieldText>) {
    match value {
        Value::String(source) if selection.includes(&path) && !source.trim().is_empty() => {
            out.push(FieldText {
                path,
                source: source.clone(),
            });
        }
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                if let Some(name) = key_name(key) {
                    collect(child, format!("{path}.{name}"), selection, out);
                }
            }
        }
        Value::Sequence(items) => {
            for (i, child) in items.iter().enumerate() {
                collect(child, format!("{path}.{i}"), selection, out);
            }
        }
        Value::Tagged(tagged) => collect(&tagged.value, path, selection, out),
        _ => {}
    }
}

fn replace(
    value: &mut Value,
    path: String,
    selection: &Selection,
    lookup: &mut dyn FnMut(&FieldText) -> Option<String>,
) -> bool {
    match value {
        Value::String(source) if selection.includes(&path) && !source.trim().is_empty() => {
            let field = FieldText {
                path,
                source: source.clone(),
            };
            match lookup(&field) {
                Some(translated) => {
                    *source = translated;
                    true
                }
                None => false,
            }
        }
        Value::Mapping(mapping) => {
            let mut replaced = false;
            for (key, child) in mapping.iter_mut() {
                if let Some(name) = key_name(key) {
                    replaced |= replace(child, format!("{path}.{name}"), selection, lookup);
                }
            }
            replaced
        }
        Value::Sequence(items) => {
            let mut replaced = false;
            for (i, child) in items.iter_mut().enumerate() {
                replaced |= replace(child, format!("{path}.{i}"), selection, lookup);
            }
            replaced
        }
        Value::Tagged(tagged) => replace(&mut tagged.value, path, selection, lookup),
        _ => false,
    }
}
