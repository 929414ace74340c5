use std::collections::HashSet;
use std::ops::Range;

use mdx_l10n_syntax::NodeId;
use serde::Serialize;

use crate::accumulator::Message;
use crate::frontmatter::{FrontMatterHandler, Selection};
use crate::key::{frontmatter_key, make_key};
use crate::normalize::escape_invalid_chars;
use crate::resources::{MDX_DATATYPE, Resource, TranslationUnit};
use crate::walker::{Field, Visitor};

/// Units found in one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub path: String,
    pub units: Vec<TranslationUnit>,
}

impl Extraction {
    /// Source-only resources ready to be merged into a translation set.
    pub fn resources(&self, project: &str, source_locale: &str) -> Vec<Resource> {
        self.units
            .iter()
            .map(|unit| Resource::from_unit(unit, project, source_locale, &self.path))
            .collect()
    }

    pub fn sources(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.source.as_str()).collect()
    }
}

/// Collects units, each key once per datatype.
pub(crate) struct Extractor<'a, F> {
    path: &'a str,
    frontmatter: &'a F,
    selection: &'a Selection,
    seen: HashSet<(String, String)>,
    units: Vec<TranslationUnit>,
}

impl<'a, F: FrontMatterHandler> Extractor<'a, F> {
    pub fn new(path: &'a str, frontmatter: &'a F, selection: &'a Selection) -> Self {
        Self {
            path,
            frontmatter,
            selection,
            seen: HashSet::new(),
            units: Vec::new(),
        }
    }

    pub fn finish(self) -> Extraction {
        Extraction {
            path: self.path.to_string(),
            units: self.units,
        }
    }

    fn add(&mut self, source: String, key: String, datatype: &str, comment: Option<String>) {
        if !self.seen.insert((key.clone(), datatype.to_string())) {
            log::trace!("duplicate unit {key} in {}", self.path);
            return;
        }
        self.units.push(TranslationUnit {
            source,
            comment,
            key,
            index: self.units.len(),
            datatype: datatype.to_string(),
        });
    }
}

impl<F: FrontMatterHandler> Visitor for Extractor<'_, F> {
    fn field(&mut self, _node: NodeId, _field: Field, value: &str) {
        self.add(escape_invalid_chars(value), make_key(value), MDX_DATATYPE, None);
    }

    fn frontmatter(&mut self, _node: NodeId, raw: &str) {
        if *self.selection == Selection::None {
            return;
        }
        let fields = match self.frontmatter.extract(raw, self.selection) {
            Ok(fields) => fields,
            Err(e) => {
                log::warn!("Skipping front matter of {}: {e}", self.path);
                return;
            }
        };
        let datatype = self.frontmatter.datatype().to_string();
        for field in fields {
            let key = frontmatter_key(self.path, &field.path);
            self.add(escape_invalid_chars(&field.source), key, &datatype, None);
        }
    }

    fn message(
        &mut self,
        _events: Range<usize>,
        message: Message<NodeId>,
        comment: Option<String>,
    ) {
        let text = message.minimal_string();
        self.add(escape_invalid_chars(text), make_key(text), MDX_DATATYPE, comment);
    }
}
