//! Reconstruction of a document in a target locale.
//!
//! The localizer runs the same walk as extraction. Each translated run is
//! turned back into events and recorded as a replacement for the event range
//! it came from; [`splice`] then swaps the ranges in one pass and the
//! [`Sink`](mdx_l10n_syntax::Sink) builds the localized tree.

use std::collections::HashSet;
use std::ops::Range;

use mdx_l10n_syntax::{
    AttrValue, Attribute, Element, Event, Node, NodeId, NodeKind, Origin, Quote, Tree,
};

use crate::accumulator::{Message, Piece};
use crate::attributes::set_attribute;
use crate::frontmatter::{FrontMatterHandler, Selection};
use crate::key::{frontmatter_key, make_key};
use crate::normalize::escape_invalid_chars;
use crate::resources::{MDX_DATATYPE, Resource, TranslationSet, TranslationUnit};
use crate::walker::{Field, Visitor};

/// Who is asking and for which locale.
pub(crate) struct Target<'a> {
    pub project: &'a str,
    pub source_locale: &'a str,
    pub locale: &'a str,
    pub path: &'a str,
    pub identify: bool,
}

pub(crate) struct Localizer<'a, F> {
    target: Target<'a>,
    set: &'a TranslationSet,
    frontmatter: &'a F,
    selection: &'a Selection,
    pub fields: Vec<(NodeId, Field, String)>,
    pub header: Option<(NodeId, String)>,
    pub replacements: Vec<(Range<usize>, Vec<Event>)>,
    pub missing: Vec<Resource>,
    seen: HashSet<(String, String)>,
    index: usize,
}

impl<'a, F: FrontMatterHandler> Localizer<'a, F> {
    pub fn new(
        target: Target<'a>,
        set: &'a TranslationSet,
        frontmatter: &'a F,
        selection: &'a Selection,
    ) -> Self {
        Self {
            target,
            set,
            frontmatter,
            selection,
            fields: Vec::new(),
            header: None,
            replacements: Vec::new(),
            missing: Vec::new(),
            seen: HashSet::new(),
            index: 0,
        }
    }

    pub fn fully_translated(&self) -> bool {
        self.missing.is_empty()
    }

    fn lookup(&self, key: &str, datatype: &str) -> Option<&'a str> {
        self.set
            .lookup(self.target.project, self.target.locale, key, datatype)
    }

    /// Index of a unit seen for the first time, numbered like extraction.
    fn first_seen(&mut self, key: &str, datatype: &str) -> Option<usize> {
        if !self.seen.insert((key.to_string(), datatype.to_string())) {
            return None;
        }
        let index = self.index;
        self.index += 1;
        Some(index)
    }

    /// Register a unit without translation, once per key.
    fn record_missing(
        &mut self,
        source: String,
        key: String,
        datatype: &str,
        comment: Option<String>,
    ) {
        let Some(index) = self.first_seen(&key, datatype) else {
            return;
        };
        let unit = TranslationUnit {
            source,
            comment,
            key,
            index,
            datatype: datatype.to_string(),
        };
        let t = &self.target;
        self.missing.push(Resource::untranslated(
            &unit,
            t.project,
            t.source_locale,
            t.path,
            t.locale,
        ));
    }
}

impl<F: FrontMatterHandler> Visitor for Localizer<'_, F> {
    fn field(&mut self, node: NodeId, field: Field, value: &str) {
        let key = make_key(value);
        match self.lookup(&key, MDX_DATATYPE) {
            Some(translated) => {
                self.first_seen(&key, MDX_DATATYPE);
                self.fields.push((node, field, translated.to_string()));
            }
            None => self.record_missing(escape_invalid_chars(value), key, MDX_DATATYPE, None),
        }
    }

    fn frontmatter(&mut self, node: NodeId, raw: &str) {
        if *self.selection == Selection::None {
            return;
        }
        let datatype = self.frontmatter.datatype().to_string();
        let (set, t) = (self.set, &self.target);
        let mut fields = Vec::new();
        let result = self.frontmatter.localize(raw, self.selection, &mut |field| {
            let key = frontmatter_key(t.path, &field.path);
            let found = set.lookup(t.project, t.locale, &key, &datatype);
            fields.push((key, field.source.clone(), found.is_some()));
            found.map(str::to_string)
        });
        match result {
            Ok(localized) if localized != raw => self.header = Some((node, localized)),
            Ok(_) => {}
            Err(e) => {
                log::warn!("Leaving front matter of {} untranslated: {e}", self.target.path);
                return;
            }
        }
        for (key, source, found) in fields {
            if found {
                self.first_seen(&key, &datatype);
            } else {
                self.record_missing(escape_invalid_chars(&source), key, &datatype, None);
            }
        }
    }

    fn message(
        &mut self,
        events: Range<usize>,
        message: Message<NodeId>,
        comment: Option<String>,
    ) {
        let text = message.minimal_string();
        let key = make_key(text);
        let Some(translated) = self.lookup(&key, MDX_DATATYPE) else {
            self.record_missing(escape_invalid_chars(text), key, MDX_DATATYPE, comment);
            return;
        };
        self.first_seen(&key, MDX_DATATYPE);

        let resolved = message.from_translation(translated);
        if resolved.mismatched {
            log::warn!(
                "Placeholder mismatch for {key} in {}: source {text:?}, locale {}, translation {translated:?}",
                self.target.path,
                self.target.locale
            );
        }

        let mut replacement = Vec::with_capacity(resolved.pieces.len() + 2);
        if self.target.identify {
            replacement.push(Event::Start(Origin::New(locid_span(&key))));
        }
        replacement.extend(resolved.pieces.into_iter().map(|piece| match piece {
            Piece::Text(text) => Event::Leaf(Origin::New(Node::text(text))),
            Piece::Open(id) => Event::start(id),
            Piece::Close(_) => Event::Finish,
            Piece::Whole(id) => Event::leaf(id),
        }));
        if self.target.identify {
            replacement.push(Event::Finish);
        }
        self.replacements.push((events, replacement));
    }
}

/// `<span x-locid="KEY">` wrapped around a translated run.
fn locid_span(key: &str) -> Node {
    let mut span = Element::new("span", false);
    span.attributes.push(Attribute {
        name: "x-locid".to_string(),
        value: AttrValue::Literal {
            value: key.to_string(),
            quote: Quote::Double,
        },
    });
    Node::new(NodeKind::Element(span))
}

/// Write translated auxiliary fields back onto their nodes.
pub(crate) fn apply_fields(tree: &mut Tree, fields: Vec<(NodeId, Field, String)>) {
    for (id, field, value) in fields {
        let node = &mut tree[id];
        match field {
            Field::Title => node.title = Some(value),
            Field::Alt => node.alt = Some(value),
            Field::Url => node.url = Some(value),
            Field::Attribute(index) => {
                if let NodeKind::Element(element) = &mut node.kind {
                    set_attribute(element, index, &value);
                }
            }
        }
    }
}

/// Replace event ranges with new events. Ranges are ascending and disjoint.
pub(crate) fn splice(
    events: Vec<Event>,
    replacements: Vec<(Range<usize>, Vec<Event>)>,
) -> Vec<Event> {
    let mut out = Vec::with_capacity(events.len());
    let mut replacements = replacements.into_iter().peekable();
    let mut events = events.into_iter().enumerate();
    while let Some((i, event)) = events.next() {
        match replacements.peek() {
            Some((range, _)) if range.start == i => {
                let Some((range, replacement)) = replacements.next() else {
                    break;
                };
                out.extend(replacement);
                // Skip the rest of the replaced range.
                for _ in range.start + 1..range.end {
                    events.next();
                }
            }
            _ => out.push(event),
        }
    }
    out
}
