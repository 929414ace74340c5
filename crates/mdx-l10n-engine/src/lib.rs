//! # mdx-l10n-engine
//!
//! Finds the translatable text in an MDX document and puts translations back
//! without disturbing anything around them.
//!
//! ## Architecture Overview
//!
//! ```text
//!            ┌──────────── extract ────────────┐
//! Tree → prepare → flatten → walk ─→ Extractor ─→ Extraction (units)
//!                              │
//!                              └──→ Localizer ─→ splice → Sink → Tree
//!            └──────────── localize ───────────┘
//! ```
//!
//! Both directions share one segmentation walk ([`walker`]), so a unit's key
//! and placeholder numbering are identical when extracting and when
//! localizing. A run of inline nodes becomes one message:
//!
//! ```text
//! Do *not* skip [the setup][setup].   →   Do <c0>not</c0> skip <c1>the setup</c1>.
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use mdx_l10n_engine::{Engine, Settings};
//!
//! let engine = Engine::new(Settings::default());
//! let extraction = engine.extract_text("Hello [world](http://x).\n", "intro.mdx").unwrap();
//!
//! assert_eq!(extraction.units[0].source, "Hello <c0>world</c0>.");
//! assert_eq!(extraction.units[0].key, "r443773438");
//! ```

pub mod accumulator;
pub mod attributes;
pub mod classify;
pub mod directives;
pub mod error;
pub mod extract;
pub mod frontmatter;
pub mod io;
pub mod key;
pub mod localize;
pub mod normalize;
pub mod resources;
pub mod walker;

use mdx_l10n_syntax::{DocumentCodec, Event, MdxCodec, Node, NodeKind, Origin, Sink, Tree, flatten};

pub use classify::TagRules;
pub use error::EngineError;
pub use extract::Extraction;
pub use frontmatter::{FrontMatterError, FrontMatterHandler, Selection, YamlFrontMatter};
pub use key::{hash_key, make_key};
pub use resources::{Resource, ResourceState, TranslationSet, TranslationUnit};

use extract::Extractor;
use localize::{Localizer, Target, apply_fields, splice};
use walker::{prepare, walk};

/// Per-project behavior of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub project: String,
    pub source_locale: String,
    /// Only emit translated documents when every unit is translated, and
    /// mark them in the front matter.
    pub fully_translated: bool,
    /// Wrap translated runs in `<span x-locid="KEY">`.
    pub identify: bool,
    /// Initial state of the `localize-links` directive.
    pub localize_links: bool,
    pub tags: TagRules,
    pub frontmatter: Selection,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project: String::new(),
            source_locale: "en-US".to_string(),
            fully_translated: false,
            identify: false,
            localize_links: false,
            tags: TagRules::default(),
            frontmatter: Selection::None,
        }
    }
}

/// Result of localizing one document into one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub tree: Tree,
    /// Every unit had a non-empty translation.
    pub fully_translated: bool,
    /// Units without translation, as new resources for the target locale.
    pub new_units: Vec<Resource>,
}

/// [`Localized`] rendered back to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedText {
    pub text: String,
    pub fully_translated: bool,
    pub new_units: Vec<Resource>,
}

pub struct Engine<C = MdxCodec, F = YamlFrontMatter> {
    settings: Settings,
    codec: C,
    frontmatter: F,
}

impl Engine {
    pub fn new(settings: Settings) -> Self {
        Self::with_parts(settings, MdxCodec, YamlFrontMatter)
    }
}

impl<C: DocumentCodec, F: FrontMatterHandler> Engine<C, F> {
    pub fn with_parts(settings: Settings, codec: C, frontmatter: F) -> Self {
        Self {
            settings,
            codec,
            frontmatter,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Collect the translatable units of a parsed document.
    pub fn extract(&self, tree: &Tree, path: &str) -> Extraction {
        let settings = &self.settings;
        let prepared = prepare(tree, &settings.tags);
        let events = flatten(&prepared);

        let mut extractor = Extractor::new(path, &self.frontmatter, &settings.frontmatter);
        walk(&prepared, &events, &settings.tags, settings.localize_links, &mut extractor);

        let extraction = extractor.finish();
        log::debug!("{path}: {} units", extraction.units.len());
        extraction
    }

    /// Build the document for `locale` from the translations in `set`.
    ///
    /// The input tree is left untouched. Missing translations keep the
    /// source text and come back as [`Localized::new_units`].
    pub fn localize(
        &self,
        tree: &Tree,
        path: &str,
        set: &TranslationSet,
        locale: &str,
    ) -> Result<Localized, EngineError> {
        let settings = &self.settings;
        let mut working = prepare(tree, &settings.tags);
        let events = flatten(&working);

        let target = Target {
            project: &settings.project,
            source_locale: &settings.source_locale,
            locale,
            path,
            identify: settings.identify,
        };
        let mut localizer = Localizer::new(target, set, &self.frontmatter, &settings.frontmatter);
        walk(&working, &events, &settings.tags, settings.localize_links, &mut localizer);

        let fully_translated = localizer.fully_translated();
        let Localizer {
            fields,
            header,
            replacements,
            missing,
            ..
        } = localizer;

        apply_fields(&mut working, fields);
        if let Some((id, raw)) = header {
            working[id].value = Some(raw);
        }
        let mut events = splice(events, replacements);

        if settings.fully_translated {
            if !fully_translated {
                log::info!("{path} is not fully translated into {locale}, keeping the source");
                return Ok(Localized {
                    tree: tree.clone(),
                    fully_translated,
                    new_units: missing,
                });
            }
            self.mark_fully_translated(&mut working, &mut events)?;
        }

        let mut localized = Sink::new(&working).finish(events);
        for id in localized.descendants() {
            localized[id].localizable = false;
        }
        Ok(Localized {
            tree: localized,
            fully_translated,
            new_units: missing,
        })
    }

    /// Parse `source` and extract it.
    pub fn extract_text(&self, source: &str, path: &str) -> Result<Extraction, EngineError> {
        let tree = self.codec.parse(source)?;
        Ok(self.extract(&tree, path))
    }

    /// Parse `source`, localize it and serialize the result.
    pub fn localize_text(
        &self,
        source: &str,
        path: &str,
        set: &TranslationSet,
        locale: &str,
    ) -> Result<LocalizedText, EngineError> {
        let tree = self.codec.parse(source)?;
        let localized = self.localize(&tree, path, set, locale)?;
        Ok(LocalizedText {
            text: self.codec.serialize(&localized.tree),
            fully_translated: localized.fully_translated,
            new_units: localized.new_units,
        })
    }

    fn mark_fully_translated(
        &self,
        working: &mut Tree,
        events: &mut Vec<Event>,
    ) -> Result<(), EngineError> {
        let existing = working
            .children(working.root())
            .iter()
            .copied()
            .find(|&id| working[id].kind == NodeKind::Frontmatter);

        match existing {
            Some(id) => {
                let raw = working[id].value.as_deref().unwrap_or_default();
                let marked = self.frontmatter.mark_fully_translated(raw)?;
                working[id].value = Some(marked);
            }
            None => {
                let marked = self.frontmatter.mark_fully_translated("")?;
                let node = Node::new(NodeKind::Frontmatter).with_value(marked);
                events.insert(0, Event::Leaf(Origin::New(node)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn translations(locale: &str, pairs: &[(&str, &str)]) -> TranslationSet {
        pairs
            .iter()
            .map(|(source, target)| Resource {
                project: String::new(),
                key: make_key(source),
                source_locale: "en-US".to_string(),
                source: source.to_string(),
                target_locale: Some(locale.to_string()),
                target: Some(target.to_string()),
                datatype: "mdx".to_string(),
                path: None,
                state: ResourceState::Translated,
                comment: None,
                index: 0,
            })
            .collect()
    }

    #[test]
    fn extract_reports_units_in_document_order() {
        let engine = Engine::new(Settings::default());

        let extraction = engine
            .extract_text("# Getting started\n\nHello [world](http://x).\n", "intro.mdx")
            .unwrap();

        assert_eq!(
            extraction.sources(),
            vec!["Getting started", "Hello <c0>world</c0>."]
        );
        assert_eq!(extraction.units[0].key, "r659613943");
        assert_eq!(extraction.units[1].index, 1);
    }

    #[test]
    fn localize_replaces_translated_runs() {
        let engine = Engine::new(Settings::default());
        let set = translations("fr-FR", &[("Hello <c0>world</c0>.", "Bonjour <c0>monde</c0>.")]);

        let localized = engine
            .localize_text("Hello [world](http://x).\n", "intro.mdx", &set, "fr-FR")
            .unwrap();

        assert_eq!(localized.text, "Bonjour [monde](http://x).\n");
        assert!(localized.fully_translated);
        assert!(localized.new_units.is_empty());
    }

    #[test]
    fn localize_does_not_touch_the_input_tree() {
        let engine = Engine::new(Settings::default());
        let tree = engine.codec().parse("Hello world\n").unwrap();
        let before = tree.clone();
        let set = translations("fr-FR", &[("Hello world", "Bonjour le monde")]);

        let localized = engine.localize(&tree, "a.mdx", &set, "fr-FR").unwrap();

        assert_eq!(tree, before);
        assert_eq!(engine.codec().serialize(&localized.tree), "Bonjour le monde\n");
    }

    #[test]
    fn missing_translations_become_new_units() {
        let engine = Engine::new(Settings {
            project: "docs".to_string(),
            ..Settings::default()
        });

        let localized = engine
            .localize_text("Hello world\n", "a.mdx", &TranslationSet::new(), "de-DE")
            .unwrap();

        assert_eq!(localized.text, "Hello world\n");
        assert!(!localized.fully_translated);
        assert_eq!(localized.new_units.len(), 1);
        let unit = &localized.new_units[0];
        assert_eq!(unit.key, "r439544977");
        assert_eq!(unit.target.as_deref(), Some("Hello world"));
        assert_eq!(unit.target_locale.as_deref(), Some("de-DE"));
        assert_eq!(unit.state, ResourceState::New);
        assert_eq!(unit.project, "docs");
    }

    #[test]
    fn parse_errors_propagate() {
        let engine = Engine::new(Settings::default());

        let err = engine.extract_text("Broken {expression\n", "a.mdx").unwrap_err();

        assert!(matches!(err, EngineError::Parse(_)));
    }
}
