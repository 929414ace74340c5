use insta::assert_snapshot;
use mdx_l10n_engine::accumulator::{Token, tokenize};
use mdx_l10n_engine::{
    Engine, Extraction, Resource, ResourceState, Selection, Settings, TranslationSet, make_key,
};
use mdx_l10n_syntax::DocumentCodec;
use pretty_assertions::assert_eq;

const GUIDE_PATH: &str = "docs/intro.mdx";

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn guide_engine() -> Engine {
    Engine::new(Settings {
        project: "docs".to_string(),
        frontmatter: Selection::Fields(vec!["title".to_string()]),
        ..Settings::default()
    })
}

fn resource(project: &str, key: String, datatype: &str, target: &str) -> Resource {
    Resource {
        project: project.to_string(),
        key,
        source_locale: "en-US".to_string(),
        source: String::new(),
        target_locale: Some("fr-FR".to_string()),
        target: Some(target.to_string()),
        datatype: datatype.to_string(),
        path: None,
        state: ResourceState::Translated,
        comment: None,
        index: 0,
    }
}

/// French translations keyed by source string.
fn french(project: &str, pairs: &[(&str, &str)]) -> TranslationSet {
    pairs
        .iter()
        .map(|(source, target)| resource(project, make_key(source), "mdx", target))
        .collect()
}

fn guide_translations() -> TranslationSet {
    let mut set = french(
        "docs",
        &[
            ("Getting started", "Premiers pas"),
            (
                "Install the <c0>CLI</c0> with <c1/>, then run it in <c2/>.",
                "Installez la <c0>CLI</c0> avec <c1/>, puis lancez-la dans <c2/>.",
            ),
            ("Heads up", "Attention"),
            (
                "Do <c0>not</c0> skip <c1>the setup</c1>.",
                "Ne sautez <c0>pas</c0> <c1>la configuration</c1>.",
            ),
            ("Tool", "Outil"),
        ],
    );
    set.insert(resource(
        "docs",
        "r761732109.title".to_string(),
        "x-yaml",
        "Premiers pas",
    ));
    set
}

fn summary(extraction: &Extraction) -> String {
    extraction
        .units
        .iter()
        .map(|u| match &u.comment {
            Some(comment) => format!("{} [{}] # {comment}", u.source, u.datatype),
            None => format!("{} [{}]", u.source, u.datatype),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn guide_extraction() {
    // Given
    let engine = guide_engine();
    let source = fixture("guide.mdx");

    // When
    let extraction = engine.extract_text(&source, GUIDE_PATH).unwrap();

    // Then
    assert_snapshot!(summary(&extraction), @r"
    Getting started [x-yaml]
    Getting started [mdx]
    Install the <c0>CLI</c0> with <c1/>, then run it in <c2/>. [mdx] # c1 will be replaced with the inline code `npm i -g tool`. c2 will be replaced with the inline expression {props.dir}.
    Heads up [mdx]
    Do <c0>not</c0> skip <c1>the setup</c1>. [mdx]
    Tool [mdx] # This heading is a product name
    ");
    assert_eq!(extraction.units[0].key, "r761732109.title");
    assert_eq!(extraction.units[1].key, "r659613943");
    assert_eq!(extraction.units[4].key, "r634032651");
    let indices: Vec<_> = extraction.units.iter().map(|u| u.index).collect();
    assert_eq!(indices, (0..6).collect::<Vec<_>>());
}

#[test]
fn guide_localization() {
    let engine = guide_engine();
    let source = fixture("guide.mdx");

    let localized = engine
        .localize_text(&source, GUIDE_PATH, &guide_translations(), "fr-FR")
        .unwrap();

    assert!(localized.fully_translated, "{:#?}", localized.new_units);
    let text = &localized.text;
    assert!(text.starts_with("---\ntitle: Premiers pas\nsidebar_label: Start\n---\n"));
    assert!(text.contains("import {Callout} from '../components'"));
    assert!(text.contains("# Premiers pas\n"));
    assert!(text.contains(
        "Installez la **CLI** avec `npm i -g tool`, puis lancez-la dans {props.dir}.\n"
    ));
    assert!(text.contains("<Callout type=\"warning\" title=\"Attention\">"));
    assert!(text.contains("Ne sautez *pas* [la configuration][setup].\n"));
    assert!(text.contains("{/* i18n This heading is a product name */}"));
    assert!(text.contains("## Outil\n"));
    assert!(text.contains("[setup]: https://example.com/setup \"Setup\""));
}

#[test]
fn localized_output_parses_back() {
    let engine = guide_engine();
    let source = fixture("guide.mdx");

    let localized = engine
        .localize_text(&source, GUIDE_PATH, &guide_translations(), "fr-FR")
        .unwrap();

    let reparsed = engine.codec().parse(&localized.text).unwrap();
    assert_eq!(engine.codec().serialize(&reparsed), localized.text);
}

#[test]
fn re_extraction_is_idempotent() {
    let engine = guide_engine();
    let source = fixture("guide.mdx");

    let first = engine.extract_text(&source, GUIDE_PATH).unwrap();
    let second = engine.extract_text(&source, GUIDE_PATH).unwrap();

    assert_eq!(first, second);
}

#[test]
fn empty_translation_set_round_trips() {
    // Given: no translations at all
    let engine = guide_engine();
    let source = fixture("guide.mdx");
    let canonical = engine
        .codec()
        .serialize(&engine.codec().parse(&source).unwrap());

    // When
    let localized = engine
        .localize_text(&source, GUIDE_PATH, &TranslationSet::new(), "fr-FR")
        .unwrap();

    // Then: the document is unchanged and every unit comes back as new
    assert_eq!(localized.text, canonical);
    assert!(!localized.fully_translated);
    assert_eq!(localized.new_units.len(), 6);
    assert!(
        localized
            .new_units
            .iter()
            .all(|r| r.state == ResourceState::New && r.target.as_ref() == Some(&r.source))
    );

    let again = engine.extract_text(&localized.text, GUIDE_PATH).unwrap();
    assert_eq!(again, engine.extract_text(&source, GUIDE_PATH).unwrap());
}

#[test]
fn untranslated_front_matter_keeps_comments_and_quoting() {
    // Given: a header with a comment and a quoted value, every field selected
    let engine = Engine::new(Settings {
        frontmatter: Selection::All,
        ..Settings::default()
    });
    let source = "---\n# sidebar position\ntitle: \"Hello: world\"\nsidebar_position: 2\n---\n\nHello world\n";
    let canonical = engine
        .codec()
        .serialize(&engine.codec().parse(source).unwrap());

    // When
    let localized = engine
        .localize_text(source, "a.mdx", &TranslationSet::new(), "fr-FR")
        .unwrap();

    // Then
    assert_eq!(localized.text, canonical);
    assert!(localized.text.starts_with("---\n# sidebar position\ntitle: \"Hello: world\"\n"));
    assert_eq!(localized.new_units.len(), 2);
    assert_eq!(localized.new_units[0].datatype, "x-yaml");
}

#[test]
fn placeholders_are_contiguous() {
    let engine = guide_engine();
    let extraction = engine
        .extract_text(&fixture("guide.mdx"), GUIDE_PATH)
        .unwrap();

    for unit in &extraction.units {
        let mut indices: Vec<usize> = tokenize(&unit.source)
            .into_iter()
            .filter_map(|token| match token {
                Token::Open(n) | Token::SelfClosing(n) => Some(n),
                _ => None,
            })
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..indices.len()).collect::<Vec<_>>(), "{}", unit.source);
    }
}

#[test]
fn link_inside_sentence_stays_in_one_unit() {
    let engine = Engine::new(Settings::default());

    let extraction = engine
        .extract_text("Hello [world](http://x).\n", "a.mdx")
        .unwrap();

    assert_eq!(extraction.sources(), vec!["Hello <c0>world</c0>."]);
}

#[test]
fn lone_reference_link_keeps_its_placeholder() {
    let engine = Engine::new(Settings::default());
    let set = french("", &[("<c0>Getting started</c0>", "<c0>Premiers pas</c0>")]);

    let extraction = engine
        .extract_text("[Getting started][gs]\n\n[gs]: /start\n", "a.mdx")
        .unwrap();
    let localized = engine
        .localize_text("[Getting started][gs]\n\n[gs]: /start\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(extraction.sources(), vec!["<c0>Getting started</c0>"]);
    assert_eq!(extraction.units[0].key, make_key("<c0>Getting started</c0>"));
    assert_eq!(localized.text, "[Premiers pas][gs]\n\n[gs]: /start\n");
}

#[test]
fn unit_indices_agree_between_passes() {
    // Given: a repeated paragraph
    let engine = Engine::new(Settings::default());
    let source = "Hello\n\nHello\n\nWorld\n";

    // When
    let extraction = engine.extract_text(source, "a.mdx").unwrap();
    let localized = engine
        .localize_text(source, "a.mdx", &TranslationSet::new(), "fr-FR")
        .unwrap();

    // Then
    let extracted: Vec<_> = extraction.units.iter().map(|u| u.index).collect();
    let missing: Vec<_> = localized.new_units.iter().map(|r| r.index).collect();
    assert_eq!(extracted, vec![0, 1]);
    assert_eq!(missing, extracted);
}

#[test]
fn translated_tree_keeps_link_structure() {
    let engine = Engine::new(Settings::default());
    let tree = engine.codec().parse("Hello [world](http://x).\n").unwrap();
    let set = french("", &[("Hello <c0>world</c0>.", "Bonjour <c0>monde</c0>.")]);

    let localized = engine.localize(&tree, "a.mdx", &set, "fr-FR").unwrap();

    assert_snapshot!(localized.tree.outline(), @r#"
    Paragraph
      Text "Bonjour "
      Link(Inline) url="http://x"
        Text "monde"
      Text "."
    "#);
}

#[test]
fn unknown_placeholder_is_dropped_with_its_content() {
    let engine = Engine::new(Settings::default());
    let set = french("", &[("A <c0>B</c0> C.", "X <c0>Y</c0> <c1>Z</c1>.")]);

    let localized = engine
        .localize_text("A *B* C.\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(localized.text, "X *Y* .\n");
    assert!(localized.fully_translated);
}

#[test]
fn link_directive_applies_from_its_position() {
    let engine = Engine::new(Settings::default());
    let source = "See [docs](https://a.example/docs).\n\n\
                  {/* i18n-enable localize-links */}\n\n\
                  See [guide](https://b.example/guide).\n";

    let extraction = engine.extract_text(source, "a.mdx").unwrap();

    assert_eq!(
        extraction.sources(),
        vec![
            "See <c0>docs</c0>.",
            "https://b.example/guide",
            "See <c0>guide</c0>.",
        ]
    );
}

#[test]
fn localize_links_setting_enables_urls_everywhere() {
    let engine = Engine::new(Settings {
        localize_links: true,
        ..Settings::default()
    });
    let set = french(
        "",
        &[
            ("See <c0>docs</c0>.", "Voir <c0>la doc</c0>."),
            ("https://a.example/docs", "https://a.example/fr/docs"),
        ],
    );

    let localized = engine
        .localize_text("See [docs](https://a.example/docs).\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(localized.text, "Voir [la doc](https://a.example/fr/docs).\n");
}

#[test]
fn leading_decorative_span_is_kept_outside_the_unit() {
    let engine = Engine::new(Settings::default());
    let source = "<span class=\"icon\"></span> Click *here* now.\n";
    let set = french(
        "",
        &[("Click <c0>here</c0> now.", "Cliquez <c0>ici</c0> maintenant.")],
    );

    let extraction = engine.extract_text(source, "a.mdx").unwrap();
    let localized = engine.localize_text(source, "a.mdx", &set, "fr-FR").unwrap();

    assert_eq!(extraction.sources(), vec!["Click <c0>here</c0> now."]);
    assert_eq!(
        localized.text,
        "<span class=\"icon\"></span> Cliquez *ici* maintenant.\n"
    );
}

#[test]
fn image_alt_and_html_attributes_are_units() {
    let engine = Engine::new(Settings::default());
    let source = "![A cat](cat.png) sits on <abbr title=\"the mat\">TM</abbr>.\n";
    let set = french(
        "",
        &[
            ("A cat", "Un chat"),
            ("the mat", "le tapis"),
            ("sits on <c0>TM</c0>.", "est assis sur <c0>TM</c0>."),
        ],
    );

    let extraction = engine.extract_text(source, "a.mdx").unwrap();
    let localized = engine.localize_text(source, "a.mdx", &set, "fr-FR").unwrap();

    assert_eq!(
        extraction.sources(),
        vec!["A cat", "the mat", "sits on <c0>TM</c0>."]
    );
    assert_eq!(
        localized.text,
        "![Un chat](cat.png) est assis sur <abbr title=\"le tapis\">TM</abbr>.\n"
    );
}

#[test]
fn fully_translated_documents_are_marked() {
    let engine = Engine::new(Settings {
        fully_translated: true,
        ..Settings::default()
    });
    let set = french("", &[("Hello world", "Bonjour le monde")]);

    let localized = engine
        .localize_text("Hello world\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(
        localized.text,
        "---\nfullyTranslated: true\n---\n\nBonjour le monde\n"
    );
}

#[test]
fn partially_translated_documents_fall_back_to_the_source() {
    let engine = Engine::new(Settings {
        fully_translated: true,
        ..Settings::default()
    });
    let set = french("", &[("Hello world", "Bonjour le monde")]);

    let localized = engine
        .localize_text("Hello world\n\nSecond paragraph\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(localized.text, "Hello world\n\nSecond paragraph\n");
    assert!(!localized.fully_translated);
    assert_eq!(localized.new_units.len(), 1);
    assert_eq!(localized.new_units[0].source, "Second paragraph");
}

#[test]
fn identify_wraps_translated_runs() {
    let engine = Engine::new(Settings {
        identify: true,
        ..Settings::default()
    });
    let set = french("", &[("Hello world", "Bonjour le monde")]);

    let localized = engine
        .localize_text("Hello world\n\nUntranslated\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(
        localized.text,
        "<span x-locid=\"r439544977\">Bonjour le monde</span>\n\nUntranslated\n"
    );
}

#[test]
fn empty_target_counts_as_missing() {
    let engine = Engine::new(Settings::default());
    let set = french("", &[("Hello world", "")]);

    let localized = engine
        .localize_text("Hello world\n", "a.mdx", &set, "fr-FR")
        .unwrap();

    assert_eq!(localized.text, "Hello world\n");
    assert!(!localized.fully_translated);
}
