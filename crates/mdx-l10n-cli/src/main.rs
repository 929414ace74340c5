mod args;
mod status;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mdx_l10n_config::{Config, FrontMatterFields, Mapping};
use mdx_l10n_engine::{
    Engine, LocalizedText, Resource, Selection, Settings, TagRules, TranslationSet, io,
};
use std::path::{Path, PathBuf};

use args::{CliArguments, Commands, ExtractArgs, LocalizeArgs};
use status::{STATUS_FILE, TranslationStatus};

const DEFAULT_TEMPLATE: &str = "[dir]/[locale]/[base]";

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = CliArguments::parse();
    let config = Config::load_from_path(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if config.is_none() {
        log::info!("No config at {}, using defaults", args.config.display());
    }

    match args.command {
        Commands::Extract(extract_args) => extract(config.as_ref(), &extract_args),
        Commands::Localize(localize_args) => {
            let root = args.config.parent().unwrap_or(Path::new(""));
            localize(config.as_ref(), &localize_args, &root.join(STATUS_FILE))
        }
    }
}

fn extract(config: Option<&Config>, args: &ExtractArgs) -> Result<()> {
    let mut resources = Vec::new();
    for file in &args.files {
        resources.extend(extract_file(config, file)?);
    }

    let json = serde_json::to_string_pretty(&resources)?;
    match &args.output {
        Some(output) => io::write_file(output, &json)
            .with_context(|| format!("Failed to write {}", output.display()))?,
        None => println!("{json}"),
    }
    log::info!(
        "Extracted {} units from {} files",
        resources.len(),
        args.files.len()
    );
    Ok(())
}

/// Localize every file into every locale. With `fully_translated` set, the
/// completeness of each output is also written to `status_path`.
fn localize(config: Option<&Config>, args: &LocalizeArgs, status_path: &Path) -> Result<()> {
    let locales = if args.locales.is_empty() {
        config.map(|c| c.locales.clone()).unwrap_or_default()
    } else {
        args.locales.clone()
    };
    if locales.is_empty() {
        bail!("No target locale given and none configured");
    }

    let translations = args
        .translations
        .as_deref()
        .or_else(|| config.and_then(|c| c.translations.as_deref()));
    let set = match translations {
        Some(path) => load_translations(path)?,
        None => {
            log::warn!("No translation set given, every unit will be reported as new");
            TranslationSet::new()
        }
    };

    let mut new_units = Vec::new();
    let mut status = TranslationStatus::default();
    for file in &args.files {
        for locale in &locales {
            let (output, localized) = localize_file(config, &set, file, locale)?;
            status.add(&output, localized.fully_translated);
            new_units.extend(localized.new_units);
        }
    }

    let json = serde_json::to_string_pretty(&new_units)?;
    io::write_file(&args.new_resources, &json)
        .with_context(|| format!("Failed to write {}", args.new_resources.display()))?;
    log::info!(
        "{} untranslated units written to {}",
        new_units.len(),
        args.new_resources.display()
    );

    if config.is_some_and(|c| c.mdx.fully_translated) {
        status.write(status_path)?;
    }
    Ok(())
}

fn load_translations(path: &Path) -> Result<TranslationSet> {
    let json = io::read_file(path)
        .with_context(|| format!("Failed to read translations from {}", path.display()))?;
    let set = TranslationSet::from_json(&json)
        .with_context(|| format!("Invalid translation set {}", path.display()))?;
    log::info!("Loaded {} translations from {}", set.len(), path.display());
    Ok(set)
}

fn extract_file(config: Option<&Config>, file: &Path) -> Result<Vec<Resource>> {
    let mapping = config.and_then(|c| c.mapping_for(file));
    let engine = Engine::new(settings(config, mapping));

    let source =
        io::read_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let extraction = engine
        .extract_text(&source, &document_path(file))
        .with_context(|| format!("Failed to extract {}", file.display()))?;

    let settings = engine.settings();
    Ok(extraction.resources(&settings.project, &settings.source_locale))
}

fn localize_file(
    config: Option<&Config>,
    set: &TranslationSet,
    file: &Path,
    locale: &str,
) -> Result<(PathBuf, LocalizedText)> {
    let mapping = config.and_then(|c| c.mapping_for(file));
    let engine = Engine::new(settings(config, mapping));

    let source =
        io::read_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let localized = engine
        .localize_text(&source, &document_path(file), set, locale)
        .with_context(|| format!("Failed to localize {} into {locale}", file.display()))?;

    let output = output_path(mapping, file, locale)?;
    if output == file {
        bail!("Output for {locale} would overwrite {}", file.display());
    }
    io::write_file(&output, &localized.text)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!(
        "Wrote {} ({} untranslated)",
        output.display(),
        localized.new_units.len()
    );
    Ok((output, localized))
}

/// Engine settings for one document.
fn settings(config: Option<&Config>, mapping: Option<&Mapping>) -> Settings {
    let mut settings = Settings::default();
    if let Some(config) = config {
        let mdx = &config.mdx;
        settings.project = config.project.clone();
        settings.source_locale = config.source_locale.clone();
        settings.fully_translated = mdx.fully_translated;
        settings.identify = mdx.identify;
        settings.localize_links = mdx.localize_links;
        settings.tags = TagRules::new(
            mdx.breaking_tags.as_slice(),
            mdx.non_breaking_tags.as_slice(),
        );
    }
    if let Some(mapping) = mapping {
        settings.frontmatter = selection(&mapping.frontmatter);
    }
    settings
}

fn selection(fields: &FrontMatterFields) -> Selection {
    match fields {
        FrontMatterFields::Flag(true) => Selection::All,
        FrontMatterFields::Flag(false) => Selection::None,
        FrontMatterFields::Fields(fields) => Selection::Fields(fields.clone()),
    }
}

/// Path the document's front matter keys are derived from.
fn document_path(file: &Path) -> String {
    file.to_string_lossy().replace('\\', "/")
}

fn output_path(mapping: Option<&Mapping>, file: &Path, locale: &str) -> Result<PathBuf> {
    Ok(match mapping {
        Some(mapping) => mapping.output_path(file, locale),
        None => Mapping::new("**", DEFAULT_TEMPLATE)?.output_path(file, locale),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdx_l10n_engine::{ResourceState, make_key};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> Config {
        let path = dir.join("mdx-l10n.toml");
        std::fs::write(&path, content).unwrap();
        Config::load_from_path(&path).unwrap().unwrap()
    }

    fn translated(key: String, target: &str) -> Resource {
        Resource {
            project: "docs".to_string(),
            key,
            source_locale: "en-US".to_string(),
            source: String::new(),
            target_locale: Some("fr-FR".to_string()),
            target: Some(target.to_string()),
            datatype: "mdx".to_string(),
            path: None,
            state: ResourceState::Translated,
            comment: None,
            index: 0,
        }
    }

    #[test]
    fn test_settings_follow_config_and_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(
            temp_dir.path(),
            r#"
project = "docs"
[mdx]
identify = true
breaking_tags = ["span"]
[[mdx.mappings]]
pattern = "docs/*.mdx"
frontmatter = ["title"]
"#,
        );
        let mapping = config.mapping_for(Path::new("docs/a.mdx"));

        let settings = settings(Some(&config), mapping);

        assert_eq!(settings.project, "docs");
        assert!(settings.identify);
        assert!(!settings.fully_translated);
        assert_eq!(settings.frontmatter, Selection::Fields(vec!["title".into()]));
        assert_eq!(settings.tags, TagRules::new(&["span"], &[]));
    }

    #[test]
    fn test_settings_without_config() {
        assert_eq!(settings(None, None), Settings::default());
    }

    #[test]
    fn test_output_path_defaults_to_locale_directory() {
        let output = output_path(None, Path::new("docs/a.mdx"), "de-DE").unwrap();
        assert_eq!(output, PathBuf::from("docs/de-DE/a.mdx"));
    }

    #[test]
    fn test_extract_file_reports_resources() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.mdx");
        std::fs::write(&file, "# Hello\n\nHello [world](http://x).\n").unwrap();

        let resources = extract_file(None, &file).unwrap();

        let sources: Vec<_> = resources.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["Hello", "Hello <c0>world</c0>."]);
        assert!(resources.iter().all(|r| r.state == ResourceState::New));
        assert_eq!(resources[1].path.as_deref(), Some(document_path(&file).as_str()));
    }

    #[test]
    fn test_localize_file_writes_through_mapping() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = write_config(
            root,
            &format!(
                "project = \"docs\"\n\n[[mdx.mappings]]\npattern = \"{}/*.mdx\"\ntemplate = \"[dir]/i18n/[locale]/[filename].[extension]\"\n",
                root.display()
            ),
        );
        let file = root.join("intro.mdx");
        std::fs::write(&file, "Hello world\n\nNot yet\n").unwrap();
        let set: TranslationSet = [translated(make_key("Hello world"), "Bonjour le monde")]
            .into_iter()
            .collect();

        let (output, localized) = localize_file(Some(&config), &set, &file, "fr-FR").unwrap();

        assert_eq!(output, root.join("i18n/fr-FR/intro.mdx"));
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "Bonjour le monde\n\nNot yet\n"
        );
        assert!(!localized.fully_translated);
        let new_units = localized.new_units;
        assert_eq!(new_units.len(), 1);
        assert_eq!(new_units[0].source, "Not yet");
        assert_eq!(new_units[0].target_locale.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn test_localize_writes_translation_status() {
        // Given a project that tracks fully translated files
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = write_config(
            root,
            &format!(
                "project = \"docs\"\n\n[mdx]\nfully_translated = true\n\n[[mdx.mappings]]\npattern = \"{}/*.mdx\"\ntemplate = \"[dir]/i18n/[locale]/[base]\"\n",
                root.display()
            ),
        );
        let done = root.join("done.mdx");
        let partial = root.join("partial.mdx");
        std::fs::write(&done, "Hello world\n").unwrap();
        std::fs::write(&partial, "Hello world\n\nNot yet\n").unwrap();
        let translations = root.join("fr.json");
        let set: TranslationSet = [translated(make_key("Hello world"), "Bonjour le monde")]
            .into_iter()
            .collect();
        std::fs::write(&translations, set.to_json().unwrap()).unwrap();
        let args = LocalizeArgs {
            locales: vec!["fr-FR".to_string()],
            translations: Some(translations),
            new_resources: root.join("new-resources.json"),
            files: vec![done, partial],
        };
        let status_path = root.join(STATUS_FILE);

        // When both files are localized
        localize(Some(&config), &args, &status_path).unwrap();

        // Then each output is listed under its completeness
        let status: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&status_path).unwrap()).unwrap();
        assert_eq!(
            status,
            serde_json::json!({
                "translated": [document_path(&root.join("i18n/fr-FR/done.mdx"))],
                "untranslated": [document_path(&root.join("i18n/fr-FR/partial.mdx"))],
            })
        );
        // and the incomplete file falls back to the source text
        assert_eq!(
            std::fs::read_to_string(root.join("i18n/fr-FR/partial.mdx")).unwrap(),
            "Hello world\n\nNot yet\n"
        );
    }

    #[test]
    fn test_localize_without_fully_translated_skips_status() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let config = write_config(root, "project = \"docs\"\n");
        let file = root.join("a.mdx");
        std::fs::write(&file, "Hello world\n").unwrap();
        let args = LocalizeArgs {
            locales: vec!["fr-FR".to_string()],
            translations: None,
            new_resources: root.join("new-resources.json"),
            files: vec![file],
        };
        let status_path = root.join(STATUS_FILE);

        localize(Some(&config), &args, &status_path).unwrap();

        assert!(!status_path.exists());
        assert!(root.join("fr-FR/a.mdx").exists());
    }

    #[test]
    fn test_load_translations_reads_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fr.json");
        let set: TranslationSet = [translated(make_key("Hello world"), "Bonjour")]
            .into_iter()
            .collect();
        std::fs::write(&path, set.to_json().unwrap()).unwrap();

        let loaded = load_translations(&path).unwrap();

        assert_eq!(loaded, set);
        assert!(load_translations(&temp_dir.path().join("missing.json")).is_err());
    }
}
