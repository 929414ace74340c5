use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid file pattern {pattern:?}: {source}")]
    PatternError {
        pattern: String,
        source: glob::PatternError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub project: String,
    #[serde(default = "default_source_locale")]
    pub source_locale: String,
    #[serde(default)]
    pub locales: Vec<String>,
    /// JSON translation set read by `localize`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translations: Option<PathBuf>,
    #[serde(default)]
    pub mdx: MdxSettings,
}

fn default_source_locale() -> String {
    "en-US".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MdxSettings {
    pub fully_translated: bool,
    pub identify: bool,
    pub localize_links: bool,
    pub breaking_tags: Vec<String>,
    pub non_breaking_tags: Vec<String>,
    pub mappings: Vec<Mapping>,
}

/// Which front matter fields a mapping localizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontMatterFields {
    /// `true` for every string field, `false` for none.
    Flag(bool),
    Fields(Vec<String>),
}

impl Default for FrontMatterFields {
    fn default() -> Self {
        FrontMatterFields::Flag(false)
    }
}

/// Where the files matching `pattern` go, and what of them is localized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub pattern: String,
    #[serde(default)]
    pub frontmatter: FrontMatterFields,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(skip)]
    compiled: Option<Pattern>,
}

fn default_template() -> String {
    "[dir]/[locale]/[base]".to_string()
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl Mapping {
    pub fn new(pattern: &str, template: &str) -> Result<Self, ConfigError> {
        let mut mapping = Mapping {
            pattern: pattern.to_string(),
            frontmatter: FrontMatterFields::default(),
            template: template.to_string(),
            compiled: None,
        };
        mapping.compile()?;
        Ok(mapping)
    }

    fn compile(&mut self) -> Result<(), ConfigError> {
        let compiled = Pattern::new(&self.pattern).map_err(|source| ConfigError::PatternError {
            pattern: self.pattern.clone(),
            source,
        })?;
        self.compiled = Some(compiled);
        Ok(())
    }

    pub fn matches(&self, path: &Path) -> bool {
        match &self.compiled {
            Some(pattern) => pattern.matches_path_with(path, MATCH_OPTIONS),
            None => Pattern::new(&self.pattern)
                .is_ok_and(|pattern| pattern.matches_path_with(path, MATCH_OPTIONS)),
        }
    }

    /// Output location of `path` for `locale`.
    ///
    /// Template variables: `[dir]` parent directory, `[base]` file name,
    /// `[filename]` file name without extension, `[extension]` extension
    /// without the dot, `[locale]` target locale.
    pub fn output_path(&self, path: &Path, locale: &str) -> PathBuf {
        let dir = path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut template = self.template.clone();
        if dir.is_empty() {
            template = template.replace("[dir]/", "");
        }
        let formatted = template
            .replace("[dir]", &dir)
            .replace("[base]", &base)
            .replace("[filename]", &filename)
            .replace("[extension]", &extension)
            .replace("[locale]", locale);
        PathBuf::from(formatted)
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        for mapping in &mut config.mdx.mappings {
            mapping.compile()?;
        }

        // Expand shell variables and tilde in the translations path
        if let Some(translations) = config.translations.take() {
            config.translations = Some(Self::expand_path(&translations).unwrap_or(translations));
        }

        Ok(Some(config))
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// First mapping whose pattern matches `path`.
    pub fn mapping_for(&self, path: &Path) -> Option<&Mapping> {
        self.mdx.mappings.iter().find(|m| m.matches(path))
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
