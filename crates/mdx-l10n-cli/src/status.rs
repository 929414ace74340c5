//! `translation-status.json`: which localized files are complete.

use anyhow::{Context, Result};
use mdx_l10n_engine::io;
use serde::Serialize;
use std::path::Path;

pub const STATUS_FILE: &str = "translation-status.json";

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStatus {
    pub translated: Vec<String>,
    pub untranslated: Vec<String>,
}

impl TranslationStatus {
    pub fn add(&mut self, output: &Path, fully_translated: bool) {
        let path = output.to_string_lossy().replace('\\', "/");
        if fully_translated {
            self.translated.push(path);
        } else {
            self.untranslated.push(path);
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        io::write_file(path, &json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!(
            "{} translated, {} untranslated files listed in {}",
            self.translated.len(),
            self.untranslated.len(),
            path.display()
        );
        Ok(())
    }
}
