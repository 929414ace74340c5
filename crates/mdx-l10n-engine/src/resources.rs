//! Translation units and the translation set they are looked up in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Datatype of units taken from the document body.
pub const MDX_DATATYPE: &str = "mdx";

/// A string found in a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub key: String,
    pub index: usize,
    pub datatype: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    New,
    Translated,
}

/// One entry of a translation set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub project: String,
    pub key: String,
    pub source_locale: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub datatype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub state: ResourceState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub index: usize,
}

impl Resource {
    /// Source-only resource for `unit`.
    pub fn from_unit(
        unit: &TranslationUnit,
        project: &str,
        source_locale: &str,
        path: &str,
    ) -> Self {
        Self {
            project: project.to_string(),
            key: unit.key.clone(),
            source_locale: source_locale.to_string(),
            source: unit.source.clone(),
            target_locale: None,
            target: None,
            datatype: unit.datatype.clone(),
            path: Some(path.to_string()),
            state: ResourceState::New,
            comment: unit.comment.clone(),
            index: unit.index,
        }
    }

    /// Placeholder resource for a missing translation: the target is the
    /// source, marked new.
    pub fn untranslated(
        unit: &TranslationUnit,
        project: &str,
        source_locale: &str,
        path: &str,
        locale: &str,
    ) -> Self {
        Self {
            target_locale: Some(locale.to_string()),
            target: Some(unit.source.clone()),
            ..Self::from_unit(unit, project, source_locale, path)
        }
    }

    /// Lookup key: `<project>_<locale>_<key>_<datatype>`.
    pub fn hash_key(&self) -> String {
        set_key(
            &self.project,
            self.target_locale.as_deref().unwrap_or(&self.source_locale),
            &self.key,
            &self.datatype,
        )
    }
}

fn set_key(project: &str, locale: &str, key: &str, datatype: &str) -> String {
    format!("{project}_{locale}_{key}_{datatype}")
}

/// Translations indexed for lookup by project, locale, key and datatype.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationSet {
    resources: BTreeMap<String, Resource>,
}

impl TranslationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a resource.
    pub fn insert(&mut self, resource: Resource) {
        self.resources.insert(resource.hash_key(), resource);
    }

    pub fn get(&self, project: &str, locale: &str, key: &str, datatype: &str) -> Option<&Resource> {
        self.resources.get(&set_key(project, locale, key, datatype))
    }

    /// Non-empty target text for a key, if translated.
    pub fn lookup(&self, project: &str, locale: &str, key: &str, datatype: &str) -> Option<&str> {
        self.get(project, locale, key, datatype)
            .and_then(|r| r.target.as_deref())
            .filter(|target| !target.is_empty())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Read a JSON array of resources.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let resources: Vec<Resource> = serde_json::from_str(json)?;
        Ok(resources.into_iter().collect())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.iter().collect::<Vec<_>>())
    }
}

impl FromIterator<Resource> for TranslationSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        let mut set = Self::new();
        for resource in iter {
            set.insert(resource);
        }
        set
    }
}

impl Extend<Resource> for TranslationSet {
    fn extend<I: IntoIterator<Item = Resource>>(&mut self, iter: I) {
        for resource in iter {
            self.insert(resource);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit() -> TranslationUnit {
        TranslationUnit {
            source: "Hello <c0>world</c0>.".to_string(),
            comment: None,
            key: "r443773438".to_string(),
            index: 0,
            datatype: MDX_DATATYPE.to_string(),
        }
    }

    fn translated(target: &str) -> Resource {
        Resource {
            project: "docs".to_string(),
            target_locale: Some("fr-FR".to_string()),
            target: Some(target.to_string()),
            state: ResourceState::Translated,
            ..Resource::from_unit(&unit(), "docs", "en-US", "intro.mdx")
        }
    }

    #[test]
    fn lookup_uses_project_locale_key_and_datatype() {
        let set: TranslationSet = [translated("Bonjour <c0>monde</c0>.")].into_iter().collect();

        assert_eq!(
            set.lookup("docs", "fr-FR", "r443773438", "mdx"),
            Some("Bonjour <c0>monde</c0>.")
        );
        assert_eq!(set.lookup("docs", "de-DE", "r443773438", "mdx"), None);
        assert_eq!(set.lookup("docs", "fr-FR", "r443773438", "x-yaml"), None);
        assert_eq!(set.lookup("blog", "fr-FR", "r443773438", "mdx"), None);
    }

    #[test]
    fn empty_target_counts_as_missing() {
        let set: TranslationSet = [translated("")].into_iter().collect();

        assert!(set.get("docs", "fr-FR", "r443773438", "mdx").is_some());
        assert_eq!(set.lookup("docs", "fr-FR", "r443773438", "mdx"), None);
    }

    #[test]
    fn untranslated_resource_copies_the_source() {
        let resource = Resource::untranslated(&unit(), "docs", "en-US", "intro.mdx", "fr-FR");

        assert_eq!(resource.target.as_deref(), Some("Hello <c0>world</c0>."));
        assert_eq!(resource.state, ResourceState::New);
        assert_eq!(resource.hash_key(), "docs_fr-FR_r443773438_mdx");
    }

    #[test]
    fn json_round_trip_keeps_resources() {
        let set: TranslationSet = [translated("Bonjour <c0>monde</c0>.")].into_iter().collect();

        let json = set.to_json().unwrap();
        let back = TranslationSet::from_json(&json).unwrap();

        assert!(json.contains("\"targetLocale\": \"fr-FR\""));
        assert!(json.contains("\"state\": \"translated\""));
        assert_eq!(back, set);
    }
}
