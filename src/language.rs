//! Language identifiers and the per-pass language configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A natural-language identifier such as `en_US` or `fr`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageId(Arc<str>);

impl LanguageId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for LanguageId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

/// One configured language: its identifier, whether it is enabled, and any
/// custom dictionaries layered on top of the standard one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub id: LanguageId,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub dictionaries: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl LanguageEntry {
    pub fn new(id: impl Into<LanguageId>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            dictionaries: Vec::new(),
        }
    }
}

/// Parses one entry of the compact syntax: `[#]lang{:dictionary}`.
impl FromStr for LanguageEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split(':').map(str::trim);
        let head = tokens.next().unwrap_or_default();
        let (enabled, id) = match head.strip_prefix('#') {
            Some(rest) => (false, rest.trim()),
            None => (true, head),
        };

        if id.is_empty() {
            return Err(format!("Missing language identifier in '{}'", s));
        }

        Ok(Self {
            id: LanguageId::new(id),
            enabled,
            dictionaries: tokens.filter(|t| !t.is_empty()).map(String::from).collect(),
        })
    }
}

impl fmt::Display for LanguageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.enabled {
            f.write_str("#")?;
        }
        f.write_str(self.id.as_str())?;
        for dict in &self.dictionaries {
            write!(f, ":{}", dict)?;
        }
        Ok(())
    }
}

/// Parses the compact language list, e.g. `en_US;#de_DE;fr_FR:legal.txt`.
/// Entries may be separated by `;` or `,`.
pub fn parse_language_list(s: &str) -> Result<Vec<LanguageEntry>, String> {
    s.split([';', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(LanguageEntry::from_str)
        .collect()
}

pub fn format_language_list(entries: &[LanguageEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

/// The enabled languages for one analysis pass, in priority order. The first
/// one is the primary language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    entries: Vec<LanguageEntry>,
}

impl LanguageConfig {
    /// Keeps only enabled entries, in order.
    pub fn new(entries: impl IntoIterator<Item = LanguageEntry>) -> Self {
        Self {
            entries: entries.into_iter().filter(|e| e.enabled).collect(),
        }
    }

    pub fn single(id: impl Into<LanguageId>) -> Self {
        Self::new([LanguageEntry::new(id)])
    }

    pub fn of(ids: &[&str]) -> Self {
        Self::new(ids.iter().map(|id| LanguageEntry::new(*id)))
    }

    pub fn primary(&self) -> Option<&LanguageId> {
        self.entries.first().map(|e| &e.id)
    }

    pub fn ids(&self) -> Vec<LanguageId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read-only source of the language configuration, consulted once per pass.
pub trait LanguageConfigProvider: Send + Sync {
    fn language_config(&self) -> LanguageConfig;
}

impl LanguageConfigProvider for LanguageConfig {
    fn language_config(&self) -> LanguageConfig {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_list() {
        let entries = parse_language_list("en_US;#de_DE, fr_FR:legal.txt:names.dict").unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].enabled);
        assert!(!entries[1].enabled);
        assert_eq!(entries[1].id.as_str(), "de_DE");
        assert_eq!(entries[2].dictionaries, vec!["legal.txt", "names.dict"]);
    }

    #[test]
    fn test_compact_list_round_trip() {
        let text = "en_US;#de_DE;fr_FR:legal.txt";
        let entries = parse_language_list(text).unwrap();
        assert_eq!(format_language_list(&entries), text);
    }

    #[test]
    fn test_missing_identifier_is_rejected() {
        assert!(parse_language_list("en_US;#:dict.txt").is_err());
    }

    #[test]
    fn test_language_id_serializes_as_plain_string() {
        let id = LanguageId::new("pt_BR");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pt_BR\"");
        let back: LanguageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_language_config_keeps_enabled_in_order() {
        let entries = parse_language_list("#de_DE;fr_FR;en_US").unwrap();
        let config = LanguageConfig::new(entries);
        assert_eq!(config.primary().map(LanguageId::as_str), Some("fr_FR"));
        assert_eq!(config.len(), 2);
    }
}
