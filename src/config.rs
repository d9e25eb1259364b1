use crate::language::{parse_language_list, LanguageConfig, LanguageConfigProvider, LanguageEntry};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Language list used when nothing is configured.
pub const DEFAULT_LANGUAGES: &str = "en_US;#de_DE;#fr_FR;#es_ES";

/// Name of the per-project configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".livespell.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub personal_dictionary: Option<PathBuf>,

    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Quiet period before a pass starts, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Configured languages in priority order, enabled or not.
    #[serde(default = "default_languages")]
    pub languages: Vec<LanguageEntry>,
}

fn default_languages() -> Vec<LanguageEntry> {
    parse_language_list(DEFAULT_LANGUAGES).unwrap_or_default()
}

fn default_max_suggestions() -> usize {
    5
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            personal_dictionary: None,
            ignore_patterns: vec![
                r"https?://\S+".to_string(),         // URLs
                r"^[a-fA-F0-9]{32,}$".to_string(),   // Hashes
            ],
            max_suggestions: default_max_suggestions(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Config {
    /// Load configuration with priority: CLI args > local config > global config > defaults
    ///
    /// `languages` is the compact language list (`en_US;#de_DE:legal.txt`).
    pub fn load(
        languages: Option<&str>,
        personal_dict: Option<PathBuf>,
        cli_patterns: Vec<String>,
    ) -> Result<Self> {
        let mut config = Self::default();

        // Load global config
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        // Load local config (overrides global)
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            let local_config = Self::from_file(&local_path)?;
            config = config.merge(local_config);
        }

        // Apply CLI overrides
        if let Some(list) = languages {
            config.languages = parse_language_list(list)
                .map_err(anyhow::Error::msg)
                .context("Invalid language list")?;
        }
        if let Some(dict) = personal_dict {
            config.personal_dictionary = Some(dict);
        }
        if !cli_patterns.is_empty() {
            config.ignore_patterns.extend(cli_patterns);
        }

        // Set default personal dictionary if not specified
        if config.personal_dictionary.is_none() {
            config.personal_dictionary = Self::default_personal_dict_path();
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        // other's values override self's if they differ from defaults
        if other.languages != default_languages() {
            self.languages = other.languages;
        }
        if other.personal_dictionary.is_some() {
            self.personal_dictionary = other.personal_dictionary;
        }
        if !other.ignore_patterns.is_empty() {
            self.ignore_patterns = other.ignore_patterns;
        }
        if other.max_suggestions != default_max_suggestions() {
            self.max_suggestions = other.max_suggestions;
        }
        if other.debounce_ms != default_debounce_ms() {
            self.debounce_ms = other.debounce_ms;
        }
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "livespell")
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn default_personal_dict_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("personal.txt"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }
}

impl LanguageConfigProvider for Config {
    fn language_config(&self) -> LanguageConfig {
        LanguageConfig::new(self.languages.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageId;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.languages.len(), 4);
        assert_eq!(config.max_suggestions, 5);
        assert_eq!(config.debounce(), Duration::from_millis(500));

        let languages = config.language_config();
        assert_eq!(languages.len(), 1);
        assert_eq!(languages.primary().map(LanguageId::as_str), Some("en_US"));
    }

    #[test]
    fn test_merge_configs() {
        let base = Config::default();
        let override_config = Config {
            languages: parse_language_list("fr_FR;en_US").unwrap(),
            debounce_ms: 50,
            ..Default::default()
        };

        let merged = base.merge(override_config);
        assert_eq!(merged.languages[0].id.as_str(), "fr_FR");
        assert_eq!(merged.debounce_ms, 50);
        assert_eq!(merged.max_suggestions, 5);
    }

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            languages: parse_language_list("en_US:legal.txt;#de_DE").unwrap(),
            max_suggestions: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[languages]]\nid = \"fr_FR\"\n\n[[languages]]\nid = \"de_DE\"\nenabled = false\n",
        )
        .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.max_suggestions, 5);
        assert_eq!(loaded.debounce_ms, 500);
        assert_eq!(loaded.language_config().len(), 1);
    }
}
