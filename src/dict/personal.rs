use crate::checker::dictionary::parse_word_list;
use crate::checker::IgnoreList;
use crate::config::Config;
use crate::error::CollaboratorError;
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use regex::Regex;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Raised whenever the set of ignored words changes.
///
/// `word: None` means anything may have changed and everything should be
/// re-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEvent {
    pub word: Option<String>,
}

/// The user's own words and ignore patterns.
///
/// Words added with [`add_word`](Self::add_word) are appended to the backing
/// file; words passed to [`ignore_word`](Self::ignore_word) last only as
/// long as this value.
pub struct PersonalDictionary {
    path: Option<PathBuf>,
    patterns: Vec<Regex>,
    words: RwLock<HashSet<String>>,
    session: RwLock<HashSet<String>>,
    subscribers: Mutex<Vec<Sender<DictionaryEvent>>>,
}

impl PersonalDictionary {
    /// An in-memory dictionary. Invalid patterns are skipped with a warning.
    pub fn new(patterns: &[String]) -> Self {
        let mut compiled = Vec::new();
        for pattern in patterns {
            match Regex::new(pattern) {
                Ok(re) => compiled.push(re),
                Err(e) => warn!(pattern = %pattern, error = %e, "invalid ignore pattern"),
            }
        }

        Self {
            path: None,
            patterns: compiled,
            words: RwLock::new(HashSet::new()),
            session: RwLock::new(HashSet::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Backed by the word file at `path`, which need not exist yet.
    pub fn open(path: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let mut dictionary = Self::new(patterns);
        let path = path.into();
        *dictionary.words.get_mut() = read_words(&path)?;
        dictionary.path = Some(path);
        Ok(dictionary)
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.personal_dictionary {
            Some(path) => Self::open(path, &config.ignore_patterns),
            None => Ok(Self::new(&config.ignore_patterns)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn contains(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        let known = |set: &HashSet<String>| set.contains(word) || set.contains(&lower);
        known(&self.words.read()) || known(&self.session.read())
    }

    /// Persisted words, sorted.
    pub fn words(&self) -> Vec<String> {
        let mut words: Vec<String> = self.words.read().iter().cloned().collect();
        words.sort();
        words
    }

    /// Adds `word` for good, appending it to the backing file.
    pub fn add_word(&self, word: &str) -> Result<()> {
        let word = word.trim();
        if word.is_empty() || self.words.read().contains(word) {
            return Ok(());
        }

        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .context("Failed to create personal dictionary directory")?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open personal dictionary: {}", path.display()))?;
            writeln!(file, "{}", word).context("Failed to write personal dictionary")?;
        }

        self.words.write().insert(word.to_string());
        debug!(word, "added to personal dictionary");
        self.notify(Some(word.to_string()));
        Ok(())
    }

    /// Ignores `word` until this dictionary is dropped.
    pub fn ignore_word(&self, word: &str) {
        if self.session.write().insert(word.to_string()) {
            self.notify(Some(word.to_string()));
        }
    }

    /// Re-reads the backing file.
    pub fn reload(&self) -> Result<()> {
        if let Some(path) = &self.path {
            *self.words.write() = read_words(path)?;
        }
        self.notify(None);
        Ok(())
    }

    /// Receives every later change. Dropped receivers are pruned on the next
    /// change.
    pub fn subscribe(&self) -> Receiver<DictionaryEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    fn notify(&self, word: Option<String>) {
        let event = DictionaryEvent { word };
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl IgnoreList for PersonalDictionary {
    fn should_ignore(&self, word: &str) -> Result<bool, CollaboratorError> {
        Ok(self.contains(word) || self.patterns.iter().any(|p| p.is_match(word)))
    }
}

fn read_words(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read personal dictionary: {}", path.display()))?;
    Ok(parse_word_list(&content).into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_words_persist_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("personal.txt");

        let dict = PersonalDictionary::open(&path, &[]).unwrap();
        dict.add_word("Kubernetes").unwrap();
        dict.add_word("Kubernetes").unwrap();
        assert!(dict.should_ignore("Kubernetes").unwrap());

        let reopened = PersonalDictionary::open(&path, &[]).unwrap();
        assert_eq!(reopened.words(), vec!["Kubernetes"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "Kubernetes\n");
    }

    #[test]
    fn test_lowercase_entries_match_any_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("personal.txt");
        fs::write(&path, "# mine\nrustacean\n").unwrap();

        let dict = PersonalDictionary::open(&path, &[]).unwrap();
        assert!(dict.contains("Rustacean"));
        assert!(!dict.contains("crab"));
    }

    #[test]
    fn test_patterns_and_session_words() {
        let dict = PersonalDictionary::new(&["^TODO".to_string(), "(".to_string()]);
        assert!(dict.should_ignore("TODOs").unwrap());
        assert!(!dict.should_ignore("teh").unwrap());

        dict.ignore_word("teh");
        assert!(dict.should_ignore("teh").unwrap());
        assert!(dict.words().is_empty());
    }

    #[test]
    fn test_changes_are_broadcast() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("personal.txt");
        let dict = PersonalDictionary::open(&path, &[]).unwrap();
        let rx = dict.subscribe();

        dict.add_word("livespell").unwrap();
        dict.ignore_word("grepable");
        fs::write(&path, "other\n").unwrap();
        dict.reload().unwrap();

        let events: Vec<DictionaryEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                DictionaryEvent { word: Some("livespell".into()) },
                DictionaryEvent { word: Some("grepable".into()) },
                DictionaryEvent { word: None },
            ]
        );
        assert!(dict.contains("other"));
        assert!(!dict.contains("livespell"));
    }
}
