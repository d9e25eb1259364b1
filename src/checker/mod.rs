pub mod dictionary;
pub mod disambiguator;
pub mod suggestions;
pub mod tokenizer;

use crate::config::Config;
use crate::error::CollaboratorError;
use crate::language::{LanguageEntry, LanguageId};
use dashmap::DashMap;
use dictionary::Dictionary;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub use disambiguator::{Disambiguator, FoundMisspelling, MIN_FOREIGN_WORD_SEQUENCE};

/// A misspelled range reported by a [`SpellingOracle`], relative to the text
/// it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorRange {
    pub index: usize,
    pub length: usize,
}

impl ErrorRange {
    pub fn end(&self) -> usize {
        self.index + self.length
    }
}

/// Per-language spelling judgement.
///
/// Implementations must be deterministic for a fixed `(text, language)` pair
/// for at least the duration of one analysis pass.
pub trait SpellingOracle: Send + Sync {
    /// First misspelling in `text` starting at or after byte `from`.
    fn next_error(
        &self,
        text: &str,
        from: usize,
        language: &LanguageId,
    ) -> Result<Option<ErrorRange>, CollaboratorError>;

    /// Replacement candidates for a misspelled `word`, best first.
    fn suggestions(&self, word: &str, language: &LanguageId)
        -> Result<Vec<String>, CollaboratorError>;
}

/// Words the user asked not to be flagged.
pub trait IgnoreList: Send + Sync {
    fn should_ignore(&self, word: &str) -> Result<bool, CollaboratorError>;
}

/// Ignores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIgnoreList;

impl IgnoreList for NoIgnoreList {
    fn should_ignore(&self, _word: &str) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
}

/// Shared `next_error` logic for word-lookup oracles. A known stem with a
/// possessive `'s` counts as known; an unknown one is reported without the
/// suffix.
fn find_next_error<F>(text: &str, from: usize, mut is_known: F) -> Result<Option<ErrorRange>, CollaboratorError>
where
    F: FnMut(&str) -> Result<bool, CollaboratorError>,
{
    for word in tokenizer::dictionary_words(text, from) {
        let candidate = &text[word.start..word.end];
        if is_known(candidate)? {
            continue;
        }

        if let Some(stem) = tokenizer::strip_possessive(candidate) {
            if is_known(stem)? {
                continue;
            }
            return Ok(Some(ErrorRange {
                index: word.start,
                length: stem.len(),
            }));
        }

        return Ok(Some(ErrorRange {
            index: word.start,
            length: word.len(),
        }));
    }

    Ok(None)
}

/// In-memory oracle over plain word sets, one per language.
///
/// Lookups are exact first, then lowercase. Asking about a language with no
/// word set is a collaborator failure.
#[derive(Debug, Clone)]
pub struct WordListOracle {
    words: HashMap<LanguageId, HashSet<String>>,
    max_suggestions: usize,
}

impl WordListOracle {
    pub fn new() -> Self {
        Self {
            words: HashMap::new(),
            max_suggestions: 5,
        }
    }

    pub fn with_words<I, S>(mut self, language: impl Into<LanguageId>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .entry(language.into())
            .or_default()
            .extend(words.into_iter().map(|w| w.as_ref().to_string()));
        self
    }

    fn word_set(&self, language: &LanguageId) -> Result<&HashSet<String>, CollaboratorError> {
        self.words
            .get(language)
            .ok_or_else(|| CollaboratorError::oracle(language, "no word list for language"))
    }
}

impl Default for WordListOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellingOracle for WordListOracle {
    fn next_error(
        &self,
        text: &str,
        from: usize,
        language: &LanguageId,
    ) -> Result<Option<ErrorRange>, CollaboratorError> {
        let set = self.word_set(language)?;
        find_next_error(text, from, |w| {
            Ok(set.contains(w) || set.contains(&w.to_lowercase()))
        })
    }

    fn suggestions(
        &self,
        word: &str,
        language: &LanguageId,
    ) -> Result<Vec<String>, CollaboratorError> {
        let set = self.word_set(language)?;
        let mut candidates: Vec<&str> = set.iter().map(String::as_str).collect();
        candidates.sort_unstable();
        Ok(suggestions::rank_candidates(
            word,
            candidates,
            self.max_suggestions,
        ))
    }
}

/// A language's standard dictionary plus its custom dictionaries.
pub struct LanguageDictionary {
    main: Dictionary,
    custom: Vec<Dictionary>,
}

impl LanguageDictionary {
    pub fn new(main: Dictionary) -> Self {
        Self {
            main,
            custom: Vec::new(),
        }
    }

    pub fn with_custom(mut self, dictionary: Dictionary) -> Self {
        self.custom.push(dictionary);
        self
    }

    pub fn contains(&self, word: &str) -> bool {
        self.main.contains_any_case(word) || self.custom.iter().any(|d| d.contains_any_case(word))
    }
}

/// Oracle backed by FST dictionaries.
///
/// Each language's dictionaries are loaded on first use and the handle is
/// reused by every later pass. A failed load is reported as a collaborator
/// failure and retried on the next request.
pub struct DictionaryOracle {
    entries: HashMap<LanguageId, LanguageEntry>,
    custom_dir: Option<PathBuf>,
    handles: DashMap<LanguageId, Arc<LanguageDictionary>>,
    max_suggestions: usize,
}

impl DictionaryOracle {
    pub fn new(max_suggestions: usize) -> Self {
        Self {
            entries: HashMap::new(),
            custom_dir: None,
            handles: DashMap::new(),
            max_suggestions,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut oracle = Self::new(config.max_suggestions);
        oracle.custom_dir = Config::config_dir();
        oracle.entries = config
            .languages
            .iter()
            .map(|entry| (entry.id.clone(), entry.clone()))
            .collect();
        oracle
    }

    /// Pre-installs the dictionaries for `language`, bypassing lazy loading.
    pub fn with_dictionary(self, language: impl Into<LanguageId>, dictionary: LanguageDictionary) -> Self {
        self.handles.insert(language.into(), Arc::new(dictionary));
        self
    }

    /// Loads the dictionaries for `language` now rather than on first use.
    pub fn preload(&self, language: &LanguageId) -> Result<(), CollaboratorError> {
        self.handle(language).map(|_| ())
    }

    fn handle(&self, language: &LanguageId) -> Result<Arc<LanguageDictionary>, CollaboratorError> {
        if let Some(handle) = self.handles.get(language) {
            return Ok(Arc::clone(handle.value()));
        }

        let loaded = Arc::new(
            self.load(language)
                .map_err(|e| CollaboratorError::oracle(language, e))?,
        );
        debug!(%language, "dictionary handle loaded");

        Ok(Arc::clone(
            self.handles
                .entry(language.clone())
                .or_insert(loaded)
                .value(),
        ))
    }

    fn load(&self, language: &LanguageId) -> anyhow::Result<LanguageDictionary> {
        let mut dictionary = LanguageDictionary::new(Dictionary::load(language.as_str())?);

        let refs = self
            .entries
            .get(language)
            .map(|e| e.dictionaries.as_slice())
            .unwrap_or_default();
        for name in refs {
            let path = match &self.custom_dir {
                Some(dir) => dir.join(name),
                None => PathBuf::from(name),
            };
            dictionary = dictionary.with_custom(Dictionary::load_custom(&path)?);
        }

        Ok(dictionary)
    }
}

impl SpellingOracle for DictionaryOracle {
    fn next_error(
        &self,
        text: &str,
        from: usize,
        language: &LanguageId,
    ) -> Result<Option<ErrorRange>, CollaboratorError> {
        let handle = self.handle(language)?;
        find_next_error(text, from, |w| Ok(handle.contains(w)))
    }

    fn suggestions(
        &self,
        word: &str,
        language: &LanguageId,
    ) -> Result<Vec<String>, CollaboratorError> {
        let handle = self.handle(language)?;
        let mut found = suggestions::generate(word, &handle.main, self.max_suggestions);
        for custom in &handle.custom {
            if found.len() >= self.max_suggestions {
                break;
            }
            for s in suggestions::generate(word, custom, self.max_suggestions - found.len()) {
                if !found.contains(&s) {
                    found.push(s);
                }
            }
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> LanguageId {
        LanguageId::new("en")
    }

    #[test]
    fn test_word_list_oracle_finds_errors_in_order() {
        let oracle = WordListOracle::new().with_words("en", ["this", "is", "a"]);
        let text = "Thiss is a tst";
        let first = oracle.next_error(text, 0, &en()).unwrap().unwrap();
        assert_eq!(first, ErrorRange { index: 0, length: 5 });
        let second = oracle.next_error(text, first.end(), &en()).unwrap().unwrap();
        assert_eq!(&text[second.index..second.end()], "tst");
        assert!(oracle.next_error(text, second.end(), &en()).unwrap().is_none());
    }

    #[test]
    fn test_possessive_of_known_word_is_accepted() {
        let oracle = WordListOracle::new().with_words("en", ["john"]);
        assert!(oracle.next_error("John's", 0, &en()).unwrap().is_none());
        let err = oracle.next_error("Johnn's", 0, &en()).unwrap().unwrap();
        assert_eq!(err.length, 5);
    }

    #[test]
    fn test_unknown_language_is_a_failure() {
        let oracle = WordListOracle::new().with_words("en", ["word"]);
        let err = oracle.next_error("word", 0, &LanguageId::new("xx")).unwrap_err();
        assert!(matches!(err, CollaboratorError::Oracle { .. }));
    }

    #[test]
    fn test_dictionary_oracle_with_custom_words() {
        let oracle = DictionaryOracle::new(3).with_dictionary(
            "en",
            LanguageDictionary::new(Dictionary::from_words(["the", "court", "found"]).unwrap())
                .with_custom(Dictionary::from_words(["estoppel"]).unwrap()),
        );
        let text = "The court found estoppel and lachs";
        let err = oracle.next_error(text, 0, &en()).unwrap().unwrap();
        assert_eq!(&text[err.index..err.end()], "and");
        let suggestions = oracle.suggestions("cort", &en()).unwrap();
        assert_eq!(suggestions.first().map(String::as_str), Some("court"));
    }
}
