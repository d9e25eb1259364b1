use anyhow::{Context, Result};
use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// An immutable word set backed by an FST.
pub struct Dictionary {
    set: Set<Vec<u8>>,
}

impl Dictionary {
    /// Load the standard dictionary for `language` from the data directory,
    /// falling back to the small built-in word list when none is installed.
    pub fn load(language: &str) -> Result<Self> {
        let dict_path = Self::get_dictionary_path(language)?;

        if !dict_path.exists() {
            warn!(
                language,
                path = %dict_path.display(),
                "no dictionary installed, using the built-in word list"
            );
            return Self::from_words(Self::get_basic_wordlist(language));
        }

        Self::load_from_path(&dict_path)
    }

    /// Load dictionary from a specific path (useful for testing)
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dictionary: {}", path.display()))?;

        let reader = BufReader::new(file);
        let set = Set::new(reader.bytes().collect::<Result<Vec<_>, _>>()?)
            .context("Failed to parse dictionary")?;

        debug!(path = %path.display(), words = set.len(), "loaded dictionary");
        Ok(Self { set })
    }

    /// Load a custom dictionary: an FST `.dict` file or a plain word list.
    pub fn load_custom(path: &Path) -> Result<Self> {
        if path.extension().and_then(|e| e.to_str()) == Some("dict") {
            return Self::load_from_path(path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list: {}", path.display()))?;
        Self::from_words(parse_word_list(&content))
    }

    /// Build an in-memory dictionary.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut sorted: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        sorted.sort();
        sorted.dedup();

        let set = Set::from_iter(sorted.iter()).context("Failed to build dictionary")?;
        Ok(Self { set })
    }

    /// Check if word exists in dictionary
    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    /// Exact match first, then the lowercase form.
    pub fn contains_any_case(&self, word: &str) -> bool {
        self.contains(word) || self.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Get all words with a given prefix
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut stream = self
            .set
            .search(fst::automaton::Str::new(prefix).starts_with())
            .into_stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                results.push(word);
            }
        }

        results
    }

    /// Words whose length is within one character of `len`, capped at `limit`.
    pub fn words_near_length(&self, len: usize, limit: usize) -> Vec<String> {
        let mut words = Vec::new();
        let mut stream = self.set.stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = std::str::from_utf8(key) {
                if word.chars().count().abs_diff(len) <= 1 {
                    words.push(word.to_string());
                    if words.len() >= limit {
                        break;
                    }
                }
            }
        }

        words
    }

    /// Build dictionary from word list
    pub fn build_from_words(words: &[String], output_path: &Path) -> Result<()> {
        let mut sorted_words = words.to_vec();
        sorted_words.sort();
        sorted_words.dedup();

        let file = File::create(output_path)
            .with_context(|| format!("Failed to create dictionary: {}", output_path.display()))?;

        let writer = BufWriter::new(file);
        let mut builder = SetBuilder::new(writer).context("Failed to create FST builder")?;

        for word in sorted_words {
            builder
                .insert(word.as_bytes())
                .context("Failed to insert word into dictionary")?;
        }

        builder.finish().context("Failed to finalize dictionary")?;

        Ok(())
    }

    pub fn get_dictionary_path(language: &str) -> Result<PathBuf> {
        let data_dir = crate::config::Config::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join(format!("{}.dict", language)))
    }

    fn get_basic_wordlist(language: &str) -> Vec<&'static str> {
        match language.split(['_', '-']).next().unwrap_or_default() {
            "en" => vec![
                "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for",
                "not", "on", "with", "he", "as", "you", "do", "at", "this", "but", "his", "by",
                "from", "they", "we", "say", "her", "she", "or", "an", "will", "my", "one",
                "all", "would", "there", "their", "what", "so", "up", "out", "if", "about",
                "who", "get", "which", "go", "me", "when", "make", "can", "like", "time", "no",
                "just", "him", "know", "take", "people", "into", "year", "your", "good", "some",
                "could", "them", "see", "other", "than", "then", "now", "look", "only", "come",
                "its", "over", "think", "also", "back", "after", "use", "two", "how", "our",
                "work", "first", "well", "way", "even", "new", "want", "because", "any",
                "these", "give", "day", "most", "us", "is", "are", "was", "were", "today",
                "function", "class", "method", "variable", "string", "integer", "boolean",
                "array", "list", "dictionary", "object", "parameter", "return", "import",
                "export", "async", "await", "promise", "callback", "error", "exception", "test",
                "debug", "compile", "build", "deploy", "version", "configuration",
            ],
            "fr" => vec![
                "le", "la", "les", "un", "une", "des", "et", "est", "je", "tu", "il", "elle",
                "nous", "vous", "ils", "suis", "es", "sommes", "pas", "de", "du", "en", "que",
                "qui", "dans", "pour", "avec", "sur", "bien", "très", "fatigué", "bonjour",
                "merci", "aujourd'hui", "oui", "non",
            ],
            "de" => vec![
                "der", "die", "das", "und", "ist", "ich", "du", "er", "sie", "es", "wir", "ihr",
                "nicht", "ein", "eine", "mit", "von", "zu", "auf", "für", "gut", "heute", "danke",
            ],
            "es" => vec![
                "el", "la", "los", "las", "un", "una", "y", "es", "yo", "tú", "él", "ella",
                "nosotros", "no", "de", "en", "que", "con", "por", "para", "bien", "hoy",
                "gracias",
            ],
            _ => Vec::new(),
        }
    }
}

/// Words from a plain list: one per line, `#` comments, NetSpell/ISpell
/// affix flags after `/` stripped.
pub fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split('/').next())
        .map(|word| word.trim().to_string())
        .filter(|word| !word.is_empty())
        .collect()
}
