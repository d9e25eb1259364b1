//! Multi-language sentence disambiguation.
//!
//! Each sentence is walked word by word with a sticky current language. A
//! word the current language rejects is probed against the other configured
//! languages; the first one that accepts it becomes current. The resulting
//! language runs are then scored, and short foreign runs are re-checked
//! against the sentence's dominant language.

use super::tokenizer::{is_probably_real_word, possessive_suffix_len, segment};
use super::{ErrorRange, IgnoreList, SpellingOracle};
use crate::document::Span;
use crate::error::CollaboratorError;
use crate::language::LanguageId;
use lazy_static::lazy_static;
use regex::{Matches, Regex};
use std::collections::VecDeque;
use tracing::trace;

/// Minimum number of words a foreign run needs before its own spelling
/// results are trusted over the sentence's dominant language.
pub const MIN_FOREIGN_WORD_SEQUENCE: usize = 3;

lazy_static! {
    // punctuation followed by whitespace, optionally through closing quotes
    // or brackets; a closing quote before whitespace; whitespace before an
    // opening quote
    static ref SENTENCE_BREAK: Regex =
        Regex::new(r#"[.,;:?!]["'”’»)\]]*\s+|["”»]\s+|\s+["“«]"#).unwrap();
}

/// A misspelling found in checked text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundMisspelling {
    /// Byte range in the coordinates of the caller (relative text offset
    /// plus the base offset passed to [`Disambiguator::misspellings`]).
    pub span: Span,
    pub word: String,
    pub language: LanguageId,
    pub suggestions: Vec<String>,
}

/// A run of words within one sentence checked under the same language.
#[derive(Debug, Clone)]
struct LanguageSpan {
    start: usize,
    end: usize,
    language: usize,
    words: usize,
    /// Error ranges relative to the sentence.
    errors: Vec<Span>,
}

/// Per-sentence state threaded through the word loop.
#[derive(Debug)]
struct SentenceState {
    current: usize,
    spans: Vec<LanguageSpan>,
}

impl SentenceState {
    fn new() -> Self {
        Self {
            current: 0,
            spans: Vec::new(),
        }
    }

    fn push_word(&mut self, word: Span, errors: Vec<Span>) {
        match self.spans.last_mut() {
            Some(last) if last.language == self.current => {
                last.end = word.end;
                last.words += 1;
                last.errors.extend(errors);
            }
            _ => self.spans.push(LanguageSpan {
                start: word.start,
                end: word.end,
                language: self.current,
                words: 1,
                errors,
            }),
        }
    }

    /// Language with the largest summed `length + 1` over error-free spans.
    /// The first language to reach the maximum wins ties.
    fn best_language(&self) -> Option<usize> {
        let mut scores: Vec<(usize, usize)> = Vec::new();
        for span in self.spans.iter().filter(|s| s.errors.is_empty()) {
            let score = span.end - span.start + 1;
            match scores.iter_mut().find(|(lang, _)| *lang == span.language) {
                Some(entry) => entry.1 += score,
                None => scores.push((span.language, score)),
            }
        }

        let mut best: Option<(usize, usize)> = None;
        for (lang, score) in scores {
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((lang, score));
            }
        }
        best.map(|(lang, _)| lang)
    }
}

/// An error range within a sentence and the language it is reported in.
#[derive(Debug, Clone, Copy)]
struct SentenceError {
    range: Span,
    language: usize,
}

/// Checks text against an ordered set of languages.
///
/// The first language is the primary one. Checking is reentrant: all
/// per-sentence state lives in the iterator returned by
/// [`misspellings`](Self::misspellings).
pub struct Disambiguator<'a> {
    languages: &'a [LanguageId],
    oracle: &'a dyn SpellingOracle,
    ignore: &'a dyn IgnoreList,
}

impl<'a> Disambiguator<'a> {
    pub fn new(
        languages: &'a [LanguageId],
        oracle: &'a dyn SpellingOracle,
        ignore: &'a dyn IgnoreList,
    ) -> Self {
        Self {
            languages,
            oracle,
            ignore,
        }
    }

    /// Lazily checks `text` one sentence at a time. Reported spans are
    /// shifted by `base`.
    ///
    /// A collaborator failure is yielded in place of the failing sentence's
    /// results; iteration may continue with the next sentence.
    pub fn misspellings<'t>(&'t self, text: &'t str, base: usize) -> Misspellings<'a, 't> {
        Misspellings {
            disambiguator: self,
            text,
            base,
            breaks: SENTENCE_BREAK.find_iter(text),
            cursor: if self.languages.is_empty() {
                None
            } else {
                Some(0)
            },
            pending: VecDeque::new(),
        }
    }

    fn check_sentence(&self, sentence: &str) -> Result<Vec<SentenceError>, CollaboratorError> {
        let mut state = SentenceState::new();

        for word in segment(sentence) {
            let word_text = &sentence[word.start..word.end];
            if !is_probably_real_word(word_text) {
                continue;
            }
            let errors = self
                .check_word(&mut state, word_text)?
                .into_iter()
                .map(|e| e.shift(word.start))
                .collect();
            state.push_word(word, errors);
        }

        if self.languages.len() == 1 {
            return Ok(state
                .spans
                .iter()
                .flat_map(|s| s.errors.iter())
                .map(|&range| SentenceError { range, language: 0 })
                .collect());
        }

        let best = state.best_language().unwrap_or(0);
        trace!(
            spans = state.spans.len(),
            best = %self.languages[best],
            "sentence language runs"
        );
        self.reattribute(sentence, &state.spans, best)
    }

    /// Checks one word under the current language, switching language when
    /// another configured one accepts it. Returns error ranges relative to
    /// the word.
    fn check_word(&self, state: &mut SentenceState, word: &str) -> Result<Vec<Span>, CollaboratorError> {
        let current = &self.languages[state.current];
        let first = match self.oracle.next_error(word, 0, current)? {
            Some(err) => err,
            None => return Ok(Vec::new()),
        };

        for (index, language) in self.languages.iter().enumerate() {
            if index == state.current {
                continue;
            }
            if self.oracle.next_error(word, first.index, language)?.is_none() {
                state.current = index;
                return Ok(Vec::new());
            }
        }

        self.collect_errors(word, Some(first), current)
    }

    /// Walks the oracle's errors through `text` starting from `first`,
    /// folding a trailing possessive into each error and dropping
    /// non-words and ignored words.
    fn collect_errors(
        &self,
        text: &str,
        first: Option<ErrorRange>,
        language: &LanguageId,
    ) -> Result<Vec<Span>, CollaboratorError> {
        let mut errors = Vec::new();
        let mut next = first;
        let mut from = 0;

        while let Some(err) = next {
            // an oracle that moves backwards would never let this loop end
            if err.index < from || err.index > text.len() {
                return Err(CollaboratorError::oracle(
                    language,
                    format!(
                        "error at {} is outside the searched range {}..{}",
                        err.index,
                        from,
                        text.len()
                    ),
                ));
            }

            let mut end = err.end().min(text.len());
            if let Some(extra) = possessive_suffix_len(text, end) {
                end += extra;
            }

            let range = Span::new(err.index, end);
            if let Some(error_text) = text.get(range.start..range.end) {
                if is_probably_real_word(error_text) && !self.ignore.should_ignore(error_text)? {
                    errors.push(range);
                }
            }

            if err.length == 0 || end >= text.len() {
                break;
            }
            from = end;
            next = self.oracle.next_error(text, from, language)?;
        }

        Ok(errors)
    }

    fn reattribute(
        &self,
        sentence: &str,
        spans: &[LanguageSpan],
        best: usize,
    ) -> Result<Vec<SentenceError>, CollaboratorError> {
        let mut out = Vec::new();
        let mut i = 0;

        while i < spans.len() {
            if spans[i].language == best {
                out.extend(own_errors(&spans[i]));
                i += 1;
                continue;
            }

            let run_end = i + spans[i..].iter().take_while(|s| s.language != best).count();
            let run = &spans[i..run_end];
            let run_words: usize = run.iter().map(|s| s.words).sum();

            for (k, span) in run.iter().enumerate() {
                let trusted = run_words >= MIN_FOREIGN_WORD_SEQUENCE
                    || i + k == 0
                    || k > 0
                    || span.errors.len() > 1;

                if trusted {
                    out.extend(own_errors(span));
                } else {
                    out.extend(self.recheck(sentence, span, best)?);
                }
            }

            i = run_end;
        }

        Ok(out)
    }

    /// Re-runs the oracle for `best` over the words of `span`.
    fn recheck(
        &self,
        sentence: &str,
        span: &LanguageSpan,
        best: usize,
    ) -> Result<Vec<SentenceError>, CollaboratorError> {
        let language = &self.languages[best];
        let text = &sentence[span.start..span.end];
        let mut out = Vec::new();

        for word in segment(text) {
            let word_text = &text[word.start..word.end];
            if !is_probably_real_word(word_text) {
                continue;
            }
            let first = self.oracle.next_error(word_text, 0, language)?;
            for range in self.collect_errors(word_text, first, language)? {
                out.push(SentenceError {
                    range: range.shift(span.start + word.start),
                    language: best,
                });
            }
        }

        Ok(out)
    }
}

fn own_errors(span: &LanguageSpan) -> impl Iterator<Item = SentenceError> + '_ {
    span.errors.iter().map(move |&range| SentenceError {
        range,
        language: span.language,
    })
}

/// Lazy per-sentence iterator returned by [`Disambiguator::misspellings`].
pub struct Misspellings<'a, 't> {
    disambiguator: &'t Disambiguator<'a>,
    text: &'t str,
    base: usize,
    breaks: Matches<'static, 't>,
    /// Start of the next unchecked sentence; `None` once exhausted.
    cursor: Option<usize>,
    pending: VecDeque<FoundMisspelling>,
}

impl Misspellings<'_, '_> {
    fn next_sentence(&mut self) -> Option<Span> {
        let start = self.cursor?;
        match self.breaks.next() {
            Some(m) => {
                self.cursor = Some(m.end());
                Some(Span::new(start, m.start()))
            }
            None => {
                self.cursor = None;
                Some(Span::new(start, self.text.len()))
            }
        }
    }

    fn fill(&mut self, sentence: Span) -> Result<(), CollaboratorError> {
        let d = self.disambiguator;
        let text = &self.text[sentence.start..sentence.end];

        for error in d.check_sentence(text)? {
            let word = &text[error.range.start..error.range.end];
            let language = &d.languages[error.language];
            let suggestions = d.oracle.suggestions(word, language)?;
            self.pending.push_back(FoundMisspelling {
                span: error.range.shift(self.base + sentence.start),
                word: word.to_string(),
                language: language.clone(),
                suggestions,
            });
        }

        Ok(())
    }
}

impl Iterator for Misspellings<'_, '_> {
    type Item = Result<FoundMisspelling, CollaboratorError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(found) = self.pending.pop_front() {
                return Some(Ok(found));
            }

            let sentence = self.next_sentence()?;
            if sentence.is_empty() {
                continue;
            }
            if let Err(e) = self.fill(sentence) {
                self.pending.clear();
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{NoIgnoreList, WordListOracle};

    fn ids(langs: &[&str]) -> Vec<LanguageId> {
        langs.iter().map(|l| LanguageId::new(*l)).collect()
    }

    fn check(
        langs: &[&str],
        oracle: &WordListOracle,
        text: &str,
    ) -> Vec<FoundMisspelling> {
        let languages = ids(langs);
        let d = Disambiguator::new(&languages, oracle, &NoIgnoreList);
        let found: Result<Vec<_>, _> = d.misspellings(text, 0).collect();
        found.unwrap()
    }

    fn flagged(found: &[FoundMisspelling]) -> Vec<(&str, &str)> {
        found
            .iter()
            .map(|f| (f.word.as_str(), f.language.as_str()))
            .collect()
    }

    fn english() -> WordListOracle {
        WordListOracle::new().with_words(
            "en",
            ["this", "is", "a", "test", "think", "nice", "hello", "world", "today", "friend", "again", "sun"],
        )
    }

    fn english_french() -> WordListOracle {
        english().with_words(
            "fr",
            ["je", "suis", "fatigué", "très", "bien", "bonjour", "c'est", "la", "vie"],
        )
    }

    #[test]
    fn test_single_language_reports_each_error() {
        let found = check(&["en"], &english(), "Thiss is a tst");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].span, Span::new(0, 5));
        assert_eq!(found[0].word, "Thiss");
        assert_eq!(found[1].span, Span::new(11, 14));
        assert_eq!(found[1].word, "tst");
        assert_eq!(found[0].suggestions.first().map(String::as_str), Some("This"));
    }

    #[test]
    fn test_offsets_include_sentence_start_and_base() {
        let languages = ids(&["en"]);
        let oracle = english();
        let d = Disambiguator::new(&languages, &oracle, &NoIgnoreList);
        let spans: Vec<Span> = d
            .misspellings("Thiss is a tst. Thiss again", 100)
            .map(|r| r.unwrap().span)
            .collect();
        assert_eq!(
            spans,
            vec![Span::new(100, 105), Span::new(111, 114), Span::new(116, 121)]
        );
    }

    #[test]
    fn test_checking_is_idempotent() {
        let oracle = english_french();
        let text = "I think très bien is nice. Je suis fatigué today, hello wrld";
        let first = check(&["en", "fr"], &oracle, text);
        let second = check(&["en", "fr"], &oracle, text);
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_dominant_language_rechecks_short_foreign_run() {
        let found = check(&["en", "fr"], &english_french(), "Je suis fatigué today");
        assert_eq!(flagged(&found), vec![("today", "fr")]);
        assert_eq!(found[0].span, Span::new(17, 22));
    }

    #[test]
    fn test_short_foreign_run_is_rechecked_in_best_language() {
        let found = check(&["en", "fr"], &english_french(), "I think très bien is nice");
        assert_eq!(flagged(&found), vec![("très", "en"), ("bien", "en")]);
    }

    #[test]
    fn test_long_foreign_run_is_trusted() {
        let found = check(&["en", "fr"], &english_french(), "I think c'est la vie is nice");
        assert!(found.is_empty(), "unexpected: {:?}", flagged(&found));
    }

    #[test]
    fn test_foreign_first_span_is_trusted() {
        let found = check(&["en", "fr"], &english_french(), "bonjour hello world");
        assert!(found.is_empty());
    }

    #[test]
    fn test_foreign_span_with_several_errors_keeps_its_own() {
        let found = check(
            &["en", "fr"],
            &english_french(),
            "hello bonjour xyzzy-qwrty world",
        );
        assert_eq!(flagged(&found), vec![("xyzzy", "fr"), ("qwrty", "fr")]);
    }

    #[test]
    fn test_tie_keeps_first_seen_language() {
        let oracle = english().with_words("es", ["sol"]);
        let found = check(&["en", "es"], &oracle, "sun sol");
        assert_eq!(flagged(&found), vec![("sol", "en")]);
    }

    #[test]
    fn test_sentences_are_checked_independently() {
        let found = check(&["en", "fr"], &english_french(), "bonjour. hello");
        assert!(found.is_empty());
    }

    #[test]
    fn test_non_words_are_never_reported() {
        let oracle = WordListOracle::new().with_words("en", ["and"]);
        let found = check(
            &["en"],
            &oracle,
            "CamelCase123 and user@example.com and file.exe and SHOUT",
        );
        assert!(found.is_empty(), "unexpected: {:?}", flagged(&found));
    }

    #[test]
    fn test_possessive_is_folded_into_the_error() {
        let found = check(&["en"], &english(), "Johnn's friend");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].word, "Johnn's");
        assert_eq!(found[0].span, Span::new(0, 7));
    }

    #[test]
    fn test_ignored_words_are_skipped() {
        struct IgnoreTst;
        impl IgnoreList for IgnoreTst {
            fn should_ignore(&self, word: &str) -> Result<bool, CollaboratorError> {
                Ok(word == "tst")
            }
        }

        let languages = ids(&["en"]);
        let oracle = english();
        let d = Disambiguator::new(&languages, &oracle, &IgnoreTst);
        let words: Vec<String> = d
            .misspellings("Thiss is a tst", 0)
            .map(|r| r.unwrap().word)
            .collect();
        assert_eq!(words, vec!["Thiss"]);
    }

    #[test]
    fn test_oracle_failure_is_yielded() {
        let languages = ids(&["xx"]);
        let oracle = english();
        let d = Disambiguator::new(&languages, &oracle, &NoIgnoreList);
        let mut results = d.misspellings("anything here", 0);
        assert!(matches!(results.next(), Some(Err(CollaboratorError::Oracle { .. }))));
    }

    #[test]
    fn test_second_span_of_foreign_run_keeps_its_own_errors() {
        let oracle = WordListOracle::new()
            .with_words("en", ["hello", "world", "again", "nice"])
            .with_words("fr", ["bonjour"])
            .with_words("es", ["hola"]);
        let found = check(&["en", "fr", "es"], &oracle, "hello world bonjour hola again nice");
        assert_eq!(flagged(&found), vec![("bonjour", "en")]);
    }

    /// Always reports the same error at the start of the text.
    struct StuckOracle;

    impl SpellingOracle for StuckOracle {
        fn next_error(
            &self,
            _text: &str,
            _from: usize,
            _language: &LanguageId,
        ) -> Result<Option<ErrorRange>, CollaboratorError> {
            Ok(Some(ErrorRange { index: 0, length: 3 }))
        }

        fn suggestions(&self, _word: &str, _language: &LanguageId) -> Result<Vec<String>, CollaboratorError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_oracle_that_does_not_advance_is_a_failure() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let languages = ids(&["en"]);
            let d = Disambiguator::new(&languages, &StuckOracle, &NoIgnoreList);
            let results: Vec<_> = d.misspellings("abcdefgh", 0).collect();
            let _ = tx.send(results);
        });

        let results = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("checking did not terminate");
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(CollaboratorError::Oracle { .. })));
    }

    #[test]
    fn test_no_languages_reports_nothing() {
        let oracle = WordListOracle::new();
        let d = Disambiguator::new(&[], &oracle, &NoIgnoreList);
        assert_eq!(d.misspellings("Thiss is a tst", 0).count(), 0);
    }
}
