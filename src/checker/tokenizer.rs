// Word segmentation and the cheap "is this even a word" filter applied
// before any dictionary is consulted.

use crate::document::Span;
use unicode_segmentation::UnicodeSegmentation;

/// Characters that end a word in addition to whitespace. Apostrophes,
/// backticks, hyphens and periods are deliberately absent so contractions,
/// hyphenations and abbreviations stay in one piece.
const WORD_BREAKS: &[char] = &[
    ',', ';', ':', '!', '?', '"', '(', ')', '[', ']', '{', '}', '<', '>', '/', '\\', '|', '*',
    '+', '=', '&', '^', '%', '$', '#', '~', '“', '”', '«', '»', '„', '…',
];

pub fn is_word_break(c: char) -> bool {
    c.is_whitespace() || WORD_BREAKS.contains(&c)
}

/// Lazy iterator over candidate word spans, relative to the segmented text.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    graphemes: unicode_segmentation::GraphemeIndices<'a>,
    len: usize,
}

/// Splits `text` into candidate words on whitespace and [`WORD_BREAKS`].
pub fn segment(text: &str) -> Segments<'_> {
    Segments {
        graphemes: text.grapheme_indices(true),
        len: text.len(),
    }
}

impl Iterator for Segments<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let mut start = None;

        for (offset, grapheme) in self.graphemes.by_ref() {
            let ch = grapheme.chars().next().unwrap_or(' ');
            match (start, is_word_break(ch)) {
                (None, true) => {}
                (None, false) => start = Some(offset),
                (Some(s), true) => return Some(Span::new(s, offset)),
                (Some(_), false) => {}
            }
        }

        start.map(|s| Span::new(s, self.len))
    }
}

/// Rejects tokens that are almost certainly identifiers, numbers, file names,
/// e-mail addresses or acronyms rather than natural-language words.
pub fn is_probably_real_word(word: &str) -> bool {
    if word
        .chars()
        .any(|c| c.is_numeric() || c == '_' || c == '@')
    {
        return false;
    }

    // "file.exe", "e.g" -- a period with more text after it
    if word.trim_end_matches('.').contains('.') {
        return false;
    }

    let mut found_lower = false;
    for (i, c) in word.chars().enumerate() {
        if i > 0 && found_lower && c.is_uppercase() {
            return false;
        }
        if c.is_lowercase() {
            found_lower = true;
        } else if c.is_uppercase() {
            found_lower = false;
        }
    }

    // ALL-CAPS, and tokens with no letters at all
    word.chars().any(char::is_lowercase)
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '’'
}

/// Lazy iterator over the dictionary-checkable words of `text` at or after
/// `from`: runs of letters, joined across single inner apostrophes.
#[derive(Debug, Clone)]
pub struct DictionaryWords<'a> {
    text: &'a str,
    pos: usize,
}

pub fn dictionary_words(text: &str, from: usize) -> DictionaryWords<'_> {
    let mut pos = from.min(text.len());
    while !text.is_char_boundary(pos) {
        pos += 1;
    }

    // never start in the middle of a word
    if pos > 0 && pos < text.len() {
        let before = text[..pos].chars().next_back().unwrap_or(' ');
        if before.is_alphabetic() {
            pos += text[pos..]
                .find(|c: char| !c.is_alphabetic() && !is_apostrophe(c))
                .unwrap_or(text.len() - pos);
        }
    }

    DictionaryWords { text, pos }
}

impl Iterator for DictionaryWords<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        let rest = &self.text[self.pos..];
        let (skip, _) = rest.char_indices().find(|(_, c)| c.is_alphabetic())?;
        let start = self.pos + skip;

        let mut end = start;
        let mut chars = self.text[start..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c.is_alphabetic() {
                end = start + i + c.len_utf8();
            } else if is_apostrophe(c)
                && chars.peek().is_some_and(|(_, next)| next.is_alphabetic())
            {
                continue;
            } else {
                break;
            }
        }

        self.pos = end;
        Some(Span::new(start, end))
    }
}

/// `"John's"` -> `Some("John")`.
pub fn strip_possessive(word: &str) -> Option<&str> {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("’s"))
        .filter(|stem| !stem.is_empty())
}

/// Length of a possessive `'s` starting at `text[at..]`, if there is one
/// that is not followed by more letters.
pub fn possessive_suffix_len(text: &str, at: usize) -> Option<usize> {
    let rest = text.get(at..)?;
    let suffix_len = if rest.starts_with("'s") {
        2
    } else if rest.starts_with("’s") {
        "’s".len()
    } else {
        return None;
    };

    match rest[suffix_len..].chars().next() {
        Some(c) if c.is_alphabetic() => None,
        _ => Some(suffix_len),
    }
}
