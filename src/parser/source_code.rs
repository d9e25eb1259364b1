use super::{finish, NaturalTextClassifier, SourceLang};
use crate::document::{NormalizedSpans, Snapshot, Span, TextVersion};
use crate::error::CollaboratorError;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Comment and string delimiters of a language family.
#[derive(Debug, Clone, Copy)]
struct Syntax {
    line_comment: &'static str,
    block_comment: Option<(&'static str, &'static str)>,
    /// Longest delimiters first so `"""` wins over `"`.
    quotes: &'static [&'static str],
}

const C_STYLE: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &["\""],
};

const JS_STYLE: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &["\"", "'", "`"],
};

const GO_STYLE: Syntax = Syntax {
    line_comment: "//",
    block_comment: Some(("/*", "*/")),
    quotes: &["\"", "`"],
};

const PYTHON_STYLE: Syntax = Syntax {
    line_comment: "#",
    block_comment: None,
    quotes: &["\"\"\"", "'''", "\"", "'"],
};

const HASH_STYLE: Syntax = Syntax {
    line_comment: "#",
    block_comment: None,
    quotes: &["\"", "'"],
};

impl Syntax {
    fn for_lang(lang: SourceLang) -> Self {
        match lang {
            SourceLang::Python => PYTHON_STYLE,
            SourceLang::Shell | SourceLang::Toml => HASH_STYLE,
            SourceLang::JavaScript | SourceLang::TypeScript | SourceLang::Jsx | SourceLang::Tsx => {
                JS_STYLE
            }
            SourceLang::Go => GO_STYLE,
            SourceLang::Rust
            | SourceLang::Java
            | SourceLang::C
            | SourceLang::Cpp
            | SourceLang::Other => C_STYLE,
        }
    }
}

/// Comment and string-literal interiors of source code.
///
/// The whole document is scanned once per version; requests for that version
/// are answered from the cached result.
pub struct SourceCodeClassifier {
    syntax: Syntax,
    cache: Mutex<Option<(TextVersion, Arc<NormalizedSpans>)>>,
}

impl SourceCodeClassifier {
    pub fn new(lang: SourceLang) -> Self {
        Self {
            syntax: Syntax::for_lang(lang),
            cache: Mutex::new(None),
        }
    }

    fn regions(&self, snapshot: &Snapshot) -> Arc<NormalizedSpans> {
        let mut cache = self.cache.lock();
        if let Some((version, spans)) = cache.as_ref() {
            if *version == snapshot.version() {
                return Arc::clone(spans);
            }
        }

        let spans = Arc::new(scan(snapshot.text(), &self.syntax));
        trace!(version = %snapshot.version(), regions = spans.len(), "scanned source");
        *cache = Some((snapshot.version(), Arc::clone(&spans)));
        spans
    }
}

impl NaturalTextClassifier for SourceCodeClassifier {
    fn classify(&self, snapshot: &Snapshot, span: Span) -> Result<NormalizedSpans, CollaboratorError> {
        Ok(finish(snapshot, &self.regions(snapshot), span))
    }
}

fn scan(text: &str, syntax: &Syntax) -> NormalizedSpans {
    let len = text.len();
    let mut regions = Vec::new();
    let mut i = 0;

    while i < len {
        let rest = &text[i..];

        if rest.starts_with(syntax.line_comment) {
            let start = i + syntax.line_comment.len();
            let end = text[start..].find('\n').map_or(len, |e| start + e);
            regions.push(Span::new(start, end));
            i = end;
            continue;
        }

        if let Some((open, close)) = syntax.block_comment {
            if rest.starts_with(open) {
                let start = i + open.len();
                match text[start..].find(close) {
                    Some(e) => {
                        regions.push(Span::new(start, start + e));
                        i = start + e + close.len();
                    }
                    None => {
                        regions.push(Span::new(start, len));
                        i = len;
                    }
                }
                continue;
            }
        }

        if let Some(quote) = syntax.quotes.iter().find(|q| rest.starts_with(**q)) {
            let start = i + quote.len();
            let (end, next) = string_end(text, start, quote);
            regions.push(Span::new(start, end));
            i = next;
            continue;
        }

        i += rest.chars().next().map_or(1, char::len_utf8);
    }

    regions.into_iter().collect()
}

/// End of a string literal's interior and the offset just past its closing
/// quote. Single-character quotes end at a line break when unterminated.
fn string_end(text: &str, start: usize, quote: &str) -> (usize, usize) {
    let multiline = quote.len() > 1 || quote == "`";
    let mut j = start;

    while j < text.len() {
        let rest = &text[j..];
        if rest.starts_with('\\') {
            j += 1;
            j += text[j..].chars().next().map_or(0, char::len_utf8);
        } else if rest.starts_with(quote) {
            return (j, j + quote.len());
        } else if !multiline && rest.starts_with('\n') {
            return (j, j);
        } else {
            j += rest.chars().next().map_or(1, char::len_utf8);
        }
    }

    (text.len(), text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn natural(text: &str, lang: SourceLang) -> Vec<String> {
        let doc = Document::new(text);
        let snapshot = doc.snapshot();
        SourceCodeClassifier::new(lang)
            .classify(&snapshot, snapshot.extent())
            .unwrap()
            .iter()
            .map(|s| snapshot.slice(*s).to_string())
            .collect()
    }

    #[test]
    fn test_c_style_comments() {
        let content = r#"
// This is a comment with words
fn main() {
    println!("A string with text");
}
"#;

        let found = natural(content, SourceLang::Rust);
        assert_eq!(found, vec![" This is a comment with words", "A string with text"]);
    }

    #[test]
    fn test_block_comment_spans_lines() {
        let content = "int x; /* first line\n   second line */ int y;";
        let found = natural(content, SourceLang::C);
        assert_eq!(found, vec![" first line\n   second line "]);
    }

    #[test]
    fn test_rust_lifetimes_are_not_strings() {
        let found = natural("fn f<'a>(s: &'a str) {} // note", SourceLang::Rust);
        assert_eq!(found, vec![" note"]);
    }

    #[test]
    fn test_escaped_quote_stays_in_string() {
        let found = natural(r#"let s = "say \"hi\" now";"#, SourceLang::Rust);
        assert_eq!(found, vec![r#"say \"hi\" now"#]);
    }

    #[test]
    fn test_python_comments_and_docstrings() {
        let content = "# This is a Python comment\ndef main():\n    \"\"\"Docstring\n    text\"\"\"\n    print('hi # not a comment')\n";
        let found = natural(content, SourceLang::Python);
        assert_eq!(
            found,
            vec![" This is a Python comment", "Docstring\n    text", "hi # not a comment"]
        );
    }

    #[test]
    fn test_url_in_comment_is_excluded() {
        let found = natural("// see https://example.com for more", SourceLang::Go);
        assert_eq!(found, vec![" see ", " for more"]);
    }

    #[test]
    fn test_cache_follows_version() {
        let doc = Document::new("// one");
        let classifier = SourceCodeClassifier::new(SourceLang::Rust);
        let before = classifier.classify(&doc.snapshot(), doc.snapshot().extent()).unwrap();
        assert_eq!(before.as_slice(), &[Span::new(2, 6)]);

        doc.insert(0, "x; ").unwrap();
        let snapshot = doc.snapshot();
        let after = classifier.classify(&snapshot, snapshot.extent()).unwrap();
        assert_eq!(after.as_slice(), &[Span::new(5, 9)]);
    }
}
