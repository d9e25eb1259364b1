//! Natural-text classification: which parts of a document are prose worth
//! spell-checking.

pub mod markdown;
pub mod plaintext;
pub mod source_code;

use crate::document::{NormalizedSpans, Snapshot, Span};
use crate::error::CollaboratorError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;

pub use markdown::MarkdownClassifier;
pub use plaintext::PlainTextClassifier;
pub use source_code::SourceCodeClassifier;

lazy_static! {
    static ref URL: Regex =
        Regex::new(r#"(?:https?|ftp)://[^\s<>"'`)\]]+|www\.[^\s<>"'`)\]]+"#).unwrap();
}

/// Decides which sub-ranges of a text range are natural language.
pub trait NaturalTextClassifier: Send + Sync {
    /// Natural-text sub-spans of `span` in `snapshot`, sorted and merged.
    /// The result never extends outside `span`.
    fn classify(&self, snapshot: &Snapshot, span: Span) -> Result<NormalizedSpans, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Markdown,
    SourceCode(SourceLang),
    PlainText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLang {
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Jsx,
    Tsx,
    Shell,
    Toml,
    Other,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "md" | "mdx" | "markdown" => FileType::Markdown,
            "rs" => FileType::SourceCode(SourceLang::Rust),
            "js" | "mjs" | "cjs" => FileType::SourceCode(SourceLang::JavaScript),
            "ts" | "mts" | "cts" => FileType::SourceCode(SourceLang::TypeScript),
            "jsx" => FileType::SourceCode(SourceLang::Jsx),
            "tsx" => FileType::SourceCode(SourceLang::Tsx),
            "py" | "pyw" => FileType::SourceCode(SourceLang::Python),
            "go" => FileType::SourceCode(SourceLang::Go),
            "java" => FileType::SourceCode(SourceLang::Java),
            "c" | "h" => FileType::SourceCode(SourceLang::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hh" => FileType::SourceCode(SourceLang::Cpp),
            "sh" | "bash" | "zsh" => FileType::SourceCode(SourceLang::Shell),
            "toml" | "yaml" | "yml" => FileType::SourceCode(SourceLang::Toml),
            _ => FileType::PlainText,
        }
    }
}

/// Picks the classifier for a file by its extension.
pub fn classifier_for_path(path: &Path) -> Arc<dyn NaturalTextClassifier> {
    match FileType::from_path(path) {
        FileType::Markdown => Arc::new(MarkdownClassifier::new()),
        FileType::SourceCode(lang) => Arc::new(SourceCodeClassifier::new(lang)),
        FileType::PlainText => Arc::new(PlainTextClassifier),
    }
}

/// URL ranges in `text`, shifted by `base`.
pub fn url_spans(text: &str, base: usize) -> NormalizedSpans {
    URL.find_iter(text)
        .map(|m| Span::new(base + m.start(), base + m.end()))
        .collect()
}

/// `spans` minus any URLs they contain, clipped to `bounds`.
pub(crate) fn finish(snapshot: &Snapshot, spans: &NormalizedSpans, bounds: Span) -> NormalizedSpans {
    let clipped = spans.clip(bounds);
    let Some(extent) = clipped.extent() else {
        return clipped;
    };
    let urls = url_spans(snapshot.slice(extent), extent.start);
    clipped.difference(&urls)
}
