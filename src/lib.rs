pub mod checker;
pub mod cli;
pub mod config;
pub mod dict;
pub mod document;
pub mod engine;
pub mod error;
pub mod language;
pub mod parser;

pub use checker::{DictionaryOracle, IgnoreList, SpellingOracle, WordListOracle};
pub use config::Config;
pub use dict::PersonalDictionary;
pub use document::{Document, DocumentChange, NormalizedSpans, Snapshot, Span, TextVersion, VersionedSpan};
pub use engine::{SessionRegistry, SpellingEvent, SpellingSession};
pub use error::{CollaboratorError, EditError};
pub use language::{LanguageConfig, LanguageConfigProvider, LanguageId};
pub use parser::NaturalTextClassifier;
