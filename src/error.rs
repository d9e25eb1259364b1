use crate::language::LanguageId;
use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure raised by one of the collaborators consulted during an analysis pass.
///
/// These never abort a pass: the scheduler logs them, keeps the region dirty
/// and retries it on a later pass.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("natural text classifier failed")]
    Classifier(#[source] BoxError),

    #[error("spelling oracle failed for language {language}")]
    Oracle {
        language: LanguageId,
        #[source]
        source: BoxError,
    },

    #[error("ignore list lookup failed")]
    IgnoreList(#[source] BoxError),

    #[error("collaborator panicked: {0}")]
    Panicked(String),
}

impl CollaboratorError {
    pub fn oracle(language: &LanguageId, source: impl Into<BoxError>) -> Self {
        Self::Oracle {
            language: language.clone(),
            source: source.into(),
        }
    }

    pub fn classifier(source: impl Into<BoxError>) -> Self {
        Self::Classifier(source.into())
    }

    pub fn ignore_list(source: impl Into<BoxError>) -> Self {
        Self::IgnoreList(source.into())
    }

    /// Builds a `Panicked` error from a `catch_unwind` payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }
}

/// Rejected document edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("edit range {start}..{end} is outside the document (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("edit offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("edit ranges overlap at offset {0}")]
    Overlapping(usize),
}
