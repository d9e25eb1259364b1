pub mod output;

use crate::checker::{DictionaryOracle, SpellingOracle};
use crate::config::Config;
use crate::dict::PersonalDictionary;
use crate::document::{Document, Snapshot, Span};
use crate::engine::{MisspellingTag, SpellingSession};
use crate::language::LanguageConfigProvider;
use crate::parser::classifier_for_path;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How long a file may take to reach a settled state.
const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedMisspelling {
    pub word: String,
    pub line: usize,
    pub column: usize,
    pub language: String,
    pub context: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub path: PathBuf,
    pub misspellings: Vec<ReportedMisspelling>,
    /// False when checking timed out and some regions may not have been
    /// checked.
    pub complete: bool,
}

/// Checks whole files by running each through a spelling session.
pub struct FileChecker {
    oracle: Arc<dyn SpellingOracle>,
    ignore: Arc<PersonalDictionary>,
    languages: Arc<dyn LanguageConfigProvider>,
    timeout: Duration,
}

impl FileChecker {
    /// Builds the collaborators described by `config`. Fails if an enabled
    /// language's dictionaries cannot be loaded.
    pub fn new(config: &Config) -> Result<Self> {
        let oracle = DictionaryOracle::from_config(config);
        for language in config.language_config().ids() {
            oracle
                .preload(&language)
                .with_context(|| format!("Failed to load dictionaries for {}", language))?;
        }
        let ignore = Arc::new(PersonalDictionary::from_config(config)?);

        Ok(Self::with_collaborators(
            Arc::new(oracle),
            ignore,
            Arc::new(config.clone()),
        ))
    }

    pub fn with_collaborators(
        oracle: Arc<dyn SpellingOracle>,
        ignore: Arc<PersonalDictionary>,
        languages: Arc<dyn LanguageConfigProvider>,
    ) -> Self {
        Self {
            oracle,
            ignore,
            languages,
            timeout: CHECK_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn personal_dictionary(&self) -> &PersonalDictionary {
        &self.ignore
    }

    pub fn check_file(&self, path: &Path) -> Result<FileReport> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        self.check_text(path, content)
    }

    /// Checks `content` as if it were the file at `path`; the path only
    /// selects the classifier.
    pub fn check_text(&self, path: &Path, content: String) -> Result<FileReport> {
        let session = SpellingSession::builder(Document::new(content), Arc::clone(&self.oracle))
            .classifier(classifier_for_path(path))
            .ignore_list(self.ignore.clone())
            .languages(Arc::clone(&self.languages))
            .debounce(Duration::ZERO)
            .attach()
            .context("Failed to start spelling session")?;

        let complete = session.wait_idle(self.timeout);
        if !complete {
            warn!(path = %path.display(), "checking did not settle, results may be partial");
        }

        let snapshot = session.document().snapshot();
        let misspellings: Vec<ReportedMisspelling> = session
            .misspellings_in(&snapshot)
            .iter()
            .map(|(span, tag)| report(&snapshot, *span, tag))
            .collect();
        debug!(
            path = %path.display(),
            found = misspellings.len(),
            passes = session.passes_started(),
            "file checked"
        );

        Ok(FileReport {
            path: path.to_path_buf(),
            misspellings,
            complete,
        })
    }
}

fn report(snapshot: &Snapshot, span: Span, tag: &MisspellingTag) -> ReportedMisspelling {
    let line = snapshot.line_extent_containing(span.start);
    let column = snapshot.slice(Span::new(line.start, span.start)).chars().count() + 1;

    ReportedMisspelling {
        word: snapshot.slice(span).to_string(),
        line: snapshot.line_index_of(span.start) + 1,
        column,
        language: tag.language().to_string(),
        context: snapshot.slice(line).trim().to_string(),
        suggestions: tag.suggestions().to_vec(),
    }
}
