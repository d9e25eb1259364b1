use super::scheduler::{AnalysisScheduler, PassHost, SchedulerState, DEFAULT_DEBOUNCE};
use super::store::{MisspellingStore, MisspellingTag};
use super::tracker::DirtyRegionTracker;
use crate::checker::{Disambiguator, IgnoreList, NoIgnoreList, SpellingOracle};
use crate::dict::DictionaryEvent;
use crate::document::{
    Document, DocumentChange, NormalizedSpans, Snapshot, Span, SpanTrackingMode, VersionedSpan,
};
use crate::error::CollaboratorError;
use crate::language::{LanguageConfig, LanguageConfigProvider, LanguageId};
use crate::parser::{NaturalTextClassifier, PlainTextClassifier};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Notification published by a [`SpellingSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpellingEvent {
    /// Tags may have changed over this span; consumers should re-query it.
    TagsChanged(VersionedSpan),
}

/// Work for one pass: the regions to check and the settings to check them
/// with, fixed when the pass begins.
pub struct AnalysisBatch {
    snapshot: Snapshot,
    regions: NormalizedSpans,
    languages: Vec<LanguageId>,
}

struct SessionCore {
    document: Document,
    tracker: DirtyRegionTracker,
    store: MisspellingStore,
    classifier: Arc<dyn NaturalTextClassifier>,
    oracle: Arc<dyn SpellingOracle>,
    ignore: Arc<dyn IgnoreList>,
    languages: Arc<dyn LanguageConfigProvider>,
    subscribers: Mutex<Vec<Sender<SpellingEvent>>>,
}

impl SessionCore {
    fn notify(&self, event: SpellingEvent) {
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn check_region(
        &self,
        snapshot: &Snapshot,
        region: Span,
        languages: &[LanguageId],
    ) -> Result<Vec<MisspellingTag>, CollaboratorError> {
        let natural = self.classifier.classify(snapshot, region)?;
        let disambiguator = Disambiguator::new(languages, &*self.oracle, &*self.ignore);

        let mut tags = Vec::new();
        for span in natural.iter() {
            for found in disambiguator.misspellings(snapshot.slice(*span), span.start) {
                tags.push(MisspellingTag::new(snapshot.version(), found?));
            }
        }
        Ok(tags)
    }

    fn publish(&self, region: VersionedSpan, tags: Vec<MisspellingTag>) {
        let latest = self.document.snapshot();
        let found = tags.len();
        match self.store.update(&latest, region, tags) {
            Some(changed) => {
                trace!(region = ?region.span, found, changed = ?changed, "tags updated");
                self.notify(SpellingEvent::TagsChanged(VersionedSpan::new(
                    latest.version(),
                    changed,
                )));
            }
            None => trace!(region = ?region.span, found, "tags unchanged"),
        }
    }
}

impl PassHost for SessionCore {
    type Batch = AnalysisBatch;

    fn begin_pass(&self) -> Option<AnalysisBatch> {
        let snapshot = self.document.snapshot();
        let regions = self.tracker.drain_and_normalize(&snapshot);
        if regions.is_empty() {
            return None;
        }

        Some(AnalysisBatch {
            snapshot,
            regions,
            languages: self.languages.language_config().ids(),
        })
    }

    fn run_pass(&self, batch: AnalysisBatch) -> Vec<VersionedSpan> {
        let AnalysisBatch {
            snapshot,
            regions,
            languages,
        } = batch;
        debug!(
            version = %snapshot.version(),
            regions = regions.len(),
            languages = languages.len(),
            "checking regions"
        );

        let mut failed = Vec::new();
        for region in regions.iter().copied() {
            let result = catch_unwind(AssertUnwindSafe(|| {
                self.check_region(&snapshot, region, &languages)
            }))
            .unwrap_or_else(|payload| Err(CollaboratorError::from_panic(payload)));

            let region = VersionedSpan::new(snapshot.version(), region);
            match result {
                Ok(tags) => self.publish(region, tags),
                Err(e) => {
                    warn!(region = ?region.span, error = %e, "region check failed, will retry");
                    failed.push(region);
                }
            }
        }
        failed
    }

    fn has_pending(&self) -> bool {
        !self.tracker.is_empty()
    }

    fn retry(&self, failed: Vec<VersionedSpan>) {
        for region in failed {
            self.tracker.mark_dirty(region);
        }
    }
}

/// Configures and attaches a [`SpellingSession`].
pub struct SessionBuilder {
    document: Document,
    oracle: Arc<dyn SpellingOracle>,
    classifier: Arc<dyn NaturalTextClassifier>,
    ignore: Arc<dyn IgnoreList>,
    languages: Arc<dyn LanguageConfigProvider>,
    debounce: Duration,
}

impl SessionBuilder {
    /// Which parts of the document are checked. Defaults to all of it.
    pub fn classifier(mut self, classifier: Arc<dyn NaturalTextClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn ignore_list(mut self, ignore: Arc<dyn IgnoreList>) -> Self {
        self.ignore = ignore;
        self
    }

    /// Defaults to `en_US` alone.
    pub fn languages(mut self, languages: Arc<dyn LanguageConfigProvider>) -> Self {
        self.languages = languages;
        self
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Starts the background threads and queues every line of the document.
    pub fn attach(self) -> io::Result<SpellingSession> {
        let core = Arc::new(SessionCore {
            document: self.document,
            tracker: DirtyRegionTracker::new(),
            store: MisspellingStore::new(),
            classifier: self.classifier,
            oracle: self.oracle,
            ignore: self.ignore,
            languages: self.languages,
            subscribers: Mutex::new(Vec::new()),
        });
        let scheduler = AnalysisScheduler::new(Arc::clone(&core), self.debounce)?;

        let snapshot = core.document.snapshot();
        core.tracker.seed_lines(&snapshot);
        debug!(
            document = ?core.document.id(),
            version = %snapshot.version(),
            lines = snapshot.line_count(),
            "spelling session attached"
        );
        scheduler.schedule();

        Ok(SpellingSession { core, scheduler })
    }
}

/// Live spell checking of one document.
///
/// The session keeps a set of misspelling tags in step with the document.
/// Callers report what happened (edits, classifier changes, dictionary
/// changes) and the session re-checks the affected lines in the background,
/// publishing a [`SpellingEvent`] for each span whose tags changed.
pub struct SpellingSession {
    core: Arc<SessionCore>,
    scheduler: AnalysisScheduler,
}

impl SpellingSession {
    pub fn builder(document: Document, oracle: Arc<dyn SpellingOracle>) -> SessionBuilder {
        SessionBuilder {
            document,
            oracle,
            classifier: Arc::new(PlainTextClassifier),
            ignore: Arc::new(NoIgnoreList),
            languages: Arc::new(LanguageConfig::single("en_US")),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn document(&self) -> &Document {
        &self.core.document
    }

    /// Marks the full lines touched by `change` dirty. Changes to other
    /// documents are ignored.
    pub fn text_changed(&self, change: &DocumentChange) {
        if change.document != self.core.document.id() || change.changes.is_empty() {
            return;
        }

        let snapshot = self.core.document.snapshot();
        for text_change in &change.changes {
            let span =
                snapshot.translate_from(change.after, text_change.new, SpanTrackingMode::EdgeInclusive);
            self.core
                .tracker
                .mark_dirty(VersionedSpan::new(snapshot.version(), full_lines(&snapshot, span)));
        }
        self.scheduler.schedule();
    }

    /// The classifier's view of `region` changed: re-check it and tell
    /// subscribers right away.
    pub fn natural_text_changed(&self, region: VersionedSpan) {
        if region.span.is_empty() {
            return;
        }
        self.core.tracker.mark_dirty(region);
        self.core.notify(SpellingEvent::TagsChanged(region));
        self.scheduler.schedule();
    }

    /// Re-checks what a change to the ignored words may affect: the tags
    /// for `word`, or everything when no word is given.
    pub fn dictionary_changed(&self, event: &DictionaryEvent) {
        let snapshot = self.core.document.snapshot();
        match &event.word {
            Some(word) => {
                let lower = word.to_lowercase();
                let mut marked = 0;
                for tag in self.core.store.snapshot_for_read().iter() {
                    let span = tag.span_in(&snapshot);
                    if span.is_empty() {
                        continue;
                    }
                    let text = snapshot.slice(span);
                    let bare = text.strip_suffix("'s").unwrap_or(text);
                    if bare == word || bare.to_lowercase() == lower {
                        self.core
                            .tracker
                            .mark_dirty(VersionedSpan::new(snapshot.version(), full_lines(&snapshot, span)));
                        marked += 1;
                    }
                }
                debug!(word = %word, marked, "dictionary word changed");
                if marked > 0 {
                    self.scheduler.schedule();
                }
            }
            None => {
                debug!("dictionary reset, re-checking document");
                self.core.tracker.seed_lines(&snapshot);
                self.scheduler.schedule();
            }
        }
    }

    /// Language or dictionary settings changed; re-checks everything.
    pub fn configuration_changed(&self) {
        self.dictionary_changed(&DictionaryEvent { word: None });
    }

    /// Tags intersecting `spans` in the current document.
    pub fn tags(&self, spans: &NormalizedSpans) -> Vec<Arc<MisspellingTag>> {
        self.core.store.query(&self.core.document.snapshot(), spans)
    }

    /// Every live tag with its span in `snapshot`, in document order.
    pub fn misspellings_in(&self, snapshot: &Snapshot) -> Vec<(Span, Arc<MisspellingTag>)> {
        let mut resolved: Vec<_> = self
            .core
            .store
            .snapshot_for_read()
            .iter()
            .map(|tag| (tag.span_in(snapshot), Arc::clone(tag)))
            .filter(|(span, _)| !span.is_empty())
            .collect();
        resolved.sort_by_key(|(span, _)| *span);
        resolved
    }

    /// [`misspellings_in`](Self::misspellings_in) the current document.
    pub fn misspellings(&self) -> Vec<(Span, Arc<MisspellingTag>)> {
        self.misspellings_in(&self.core.document.snapshot())
    }

    pub fn subscribe(&self) -> Receiver<SpellingEvent> {
        let (tx, rx) = unbounded();
        self.core.subscribers.lock().push(tx);
        rx
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn passes_started(&self) -> u64 {
        self.scheduler.passes_started()
    }

    /// Blocks until no pass is running or scheduled. Returns `false` on
    /// timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.scheduler.wait_idle(timeout)
    }
}

/// `span` widened to the start of its first line and the end of its last.
fn full_lines(snapshot: &Snapshot, span: Span) -> Span {
    let first = snapshot.line_extent_containing(span.start);
    let last = snapshot.line_extent_containing(span.end);
    first.cover(last)
}
