use crate::checker::FoundMisspelling;
use crate::document::{
    NormalizedSpans, Snapshot, Span, SpanTrackingMode, TextVersion, TrackingSpan, VersionedSpan,
};
use crate::language::LanguageId;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// One flagged word, bound to a span that follows document edits.
#[derive(Debug, Clone)]
pub struct MisspellingTag {
    span: TrackingSpan,
    word: String,
    language: LanguageId,
    suggestions: Vec<String>,
}

impl MisspellingTag {
    /// A tag for `found`, whose span is measured at `version`.
    pub fn new(version: TextVersion, found: FoundMisspelling) -> Self {
        Self {
            span: TrackingSpan::new(
                VersionedSpan::new(version, found.span),
                SpanTrackingMode::EdgeExclusive,
            ),
            word: found.word,
            language: found.language,
            suggestions: found.suggestions,
        }
    }

    pub fn span_in(&self, snapshot: &Snapshot) -> Span {
        self.span.span_in(snapshot)
    }

    pub fn tracking_span(&self) -> &TrackingSpan {
        &self.span
    }

    /// The word as it was when flagged.
    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    fn same_finding(&self, span: Span, other: &MisspellingTag, other_span: Span) -> bool {
        span == other_span
            && self.word == other.word
            && self.language == other.language
            && self.suggestions == other.suggestions
    }
}

/// The current misspellings of one document.
///
/// Readers load the published list without locking; each update builds a
/// new list and swaps it in whole.
#[derive(Default)]
pub struct MisspellingStore {
    tags: ArcSwap<Vec<Arc<MisspellingTag>>>,
    writer: Mutex<()>,
}

impl MisspellingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tags overlapping `region` with `found` and drops tags
    /// whose span has collapsed. Spans are resolved against `latest`.
    ///
    /// Returns the span covering everything that changed, or `None` when the
    /// published tags are unchanged.
    pub fn update(&self, latest: &Snapshot, region: VersionedSpan, found: Vec<MisspellingTag>) -> Option<Span> {
        let _writer = self.writer.lock();
        let region = latest.translate(region, SpanTrackingMode::EdgeInclusive);
        let current = self.tags.load();

        let mut kept: Vec<(Span, Arc<MisspellingTag>)> = Vec::with_capacity(current.len() + found.len());
        let mut removed: Vec<(Span, &Arc<MisspellingTag>)> = Vec::new();
        for tag in current.iter() {
            let span = tag.span_in(latest);
            if span.is_empty() || span.overlaps_with(region) {
                removed.push((span, tag));
            } else {
                kept.push((span, Arc::clone(tag)));
            }
        }

        removed.sort_by_key(|(span, _)| *span);

        let mut added: Vec<(Span, Arc<MisspellingTag>)> = found
            .into_iter()
            .map(|tag| (tag.span_in(latest), Arc::new(tag)))
            .filter(|(span, _)| !span.is_empty())
            .collect();
        added.sort_by_key(|(span, _)| *span);

        let unchanged = removed.len() == added.len()
            && removed
                .iter()
                .zip(&added)
                .all(|((rs, rt), (ads, at))| rt.same_finding(*rs, at, *ads));
        if unchanged {
            return None;
        }

        let changed = removed
            .iter()
            .map(|(span, _)| *span)
            .chain(added.iter().map(|(span, _)| *span))
            .reduce(|a, b| a.cover(b));

        kept.extend(added);
        kept.sort_by_key(|(span, _)| *span);
        self.tags
            .store(Arc::new(kept.into_iter().map(|(_, tag)| tag).collect()));

        changed
    }

    /// The published tags, in document order as of their last update.
    pub fn snapshot_for_read(&self) -> Arc<Vec<Arc<MisspellingTag>>> {
        self.tags.load_full()
    }

    /// Tags intersecting any of `spans` in `snapshot`. Collapsed tags are
    /// skipped.
    pub fn query(&self, snapshot: &Snapshot, spans: &NormalizedSpans) -> Vec<Arc<MisspellingTag>> {
        self.tags
            .load()
            .iter()
            .filter(|tag| {
                let span = tag.span_in(snapshot);
                !span.is_empty() && spans.intersects_with(span)
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tags.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn found(span: Span, word: &str) -> FoundMisspelling {
        FoundMisspelling {
            span,
            word: word.to_string(),
            language: LanguageId::new("en"),
            suggestions: vec![],
        }
    }

    fn tag(version: TextVersion, span: Span, word: &str) -> MisspellingTag {
        MisspellingTag::new(version, found(span, word))
    }

    fn words(store: &MisspellingStore) -> Vec<String> {
        store
            .snapshot_for_read()
            .iter()
            .map(|t| t.word().to_string())
            .collect()
    }

    #[test]
    fn test_update_replaces_only_the_region() {
        let doc = Document::new("Thiss is a tst\nanother lyne");
        let snapshot = doc.snapshot();
        let v = snapshot.version();
        let store = MisspellingStore::new();

        let first = store.update(
            &snapshot,
            VersionedSpan::new(v, snapshot.line_extent(0)),
            vec![tag(v, Span::new(0, 5), "Thiss"), tag(v, Span::new(11, 14), "tst")],
        );
        assert_eq!(first, Some(Span::new(0, 14)));

        let second = store.update(
            &snapshot,
            VersionedSpan::new(v, snapshot.line_extent(1)),
            vec![tag(v, Span::new(23, 27), "lyne")],
        );
        assert_eq!(second, Some(Span::new(23, 27)));
        assert_eq!(words(&store), vec!["Thiss", "tst", "lyne"]);

        // line 0 re-checked clean
        let third = store.update(&snapshot, VersionedSpan::new(v, snapshot.line_extent(0)), vec![]);
        assert_eq!(third, Some(Span::new(0, 14)));
        assert_eq!(words(&store), vec!["lyne"]);
    }

    #[test]
    fn test_identical_results_report_no_change() {
        let doc = Document::new("Thiss is fine");
        let snapshot = doc.snapshot();
        let v = snapshot.version();
        let store = MisspellingStore::new();
        let region = VersionedSpan::new(v, snapshot.extent());

        store.update(&snapshot, region, vec![tag(v, Span::new(0, 5), "Thiss")]);
        let again = store.update(&snapshot, region, vec![tag(v, Span::new(0, 5), "Thiss")]);
        assert_eq!(again, None);
        assert_eq!(store.update(&snapshot, region, vec![]), Some(Span::new(0, 5)));
        assert_eq!(store.update(&snapshot, region, vec![]), None);
    }

    #[test]
    fn test_tag_follows_insertion_and_dies_with_its_text() {
        let doc = Document::new("say helo there");
        let v = doc.version();
        let store = MisspellingStore::new();
        store.update(&doc.snapshot(), VersionedSpan::new(v, doc.snapshot().extent()), vec![tag(v, Span::new(4, 8), "helo")]);

        doc.insert(0, "I ").unwrap();
        let snapshot = doc.snapshot();
        let tags = store.query(&snapshot, &NormalizedSpans::single(snapshot.extent()));
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].span_in(&snapshot), Span::new(6, 10));

        doc.delete(Span::new(6, 10)).unwrap();
        let snapshot = doc.snapshot();
        assert!(store
            .query(&snapshot, &NormalizedSpans::single(snapshot.extent()))
            .is_empty());

        // collapsed tags are purged by the next update anywhere
        let changed = store.update(&snapshot, VersionedSpan::new(snapshot.version(), Span::new(0, 1)), vec![]);
        assert_eq!(changed, Some(Span::new(6, 6)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_region_is_translated_before_removal() {
        let doc = Document::new("one twoo three");
        let v0 = doc.version();
        let store = MisspellingStore::new();
        store.update(&doc.snapshot(), VersionedSpan::new(v0, doc.snapshot().extent()), vec![tag(v0, Span::new(4, 8), "twoo")]);

        doc.insert(0, "zero ").unwrap();
        // region measured at v0 still covers the tag after the edit
        let changed = store.update(&doc.snapshot(), VersionedSpan::new(v0, Span::new(4, 8)), vec![]);
        assert_eq!(changed, Some(Span::new(9, 13)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_query_touching_span_counts() {
        let doc = Document::new("abc defg");
        let snapshot = doc.snapshot();
        let v = snapshot.version();
        let store = MisspellingStore::new();
        store.update(&snapshot, VersionedSpan::new(v, snapshot.extent()), vec![tag(v, Span::new(4, 8), "defg")]);

        assert_eq!(store.query(&snapshot, &NormalizedSpans::single(Span::new(0, 4))).len(), 1);
        assert!(store.query(&snapshot, &NormalizedSpans::single(Span::new(0, 3))).is_empty());
        assert!(store.query(&snapshot, &NormalizedSpans::new()).is_empty());
    }
}
