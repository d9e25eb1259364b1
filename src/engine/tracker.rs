use crate::document::{NormalizedSpans, Snapshot, Span, SpanTrackingMode, TextVersion, TrackingSpan, VersionedSpan};
use parking_lot::Mutex;
use std::mem;
use tracing::trace;

/// Queue of text regions whose analysis is stale.
///
/// Regions are held as tracking spans, so edits made while they wait are
/// absorbed when they are drained rather than when the edit happens.
#[derive(Debug, Default)]
pub struct DirtyRegionTracker {
    pending: Mutex<Vec<TrackingSpan>>,
}

impl DirtyRegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `region`. Empty regions are dropped.
    pub fn mark_dirty(&self, region: VersionedSpan) {
        if region.span.is_empty() {
            return;
        }
        self.pending
            .lock()
            .push(TrackingSpan::new(region, SpanTrackingMode::EdgeInclusive));
    }

    pub fn mark_all<I>(&self, version: TextVersion, spans: I)
    where
        I: IntoIterator<Item = Span>,
    {
        let regions: Vec<TrackingSpan> = spans
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|s| TrackingSpan::new(VersionedSpan::new(version, s), SpanTrackingMode::EdgeInclusive))
            .collect();
        self.pending.lock().extend(regions);
    }

    /// Queues every non-empty line of `snapshot` as its own region.
    pub fn seed_lines(&self, snapshot: &Snapshot) {
        self.mark_all(snapshot.version(), snapshot.lines());
    }

    /// Takes every queued region, translated to `snapshot`, sorted and
    /// merged. The queue is empty afterwards.
    pub fn drain_and_normalize(&self, snapshot: &Snapshot) -> NormalizedSpans {
        let drained = mem::take(&mut *self.pending.lock());
        let count = drained.len();
        let regions: NormalizedSpans = drained.iter().map(|r| r.span_in(snapshot)).collect();
        trace!(queued = count, regions = regions.len(), version = %snapshot.version(), "drained dirty regions");
        regions
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_overlapping_regions_coalesce() {
        let doc = Document::new("0123456789abcdef");
        let snapshot = doc.snapshot();
        let tracker = DirtyRegionTracker::new();
        tracker.mark_dirty(VersionedSpan::new(snapshot.version(), Span::new(0, 5)));
        tracker.mark_dirty(VersionedSpan::new(snapshot.version(), Span::new(3, 10)));

        let drained = tracker.drain_and_normalize(&snapshot);
        assert_eq!(drained.as_slice(), &[Span::new(0, 10)]);
        assert!(tracker.is_empty());
        assert!(tracker.drain_and_normalize(&snapshot).is_empty());
    }

    #[test]
    fn test_empty_regions_are_dropped() {
        let doc = Document::new("text");
        let tracker = DirtyRegionTracker::new();
        tracker.mark_dirty(VersionedSpan::new(doc.version(), Span::new(2, 2)));
        tracker.mark_dirty(VersionedSpan::new(doc.version(), Span::new(3, 1)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_pending_regions_follow_edits() {
        let doc = Document::new("alpha beta gamma");
        let tracker = DirtyRegionTracker::new();
        tracker.mark_dirty(VersionedSpan::new(doc.version(), Span::new(11, 16)));

        doc.insert(0, ">> ").unwrap();
        let snapshot = doc.snapshot();
        let drained = tracker.drain_and_normalize(&snapshot);
        assert_eq!(drained.as_slice(), &[Span::new(14, 19)]);
        assert_eq!(snapshot.slice(drained.as_slice()[0]), "gamma");
    }

    #[test]
    fn test_seed_lines_skips_empty_lines() {
        let doc = Document::new("first\n\nthird\r\nfourth");
        let tracker = DirtyRegionTracker::new();
        tracker.seed_lines(&doc.snapshot());
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn test_concurrent_marks_are_never_lost() {
        let doc = Document::new("x".repeat(10_000));
        let snapshot = doc.snapshot();
        let tracker = Arc::new(DirtyRegionTracker::new());

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let tracker = Arc::clone(&tracker);
                let version = snapshot.version();
                thread::spawn(move || {
                    for i in 0..250 {
                        let start = (t * 250 + i) * 10;
                        tracker.mark_dirty(VersionedSpan::new(version, Span::new(start, start + 5)));
                    }
                })
            })
            .collect();

        let mut total = 0;
        for _ in 0..20 {
            total += tracker.drain_and_normalize(&snapshot).len();
        }
        for writer in writers {
            writer.join().unwrap();
        }
        total += tracker.drain_and_normalize(&snapshot).len();

        assert_eq!(total, 1000);
    }
}
