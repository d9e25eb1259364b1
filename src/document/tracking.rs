use super::{Snapshot, Span, TextChange, TextVersion, VersionedSpan};
use parking_lot::Mutex;

/// How a single point moves when text is inserted or replaced exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointTrackingMode {
    /// Moves to the end of the inserted text.
    Positive,
    /// Stays at the start of the inserted text.
    Negative,
}

/// How the edges of a span react to edits at their boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanTrackingMode {
    /// Text inserted at either edge is left outside the span.
    EdgeExclusive,
    /// Text inserted at either edge becomes part of the span.
    EdgeInclusive,
}

impl SpanTrackingMode {
    fn edges(self) -> (PointTrackingMode, PointTrackingMode) {
        match self {
            SpanTrackingMode::EdgeExclusive => {
                (PointTrackingMode::Positive, PointTrackingMode::Negative)
            }
            SpanTrackingMode::EdgeInclusive => {
                (PointTrackingMode::Negative, PointTrackingMode::Positive)
            }
        }
    }
}

/// Moves `point` across one edit batch. `changes` are sorted and disjoint
/// in the old version's coordinates.
pub(crate) fn translate_point(point: usize, changes: &[TextChange], mode: PointTrackingMode) -> usize {
    let mut delta: isize = 0;

    for change in changes {
        let start = change.old.start;
        let end = change.old.end;

        if point < start || (point == start && mode == PointTrackingMode::Negative) {
            break;
        }

        if point > end || (point == end && !change.old.is_empty()) {
            delta += change.new.len() as isize - change.old.len() as isize;
            continue;
        }

        // inside the replaced text, or on an insertion point
        return match mode {
            PointTrackingMode::Positive => change.new.end,
            PointTrackingMode::Negative => change.new.start,
        };
    }

    (point as isize + delta) as usize
}

pub(crate) fn translate_span(span: Span, changes: &[TextChange], mode: SpanTrackingMode) -> Span {
    let (start_mode, end_mode) = mode.edges();
    let start = translate_point(span.start, changes, start_mode);
    let end = translate_point(span.end, changes, end_mode);
    Span::new(start, end)
}

/// A span that re-anchors itself across document edits.
///
/// The anchor never changes; the most recent translation is cached so that
/// repeated reads only walk the edits made since the last access.
#[derive(Debug)]
pub struct TrackingSpan {
    anchor: VersionedSpan,
    mode: SpanTrackingMode,
    cached: Mutex<VersionedSpan>,
}

impl TrackingSpan {
    pub fn new(anchor: VersionedSpan, mode: SpanTrackingMode) -> Self {
        Self {
            anchor,
            mode,
            cached: Mutex::new(anchor),
        }
    }

    pub fn anchor(&self) -> VersionedSpan {
        self.anchor
    }

    pub fn mode(&self) -> SpanTrackingMode {
        self.mode
    }

    /// The span in `snapshot`'s coordinates.
    pub fn span_in(&self, snapshot: &Snapshot) -> Span {
        let target = snapshot.version();
        let mut cached = self.cached.lock();

        if cached.version == target {
            return cached.span;
        }

        if cached.version < target {
            let span = snapshot.translate_from(cached.version, cached.span, self.mode);
            *cached = VersionedSpan::new(target, span);
            return span;
        }

        // reading an older snapshot than the cache: start over from the anchor
        if self.anchor.version <= target {
            return snapshot.translate_from(self.anchor.version, self.anchor.span, self.mode);
        }
        clamp(self.anchor.span, snapshot.len())
    }
}

impl Clone for TrackingSpan {
    fn clone(&self) -> Self {
        Self {
            anchor: self.anchor,
            mode: self.mode,
            cached: Mutex::new(*self.cached.lock()),
        }
    }
}

fn clamp(span: Span, len: usize) -> Span {
    Span::new(span.start.min(len), span.end.min(len))
}
