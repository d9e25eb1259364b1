use super::TextVersion;
use std::fmt;

/// A half-open byte range `start..end` over some snapshot of a document.
///
/// Offsets are always on `char` boundaries of the text they were taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Creates a span; an inverted range collapses to an empty span at `start`.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn from_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// True when the two spans share at least one byte.
    pub fn overlaps_with(&self, other: Span) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }

    /// True when the two spans overlap or touch.
    pub fn intersects_with(&self, other: Span) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    pub fn intersection(&self, other: Span) -> Option<Span> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Span { start, end })
    }

    /// Smallest span covering both.
    pub fn cover(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn shift(&self, offset: usize) -> Span {
        Span {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{})", self.start, self.end)
    }
}

/// A span bound to the text version it was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionedSpan {
    pub version: TextVersion,
    pub span: Span,
}

impl VersionedSpan {
    pub fn new(version: TextVersion, span: Span) -> Self {
        Self { version, span }
    }
}

/// Sorted, non-overlapping, non-empty spans. Overlapping and abutting input
/// spans are merged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedSpans {
    spans: Vec<Span>,
}

impl NormalizedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(span: Span) -> Self {
        Self::from_iter([span])
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    /// Covering span of the whole collection.
    pub fn extent(&self) -> Option<Span> {
        let first = self.spans.first()?;
        let last = self.spans.last()?;
        Some(Span::new(first.start, last.end))
    }

    /// True if any member overlaps or touches `span`.
    pub fn intersects_with(&self, span: Span) -> bool {
        // members are sorted, so skip everything that ends before `span` starts
        let idx = self.spans.partition_point(|s| s.end < span.start);
        self.spans[idx..]
            .iter()
            .take_while(|s| s.start <= span.end)
            .any(|s| s.intersects_with(span))
    }

    /// Every member clipped to `bounds`, dropping what falls outside.
    pub fn clip(&self, bounds: Span) -> NormalizedSpans {
        self.spans
            .iter()
            .filter_map(|s| s.intersection(bounds))
            .collect()
    }

    /// The parts of `self` not covered by `other`.
    pub fn difference(&self, other: &NormalizedSpans) -> NormalizedSpans {
        let mut result = Vec::with_capacity(self.spans.len());
        let mut cut = other.spans.iter().peekable();

        for span in &self.spans {
            let mut start = span.start;
            while let Some(c) = cut.peek() {
                if c.end <= start {
                    cut.next();
                    continue;
                }
                if c.start >= span.end {
                    break;
                }
                if c.start > start {
                    result.push(Span::new(start, c.start));
                }
                start = start.max(c.end);
                if c.end > span.end {
                    break;
                }
                cut.next();
            }
            if start < span.end {
                result.push(Span::new(start, span.end));
            }
        }

        Self { spans: result }
    }
}

impl FromIterator<Span> for NormalizedSpans {
    fn from_iter<I: IntoIterator<Item = Span>>(iter: I) -> Self {
        let mut spans: Vec<Span> = iter.into_iter().filter(|s| !s.is_empty()).collect();
        spans.sort_unstable();

        let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }

        Self { spans: merged }
    }
}

impl IntoIterator for NormalizedSpans {
    type Item = Span;
    type IntoIter = std::vec::IntoIter<Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}

impl<'a> IntoIterator for &'a NormalizedSpans {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(pairs: &[(usize, usize)]) -> NormalizedSpans {
        pairs.iter().map(|&(s, e)| Span::new(s, e)).collect()
    }

    #[test]
    fn test_overlapping_spans_coalesce() {
        let normalized = spans(&[(0, 5), (3, 10)]);
        assert_eq!(normalized.as_slice(), &[Span::new(0, 10)]);
    }

    #[test]
    fn test_abutting_spans_merge_and_empties_drop() {
        let normalized = spans(&[(10, 12), (4, 4), (0, 5), (5, 7)]);
        assert_eq!(normalized.as_slice(), &[Span::new(0, 7), Span::new(10, 12)]);
    }

    #[test]
    fn test_inverted_span_is_empty() {
        let span = Span::new(8, 3);
        assert!(span.is_empty());
        assert!(spans(&[(8, 3)]).is_empty());
    }

    #[test]
    fn test_overlap_versus_intersect() {
        let a = Span::new(0, 5);
        let b = Span::new(5, 8);
        assert!(!a.overlaps_with(b));
        assert!(a.intersects_with(b));
        assert_eq!(a.intersection(b), Some(Span::new(5, 5)));
        assert_eq!(a.intersection(Span::new(6, 9)), None);
    }

    #[test]
    fn test_difference_removes_covered_parts() {
        let base = spans(&[(0, 20), (30, 40)]);
        let cut = spans(&[(5, 8), (18, 32), (39, 50)]);
        let diff = base.difference(&cut);
        assert_eq!(
            diff.as_slice(),
            &[Span::new(0, 5), Span::new(8, 18), Span::new(32, 39)]
        );
    }

    #[test]
    fn test_collection_intersects() {
        let set = spans(&[(0, 3), (10, 12)]);
        assert!(set.intersects_with(Span::new(3, 4)));
        assert!(set.intersects_with(Span::new(11, 11)));
        assert!(!set.intersects_with(Span::new(5, 8)));
    }

    #[test]
    fn test_clip_to_bounds() {
        let set = spans(&[(0, 10), (20, 30)]);
        let clipped = set.clip(Span::new(5, 25));
        assert_eq!(clipped.as_slice(), &[Span::new(5, 10), Span::new(20, 25)]);
    }
}
