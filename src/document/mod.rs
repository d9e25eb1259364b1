//! Versioned text documents.
//!
//! A [`Document`] is a shared, mutable text buffer. Every applied edit batch
//! produces a new [`TextVersion`] and is recorded in an append-only history,
//! which is what lets spans measured against an old [`Snapshot`] be carried
//! forward to any newer one.

mod span;
mod tracking;

pub use span::{NormalizedSpans, Span, VersionedSpan};
pub use tracking::{PointTrackingMode, SpanTrackingMode, TrackingSpan};

use crate::error::EditError;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one snapshot of a document; increases with every edit batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextVersion(u64);

impl TextVersion {
    pub fn number(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TextVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Process-unique identity of a document, used as a registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Replace `range` (current version coordinates) with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Span,
    pub text: String,
}

impl Edit {
    pub fn new(range: Span, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// One replaced range: `old` in the version before the batch, `new` in the
/// version after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChange {
    pub old: Span,
    pub new: Span,
}

/// The edit feed record produced by every applied batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub document: DocumentId,
    pub before: TextVersion,
    pub after: TextVersion,
    pub changes: Vec<TextChange>,
}

/// A shared, editable text buffer with version history.
///
/// The history keeps the change list of every applied batch for as long as
/// the document lives, so a span from any earlier version can still be
/// translated. Memory grows with the number of batches, not with the text
/// size; long-lived editors should group keystrokes into batches.
#[derive(Clone)]
pub struct Document {
    inner: Arc<Inner>,
}

struct Inner {
    id: DocumentId,
    state: RwLock<State>,
    history: Arc<History>,
}

struct State {
    version: TextVersion,
    text: Arc<str>,
    line_starts: Arc<[usize]>,
}

/// `steps[v]` holds the changes that turn version `v` into `v + 1`.
/// Append-only: steps are never dropped.
#[derive(Default)]
struct History {
    steps: RwLock<Vec<Arc<[TextChange]>>>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let line_starts = compute_line_starts(&text);
        Self {
            inner: Arc::new(Inner {
                id: DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed)),
                state: RwLock::new(State {
                    version: TextVersion::default(),
                    text: Arc::from(text),
                    line_starts,
                }),
                history: Arc::new(History::default()),
            }),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    pub fn version(&self) -> TextVersion {
        self.inner.state.read().version
    }

    /// Number of edit batches retained for translation, one per version
    /// bump.
    pub fn history_len(&self) -> usize {
        self.inner.history.steps.read().len()
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.inner.state.read();
        Snapshot {
            version: state.version,
            text: Arc::clone(&state.text),
            line_starts: Arc::clone(&state.line_starts),
            history: Arc::clone(&self.inner.history),
        }
    }

    pub fn insert(&self, offset: usize, text: &str) -> Result<DocumentChange, EditError> {
        self.apply_edits(vec![Edit::new(Span::new(offset, offset), text)])
    }

    pub fn delete(&self, range: Span) -> Result<DocumentChange, EditError> {
        self.apply_edits(vec![Edit::new(range, "")])
    }

    pub fn replace(&self, range: Span, text: &str) -> Result<DocumentChange, EditError> {
        self.apply_edits(vec![Edit::new(range, text)])
    }

    /// Applies a batch of disjoint edits atomically, all expressed against the
    /// current version. No-op edits are dropped; a batch of only no-ops does
    /// not bump the version.
    pub fn apply_edits(&self, mut edits: Vec<Edit>) -> Result<DocumentChange, EditError> {
        edits.retain(|e| !(e.range.is_empty() && e.text.is_empty()));
        edits.sort_by_key(|e| e.range.start);

        let mut state = self.inner.state.write();
        let before = state.version;

        validate_edits(&state.text, &edits)?;

        if edits.is_empty() {
            return Ok(DocumentChange {
                document: self.inner.id,
                before,
                after: before,
                changes: Vec::new(),
            });
        }

        let old_text = &state.text;
        let mut new_text = String::with_capacity(old_text.len());
        let mut changes = Vec::with_capacity(edits.len());
        let mut cursor = 0;
        let mut delta: isize = 0;

        for edit in &edits {
            new_text.push_str(&old_text[cursor..edit.range.start]);
            new_text.push_str(&edit.text);
            cursor = edit.range.end;

            let new_start = (edit.range.start as isize + delta) as usize;
            changes.push(TextChange {
                old: edit.range,
                new: Span::from_len(new_start, edit.text.len()),
            });
            delta += edit.text.len() as isize - edit.range.len() as isize;
        }
        new_text.push_str(&old_text[cursor..]);

        let after = before.next();
        self.inner.history.steps.write().push(Arc::from(changes.clone()));

        state.line_starts = compute_line_starts(&new_text);
        state.text = Arc::from(new_text);
        state.version = after;

        Ok(DocumentChange {
            document: self.inner.id,
            before,
            after,
            changes,
        })
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.inner.id)
            .field("version", &self.version())
            .finish()
    }
}

fn validate_edits(text: &str, edits: &[Edit]) -> Result<(), EditError> {
    let mut previous_end = 0;
    for edit in edits {
        let Span { start, end } = edit.range;
        if end > text.len() {
            return Err(EditError::OutOfBounds {
                start,
                end,
                len: text.len(),
            });
        }
        for offset in [start, end] {
            if !text.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        if start < previous_end {
            return Err(EditError::Overlapping(start));
        }
        previous_end = end;
    }
    Ok(())
}

fn compute_line_starts(text: &str) -> Arc<[usize]> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// Immutable view of a document at one version.
#[derive(Clone)]
pub struct Snapshot {
    version: TextVersion,
    text: Arc<str>,
    line_starts: Arc<[usize]>,
    history: Arc<History>,
}

impl Snapshot {
    pub fn version(&self) -> TextVersion {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The whole text as a span.
    pub fn extent(&self) -> Span {
        Span::new(0, self.text.len())
    }

    /// Text under `span`, clamped to the snapshot.
    pub fn slice(&self, span: Span) -> &str {
        let end = span.end.min(self.text.len());
        let start = span.start.min(end);
        &self.text[start..end]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Extent of line `index`, excluding its line break.
    pub fn line_extent(&self, index: usize) -> Span {
        let start = self.line_starts[index];
        let end = match self.line_starts.get(index + 1) {
            Some(&next) => {
                let end = next - 1;
                if end > start && self.text.as_bytes()[end - 1] == b'\r' {
                    end - 1
                } else {
                    end
                }
            }
            None => self.text.len(),
        };
        Span::new(start, end)
    }

    /// Line extents (without line breaks), in order.
    pub fn lines(&self) -> impl Iterator<Item = Span> + '_ {
        (0..self.line_count()).map(move |i| self.line_extent(i))
    }

    pub fn line_index_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    pub fn line_extent_containing(&self, offset: usize) -> Span {
        self.line_extent(self.line_index_of(offset))
    }

    /// Carries `span`, measured at version `from`, forward to this snapshot.
    /// Spans from a newer version are clamped rather than rejected.
    pub fn translate_from(&self, from: TextVersion, span: Span, mode: SpanTrackingMode) -> Span {
        if from >= self.version {
            if from == self.version {
                return span;
            }
            let len = self.text.len();
            return Span::new(span.start.min(len), span.end.min(len));
        }

        let steps = self.history.steps.read();
        let range = from.0 as usize..self.version.0 as usize;
        steps[range]
            .iter()
            .fold(span, |span, changes| tracking::translate_span(span, changes, mode))
    }

    pub fn translate(&self, span: VersionedSpan, mode: SpanTrackingMode) -> Span {
        self.translate_from(span.version, span.span, mode)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("version", &self.version)
            .field("len", &self.text.len())
            .finish()
    }
}
