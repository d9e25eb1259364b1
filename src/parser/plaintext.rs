use super::{finish, NaturalTextClassifier};
use crate::document::{NormalizedSpans, Snapshot, Span};
use crate::error::CollaboratorError;

/// Treats everything except URLs as natural text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextClassifier;

impl NaturalTextClassifier for PlainTextClassifier {
    fn classify(&self, snapshot: &Snapshot, span: Span) -> Result<NormalizedSpans, CollaboratorError> {
        Ok(finish(snapshot, &NormalizedSpans::single(snapshot.extent()), span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_plain_text_is_all_natural() {
        let doc = Document::new("Hello world!\nThis is a test.");
        let snapshot = doc.snapshot();
        let spans = PlainTextClassifier
            .classify(&snapshot, snapshot.line_extent(1))
            .unwrap();
        assert_eq!(spans.as_slice(), &[Span::new(13, 28)]);
    }

    #[test]
    fn test_request_past_the_end_is_clipped() {
        let doc = Document::new("short");
        let snapshot = doc.snapshot();
        let spans = PlainTextClassifier.classify(&snapshot, Span::new(3, 50)).unwrap();
        assert_eq!(spans.as_slice(), &[Span::new(3, 5)]);
    }

    #[test]
    fn test_url_only_line_has_no_natural_text() {
        let doc = Document::new("www.example.com");
        let snapshot = doc.snapshot();
        assert!(PlainTextClassifier
            .classify(&snapshot, snapshot.extent())
            .unwrap()
            .is_empty());
    }
}
