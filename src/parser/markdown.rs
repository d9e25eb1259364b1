use super::{finish, NaturalTextClassifier};
use crate::document::{NormalizedSpans, Snapshot, Span, TextVersion};
use crate::error::CollaboratorError;
use parking_lot::Mutex;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::sync::Arc;

/// Markdown prose: text events outside code blocks, inline code and HTML.
pub struct MarkdownClassifier {
    cache: Mutex<Option<(TextVersion, Arc<NormalizedSpans>)>>,
}

impl MarkdownClassifier {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(None),
        }
    }

    fn regions(&self, snapshot: &Snapshot) -> Arc<NormalizedSpans> {
        let mut cache = self.cache.lock();
        if let Some((version, spans)) = cache.as_ref() {
            if *version == snapshot.version() {
                return Arc::clone(spans);
            }
        }

        let spans = Arc::new(parse(snapshot.text()));
        *cache = Some((snapshot.version(), Arc::clone(&spans)));
        spans
    }
}

impl Default for MarkdownClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NaturalTextClassifier for MarkdownClassifier {
    fn classify(&self, snapshot: &Snapshot, span: Span) -> Result<NormalizedSpans, CollaboratorError> {
        Ok(finish(snapshot, &self.regions(snapshot), span))
    }
}

fn parse(content: &str) -> NormalizedSpans {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut in_code_block = false;
    let mut regions = Vec::new();

    for (event, range) in Parser::new_ext(content, options).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => in_code_block = false,
            Event::Text(text) if !in_code_block => {
                // escapes and entities are reported with their decoded text,
                // so only take ranges that still match the source
                if content.get(range.clone()) == Some(&*text) {
                    regions.push(Span::new(range.start, range.end));
                }
            }
            _ => {}
        }
    }

    regions.into_iter().collect()
}
