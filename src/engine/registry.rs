use super::session::{SessionBuilder, SpellingSession};
use crate::dict::DictionaryEvent;
use crate::document::{Document, DocumentId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::io;
use std::sync::Arc;
use tracing::debug;

/// Open spelling sessions, one per document.
///
/// The first caller to ask for a document attaches its session; closing the
/// document drops it, which stops its background threads once the last
/// outstanding handle is gone.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<DocumentId, Arc<SpellingSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `document`, attaching one configured by `configure`
    /// if none is open.
    ///
    /// The session is attached outside the map's locks, so `configure` may
    /// use the registry. If two callers race, the first one registered wins
    /// and the other's session is dropped.
    pub fn get_or_attach<F>(&self, document: &Document, configure: F) -> io::Result<Arc<SpellingSession>>
    where
        F: FnOnce(Document) -> SessionBuilder,
    {
        if let Some(existing) = self.get(document.id()) {
            return Ok(existing);
        }

        let session = Arc::new(configure(document.clone()).attach()?);
        let registered = match self.sessions.entry(document.id()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                debug!(document = ?document.id(), "session registered");
                Arc::clone(entry.insert(Arc::clone(&session)).value())
            }
        };
        Ok(registered)
    }

    pub fn get(&self, id: DocumentId) -> Option<Arc<SpellingSession>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Forgets the session for `id`. Returns whether one was open.
    pub fn close(&self, id: DocumentId) -> bool {
        let removed = self.sessions.remove(&id).is_some();
        if removed {
            debug!(document = ?id, "session closed");
        }
        removed
    }

    /// Forwards a dictionary change to every open session.
    pub fn dictionary_changed(&self, event: &DictionaryEvent) {
        for entry in self.sessions.iter() {
            entry.value().dictionary_changed(event);
        }
    }

    pub fn configuration_changed(&self) {
        for entry in self.sessions.iter() {
            entry.value().configuration_changed();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
