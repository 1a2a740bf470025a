//! Documents and the document-source collaborator contract.
//!
//! The engine never owns document content: an external repository does.
//! [`DocumentSource`] is the narrow read-only contract the engine consumes;
//! [`InMemoryDocumentStore`] is the bundled implementation used by tests
//! and by callers embedding the engine without their own storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A searchable document.
///
/// The engine only ever reads a document; mutation is the owning
/// repository's business. `indexed` reflects the repository's view of
/// whether the document has been handed to an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: u64,
    /// Title text; weighted above body text by the default ranking.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the owning repository considers this document indexed.
    pub indexed: bool,
}

impl Document {
    /// Create a document stamped with the current time.
    pub fn new<T: Into<String>, B: Into<String>>(id: u64, title: T, body: B) -> Self {
        Document {
            id,
            title: title.into(),
            body: body.into(),
            created_at: Utc::now(),
            indexed: false,
        }
    }
}

/// Read-only access to the document collection.
pub trait DocumentSource: Send + Sync {
    /// Every document, ordered by id.
    fn get_all(&self) -> Vec<Document>;

    /// A single document, if present.
    fn get_by_id(&self, id: u64) -> Option<Document>;
}

/// A thread-safe in-memory document repository.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<u64, Document>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        InMemoryDocumentStore {
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert or replace a document.
    pub fn add(&self, document: Document) {
        self.documents.write().insert(document.id, document);
    }

    /// Remove a document, returning it if it existed.
    pub fn remove(&self, id: u64) -> Option<Document> {
        self.documents.write().remove(&id)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// True when the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl DocumentSource for InMemoryDocumentStore {
    fn get_all(&self) -> Vec<Document> {
        self.documents.read().values().cloned().collect()
    }

    fn get_by_id(&self, id: u64) -> Option<Document> {
        self.documents.read().get(&id).cloned()
    }
}
