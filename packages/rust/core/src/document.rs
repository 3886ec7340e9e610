//! Immutable documents flowing through pipelines.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;
use uuid::Uuid;

use crate::metadata::Metadata;

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// A UUID v7 document identifier (time-sortable). Fresh for every document,
/// including clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Uuid);

impl DocumentId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One unit of content plus its metadata scope.
///
/// `Document` is a cheap handle: cloning it (with `Clone`) shares the same
/// instance and keeps the same [`DocumentId`]. To change content or metadata
/// build a new document with [`Document::clone_with`].
#[derive(Debug, Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

#[derive(Debug)]
struct DocumentInner {
    id: DocumentId,
    content: Option<String>,
    metadata: Arc<Metadata>,
}

impl Document {
    /// Build a document from optional content and a metadata scope.
    pub fn new(content: Option<String>, metadata: Metadata) -> Self {
        Self::from_parts(content, Arc::new(metadata))
    }

    /// Build a document with text content.
    pub fn with_content(content: impl Into<String>, metadata: Metadata) -> Self {
        Self::new(Some(content.into()), metadata)
    }

    fn from_parts(content: Option<String>, metadata: Arc<Metadata>) -> Self {
        Self {
            inner: Arc::new(DocumentInner {
                id: DocumentId::new(),
                content,
                metadata,
            }),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.inner.id
    }

    /// The content, or `None` when the document has none.
    pub fn content(&self) -> Option<&str> {
        self.inner.content.as_deref()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// Shorthand for `self.metadata().get(key)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.metadata.get(key)
    }

    /// A new document with `content` and metadata layered as `overrides` on
    /// top of this document's metadata.
    pub fn clone_with<I, K, V>(&self, content: impl Into<String>, overrides: I) -> Document
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.clone_with_content(Some(content.into()), overrides)
    }

    /// Like [`Document::clone_with`], but the new content may be absent.
    pub fn clone_with_content<I, K, V>(&self, content: Option<String>, overrides: I) -> Document
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let metadata = Metadata::overlay(Arc::clone(&self.inner.metadata), overrides);
        Self::from_parts(content, Arc::new(metadata))
    }

    /// A new document with the same content and `overrides` layered on top.
    pub fn clone_metadata<I, K, V>(&self, overrides: I) -> Document
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.clone_with_content(self.inner.content.clone(), overrides)
    }

    /// Whether both handles point at the same instance.
    pub fn ptr_eq(a: &Document, b: &Document) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

/// No overrides, for clones that only change content.
pub fn no_overrides() -> std::iter::Empty<(String, Value)> {
    std::iter::empty()
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Document {}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Document", 3)?;
        state.serialize_field("id", &self.inner.id.to_string())?;
        state.serialize_field("content", &self.inner.content)?;
        state.serialize_field("metadata", &self.inner.metadata.to_json())?;
        state.end()
    }
}
