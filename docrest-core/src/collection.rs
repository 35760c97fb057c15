//! Collection handles.
//!
//! A [`Collection`] is the object through which CRUD operations on one collection are
//! performed. It pairs a canonical collection name with a shared reference to the
//! storage backend. Handles are cheap to clone; clones refer to the same collection.
//!
//! Handles are normally obtained from a
//! [`CollectionRegistry`](crate::registry::CollectionRegistry), which keeps one handle
//! per canonical name alive for the lifetime of the registry.
//!
//! # Example
//!
//! ```ignore
//! # async fn example(registry: &docrest_core::registry::CollectionRegistry) -> docrest_core::error::DocumentStoreResult<()> {
//! use bson::doc;
//!
//! let orders = registry.get("orders").await;
//! let inserted = orders.insert(doc! { "status": "open" }).await?;
//! let all = orders.find(None).await?;
//! # Ok(()) }
//! ```

use bson::Document;
use std::sync::Arc;

use crate::{
    backend::DynStoreBackend,
    document::{DocumentId, UpdateAck},
    error::DocumentStoreResult,
    query::QueryFilter,
};

#[derive(Debug)]
struct CollectionInner {
    name: String,
    backend: Arc<dyn DynStoreBackend>,
}

/// A handle to one schemaless collection.
#[derive(Debug, Clone)]
pub struct Collection {
    inner: Arc<CollectionInner>,
}

impl Collection {
    /// Creates a new collection handle (internal use).
    pub(crate) fn new(name: String, backend: Arc<dyn DynStoreBackend>) -> Self {
        Self {
            inner: Arc::new(CollectionInner { name, backend }),
        }
    }

    /// Returns the canonical name of this collection.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether two handles are the same handle, not merely handles to the same name.
    pub fn ptr_eq(&self, other: &Collection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Finds the documents matching `filter`, or every document for `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the query fails.
    pub async fn find(&self, filter: Option<&QueryFilter>) -> DocumentStoreResult<Vec<Document>> {
        self.inner
            .backend
            .find_documents(filter, self.name())
            .await
    }

    /// Fetches one document by identifier; `Ok(None)` when it does not exist.
    pub async fn find_by_id(&self, id: &DocumentId) -> DocumentStoreResult<Option<Document>> {
        self.inner
            .backend
            .find_document_by_id(id, self.name())
            .await
    }

    /// Inserts a new document and returns it as stored, identifier included.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if the insert fails,
    /// for example when the identifier is already taken.
    pub async fn insert(&self, document: Document) -> DocumentStoreResult<Document> {
        self.inner
            .backend
            .insert_document(document, self.name())
            .await
    }

    /// Sets every field of `patch` on the identified document.
    pub async fn update_by_id(
        &self,
        id: &DocumentId,
        patch: Document,
    ) -> DocumentStoreResult<UpdateAck> {
        self.inner
            .backend
            .update_document_by_id(id, patch, self.name())
            .await
    }

    pub async fn remove_by_id(&self, id: &DocumentId) -> DocumentStoreResult<u64> {
        self.inner
            .backend
            .remove_document_by_id(id, self.name())
            .await
    }
}
