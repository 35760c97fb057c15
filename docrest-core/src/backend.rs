//! Storage backend abstraction for the document store.
//!
//! This module defines the narrow driver interface the REST layer consumes, so the same
//! routes can run against MongoDB, the in-memory store, or anything else that can find,
//! insert, set-merge and remove schemaless documents.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use docrest_core::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//!
//! let inserted = backend.insert_document(doc! { "name": "Alice" }, "users").await?;
//! let all = backend.find_documents(None, "users").await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    document::{DocumentId, UpdateAck},
    error::DocumentStoreResult,
    query::QueryFilter,
};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. The backend, not the collection handle, owns connection state, so any
/// number of handles may share one backend.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Implementations surface a failure once and never retry on their own.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Finds the documents of a collection matching every predicate of `filter`.
    ///
    /// `None` matches every document. A collection that does not exist yields an
    /// empty result.
    async fn find_documents(
        &self,
        filter: Option<&QueryFilter>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Fetches a single document by its identifier.
    ///
    /// Returns `Ok(None)` when no document has that identifier.
    async fn find_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Inserts a new document, creating the collection on first use.
    ///
    /// A document without an `_id` is assigned a generated one. The returned document
    /// is the stored one, identifier included.
    async fn insert_document(
        &self,
        document: Document,
        collection: &str,
    ) -> DocumentStoreResult<Document>;

    /// Merges the fields of `patch` into the document with the given identifier.
    ///
    /// Each field of the patch replaces the same-named stored field; fields absent from
    /// the patch are left untouched. Updating an unknown identifier matches nothing and
    /// is not an error.
    async fn update_document_by_id(
        &self,
        id: &DocumentId,
        patch: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateAck>;

    /// Removes the document with the given identifier, returning how many were removed.
    async fn remove_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<u64>;

    /// Lists the names of all collections, as the store reports them.
    async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>>;
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn find_documents(
        &self,
        filter: Option<&QueryFilter>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>>;
    async fn find_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>>;
    async fn insert_document(
        &self,
        document: Document,
        collection: &str,
    ) -> DocumentStoreResult<Document>;
    async fn update_document_by_id(
        &self,
        id: &DocumentId,
        patch: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateAck>;
    async fn remove_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<u64>;
    async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn find_documents(
        &self,
        filter: Option<&QueryFilter>,
        collection: &str,
    ) -> DocumentStoreResult<Vec<Document>> {
        StoreBackend::find_documents(self, filter, collection)
            .await
    }

    async fn find_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<Option<Document>> {
        StoreBackend::find_document_by_id(self, id, collection)
            .await
    }

    async fn insert_document(
        &self,
        document: Document,
        collection: &str,
    ) -> DocumentStoreResult<Document> {
        StoreBackend::insert_document(self, document, collection)
            .await
    }

    async fn update_document_by_id(
        &self,
        id: &DocumentId,
        patch: Document,
        collection: &str,
    ) -> DocumentStoreResult<UpdateAck> {
        StoreBackend::update_document_by_id(self, id, patch, collection)
            .await
    }

    async fn remove_document_by_id(
        &self,
        id: &DocumentId,
        collection: &str,
    ) -> DocumentStoreResult<u64> {
        StoreBackend::remove_document_by_id(self, id, collection)
            .await
    }

    async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>> {
        StoreBackend::list_collection_names(self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
