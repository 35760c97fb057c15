//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that stores documents as BSON
//! documents per collection, guarded by an async-safe read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::Document;

use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{DocumentId, ID_FIELD, UpdateAck, display_id, ensure_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::QueryFilter,
};

use crate::evaluator::DocumentEvaluator;

type CollectionDocs = Vec<Document>;
type StoreMap = HashMap<String, CollectionDocs>;


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait to provide a fully functional
/// document store that operates entirely in memory using async-aware read-write locks.
/// Documents keep their insertion order within a collection; collections are created on
/// first insert, as MongoDB does.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Queries and identifier lookups scan the collection (no indexing). It is meant for
/// development and tests.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest_core::backend::StoreBackend;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = InMemoryStore::new();
///
///     let inserted = store.insert_document(doc! { "name": "Alice", "age": 30 }, "users").await?;
///     let docs = store.find_documents(None, "users").await?;
///     assert_eq!(docs, vec![inserted]);
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// The main storage map: collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn position_of(documents: &[Document], id: &DocumentId) -> Option<usize> {
    documents
        .iter()
        .position(|doc| doc.get(ID_FIELD).is_some_and(|value| id.matches(value)))
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn find_documents(&self, filter: Option<&QueryFilter>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let documents = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        match filter {
            Some(filter) if !filter.is_empty() => DocumentEvaluator::filter_documents(documents, filter),
            _ => Ok(documents.clone()),
        }
    }

    async fn find_document_by_id(&self, id: &DocumentId, collection: &str) -> DocumentStoreResult<Option<Document>> {
        let store = self.store.read().await;

        Ok(
            store
                .get(collection)
                .and_then(|documents| position_of(documents, id).map(|index| documents[index].clone()))
        )
    }

    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<Document> {
        let document = ensure_id(document);

        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        if let Some(id) = document.get(ID_FIELD) {
            if documents.iter().any(|doc| doc.get(ID_FIELD) == Some(id)) {
                return Err(DocumentStoreError::DocumentAlreadyExists(
                    display_id(id),
                    collection.to_string(),
                ));
            }
        }

        documents.push(document.clone());

        Ok(document)
    }

    async fn update_document_by_id(&self, id: &DocumentId, patch: Document, collection: &str) -> DocumentStoreResult<UpdateAck> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(UpdateAck::new(0, 0));
        };
        let Some(index) = position_of(documents, id) else {
            return Ok(UpdateAck::new(0, 0));
        };
        let document = &mut documents[index];

        if let Some(new_id) = patch.get(ID_FIELD) {
            if document.get(ID_FIELD) != Some(new_id) {
                return Err(DocumentStoreError::InvalidDocument(
                    "the _id field is immutable".to_string(),
                ));
            }
        }

        let mut modified = false;

        for (field, value) in patch {
            if document.get(&field) != Some(&value) {
                modified = true;
                document.insert(field, value);
            }
        }

        Ok(UpdateAck::new(1, u64::from(modified)))
    }

    async fn remove_document_by_id(&self, id: &DocumentId, collection: &str) -> DocumentStoreResult<u64> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(0);
        };

        match position_of(documents, id) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest_core::backend::StoreBackendBuilder;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder().build().await.unwrap();
/// }
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_an_object_id_first() {
        let store = InMemoryStore::new();

        let inserted = store.insert_document(doc! { "v": 7 }, "items").await.unwrap();

        assert_eq!(inserted.keys().next().map(String::as_str), Some(ID_FIELD));
        assert!(matches!(inserted.get(ID_FIELD), Some(Bson::ObjectId(_))));
        assert_eq!(inserted.get_i32("v").unwrap(), 7);
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1" }, "items").await.unwrap();

        let err = store.insert_document(doc! { "_id": "1" }, "items").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(id, col) if id == "1" && col == "items"));
    }

    #[tokio::test]
    async fn unknown_ids_find_nothing() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1" }, "items").await.unwrap();

        let found = store.find_document_by_id(&DocumentId::parse("2"), "items").await.unwrap();
        assert_eq!(found, None);
        let found = store.find_document_by_id(&DocumentId::parse("1"), "nowhere").await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn updates_merge_set_fields_only() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1", "a": 1, "b": 2 }, "items").await.unwrap();

        let ack = store
            .update_document_by_id(&DocumentId::parse("1"), doc! { "b": 3, "c": 4 }, "items")
            .await
            .unwrap();
        assert_eq!(ack, UpdateAck::new(1, 1));

        let stored = store.find_document_by_id(&DocumentId::parse("1"), "items").await.unwrap();
        assert_eq!(stored, Some(doc! { "_id": "1", "a": 1, "b": 3, "c": 4 }));
    }

    #[tokio::test]
    async fn updates_report_unchanged_and_missing_documents() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1", "a": 1 }, "items").await.unwrap();

        let same = store
            .update_document_by_id(&DocumentId::parse("1"), doc! { "a": 1 }, "items")
            .await
            .unwrap();
        let missing = store
            .update_document_by_id(&DocumentId::parse("9"), doc! { "a": 1 }, "items")
            .await
            .unwrap();

        assert_eq!(same, UpdateAck::new(1, 0));
        assert_eq!(missing, UpdateAck::new(0, 0));
    }

    #[tokio::test]
    async fn the_id_cannot_be_changed() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1" }, "items").await.unwrap();

        let err = store
            .update_document_by_id(&DocumentId::parse("1"), doc! { "_id": "2" }, "items")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_document");
    }

    #[tokio::test]
    async fn remove_reports_how_many_went() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "_id": "1" }, "items").await.unwrap();

        assert_eq!(store.remove_document_by_id(&DocumentId::parse("1"), "items").await.unwrap(), 1);
        assert_eq!(store.remove_document_by_id(&DocumentId::parse("1"), "items").await.unwrap(), 0);
        assert!(store.find_documents(None, "items").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_filters_with_coerced_values() {
        let store = InMemoryStore::new();
        store.insert_document(doc! { "status": "open", "amount": 120 }, "orders").await.unwrap();
        store.insert_document(doc! { "status": "open", "amount": 0 }, "orders").await.unwrap();
        store.insert_document(doc! { "status": "closed", "amount": 5 }, "orders").await.unwrap();

        let params = json!({ "status": "open", "amount": "120" });
        let filter = QueryFilter::from_params(params.as_object().unwrap());
        let found = store.find_documents(Some(&filter), "orders").await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get_i32("amount").unwrap(), 120);
        assert_eq!(store.find_documents(None, "orders").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn collections_appear_on_first_insert() {
        let store = InMemoryStore::new();
        assert!(store.list_collection_names().await.unwrap().is_empty());

        store.insert_document(doc! { "a": 1 }, "orders").await.unwrap();
        assert_eq!(store.list_collection_names().await.unwrap(), vec!["orders"]);
    }
}
