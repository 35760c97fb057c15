//! Process-wide cache of collection handles.
//!
//! The [`CollectionRegistry`] owns the storage backend and hands out one
//! [`Collection`] per canonical name. Handles are built lazily on first reference and are
//! never evicted: the set of collections is controlled by the operator, not by requests.
//!
//! Lookups take a shared read lock; a miss upgrades to the write lock and re-checks
//! before inserting, so concurrent first references to a name agree on one handle.

use std::{collections::HashMap, sync::Arc};

use mea::rwlock::RwLock;

use crate::{
    backend::DynStoreBackend,
    collection::Collection,
    error::DocumentStoreResult,
    naming::Namespace,
};

#[derive(Debug)]
pub struct CollectionRegistry {
    backend: Arc<dyn DynStoreBackend>,
    namespace: Namespace,
    handles: RwLock<HashMap<String, Collection>>,
}

impl CollectionRegistry {
    pub fn new(backend: Arc<dyn DynStoreBackend>, namespace: Namespace) -> Self {
        Self {
            backend,
            namespace,
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the handle for a canonical collection name, creating it on first use.
    pub async fn get(&self, name: &str) -> Collection {
        {
            let handles = self.handles.read().await;
            if let Some(handle) = handles.get(name) {
                return handle.clone();
            }
        }

        let mut handles = self.handles.write().await;
        handles
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(collection = name, "creating collection handle");
                Collection::new(name.to_string(), self.backend.clone())
            })
            .clone()
    }

    /// Resolves a raw URL segment to its canonical name and returns that handle.
    pub async fn resolve(&self, raw: &str) -> Collection {
        self.get(self.namespace.resolve(raw)).await
    }

    /// Lists the canonical names of every collection in the store, in store order.
    pub async fn collection_names(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(self
            .namespace
            .strip_all(self.backend.list_collection_names().await?))
    }

    /// Number of handles created so far.
    pub async fn len(&self) -> usize {
        self.handles.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::Document;

    use crate::{
        backend::StoreBackend,
        document::{DocumentId, UpdateAck},
        query::QueryFilter,
    };

    #[derive(Debug, Default)]
    struct NamesOnly;

    #[async_trait]
    impl StoreBackend for NamesOnly {
        async fn find_documents(&self, _filter: Option<&QueryFilter>, _collection: &str) -> DocumentStoreResult<Vec<Document>> {
            Ok(vec![])
        }

        async fn find_document_by_id(&self, _id: &DocumentId, _collection: &str) -> DocumentStoreResult<Option<Document>> {
            Ok(None)
        }

        async fn insert_document(&self, document: Document, _collection: &str) -> DocumentStoreResult<Document> {
            Ok(document)
        }

        async fn update_document_by_id(&self, _id: &DocumentId, _patch: Document, _collection: &str) -> DocumentStoreResult<UpdateAck> {
            Ok(UpdateAck::new(0, 0))
        }

        async fn remove_document_by_id(&self, _id: &DocumentId, _collection: &str) -> DocumentStoreResult<u64> {
            Ok(0)
        }

        async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>> {
            Ok(vec!["shop.orders".to_string(), "items".to_string()])
        }
    }

    fn registry() -> CollectionRegistry {
        CollectionRegistry::new(Arc::new(NamesOnly), Namespace::new("shop"))
    }

    #[tokio::test]
    async fn repeated_gets_share_one_handle() {
        let registry = registry();

        let first = registry.get("orders").await;
        let second = registry.get("orders").await;

        assert!(first.ptr_eq(&second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn prefixed_segments_resolve_to_the_canonical_handle() {
        let registry = registry();

        let bare = registry.resolve("orders").await;
        let prefixed = registry.resolve("shop.orders").await;

        assert_eq!(prefixed.name(), "orders");
        assert!(bare.ptr_eq(&prefixed));
    }

    #[tokio::test]
    async fn concurrent_first_references_agree() {
        let registry = Arc::new(registry());

        let tasks = (0..16)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.get("items").await })
            })
            .collect::<Vec<_>>();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap());
        }

        assert!(handles.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn collection_names_are_canonical() {
        assert_eq!(registry().collection_names().await.unwrap(), vec!["orders", "items"]);
    }
}
