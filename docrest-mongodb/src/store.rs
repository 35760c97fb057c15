use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::ClientOptions,
};
use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::{DocumentId, ID_FIELD, UpdateAck, display_id, ensure_id},
    error::{DocumentStoreError, DocumentStoreResult},
    query::QueryFilter,
};

use crate::query::MongoQueryTranslator;

const DUPLICATE_KEY: i32 = 11000;


#[derive(Debug, Clone)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

fn backend_error(err: MongoError) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn find_documents(&self, filter: Option<&QueryFilter>, collection: &str) -> DocumentStoreResult<Vec<Document>> {
        let filter = match filter {
            Some(filter) => MongoQueryTranslator.translate(filter)?,
            None => doc! {},
        };

        self.get_collection(collection)
            .find(filter)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn find_document_by_id(&self, id: &DocumentId, collection: &str) -> DocumentStoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(doc! { ID_FIELD: id.to_bson() })
            .await
            .map_err(backend_error)
    }

    async fn insert_document(&self, document: Document, collection: &str) -> DocumentStoreResult<Document> {
        let document = ensure_id(document);

        self.get_collection(collection)
            .insert_one(&document)
            .await
            .map_err(|err| match is_duplicate_key(&err) {
                true => DocumentStoreError::DocumentAlreadyExists(
                    document
                        .get(ID_FIELD)
                        .map(display_id)
                        .unwrap_or_default(),
                    collection.to_string(),
                ),
                false => backend_error(err),
            })?;

        Ok(document)
    }

    async fn update_document_by_id(&self, id: &DocumentId, patch: Document, collection: &str) -> DocumentStoreResult<UpdateAck> {
        let result = self.get_collection(collection)
            .update_one(
                doc! { ID_FIELD: id.to_bson() },
                doc! { "$set": patch },
            )
            .await
            .map_err(backend_error)?;

        Ok(UpdateAck::new(result.matched_count, result.modified_count))
    }

    async fn remove_document_by_id(&self, id: &DocumentId, collection: &str) -> DocumentStoreResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_one(doc! { ID_FIELD: id.to_bson() })
                .await
                .map_err(backend_error)?
                .deleted_count
        )
    }

    async fn list_collection_names(&self) -> DocumentStoreResult<Vec<String>> {
        self.client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error)
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Parses the connection string and creates the client.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the first
    /// operation rather than here.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}
