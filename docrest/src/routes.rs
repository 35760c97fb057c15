//! The generic CRUD surface.
//!
//! Every collection is reachable under the API root without being declared first:
//!
//! | Method | Path | Answer |
//! |---|---|---|
//! | GET | `{api}` | canonical collection names |
//! | GET | `{api}/{name}` | documents matching the coerced query parameters |
//! | POST | `{api}/{name}` | the inserted document |
//! | GET | `{api}/{name}/{id}` | the document, or `null` |
//! | PUT | `{api}/{name}/{id}` | the store's update acknowledgement |
//! | DELETE | `{api}/{name}/{id}` | the document as it was before removal, or `null` |

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{FromRequest, Path, Query, Request, State},
    http::header,
    routing::get,
};
use bson::Document;
use serde_json::Value;
use tracing::{debug, warn};

use docrest_core::{
    document::{DocumentId, document_from_json_value, document_to_json},
    error::DocumentStoreError,
    query::QueryFilter,
    registry::CollectionRegistry,
};

use crate::{
    config::RouterOptions,
    envelope::Envelope,
    error::{Result, ServerError},
    params,
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<CollectionRegistry>,
    pub options: RouterOptions,
}

impl AppState {
    pub fn new(registry: Arc<CollectionRegistry>, options: RouterOptions) -> Self {
        Self { registry, options }
    }

    fn reply(&self, operation: &'static str, result: Result<Value>) -> Envelope {
        match result {
            Ok(value) => Envelope::success(value),
            Err(err) => {
                warn!(operation, kind = err.kind(), error = %err, "request failed");
                Envelope::failure(&err, self.options.error_status)
            }
        }
    }
}

/// Routes of the CRUD surface rooted at a normalized API path.
pub fn api_routes(api_path: &str) -> Router<AppState> {
    let base = api_path.trim_end_matches('/');
    let root = match base.is_empty() {
        true => "/",
        false => base,
    };

    let router = Router::new().route(root, get(list_collections));
    let router = match base.is_empty() {
        true => router,
        false => router.route(&format!("{base}/"), get(list_collections)),
    };

    router
        .route(
            &format!("{base}/{{name}}"),
            get(list_documents).post(create_document),
        )
        .route(
            &format!("{base}/{{name}}/{{id}}"),
            get(read_document)
                .put(update_document)
                .delete(delete_document),
        )
}

/// A request body read as a document: a JSON object or a URL-encoded form.
#[derive(Debug)]
pub struct DocumentBody(pub Document);

impl<S> FromRequest<S> for DocumentBody
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/x-www-form-urlencoded"));

        let value = match is_form {
            true => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
                Value::Object(params::parse_pairs(
                    pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())),
                ))
            }
            false => {
                let Json(value) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
                value
            }
        };

        Ok(DocumentBody(document_from_json_value(&value)?))
    }
}

async fn list_collections(State(state): State<AppState>) -> Envelope {
    let names = state.registry.collection_names().await;

    state.reply("list_collections", names.map(Value::from).map_err(ServerError::from))
}

/// Store failures answer with an empty list rather than an error envelope.
async fn list_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Envelope {
    let collection = state.registry.resolve(&name).await;
    let params = params::parse_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())));

    let filter = match params.is_empty() {
        true => None,
        false => {
            let filter = QueryFilter::from_params(&params);
            debug!(collection = collection.name(), filter = ?filter, "built query filter");
            Some(filter)
        }
    };

    match collection.find(filter.as_ref()).await {
        Ok(documents) => Envelope::success(
            documents
                .iter()
                .map(document_to_json)
                .collect::<Vec<_>>(),
        ),
        Err(err) => {
            warn!(collection = collection.name(), error = %err, "listing documents failed");
            Envelope::success(Value::Array(vec![]))
        }
    }
}

async fn create_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Result<DocumentBody>,
) -> Envelope {
    let result = create(&state, &name, body).await;
    state.reply("create", result)
}

async fn read_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Envelope {
    let result = read(&state, &name, &id).await;
    state.reply("read", result)
}

async fn update_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: Result<DocumentBody>,
) -> Envelope {
    let result = update(&state, &name, &id, body).await;
    state.reply("update", result)
}

async fn delete_document(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Envelope {
    let result = delete(&state, &name, &id).await;
    state.reply("delete", result)
}

async fn create(state: &AppState, name: &str, body: Result<DocumentBody>) -> Result<Value> {
    let DocumentBody(document) = body?;
    let collection = state.registry.resolve(name).await;

    Ok(document_to_json(&collection.insert(document).await?))
}

async fn read(state: &AppState, name: &str, id: &str) -> Result<Value> {
    let collection = state.registry.resolve(name).await;
    let id = DocumentId::parse(id);

    match collection.find_by_id(&id).await? {
        Some(document) => Ok(document_to_json(&document)),
        None if state.options.strict_not_found => Err(
            DocumentStoreError::DocumentNotFound(id.to_string(), collection.name().to_string()).into(),
        ),
        None => Ok(Value::Null),
    }
}

async fn update(state: &AppState, name: &str, id: &str, body: Result<DocumentBody>) -> Result<Value> {
    let DocumentBody(patch) = body?;
    let collection = state.registry.resolve(name).await;
    let ack = collection.update_by_id(&DocumentId::parse(id), patch).await?;

    serde_json::to_value(ack).map_err(|e| DocumentStoreError::from(e).into())
}

async fn delete(state: &AppState, name: &str, id: &str) -> Result<Value> {
    let collection = state.registry.resolve(name).await;
    let id = DocumentId::parse(id);

    let existing = collection.find_by_id(&id).await?;
    collection.remove_by_id(&id).await?;

    Ok(existing
        .as_ref()
        .map(document_to_json)
        .unwrap_or(Value::Null))
}
