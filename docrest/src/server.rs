//! Store connection, router assembly and the serve loop.

use std::{path::Path, sync::Arc};

use axum::Router;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{info, warn};

use docrest_core::{
    backend::{DynStoreBackend, StoreBackendBuilder},
    naming::Namespace,
    registry::CollectionRegistry,
};
use docrest_memory::InMemoryStore;

use crate::{
    config::{ServerConfig, StoreScheme, StoreUrl},
    error::{Result, ServerError},
    routes::{AppState, api_routes},
};

/// Builds the backend a store URL selects.
pub async fn connect(store: &StoreUrl) -> Result<Arc<dyn DynStoreBackend>> {
    match store.scheme {
        StoreScheme::Memory => Ok(Arc::new(InMemoryStore::builder().build().await?)),
        #[cfg(feature = "mongodb")]
        StoreScheme::MongoDb => Ok(Arc::new(
            docrest_mongodb::MongoDbStore::builder(&store.url, &store.database)
                .build()
                .await?,
        )),
        #[cfg(not(feature = "mongodb"))]
        StoreScheme::MongoDb => Err(ServerError::Config(
            "this build has no MongoDB support (enable the mongodb feature)".to_string(),
        )),
    }
}

/// The CRUD surface under `api_path`, with every other path served from `app_path`.
pub fn build_router(state: AppState, api_path: &str, app_path: &Path) -> Router {
    Router::new()
        .merge(api_routes(api_path))
        .with_state(state)
        .fallback_service(ServeDir::new(app_path))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let backend = connect(&config.store).await?;
    let registry = CollectionRegistry::new(backend, Namespace::new(config.store.database.clone()));
    let state = AppState::new(Arc::new(registry), config.options);

    let app = build_router(state, &config.api_path, &config.app_path);

    let listener = TcpListener::bind(config.socket_addr())
        .await
        .map_err(|e| ServerError::Config(format!("cannot listen on {}: {e}", config.socket_addr())))?;

    info!(
        addr = %listener.local_addr()?,
        database = %config.store.database,
        api = %config.api_path,
        app = %config.app_path.display(),
        "docrest listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
