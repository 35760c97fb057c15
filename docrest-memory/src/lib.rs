//! In-memory document storage backend for docrest.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and tests. `memory://<database>` store URLs select it.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Schemaless storage** - Stores documents as BSON for flexibility
//! - **MongoDB-style matching** - Equality, array membership, regexes and `$` operators
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use docrest_core::{naming::Namespace, registry::CollectionRegistry, backend::StoreBackendBuilder};
//! use docrest_memory::InMemoryStore;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let registry = CollectionRegistry::new(Arc::new(backend), Namespace::new("shop"));
//!
//!     registry.get("orders").await.insert(doc! { "status": "open" }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
