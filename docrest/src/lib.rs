//! HTTP facade of the docrest project.
//!
//! Exposes every collection of a schemaless store as a generic REST surface and serves
//! a static application bundle from the same process. The heavy lifting lives in the
//! sub-crates; this crate wires them to axum.
//!
//! - **Configuration** ([`config`]) - Flags, environment and an optional JSON file
//! - **Routes** ([`routes`]) - The six CRUD endpoints
//! - **Envelopes** ([`envelope`]) - Raw results and `{"error": ...}` failures
//! - **Query parameters** ([`params`]) - Bracket nesting of query-string keys
//! - **Server** ([`server`]) - Backend selection, router assembly, serve loop
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docrest::{config::RouterOptions, routes::AppState, server::build_router};
//! use docrest_core::{naming::Namespace, registry::CollectionRegistry};
//! use docrest_memory::InMemoryStore;
//!
//! let registry = CollectionRegistry::new(Arc::new(InMemoryStore::new()), Namespace::new("shop"));
//! let app = build_router(
//!     AppState::new(Arc::new(registry), RouterOptions::default()),
//!     "/api",
//!     "./app".as_ref(),
//! );
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest;

pub mod config;
pub mod envelope;
pub mod error;
pub mod params;
pub mod routes;
pub mod server;

pub use docrest_memory as memory;
#[cfg(feature = "mongodb")]
pub use docrest_mongodb as mongodb;

pub use error::{Result, ServerError};
