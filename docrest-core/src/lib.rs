//! Core of the docrest project: everything needed to expose schemaless document
//! collections over a generic REST surface, independent of the HTTP framework and of
//! the store.
//!
//! - **Value coercion** ([`coerce`]) - Turns untyped query-string values into typed filter values
//! - **Query filters** ([`query`]) - Field predicates plus a visitor for backends
//! - **Naming** ([`naming`]) - Strips the `<database>.` prefix from collection names
//! - **Collections** ([`collection`]) - Handles through which one collection is read and written
//! - **Registry** ([`registry`]) - Lazily built, never evicted cache of collection handles
//! - **Store backend abstraction** ([`backend`]) - The narrow driver interface backends implement
//! - **Documents** ([`document`]) - Identifiers, update acknowledgements, BSON/JSON conversion
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docrest_core::{naming::Namespace, query::QueryFilter, registry::CollectionRegistry};
//! use serde_json::json;
//!
//! let registry = CollectionRegistry::new(Arc::new(backend), Namespace::new("shop"));
//! let orders = registry.resolve("shop.orders").await;
//!
//! let params = json!({ "status": "open" });
//! let open = orders.find(Some(&QueryFilter::from_params(params.as_object().unwrap()))).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_core;

pub mod backend;
pub mod coerce;
pub mod collection;
pub mod document;
pub mod error;
pub mod naming;
pub mod query;
pub mod registry;
