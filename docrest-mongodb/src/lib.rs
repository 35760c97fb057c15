//! MongoDB backend implementation for docrest.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait. Filters
//! are translated into native MongoDB queries and updates into `$set` merges, so the
//! server does all matching.
//!
//! It is enabled by the `mongodb` feature of the `docrest` crate (on by default) and
//! selected by `mongodb://` and `mongodb+srv://` store URLs.
//!
//! # Example
//!
//! ```ignore
//! use docrest_core::backend::StoreBackendBuilder;
//! use docrest_mongodb::MongoDbStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbStore::builder("mongodb://localhost:27017/shop", "shop")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrest_mongodb;

pub mod store;
pub mod query;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
