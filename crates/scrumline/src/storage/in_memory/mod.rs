//! In-memory storage backend.
//!
//! All data lives in RAM in `HashMap`s and is lost when the process exits.
//! Suitable for tests, development and examples; the production relational
//! store is an external collaborator reached through the same
//! [`BoardStore`] trait.
//!
//! # Thread Safety and Atomicity
//!
//! The inner structure is wrapped in `Arc<tokio::sync::Mutex<_>>`. Every
//! trait method holds the lock for its whole body, which makes each
//! operation a transaction boundary: in particular a bulk
//! `apply_order_patches` validates every row before writing any, so a
//! concurrent reader can never observe a partially renumbered bucket.

mod inner;
mod trait_impl;

use crate::storage::BoardStore;
use inner::InMemoryStoreInner;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe in-memory store.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

/// Create a new, empty in-memory store.
pub fn new_in_memory_store() -> Box<dyn BoardStore> {
    Box::new(Arc::new(Mutex::new(InMemoryStoreInner::new())))
}
