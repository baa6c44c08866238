//! In-memory indexed store for tree-structured items.
//!
//! Items live in a flat, insertion-ordered collection. Each carries an
//! identifier, an optional parent identifier, a label and arbitrary extra
//! attributes. The [`TreeStore`] keeps an identifier index and a
//! parent-to-children index alongside the collection, giving O(1) lookups
//! and cascading subtree operations.

pub mod domain;
pub use domain::{Config, Item, ItemId, ItemUpdate, StoreError, TreeStore};

pub mod storage;
pub use storage::{Format, LoadError};
