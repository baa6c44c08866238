//! Domain models for the tree store.
//!
//! This module contains the item record, its identifier type, the store
//! configuration and the indexed store itself.

/// Item records and partial updates.
pub mod item;
pub use item::{Item, ItemUpdate};

/// Item identifiers.
pub mod item_id;
pub use item_id::ItemId;

mod config;
pub use config::Config;

pub mod store;
pub use store::{StoreError, TreeStore};
