//! Inventory storage boundary.
//!
//! One trait, two backends: an in-memory store for tests/dev and a Postgres
//! store for deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{InventoryStore, StoreError};
