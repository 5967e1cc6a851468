//! Infrastructure layer: inventory storage backends and the capacity-checked
//! mutation service built on top of them.

pub mod backpack_service;
pub mod store;


pub use backpack_service::{BackpackError, BackpackService, DEFAULT_MAX_ATTEMPTS};
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError};
