//! `satchel-core` — shared domain primitives.
//!
//! Identifiers, the domain error type and the optimistic concurrency token.
//! Nothing in here performs IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CharacterId, ItemId, TitleId};
pub use version::ExpectedVersion;
