//! Character inventory domain.
//!
//! Records (characters, items, titles and the relations between them) and the
//! carry-capacity rule, implemented purely as deterministic domain logic (no
//! IO, no HTTP, no storage).

pub mod backpack;
pub mod catalog;
pub mod character;
pub mod profile;
pub mod seed;

pub use backpack::{BackpackEntry, TitleGrant};
pub use catalog::{Item, Title};
pub use character::{total_weight, CapacityExceeded, CarryState, Character, Weight};
pub use profile::{BackpackLine, CharacterProfile, TitleLine};
pub use seed::SeedData;
