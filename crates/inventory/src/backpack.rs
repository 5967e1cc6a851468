//! Relations between characters and catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use satchel_core::{CharacterId, ItemId, TitleId};

/// One record of a quantity of an item held by a character.
///
/// Entries are never merged: picking up the same item twice yields two
/// entries of amount 1, not one entry of amount 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackEntry {
    pub character_id: CharacterId,
    pub item_id: ItemId,
    pub amount: u32,
}

impl BackpackEntry {
    /// The entry created by a single pickup.
    pub fn single(character_id: CharacterId, item_id: ItemId) -> Self {
        Self {
            character_id,
            item_id,
            amount: 1,
        }
    }
}

/// A title held by a character since `acquired_at`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleGrant {
    pub character_id: CharacterId,
    pub title_id: TitleId,
    pub acquired_at: DateTime<Utc>,
}
