//! Read model: a character joined with its backpack and titles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use satchel_core::{CharacterId, ItemId, TitleId};

use crate::character::Weight;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterProfile {
    pub character_id: CharacterId,
    pub first_name: String,
    pub last_name: String,
    pub current_weight: Weight,
    pub max_weight: Weight,
    /// Backpack entries in insertion order.
    pub backpack: Vec<BackpackLine>,
    /// Title grants ordered by acquisition time.
    pub titles: Vec<TitleLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackpackLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub item_weight: Weight,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleLine {
    pub title_id: TitleId,
    pub title: String,
    pub acquired_at: DateTime<Utc>,
}

impl CharacterProfile {
    /// Weight of everything listed in the backpack (weight × amount per line).
    ///
    /// Not necessarily equal to `current_weight`: seeded characters start with
    /// a recorded weight that is independent of their seeded entries.
    pub fn backpack_weight(&self) -> u64 {
        self.backpack
            .iter()
            .map(|l| u64::from(l.item_weight) * u64::from(l.amount))
            .sum()
    }

    /// Number of entries for `item_id` (not the summed amount).
    pub fn entries_of(&self, item_id: ItemId) -> usize {
        self.backpack.iter().filter(|l| l.item_id == item_id).count()
    }
}
