//! Immutable catalog records: items and titles.

use serde::{Deserialize, Serialize};

use satchel_core::{DomainError, DomainResult, Entity, ItemId, TitleId};

use crate::character::Weight;

/// Something a character can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    name: String,
    weight: Weight,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, weight: Weight) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        Ok(Self { id, name, weight })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// An achievement a character can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    id: TitleId,
    name: String,
}

impl Title {
    pub fn new(id: TitleId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("title name cannot be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Title {
    type Id = TitleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
