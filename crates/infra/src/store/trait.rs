use std::sync::Arc;

use thiserror::Error;

use satchel_core::{CharacterId, ExpectedVersion, ItemId};
use satchel_inventory::{CarryState, CharacterProfile, Weight};

/// Inventory store operation error.
///
/// These are infrastructure errors. "Record not found" is not one of them:
/// lookups return `Option`/`bool` and the caller decides what absence means.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record changed since it was read (stale `ExpectedVersion`).
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The backend failed; nothing was written.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Durable record of characters, items, titles and their relations.
///
/// ## Write path
///
/// `apply_inventory_addition` is the only mutation. It must be all-or-nothing:
/// either the weight is updated, the version bumped and every entry inserted,
/// or the store is left exactly as it was. Readers must never observe one half
/// without the other.
///
/// ## Optimistic concurrency
///
/// Every character carries a version. A writer passes the version it decided
/// against; if the stored version differs the write is refused with
/// `StoreError::Concurrency`.
///
/// ## Existence checks
///
/// `BackpackService` learns existence from `carry_state`/`item_weight`
/// returning `None`, which saves a round trip per id. `character_exists` and
/// `item_exists` are for callers that need the check without the data.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn character_exists(&self, character_id: CharacterId) -> Result<bool, StoreError>;

    async fn item_exists(&self, item_id: ItemId) -> Result<bool, StoreError>;

    /// Character joined with its backpack entries and title grants.
    async fn character_profile(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterProfile>, StoreError>;

    /// Current weight, max weight and version of a character.
    async fn carry_state(&self, character_id: CharacterId) -> Result<Option<CarryState>, StoreError>;

    async fn item_weight(&self, item_id: ItemId) -> Result<Option<Weight>, StoreError>;

    /// Atomically set the character's weight to `new_current_weight` and add one
    /// amount-1 backpack entry per id in `item_ids` (duplicates stay separate).
    async fn apply_inventory_addition(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
        new_current_weight: Weight,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn character_exists(&self, character_id: CharacterId) -> Result<bool, StoreError> {
        (**self).character_exists(character_id).await
    }

    async fn item_exists(&self, item_id: ItemId) -> Result<bool, StoreError> {
        (**self).item_exists(item_id).await
    }

    async fn character_profile(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterProfile>, StoreError> {
        (**self).character_profile(character_id).await
    }

    async fn carry_state(&self, character_id: CharacterId) -> Result<Option<CarryState>, StoreError> {
        (**self).carry_state(character_id).await
    }

    async fn item_weight(&self, item_id: ItemId) -> Result<Option<Weight>, StoreError> {
        (**self).item_weight(item_id).await
    }

    async fn apply_inventory_addition(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
        new_current_weight: Weight,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        (**self)
            .apply_inventory_addition(character_id, item_ids, new_current_weight, expected_version)
            .await
    }
}
