//! Capacity-checked backpack mutation (application-level orchestration).
//!
//! ## Execution Flow
//!
//! ```text
//! add_items(character, [item, ...])
//!   ↓
//! 0. Empty batch → Ok([]) without touching the store
//!   ↓
//! 1. Read the character's carry state (weight, max, version)
//!   ↓
//! 2. Resolve every item's weight, in request order (fail on the first unknown id)
//!   ↓
//! 3. Admission check: current + Σ weights <= max
//!   ↓
//! 4. Apply: new weight + one entry per item, guarded by the version read in 1
//!   ↓
//! 5. Version moved under us? Back off (jittered), re-run 1..4 against fresh state (bounded)
//! ```
//!
//! Steps 1 to 3 are pure decisions over a snapshot. Only step 4 writes, and it
//! writes everything or nothing, so two requests racing for the same character
//! can never both be admitted against the same starting weight.
//!
//! A refused apply means some other writer committed in between. With `N`
//! writers racing for one character, each can lose at most `N - 1` times, so
//! every admissible request lands as long as `N <= max_attempts`.

use std::time::Duration;

use rand::Rng;
use satchel_core::{CharacterId, ExpectedVersion, ItemId};
use satchel_inventory::{total_weight, CapacityExceeded, CharacterProfile};
use thiserror::Error;
use tracing::instrument;

use crate::store::{InventoryStore, StoreError};

/// Decide/apply rounds per request before reporting contention.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// Backoff before the second attempt; doubles per lost race.
const BASE_BACKOFF_MS: u64 = 2;
/// Cap on a single backoff.
const MAX_BACKOFF_MS: u64 = 100;

/// Full-jitter exponential backoff after losing `attempt` races.
fn backoff_delay(attempt: u32) -> Duration {
    let exponential =
        BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exponential.min(MAX_BACKOFF_MS);
    Duration::from_millis(rand::thread_rng().gen_range(0..=capped))
}

#[derive(Debug, Error)]
pub enum BackpackError {
    #[error("character with id = {0} does not exist")]
    CharacterNotFound(CharacterId),

    #[error("item with id = {0} does not exist")]
    ItemNotFound(ItemId),

    #[error(transparent)]
    CapacityExceeded(#[from] CapacityExceeded),

    /// Every attempt lost the race against another writer.
    #[error("character {character_id} is being modified concurrently (gave up after {attempts} attempts)")]
    Contention {
        character_id: CharacterId,
        attempts: u32,
    },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// An admitted batch: the weight to store and the version it was decided at.
struct Admission {
    new_weight: u32,
    version: u64,
}

/// Adds items to characters' backpacks under the carry-capacity rule.
///
/// Generic over the store so tests run against the in-memory backend and
/// deployments against Postgres.
#[derive(Debug, Clone)]
pub struct BackpackService<S> {
    store: S,
    max_attempts: u32,
}

impl<S> BackpackService<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the retry bound. Values below 1 are raised to 1.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Character joined with its backpack and titles.
    #[instrument(skip(self), fields(character_id = %character_id), err)]
    pub async fn profile(&self, character_id: CharacterId) -> Result<CharacterProfile, BackpackError> {
        self.store
            .character_profile(character_id)
            .await?
            .ok_or(BackpackError::CharacterNotFound(character_id))
    }

    /// Add every item in `item_ids` to the character's backpack, or none of them.
    ///
    /// Returns the ids that were added, in request order. Duplicate ids are
    /// weighed and stored once per occurrence.
    #[instrument(
        skip(self, item_ids),
        fields(character_id = %character_id, batch_len = item_ids.len()),
        err
    )]
    pub async fn add_items(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
    ) -> Result<Vec<ItemId>, BackpackError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        for attempt in 1..=self.max_attempts {
            let Admission {
                new_weight,
                version,
            } = self.decide(character_id, item_ids).await?;

            match self
                .store
                .apply_inventory_addition(
                    character_id,
                    item_ids,
                    new_weight,
                    ExpectedVersion::Exact(version),
                )
                .await
            {
                Ok(()) => {
                    tracing::info!(new_weight, attempt, "items added to backpack");
                    return Ok(item_ids.to_vec());
                }
                Err(StoreError::Concurrency(reason)) if attempt < self.max_attempts => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        attempt,
                        %reason,
                        delay_ms = delay.as_millis() as u64,
                        "carry state changed before apply; re-deciding"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(StoreError::Concurrency(reason)) => {
                    tracing::warn!(attempt, %reason, "carry state changed before final apply");
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(BackpackError::Contention {
            character_id,
            attempts: self.max_attempts,
        })
    }

    async fn decide(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
    ) -> Result<Admission, BackpackError> {
        let state = self
            .store
            .carry_state(character_id)
            .await?
            .ok_or(BackpackError::CharacterNotFound(character_id))?;

        let mut weights = Vec::with_capacity(item_ids.len());
        for &item_id in item_ids {
            let weight = self
                .store
                .item_weight(item_id)
                .await?
                .ok_or(BackpackError::ItemNotFound(item_id))?;
            weights.push(weight);
        }

        let new_weight = state.admit(total_weight(weights))?;
        Ok(Admission {
            new_weight,
            version: state.version,
        })
    }
}
