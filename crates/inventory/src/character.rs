use serde::{Deserialize, Serialize};
use thiserror::Error;

use satchel_core::{CharacterId, DomainError, DomainResult, Entity};

/// Carried weight, in whole units.
pub type Weight = u32;

/// A game character and its carrying budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    id: CharacterId,
    first_name: String,
    last_name: String,
    current_weight: Weight,
    max_weight: Weight,
    version: u64,
}

impl Character {
    /// Build a character at version 0.
    ///
    /// `current_weight > max_weight` is accepted: an already overloaded
    /// character is a legal state, it simply cannot pick anything up.
    pub fn new(
        id: CharacterId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        current_weight: Weight,
        max_weight: Weight,
    ) -> DomainResult<Self> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        if first_name.trim().is_empty() {
            return Err(DomainError::validation("first name cannot be empty"));
        }
        if last_name.trim().is_empty() {
            return Err(DomainError::validation("last name cannot be empty"));
        }
        Ok(Self {
            id,
            first_name,
            last_name,
            current_weight,
            max_weight,
            version: 0,
        })
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn current_weight(&self) -> Weight {
        self.current_weight
    }

    pub fn max_weight(&self) -> Weight {
        self.max_weight
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn carry_state(&self) -> CarryState {
        CarryState {
            character_id: self.id,
            current_weight: self.current_weight,
            max_weight: self.max_weight,
            version: self.version,
        }
    }

    /// Record a new absolute weight. Bumps the version by one.
    pub fn set_current_weight(&mut self, weight: Weight) {
        self.current_weight = weight;
        self.version += 1;
    }
}

impl Entity for Character {
    type Id = CharacterId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Snapshot of a character's load, as read for an admission decision.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryState {
    pub character_id: CharacterId,
    pub current_weight: Weight,
    pub max_weight: Weight,
    /// Version the snapshot was taken at; used as the compare-and-swap token.
    pub version: u64,
}

/// The admission check refused a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "character {character_id} cannot carry {additional} more (current weight {current_weight}, max weight {max_weight})"
)]
pub struct CapacityExceeded {
    pub character_id: CharacterId,
    pub current_weight: Weight,
    pub additional: u64,
    pub max_weight: Weight,
}

impl CarryState {
    /// Decide whether `additional` weight fits.
    ///
    /// The boundary is inclusive: landing exactly on `max_weight` is admitted.
    /// Returns the new absolute weight to store.
    pub fn admit(&self, additional: u64) -> Result<Weight, CapacityExceeded> {
        let exceeded = || CapacityExceeded {
            character_id: self.character_id,
            current_weight: self.current_weight,
            additional,
            max_weight: self.max_weight,
        };

        let proposed = u64::from(self.current_weight)
            .checked_add(additional)
            .ok_or_else(exceeded)?;
        if proposed > u64::from(self.max_weight) {
            return Err(exceeded());
        }
        // proposed <= max_weight, so it fits back into a Weight.
        Weight::try_from(proposed).map_err(|_| exceeded())
    }
}

/// Sum a batch of item weights. Repeated items count once per occurrence.
pub fn total_weight<I>(weights: I) -> u64
where
    I: IntoIterator<Item = Weight>,
{
    weights.into_iter().map(u64::from).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn state(current: Weight, max: Weight) -> CarryState {
        CarryState {
            character_id: CharacterId::new(1),
            current_weight: current,
            max_weight: max,
            version: 0,
        }
    }

    #[test]
    fn reaching_max_weight_exactly_is_admitted() {
        assert_eq!(state(100, 120).admit(20), Ok(120));
    }

    #[test]
    fn one_over_max_weight_is_rejected() {
        let err = state(100, 120).admit(21).unwrap_err();
        assert_eq!(err.additional, 21);
        assert_eq!(err.current_weight, 100);
        assert_eq!(err.max_weight, 120);
    }

    #[test]
    fn overloaded_character_rejects_any_weight_but_zero() {
        assert!(state(65, 60).admit(3).is_err());
        // Zero additional weight still fails: 65 is already above 60.
        assert!(state(65, 60).admit(0).is_err());
    }

    #[test]
    fn duplicates_count_per_occurrence() {
        assert_eq!(total_weight([5, 5]), 10);
        assert_eq!(total_weight(Vec::<Weight>::new()), 0);
    }

    #[test]
    fn huge_batches_do_not_overflow() {
        let total = total_weight([Weight::MAX, Weight::MAX]);
        assert_eq!(total, 2 * u64::from(Weight::MAX));
        assert!(state(Weight::MAX, Weight::MAX).admit(u64::MAX).is_err());
    }

    #[test]
    fn set_current_weight_bumps_version() {
        let mut c = Character::new(CharacterId::new(1), "Name1", "a", 100, 120).unwrap();
        c.set_current_weight(115);
        assert_eq!(c.current_weight(), 115);
        assert_eq!(c.version(), 1);
        assert_eq!(c.carry_state().version, 1);
    }

    #[test]
    fn blank_names_are_rejected() {
        let err = Character::new(CharacterId::new(1), "  ", "a", 0, 10).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: an admitted batch never lands above max weight, and a
        /// rejected batch really would have.
        #[test]
        fn admission_matches_inclusive_bound(
            current in 0u32..1_000,
            max in 0u32..1_000,
            weights in prop::collection::vec(0u32..200, 0..8)
        ) {
            let additional = total_weight(weights.iter().copied());
            match state(current, max).admit(additional) {
                Ok(new_weight) => {
                    prop_assert!(new_weight <= max);
                    prop_assert_eq!(u64::from(new_weight), u64::from(current) + additional);
                }
                Err(_) => prop_assert!(u64::from(current) + additional > u64::from(max)),
            }
        }
    }
}
