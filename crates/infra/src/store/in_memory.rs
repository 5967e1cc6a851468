use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use satchel_core::{CharacterId, DomainResult, Entity, ExpectedVersion, ItemId, TitleId};
use satchel_inventory::{
    BackpackEntry, BackpackLine, CarryState, Character, CharacterProfile, Item, SeedData, Title,
    TitleGrant, TitleLine, Weight,
};

use super::r#trait::{InventoryStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    items: HashMap<ItemId, Item>,
    titles: HashMap<TitleId, Title>,
    characters: HashMap<CharacterId, Character>,
    grants: Vec<TitleGrant>,
    /// Insertion order is the listing order.
    backpack: Vec<BackpackEntry>,
}

/// In-memory inventory store.
///
/// Intended for tests/dev. All tables sit behind one lock, and the apply step
/// runs entirely under the write guard, so a reader sees either none or all of
/// a batch.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store loaded with the reference fixtures.
    pub fn seeded() -> DomainResult<Self> {
        Self::from_seed(SeedData::reference()?)
    }

    pub fn from_seed(seed: SeedData) -> DomainResult<Self> {
        seed.validate()?;

        let tables = Tables {
            items: seed.items.into_iter().map(|i| (*i.id(), i)).collect(),
            titles: seed.titles.into_iter().map(|t| (*t.id(), t)).collect(),
            characters: seed.characters.into_iter().map(|c| (*c.id(), c)).collect(),
            grants: seed.grants,
            backpack: seed.backpack,
        };

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn character_exists(&self, character_id: CharacterId) -> Result<bool, StoreError> {
        Ok(self.read()?.characters.contains_key(&character_id))
    }

    async fn item_exists(&self, item_id: ItemId) -> Result<bool, StoreError> {
        Ok(self.read()?.items.contains_key(&item_id))
    }

    async fn character_profile(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterProfile>, StoreError> {
        let tables = self.read()?;
        let Some(character) = tables.characters.get(&character_id) else {
            return Ok(None);
        };

        let backpack = tables
            .backpack
            .iter()
            .filter(|e| e.character_id == character_id)
            .filter_map(|e| {
                tables.items.get(&e.item_id).map(|item| BackpackLine {
                    item_id: e.item_id,
                    item_name: item.name().to_string(),
                    item_weight: item.weight(),
                    amount: e.amount,
                })
            })
            .collect();

        let mut titles: Vec<TitleLine> = tables
            .grants
            .iter()
            .filter(|g| g.character_id == character_id)
            .filter_map(|g| {
                tables.titles.get(&g.title_id).map(|title| TitleLine {
                    title_id: g.title_id,
                    title: title.name().to_string(),
                    acquired_at: g.acquired_at,
                })
            })
            .collect();
        titles.sort_by_key(|t| (t.acquired_at, t.title_id));

        Ok(Some(CharacterProfile {
            character_id,
            first_name: character.first_name().to_string(),
            last_name: character.last_name().to_string(),
            current_weight: character.current_weight(),
            max_weight: character.max_weight(),
            backpack,
            titles,
        }))
    }

    async fn carry_state(&self, character_id: CharacterId) -> Result<Option<CarryState>, StoreError> {
        Ok(self
            .read()?
            .characters
            .get(&character_id)
            .map(Character::carry_state))
    }

    async fn item_weight(&self, item_id: ItemId) -> Result<Option<Weight>, StoreError> {
        Ok(self.read()?.items.get(&item_id).map(Item::weight))
    }

    async fn apply_inventory_addition(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
        new_current_weight: Weight,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut guard = self.write()?;
        let tables = &mut *guard;

        // Validate everything before touching anything.
        if let Some(missing) = item_ids.iter().find(|id| !tables.items.contains_key(*id)) {
            return Err(StoreError::Storage(format!(
                "backpack entry references unknown item {missing}"
            )));
        }
        let character = tables
            .characters
            .get_mut(&character_id)
            .ok_or_else(|| StoreError::Storage(format!("unknown character {character_id}")))?;
        expected_version
            .check(character.version())
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        character.set_current_weight(new_current_weight);
        tables
            .backpack
            .extend(item_ids.iter().map(|&item_id| BackpackEntry::single(character_id, item_id)));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(id: i32) -> CharacterId {
        CharacterId::new(id)
    }

    fn i(id: i32) -> ItemId {
        ItemId::new(id)
    }

    #[tokio::test]
    async fn existence_checks_follow_seed() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        assert!(store.character_exists(c(1)).await.unwrap());
        assert!(!store.character_exists(c(3)).await.unwrap());
        assert!(store.item_exists(i(3)).await.unwrap());
        assert!(!store.item_exists(i(4)).await.unwrap());
        assert_eq!(store.item_weight(i(1)).await.unwrap(), Some(15));
        assert_eq!(store.item_weight(i(9)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn profile_joins_items_and_titles() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        let profile = store.character_profile(c(1)).await.unwrap().unwrap();

        assert_eq!(profile.first_name, "Name1");
        assert_eq!(profile.last_name, "a");
        assert_eq!((profile.current_weight, profile.max_weight), (100, 120));

        let names: Vec<_> = profile.backpack.iter().map(|l| l.item_name.as_str()).collect();
        assert_eq!(names, ["item1", "item2", "item3"]);

        let titles: Vec<_> = profile.titles.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Title1", "Title2"]);
        assert!(profile.titles[0].acquired_at < profile.titles[1].acquired_at);
    }

    #[tokio::test]
    async fn profile_of_unknown_character_is_none() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        assert!(store.character_profile(c(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn character_without_relations_has_empty_lists() {
        let mut seed = SeedData::default();
        seed.characters
            .push(Character::new(c(7), "Lone", "Wolf", 0, 10).unwrap());
        let store = InMemoryInventoryStore::from_seed(seed).unwrap();

        let profile = store.character_profile(c(7)).await.unwrap().unwrap();
        assert!(profile.backpack.is_empty());
        assert!(profile.titles.is_empty());
    }

    #[tokio::test]
    async fn apply_updates_weight_version_and_entries_together() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        let before = store.carry_state(c(1)).await.unwrap().unwrap();

        store
            .apply_inventory_addition(c(1), &[i(2), i(2)], 110, ExpectedVersion::Exact(before.version))
            .await
            .unwrap();

        let after = store.carry_state(c(1)).await.unwrap().unwrap();
        assert_eq!(after.current_weight, 110);
        assert_eq!(after.version, before.version + 1);

        let profile = store.character_profile(c(1)).await.unwrap().unwrap();
        assert_eq!(profile.entries_of(i(2)), 3);
        assert!(profile.backpack.iter().all(|l| l.amount == 1));
    }

    #[tokio::test]
    async fn stale_version_is_refused_without_side_effects() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        let before = store.character_profile(c(1)).await.unwrap().unwrap();

        let err = store
            .apply_inventory_addition(c(1), &[i(1)], 115, ExpectedVersion::Exact(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Concurrency(_)));

        let after = store.character_profile(c(1)).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn unknown_item_rolls_back_whole_batch() {
        let store = InMemoryInventoryStore::seeded().unwrap();
        let before = store.character_profile(c(1)).await.unwrap().unwrap();

        let err = store
            .apply_inventory_addition(c(1), &[i(1), i(99)], 115, ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));

        let after = store.character_profile(c(1)).await.unwrap().unwrap();
        assert_eq!(before, after);
        assert_eq!(store.carry_state(c(1)).await.unwrap().unwrap().version, 0);
    }
}
