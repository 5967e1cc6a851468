//! Fixed seed data loaded into a fresh store.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use satchel_core::{CharacterId, DomainError, DomainResult, Entity, ItemId, TitleId};

use crate::backpack::{BackpackEntry, TitleGrant};
use crate::catalog::{Item, Title};
use crate::character::Character;

/// Everything a store is initialised with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedData {
    pub items: Vec<Item>,
    pub titles: Vec<Title>,
    pub characters: Vec<Character>,
    pub grants: Vec<TitleGrant>,
    pub backpack: Vec<BackpackEntry>,
}

fn day(year: i32, month: u32, day: u32) -> DomainResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| DomainError::validation(format!("invalid date {year}-{month}-{day}")))
}

impl SeedData {
    /// Reference fixtures.
    ///
    /// Character 2 is deliberately overloaded (65 of 60) and rejects every
    /// non-empty pickup.
    pub fn reference() -> DomainResult<Self> {
        let c1 = CharacterId::new(1);
        let c2 = CharacterId::new(2);

        let items = vec![
            Item::new(ItemId::new(1), "item1", 15)?,
            Item::new(ItemId::new(2), "item2", 5)?,
            Item::new(ItemId::new(3), "item3", 3)?,
        ];
        let titles = vec![
            Title::new(TitleId::new(1), "Title1")?,
            Title::new(TitleId::new(2), "Title2")?,
            Title::new(TitleId::new(3), "Title3")?,
        ];
        let characters = vec![
            Character::new(c1, "Name1", "a", 100, 120)?,
            Character::new(c2, "Name2", "b", 65, 60)?,
        ];
        let grant = |character_id, title, acquired_at| TitleGrant {
            character_id,
            title_id: TitleId::new(title),
            acquired_at,
        };
        let grants = vec![
            grant(c1, 1, day(2001, 1, 1)?),
            grant(c2, 1, day(2002, 1, 1)?),
            grant(c1, 2, day(2003, 1, 1)?),
            grant(c2, 2, day(2004, 1, 1)?),
        ];
        let backpack = [(c1, 1), (c1, 2), (c1, 3), (c2, 2), (c2, 3)]
            .into_iter()
            .map(|(c, i)| BackpackEntry::single(c, ItemId::new(i)))
            .collect();

        let seed = Self {
            items,
            titles,
            characters,
            grants,
            backpack,
        };
        seed.validate()?;
        Ok(seed)
    }

    /// Check ids are unique and every relation points at a known record.
    pub fn validate(&self) -> DomainResult<()> {
        let items = unique_ids(&self.items, "item")?;
        let titles = unique_ids(&self.titles, "title")?;
        let characters = unique_ids(&self.characters, "character")?;

        for g in &self.grants {
            if !characters.contains(&g.character_id) {
                return Err(DomainError::validation(format!(
                    "title grant references unknown character {}",
                    g.character_id
                )));
            }
            if !titles.contains(&g.title_id) {
                return Err(DomainError::validation(format!(
                    "title grant references unknown title {}",
                    g.title_id
                )));
            }
        }

        for e in &self.backpack {
            if !characters.contains(&e.character_id) {
                return Err(DomainError::validation(format!(
                    "backpack entry references unknown character {}",
                    e.character_id
                )));
            }
            if !items.contains(&e.item_id) {
                return Err(DomainError::validation(format!(
                    "backpack entry references unknown item {}",
                    e.item_id
                )));
            }
            if e.amount == 0 {
                return Err(DomainError::validation("backpack entry amount must be at least 1"));
            }
        }

        Ok(())
    }
}

fn unique_ids<E: Entity>(records: &[E], kind: &str) -> DomainResult<HashSet<E::Id>> {
    let mut seen = HashSet::with_capacity(records.len());
    for r in records {
        if !seen.insert(*r.id()) {
            return Err(DomainError::validation(format!("duplicate {kind} id {:?}", r.id())));
        }
    }
    Ok(seen)
}
