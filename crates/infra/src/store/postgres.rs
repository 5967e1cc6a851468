//! Postgres-backed inventory store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (serialization failure) | `40001` | `Concurrency` | Concurrent transaction won |
//! | Database (deadlock detected) | `40P01` | `Concurrency` | Two applies locked rows in opposite order |
//! | Database (foreign key violation) | `23503` | `Storage` | Entry references an unknown item/character |
//! | Database (check constraint violation) | `23514` | `Storage` | Negative weight, zero amount |
//! | Database (other) | Any other | `Storage` | |
//! | PoolClosed / Io / Tls / other | N/A | `Storage` | Network errors, connection failures, etc. |
//!
//! ## Atomicity
//!
//! `apply_inventory_addition` runs in one transaction. The weight update is a
//! compare-and-swap on the `version` column; if it touches zero rows the
//! transaction is rolled back. A transaction dropped before `commit` (for
//! example because the request future was cancelled) is rolled back by SQLx.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use satchel_core::{CharacterId, Entity, ExpectedVersion, ItemId, TitleId};
use satchel_inventory::{
    BackpackLine, CarryState, CharacterProfile, SeedData, TitleLine, Weight,
};

use super::r#trait::{InventoryStore, StoreError};

/// Idempotent DDL, executed statement by statement.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS items (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        weight BIGINT NOT NULL CHECK (weight >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS titles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS characters (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        current_weight BIGINT NOT NULL CHECK (current_weight >= 0),
        max_weight BIGINT NOT NULL CHECK (max_weight >= 0),
        version BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS backpack_entries (
        entry_id BIGSERIAL PRIMARY KEY,
        character_id INTEGER NOT NULL REFERENCES characters (id),
        item_id INTEGER NOT NULL REFERENCES items (id),
        amount INTEGER NOT NULL CHECK (amount >= 1)
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS backpack_entries_character_idx
        ON backpack_entries (character_id, entry_id)
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS character_titles (
        character_id INTEGER NOT NULL REFERENCES characters (id),
        title_id INTEGER NOT NULL REFERENCES titles (id),
        acquired_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (character_id, title_id)
    )
    "#,
];

/// Postgres-backed inventory store.
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Insert seed records that are not present yet.
    ///
    /// Catalog and character rows are keyed, so re-seeding skips them. Backpack
    /// entries have no natural key and are only seeded into an empty table.
    #[instrument(skip(self, seed), err)]
    pub async fn seed(&self, seed: &SeedData) -> Result<(), StoreError> {
        seed.validate()
            .map_err(|e| StoreError::Storage(format!("invalid seed data: {e}")))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for item in &seed.items {
            sqlx::query("INSERT INTO items (id, name, weight) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
                .bind(item.id().get())
                .bind(item.name())
                .bind(i64::from(item.weight()))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_items", e))?;
        }

        for title in &seed.titles {
            sqlx::query("INSERT INTO titles (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
                .bind(title.id().get())
                .bind(title.name())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_titles", e))?;
        }

        for character in &seed.characters {
            sqlx::query(
                r#"
                INSERT INTO characters (id, first_name, last_name, current_weight, max_weight)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(character.id().get())
            .bind(character.first_name())
            .bind(character.last_name())
            .bind(i64::from(character.current_weight()))
            .bind(i64::from(character.max_weight()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_characters", e))?;
        }

        for grant in &seed.grants {
            sqlx::query(
                r#"
                INSERT INTO character_titles (character_id, title_id, acquired_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (character_id, title_id) DO NOTHING
                "#,
            )
            .bind(grant.character_id.get())
            .bind(grant.title_id.get())
            .bind(grant.acquired_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_grants", e))?;
        }

        let existing: i64 = sqlx::query("SELECT COUNT(*) AS total FROM backpack_entries")
            .fetch_one(&mut *tx)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count_backpack_entries", e))?;

        if existing == 0 {
            for entry in &seed.backpack {
                sqlx::query(
                    "INSERT INTO backpack_entries (character_id, item_id, amount) VALUES ($1, $2, $3)",
                )
                .bind(entry.character_id.get())
                .bind(entry.item_id.get())
                .bind(to_db_amount(entry.amount)?)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("seed_backpack", e))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        tracing::info!(
            items = seed.items.len(),
            characters = seed.characters.len(),
            "seed data ensured"
        );
        Ok(())
    }

    /// Load a profile from one consistent snapshot.
    ///
    /// The three reads share a REPEATABLE READ transaction so a concurrent
    /// apply is seen entirely or not at all.
    #[instrument(skip(self), fields(character_id = %character_id), err)]
    pub async fn load_profile(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterProfile>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_isolation", e))?;

        let Some(row) = sqlx::query(
            r#"
            SELECT first_name, last_name, current_weight, max_weight
            FROM characters
            WHERE id = $1
            "#,
        )
        .bind(character_id.get())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_character", e))?
        else {
            return Ok(None);
        };

        let first_name: String = row.try_get("first_name").map_err(row_error)?;
        let last_name: String = row.try_get("last_name").map_err(row_error)?;
        let current_weight = from_db_weight(row.try_get("current_weight").map_err(row_error)?)?;
        let max_weight = from_db_weight(row.try_get("max_weight").map_err(row_error)?)?;

        let backpack_rows = sqlx::query(
            r#"
            SELECT b.item_id, i.name, i.weight, b.amount
            FROM backpack_entries b
            JOIN items i ON i.id = b.item_id
            WHERE b.character_id = $1
            ORDER BY b.entry_id ASC
            "#,
        )
        .bind(character_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_backpack", e))?;

        let mut backpack = Vec::with_capacity(backpack_rows.len());
        for r in backpack_rows {
            backpack.push(BackpackLine {
                item_id: ItemId::new(r.try_get("item_id").map_err(row_error)?),
                item_name: r.try_get("name").map_err(row_error)?,
                item_weight: from_db_weight(r.try_get("weight").map_err(row_error)?)?,
                amount: from_db_amount(r.try_get("amount").map_err(row_error)?)?,
            });
        }

        let title_rows = sqlx::query(
            r#"
            SELECT ct.title_id, t.name, ct.acquired_at
            FROM character_titles ct
            JOIN titles t ON t.id = ct.title_id
            WHERE ct.character_id = $1
            ORDER BY ct.acquired_at ASC, ct.title_id ASC
            "#,
        )
        .bind(character_id.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("load_titles", e))?;

        let mut titles = Vec::with_capacity(title_rows.len());
        for r in title_rows {
            let acquired_at: DateTime<Utc> = r.try_get("acquired_at").map_err(row_error)?;
            titles.push(TitleLine {
                title_id: TitleId::new(r.try_get("title_id").map_err(row_error)?),
                title: r.try_get("name").map_err(row_error)?,
                acquired_at,
            });
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Some(CharacterProfile {
            character_id,
            first_name,
            last_name,
            current_weight,
            max_weight,
            backpack,
            titles,
        }))
    }

    /// Compare-and-swap the weight, then insert the entries, in one transaction.
    #[instrument(
        skip(self, item_ids),
        fields(character_id = %character_id, entry_count = item_ids.len()),
        err
    )]
    pub async fn apply_addition(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
        new_current_weight: Weight,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let expected = match expected_version {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };

        let updated = sqlx::query(
            r#"
            UPDATE characters
            SET current_weight = $1, version = version + 1
            WHERE id = $2 AND ($3::BIGINT IS NULL OR version = $3)
            "#,
        )
        .bind(i64::from(new_current_weight))
        .bind(character_id.get())
        .bind(expected)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_weight", e))?
        .rows_affected();

        if updated == 0 {
            let exists = character_row_exists(&mut tx, character_id).await?;
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(if exists {
                StoreError::Concurrency(format!(
                    "character {character_id} is no longer at {expected_version:?}"
                ))
            } else {
                StoreError::Storage(format!("unknown character {character_id}"))
            });
        }

        for item_id in item_ids {
            sqlx::query(
                "INSERT INTO backpack_entries (character_id, item_id, amount) VALUES ($1, $2, 1)",
            )
            .bind(character_id.get())
            .bind(item_id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_backpack_entry", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(())
    }
}

async fn character_row_exists(
    tx: &mut Transaction<'_, Postgres>,
    character_id: CharacterId,
) -> Result<bool, StoreError> {
    let row = sqlx::query("SELECT 1 AS one FROM characters WHERE id = $1")
        .bind(character_id.get())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("character_exists", e))?;
    Ok(row.is_some())
}

#[async_trait::async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn character_exists(&self, character_id: CharacterId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 AS one FROM characters WHERE id = $1")
            .bind(character_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("character_exists", e))?;
        Ok(row.is_some())
    }

    async fn item_exists(&self, item_id: ItemId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 AS one FROM items WHERE id = $1")
            .bind(item_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_exists", e))?;
        Ok(row.is_some())
    }

    async fn character_profile(
        &self,
        character_id: CharacterId,
    ) -> Result<Option<CharacterProfile>, StoreError> {
        self.load_profile(character_id).await
    }

    async fn carry_state(&self, character_id: CharacterId) -> Result<Option<CarryState>, StoreError> {
        let row = sqlx::query(
            "SELECT current_weight, max_weight, version FROM characters WHERE id = $1",
        )
        .bind(character_id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("carry_state", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(CarryState {
            character_id,
            current_weight: from_db_weight(row.try_get("current_weight").map_err(row_error)?)?,
            max_weight: from_db_weight(row.try_get("max_weight").map_err(row_error)?)?,
            version: from_db_version(row.try_get("version").map_err(row_error)?)?,
        }))
    }

    async fn item_weight(&self, item_id: ItemId) -> Result<Option<Weight>, StoreError> {
        let row = sqlx::query("SELECT weight FROM items WHERE id = $1")
            .bind(item_id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("item_weight", e))?;

        row.map(|r| from_db_weight(r.try_get("weight").map_err(row_error)?))
            .transpose()
    }

    async fn apply_inventory_addition(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
        new_current_weight: Weight,
        expected_version: ExpectedVersion,
    ) -> Result<(), StoreError> {
        self.apply_addition(character_id, item_ids, new_current_weight, expected_version)
            .await
    }
}

fn from_db_weight(raw: i64) -> Result<Weight, StoreError> {
    Weight::try_from(raw).map_err(|_| StoreError::Storage(format!("weight out of range: {raw}")))
}

fn from_db_amount(raw: i32) -> Result<u32, StoreError> {
    u32::try_from(raw).map_err(|_| StoreError::Storage(format!("amount out of range: {raw}")))
}

fn to_db_amount(amount: u32) -> Result<i32, StoreError> {
    i32::try_from(amount).map_err(|_| StoreError::Storage(format!("amount out of range: {amount}")))
}

fn from_db_version(raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::Storage(format!("version out of range: {raw}")))
}

fn to_db_version(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::Storage(format!("version out of range: {version}")))
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::Storage(format!("failed to decode row: {err}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => StoreError::Concurrency(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed during {}", operation))
        }
        other => StoreError::Storage(format!("{} failed: {}", operation, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_outside_u32_are_storage_errors() {
        assert_eq!(from_db_weight(15).unwrap(), 15);
        assert!(matches!(from_db_weight(-1), Err(StoreError::Storage(_))));
        assert!(matches!(from_db_weight(i64::MAX), Err(StoreError::Storage(_))));
    }

    #[test]
    fn versions_round_trip_through_bigint() {
        assert_eq!(from_db_version(to_db_version(7).unwrap()).unwrap(), 7);
        assert!(to_db_version(u64::MAX).is_err());
    }

    #[test]
    fn pool_closed_maps_to_storage() {
        let err = map_sqlx_error("apply", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Storage(msg) if msg.contains("apply")));
    }

    #[test]
    fn schema_statements_are_idempotent() {
        assert!(SCHEMA.iter().all(|s| s.contains("IF NOT EXISTS")));
    }
}
