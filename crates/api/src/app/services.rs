use std::sync::Arc;

use satchel_core::{CharacterId, ItemId};
use satchel_infra::{
    BackpackError, BackpackService, InMemoryInventoryStore, PostgresInventoryStore,
};
use satchel_inventory::{CharacterProfile, SeedData};
use sqlx::PgPool;
use thiserror::Error;

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to Postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("invalid seed data: {0}")]
    Seed(#[from] satchel_core::DomainError),

    #[error(transparent)]
    Store(#[from] satchel_infra::StoreError),
}

type InMemoryBackpacks = BackpackService<Arc<InMemoryInventoryStore>>;
type PersistentBackpacks = BackpackService<Arc<PostgresInventoryStore>>;

/// The backpack service over whichever store the process was configured with.
#[derive(Clone)]
pub enum AppServices {
    InMemory {
        backpacks: Arc<InMemoryBackpacks>,
    },
    Persistent {
        backpacks: Arc<PersistentBackpacks>,
    },
}

impl AppServices {
    /// In-memory services loaded with the reference seed (tests, local runs).
    pub fn in_memory_seeded() -> Result<Self, StartupError> {
        let store = InMemoryInventoryStore::seeded()?;
        Ok(Self::InMemory {
            backpacks: Arc::new(BackpackService::new(Arc::new(store))),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            AppServices::InMemory { .. } => "in-memory",
            AppServices::Persistent { .. } => "postgres",
        }
    }

    pub async fn add_items(
        &self,
        character_id: CharacterId,
        item_ids: &[ItemId],
    ) -> Result<Vec<ItemId>, BackpackError> {
        match self {
            AppServices::InMemory { backpacks } => backpacks.add_items(character_id, item_ids).await,
            AppServices::Persistent { backpacks } => backpacks.add_items(character_id, item_ids).await,
        }
    }

    pub async fn profile(&self, character_id: CharacterId) -> Result<CharacterProfile, BackpackError> {
        match self {
            AppServices::InMemory { backpacks } => backpacks.profile(character_id).await,
            AppServices::Persistent { backpacks } => backpacks.profile(character_id).await,
        }
    }
}

/// Wire the store selected by `config` into a backpack service.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StartupError> {
    match &config.database_url {
        None => {
            let store = if config.seed {
                InMemoryInventoryStore::seeded()?
            } else {
                InMemoryInventoryStore::new()
            };

            tracing::info!(seeded = config.seed, "using in-memory inventory store");

            Ok(AppServices::InMemory {
                backpacks: Arc::new(
                    BackpackService::new(Arc::new(store))
                        .with_max_attempts(config.max_apply_attempts),
                ),
            })
        }
        Some(database_url) => {
            let pool = PgPool::connect(database_url).await?;
            let store = PostgresInventoryStore::new(pool);
            store.ensure_schema().await?;
            if config.seed {
                store.seed(&SeedData::reference()?).await?;
            }

            tracing::info!(seeded = config.seed, "using postgres inventory store");

            Ok(AppServices::Persistent {
                backpacks: Arc::new(
                    BackpackService::new(Arc::new(store))
                        .with_max_attempts(config.max_apply_attempts),
                ),
            })
        }
    }
}
