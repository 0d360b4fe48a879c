//! # sweetshop-engine: Inventory Stock Consistency Engine
//!
//! Keeps stock quantities consistent while purchases and restocks race,
//! enforces catalog invariants, and appends an audit record for every
//! stock change.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request Gateway (external) ── typed requests + Actor                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 sweetshop-engine (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ItemCatalog        StockLedger          InventoryQuery        │   │
//! │  │   create/update/     purchase/restock/    low/out of stock,     │   │
//! │  │   delete/search      bulk_restock         stats, history        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ every call under a timeout             │
//! │                                ▼                                        │
//! │  sweetshop-db: CatalogStore (items)  +  AuditStore (stock_mutations)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sweetshop_core::{Actor, ItemSpec, Money};
//! use sweetshop_engine::{EngineConfig, InventoryEngine};
//!
//! let engine = InventoryEngine::connect(EngineConfig::from_env()?).await?;
//! let admin = Actor::privileged("admin-1");
//!
//! let ladoo = engine
//!     .catalog()
//!     .create(ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 50), &admin)
//!     .await?;
//!
//! let sale = engine.ledger().purchase(&ladoo.id, 5, &Actor::new("alice")).await?;
//! assert_eq!(sale.remaining_quantity, 45);
//! ```

pub mod catalog;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod query;

mod store_call;

pub use catalog::ItemCatalog;
pub use config::{ConfigError, EngineConfig};
pub use engine::{InventoryEngine, StartupError};
pub use ledger::StockLedger;
pub use query::InventoryQuery;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the engine tests.

    use std::path::PathBuf;
    use std::sync::Arc;

    use async_trait::async_trait;
    use sweetshop_core::MutationRecord;
    use sweetshop_db::{AuditStore, Database, DbConfig, DbError, DbResult};

    use crate::{EngineConfig, InventoryEngine};

    /// Engine over a fresh in-memory database.
    pub async fn memory_engine() -> InventoryEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        InventoryEngine::new(
            Arc::new(db.items()),
            Arc::new(db.audit()),
            EngineConfig::default(),
        )
    }

    /// File-backed database removed on drop. Concurrency tests need real
    /// pooled connections, which the in-memory database cannot give.
    pub struct TempDb {
        pub path: PathBuf,
    }

    impl TempDb {
        pub fn new() -> Self {
            let path = std::env::temp_dir()
                .join(format!("sweetshop-test-{}.db", uuid::Uuid::new_v4()));
            TempDb { path }
        }
    }

    impl Drop for TempDb {
        fn drop(&mut self) {
            for suffix in ["", "-wal", "-shm"] {
                let mut file = self.path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }

    pub async fn file_engine(db: &TempDb) -> InventoryEngine {
        InventoryEngine::connect(
            EngineConfig::default()
                .database_path(db.path.clone())
                .max_connections(8),
        )
        .await
        .unwrap()
    }

    /// Audit store whose every call fails.
    pub struct FailingAuditStore;

    #[async_trait]
    impl AuditStore for FailingAuditStore {
        async fn append(&self, _record: &MutationRecord) -> DbResult<()> {
            Err(DbError::ConnectionFailed("audit store offline".to_string()))
        }

        async fn history_for_item(&self, _item_id: &str) -> DbResult<Vec<MutationRecord>> {
            Err(DbError::ConnectionFailed("audit store offline".to_string()))
        }

        async fn history_for_actor(
            &self,
            _actor_id: &str,
            _limit: u32,
        ) -> DbResult<Vec<MutationRecord>> {
            Err(DbError::ConnectionFailed("audit store offline".to_string()))
        }

        async fn recent(&self, _limit: u32) -> DbResult<Vec<MutationRecord>> {
            Err(DbError::ConnectionFailed("audit store offline".to_string()))
        }
    }
}
