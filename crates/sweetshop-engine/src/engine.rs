//! # Engine Wiring
//!
//! Builds the catalog, the ledger and the query service once, on top of a
//! shared pair of stores.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  InventoryEngine (Clone + Send + Sync, cheap to clone)                 │
//! │                                                                         │
//! │   catalog() ──► ItemCatalog    ──┐                                      │
//! │   ledger()  ──► StockLedger    ──┼──► Arc<dyn CatalogStore>             │
//! │   query()   ──► InventoryQuery ──┴──► Arc<dyn AuditStore>               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::catalog::ItemCatalog;
use crate::config::{ConfigError, EngineConfig};
use crate::ledger::StockLedger;
use crate::query::InventoryQuery;
use sweetshop_db::{AuditStore, CatalogStore, Database, DbError};

/// Failure to bring the engine up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] DbError),
}

/// The inventory engine. Create it once at startup and clone it into every
/// task that needs it.
#[derive(Clone)]
pub struct InventoryEngine {
    catalog: ItemCatalog,
    ledger: StockLedger,
    query: InventoryQuery,
    config: EngineConfig,
    database: Option<Database>,
}

impl InventoryEngine {
    /// Opens the SQLite stores named by `config` (running migrations) and
    /// wires the engine on top of them.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let engine = InventoryEngine::connect(EngineConfig::from_env()?).await?;
    /// let sold = engine.ledger().purchase(&id, 2, &Actor::new("alice")).await?;
    /// ```
    pub async fn connect(config: EngineConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let db = Database::new(config.db_config()).await?;

        let mut engine = Self::new(Arc::new(db.items()), Arc::new(db.audit()), config);
        engine.database = Some(db);

        info!(
            path = %engine.config.database_path.display(),
            store_timeout_ms = engine.config.store_timeout_ms,
            "Inventory engine ready"
        );
        Ok(engine)
    }

    /// Wires the engine on caller-provided stores.
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        audit_store: Arc<dyn AuditStore>,
        config: EngineConfig,
    ) -> Self {
        let timeout = config.store_timeout_duration();

        InventoryEngine {
            catalog: ItemCatalog::new(catalog_store.clone(), timeout),
            ledger: StockLedger::new(
                catalog_store.clone(),
                audit_store.clone(),
                timeout,
                config.max_restock_delta,
            ),
            query: InventoryQuery::new(
                catalog_store,
                audit_store,
                timeout,
                config.low_stock_threshold,
            ),
            config,
            database: None,
        }
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    pub fn query(&self) -> &InventoryQuery {
        &self.query
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// True when the backing database answers. Engines built with
    /// [`new`](Self::new) have no database handle and report `true`.
    pub async fn health_check(&self) -> bool {
        match &self.database {
            Some(db) => db.health_check().await,
            None => true,
        }
    }

    /// Closes the pool opened by [`connect`](Self::connect).
    pub async fn close(&self) {
        if let Some(db) = &self.database {
            db.close().await;
        }
    }
}

// =============================================================================
// Scenario Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{file_engine, memory_engine, TempDb};
    use sweetshop_core::{Actor, ErrorCode, InventoryError, ItemSpec, Money, MutationKind};

    #[tokio::test]
    async fn test_ladoo_purchase() {
        let engine = memory_engine().await;
        let ladoo = engine
            .catalog()
            .create(
                ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 50),
                &Actor::privileged("admin"),
            )
            .await
            .unwrap();

        let result = engine
            .ledger()
            .purchase(&ladoo.id, 5, &Actor::new("alice"))
            .await
            .unwrap();

        assert_eq!(result.remaining_quantity, 45);
        assert_eq!(result.total.to_string(), "50.00");

        let history = engine.query().item_history(&ladoo.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind(), MutationKind::Purchase);
        assert_eq!(history[0].actor_id, "alice");
    }

    #[tokio::test]
    async fn test_insufficient_stock_message() {
        let engine = memory_engine().await;
        let ladoo = engine
            .catalog()
            .create(
                ItemSpec::new("Ladoo", "Traditional", Money::from_cents(1000), 45),
                &Actor::privileged("admin"),
            )
            .await
            .unwrap();

        let err = engine
            .ledger()
            .purchase(&ladoo.id, 100, &Actor::new("bob"))
            .await
            .unwrap_err();

        assert_eq!(err.http_status(), 400);
        assert_eq!(
            err.to_body().message,
            "Insufficient stock for Ladoo: available 45, requested 100"
        );
        assert_eq!(engine.catalog().get(&ladoo.id).await.unwrap().unwrap().quantity, 45);
    }

    #[tokio::test]
    async fn test_duplicate_name_differs_only_in_case() {
        let engine = memory_engine().await;
        let admin = Actor::privileged("admin");
        engine
            .catalog()
            .create(ItemSpec::new("Barfi", "Traditional", Money::from_cents(1200), 5), &admin)
            .await
            .unwrap();

        let err = engine
            .catalog()
            .create(ItemSpec::new("barfi", "Traditional", Money::from_cents(900), 1), &admin)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::DuplicateName);
        assert_eq!(err.http_status(), 400);
        assert_eq!(engine.catalog().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_negative_restock_is_rejected() {
        let engine = memory_engine().await;
        let peda = engine
            .catalog()
            .create(
                ItemSpec::new("Peda", "Milk", Money::from_cents(800), 10),
                &Actor::privileged("admin"),
            )
            .await
            .unwrap();

        let err = engine
            .ledger()
            .restock(&peda.id, -5, &Actor::privileged("admin"))
            .await
            .unwrap_err();

        assert!(matches!(err, InventoryError::InvalidQuantity { quantity: -5, .. }));
        assert_eq!(engine.catalog().get(&peda.id).await.unwrap().unwrap().quantity, 10);
    }

    #[tokio::test]
    async fn test_delete_hides_item_but_keeps_history() {
        let engine = memory_engine().await;
        let admin = Actor::privileged("admin");
        let jalebi = engine
            .catalog()
            .create(ItemSpec::new("Jalebi", "Fried", Money::from_cents(600), 10), &admin)
            .await
            .unwrap();
        engine.ledger().restock(&jalebi.id, 5, &admin).await.unwrap();
        engine
            .ledger()
            .purchase(&jalebi.id, 2, &Actor::new("carol"))
            .await
            .unwrap();

        assert!(engine.catalog().delete(&jalebi.id, &admin).await.unwrap());

        assert!(engine.catalog().get(&jalebi.id).await.unwrap().is_none());
        assert!(engine.catalog().list().await.unwrap().is_empty());
        assert!(engine
            .catalog()
            .search(&sweetshop_core::ItemSearch::new().name("jalebi"))
            .await
            .unwrap()
            .is_empty());

        let history = engine.query().item_history(&jalebi.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind(), MutationKind::Restock);
        assert_eq!(history[1].new_quantity, 13);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_keep_names_unique() {
        let db = TempDb::new();
        let engine = file_engine(&db).await;

        let mut tasks = Vec::new();
        for (n, name) in ["Rasgulla", "rasgulla", "RASGULLA", " Rasgulla ", "rasGulla", "Rasgulla"]
            .into_iter()
            .enumerate()
        {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine
                    .catalog()
                    .create(
                        ItemSpec::new(name, "Bengali", Money::from_cents(700), 10),
                        &Actor::privileged(format!("admin-{}", n)),
                    )
                    .await
            }));
        }

        let mut created = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => created += 1,
                Err(err) => assert_eq!(err.code(), ErrorCode::DuplicateName),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(engine.catalog().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let err = InventoryEngine::connect(EngineConfig::default().max_connections(0))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, StartupError::Config(_)));
    }

    #[tokio::test]
    async fn test_closed_engine_reports_store_unavailable() {
        let db = TempDb::new();
        let engine = file_engine(&db).await;
        assert!(engine.health_check().await);

        engine.close().await;

        assert!(!engine.health_check().await);
        let err = engine.catalog().list().await.unwrap_err();
        assert_eq!(err, InventoryError::StoreUnavailable);
        assert!(err.is_retryable());
    }
}
