//! # Audit Repository
//!
//! SQLite implementation of [`AuditStore`], the append-only log of stock
//! mutations.
//!
//! ## Append-Only Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO stock_mutations ...   ✅ the only write this repo issues  │
//! │  UPDATE stock_mutations ...        ❌ aborted by trigger               │
//! │  DELETE FROM stock_mutations ...   ❌ aborted by trigger               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::AuditStore;
use sweetshop_core::{Money, MutationDetail, MutationKind, MutationRecord};

macro_rules! mutation_columns {
    () => {
        "id, item_id, item_name, kind, quantity, previous_quantity, new_quantity, \
         stock_version, unit_price_cents, total_cents, actor_id, recorded_at"
    };
}

#[derive(Debug, sqlx::FromRow)]
struct MutationRow {
    id: String,
    item_id: String,
    item_name: String,
    kind: MutationKind,
    quantity: i64,
    previous_quantity: i64,
    new_quantity: i64,
    stock_version: i64,
    unit_price_cents: Option<i64>,
    total_cents: Option<i64>,
    actor_id: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<MutationRow> for MutationRecord {
    type Error = DbError;

    fn try_from(row: MutationRow) -> Result<Self, Self::Error> {
        let detail = match row.kind {
            MutationKind::Restock => MutationDetail::Restock,
            MutationKind::Purchase => match (row.unit_price_cents, row.total_cents) {
                (Some(unit), Some(total)) => MutationDetail::Purchase {
                    unit_price: Money::from_cents(unit),
                    total: Money::from_cents(total),
                },
                _ => {
                    return Err(DbError::decode(
                        "stock_mutations",
                        format!("purchase {} has no price snapshot", row.id),
                    ))
                }
            },
        };

        Ok(MutationRecord {
            id: row.id,
            item_id: row.item_id,
            item_name: row.item_name,
            quantity: row.quantity,
            previous_quantity: row.previous_quantity,
            new_quantity: row.new_quantity,
            stock_version: row.stock_version,
            actor_id: row.actor_id,
            recorded_at: row.recorded_at,
            detail,
        })
    }
}

fn into_records(rows: Vec<MutationRow>) -> DbResult<Vec<MutationRecord>> {
    rows.into_iter().map(MutationRecord::try_from).collect()
}

/// Repository for the stock mutation log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Total number of records (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_mutations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn append(&self, record: &MutationRecord) -> DbResult<()> {
        debug!(
            id = %record.id,
            item_id = %record.item_id,
            kind = record.kind().as_str(),
            "Appending stock mutation"
        );

        let (unit_price, total) = match &record.detail {
            MutationDetail::Purchase { unit_price, total } => {
                (Some(unit_price.cents()), Some(total.cents()))
            }
            MutationDetail::Restock => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO stock_mutations (
                id, item_id, item_name, kind, quantity,
                previous_quantity, new_quantity, stock_version,
                unit_price_cents, total_cents, actor_id, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&record.id)
        .bind(&record.item_id)
        .bind(&record.item_name)
        .bind(record.kind())
        .bind(record.quantity)
        .bind(record.previous_quantity)
        .bind(record.new_quantity)
        .bind(record.stock_version)
        .bind(unit_price)
        .bind(total)
        .bind(&record.actor_id)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn history_for_item(&self, item_id: &str) -> DbResult<Vec<MutationRecord>> {
        let rows = sqlx::query_as::<_, MutationRow>(concat!(
            "SELECT ",
            mutation_columns!(),
            " FROM stock_mutations WHERE item_id = ?1 ORDER BY stock_version ASC"
        ))
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn history_for_actor(&self, actor_id: &str, limit: u32) -> DbResult<Vec<MutationRecord>> {
        let rows = sqlx::query_as::<_, MutationRow>(concat!(
            "SELECT ",
            mutation_columns!(),
            " FROM stock_mutations WHERE actor_id = ?1 ",
            "ORDER BY recorded_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(actor_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }

    async fn recent(&self, limit: u32) -> DbResult<Vec<MutationRecord>> {
        let rows = sqlx::query_as::<_, MutationRow>(concat!(
            "SELECT ",
            mutation_columns!(),
            " FROM stock_mutations ORDER BY recorded_at DESC, rowid DESC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        into_records(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
