//! # Item Repository
//!
//! SQLite implementation of [`CatalogStore`].
//!
//! ## Key Operations
//! - Catalog CRUD with soft delete
//! - Filtered search (name substring, category, price range, paging)
//! - Conditional stock updates
//!
//! ## Conditional Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Why One Statement                                    │
//! │                                                                         │
//! │  ❌ WRONG: read-then-write                                             │
//! │     SELECT quantity ...        (both tasks read 50)                    │
//! │     UPDATE ... SET quantity = 20                                       │
//! │     UPDATE ... SET quantity = 20   → 60 units sold from 50            │
//! │                                                                         │
//! │  ✅ CORRECT: guarded delta                                             │
//! │     UPDATE items SET quantity = quantity - 30                          │
//! │     WHERE id = ? AND is_active = 1 AND quantity >= 30                  │
//! │     RETURNING ...                                                      │
//! │                                                                         │
//! │  Task A: 50 → 20, row returned                                         │
//! │  Task B: guard fails (20 < 30), no row → InsufficientStock             │
//! │                                                                         │
//! │  Both updates bump stock_version, which orders the audit trail.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::CatalogStore;
use sweetshop_core::{name_key, Item, ItemPatch, ItemSearch, CATEGORY_WILDCARD, MAX_PAGE_SIZE};

/// Column list shared by every query that returns an [`Item`].
macro_rules! item_columns {
    () => {
        "id, name, category, price_cents, quantity, stock_version, description, image_url, \
         tags, is_active, created_at, updated_at, created_by, updated_by, deleted_at"
    };
}

/// Row shape of the `items` table. `tags` is a JSON array.
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    name: String,
    category: String,
    price_cents: i64,
    quantity: i64,
    stock_version: i64,
    description: Option<String>,
    image_url: Option<String>,
    tags: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: String,
    updated_by: String,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ItemRow> for Item {
    type Error = DbError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&row.tags)
            .map_err(|e| DbError::decode("items", format!("tags of {}: {}", row.id, e)))?;

        Ok(Item {
            id: row.id,
            name: row.name,
            category: row.category,
            price_cents: row.price_cents,
            quantity: row.quantity,
            stock_version: row.stock_version,
            description: row.description,
            image_url: row.image_url,
            tags,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            deleted_at: row.deleted_at,
        })
    }
}

fn into_items(rows: Vec<ItemRow>) -> DbResult<Vec<Item>> {
    rows.into_iter().map(Item::try_from).collect()
}

fn encode_tags(tags: &[String]) -> DbResult<String> {
    serde_json::to_string(tags).map_err(|e| DbError::Internal(e.to_string()))
}

/// A unique-index failure on `items` can only mean a name clash.
fn name_conflict(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("name", name.trim()),
        other => other,
    }
}

/// Escapes LIKE wildcards so a needle such as `50%` matches literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Repository for catalog items.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ItemRepository::new(pool);
///
/// let ladoo = repo.get("uuid-here", false).await?;
/// let sold = repo.decrement_if_sufficient("uuid-here", 5, "alice", Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Counts active items (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl CatalogStore for ItemRepository {
    async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, name_key, category, price_cents, quantity, stock_version,
                description, image_url, tags, is_active,
                created_at, updated_at, created_by, updated_by, deleted_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(name_key(&item.name))
        .bind(&item.category)
        .bind(item.price_cents)
        .bind(item.quantity)
        .bind(item.stock_version)
        .bind(&item.description)
        .bind(&item.image_url)
        .bind(encode_tags(&item.tags)?)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(&item.created_by)
        .bind(&item.updated_by)
        .bind(item.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| name_conflict(e, &item.name))?;

        Ok(())
    }

    async fn get(&self, id: &str, include_inactive: bool) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE id = ?1 AND (is_active = 1 OR ?2)"
        ))
        .bind(id)
        .bind(include_inactive)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn find_active_by_name(&self, name: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE name_key = ?1 AND is_active = 1"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn list_active(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE is_active = 1 ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_items(rows)
    }

    /// Builds the filter dynamically; every value is bound, never spliced.
    async fn search(&self, filter: &ItemSearch) -> DbResult<Vec<Item>> {
        debug!(?filter, "Searching items");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE is_active = 1"
        ));

        if let Some(needle) = filter.name.as_deref().map(name_key).filter(|n| !n.is_empty()) {
            qb.push(" AND name_key LIKE ")
                .push_bind(like_pattern(&needle))
                .push(" ESCAPE '\\'");
        }

        if let Some(category) = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(CATEGORY_WILDCARD))
        {
            qb.push(" AND category = ").push_bind(category.to_string());
        }

        if let Some(min) = filter.min_price {
            qb.push(" AND price_cents >= ").push_bind(min.cents());
        }

        if let Some(max) = filter.max_price {
            qb.push(" AND price_cents <= ").push_bind(max.cents());
        }

        let limit = filter.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE);
        qb.push(" ORDER BY name_key ASC, rowid ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(filter.offset));

        let rows = qb.build_query_as::<ItemRow>().fetch_all(&self.pool).await?;

        debug!(count = rows.len(), "Search returned items");
        into_items(rows)
    }

    async fn update_metadata(
        &self,
        id: &str,
        patch: &ItemPatch,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>> {
        debug!(id = %id, actor = %actor_id, "Updating item metadata");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE items SET updated_at = ");
        qb.push_bind(at);
        qb.push(", updated_by = ").push_bind(actor_id.to_string());

        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
            qb.push(", name_key = ").push_bind(name_key(name));
        }
        if let Some(category) = &patch.category {
            qb.push(", category = ").push_bind(category.clone());
        }
        if let Some(price) = patch.price {
            qb.push(", price_cents = ").push_bind(price.cents());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(image_url) = &patch.image_url {
            qb.push(", image_url = ").push_bind(image_url.clone());
        }
        if let Some(tags) = &patch.tags {
            qb.push(", tags = ").push_bind(encode_tags(tags)?);
        }

        qb.push(" WHERE id = ")
            .push_bind(id.to_string())
            .push(" AND is_active = 1 RETURNING ")
            .push(item_columns!());

        let row = qb
            .build_query_as::<ItemRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| name_conflict(e, patch.name.as_deref().unwrap_or_default()))?;

        row.map(Item::try_from).transpose()
    }

    async fn soft_delete(&self, id: &str, actor_id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        debug!(id = %id, actor = %actor_id, "Soft-deleting item");

        let result = sqlx::query(
            r#"
            UPDATE items
            SET
                is_active = 0,
                deleted_at = ?2,
                updated_at = ?2,
                updated_by = ?3
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(actor_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn decrement_if_sufficient(
        &self,
        id: &str,
        quantity: i64,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>> {
        debug!(id = %id, quantity, "Conditional stock decrement");

        // The price guard keeps price × quantity inside i64, so the total
        // charged for the units taken here can always be computed.
        let row = sqlx::query_as::<_, ItemRow>(concat!(
            "UPDATE items SET quantity = quantity - ?1, stock_version = stock_version + 1, ",
            "updated_at = ?2, updated_by = ?3 ",
            "WHERE id = ?4 AND is_active = 1 AND quantity >= ?5 AND price_cents <= ?6 RETURNING ",
            item_columns!()
        ))
        .bind(quantity)
        .bind(at)
        .bind(actor_id)
        .bind(id)
        .bind(quantity)
        .bind(i64::MAX / quantity.max(1))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn increment(
        &self,
        id: &str,
        quantity: i64,
        actor_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<Option<Item>> {
        debug!(id = %id, quantity, "Stock increment");

        // The upper guard keeps the sum inside i64; SQLite would silently
        // promote an overflowing integer to REAL.
        let row = sqlx::query_as::<_, ItemRow>(concat!(
            "UPDATE items SET quantity = quantity + ?1, stock_version = stock_version + 1, ",
            "updated_at = ?2, updated_by = ?3 ",
            "WHERE id = ?4 AND is_active = 1 AND quantity <= ?5 RETURNING ",
            item_columns!()
        ))
        .bind(quantity)
        .bind(at)
        .bind(actor_id)
        .bind(id)
        .bind(i64::MAX - quantity)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Item::try_from).transpose()
    }

    async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE is_active = 1 AND quantity > 0 AND quantity <= ?1 ",
            "ORDER BY quantity ASC, name_key ASC"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        into_items(rows)
    }

    async fn out_of_stock(&self) -> DbResult<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(concat!(
            "SELECT ",
            item_columns!(),
            " FROM items WHERE is_active = 1 AND quantity = 0 ORDER BY name_key ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        into_items(rows)
    }

    async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM items WHERE is_active = 1 ORDER BY category ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
