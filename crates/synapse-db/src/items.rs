//! Item repository implementation.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use synapse_core::{Category, ContentType, Error, Item, ItemRepository, QueryFilters, Result};

use crate::item_filter::{ItemFilterQueryBuilder, QueryParam};

const ITEM_COLUMNS: &str = "id, title, content, summary, category, tags, source_url, type, \
                            embedding_id, image_url, embed_html, created_at";

/// PostgreSQL implementation of ItemRepository.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: Pool<Postgres>,
}

impl PgItemRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Map a database row to an Item.
fn map_row_to_item(row: PgRow) -> Result<Item> {
    let type_str: String = row.try_get("type")?;
    let content_type: ContentType = type_str.parse()?;
    let category: String = row.try_get("category")?;

    Ok(Item {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        category: Category::from_label(&category),
        tags: row.try_get("tags")?,
        source_url: row.try_get("source_url")?,
        content_type,
        embedding_id: row.try_get("embedding_id")?,
        image_url: row.try_get("image_url")?,
        embed_html: row.try_get("embed_html")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    #[instrument(skip(self, item), fields(subsystem = "db", component = "items", op = "insert", item_id = %item.id))]
    async fn insert(&self, item: &Item) -> Result<()> {
        sqlx::query(
            "INSERT INTO items (id, title, content, summary, category, tags, source_url, type, \
                                embedding_id, image_url, embed_html, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.content)
        .bind(&item.summary)
        .bind(item.category.label())
        .bind(&item.tags)
        .bind(&item.source_url)
        .bind(item.content_type.as_str())
        .bind(&item.embedding_id)
        .bind(&item.image_url)
        .bind(&item.embed_html)
        .bind(item.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Item> {
        let row = sqlx::query(&format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::ItemNotFound(id))?;

        map_row_to_item(row)
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM items WHERE id = ANY($1) ORDER BY created_at DESC",
            ITEM_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(map_row_to_item).collect()
    }

    async fn list(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM items ORDER BY created_at DESC",
            ITEM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(map_row_to_item).collect()
    }

    #[instrument(skip(self), fields(subsystem = "db", component = "items", op = "delete"))]
    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(id));
        }
        Ok(())
    }

    #[instrument(skip(self, filters), fields(subsystem = "db", component = "items", op = "search_items"))]
    async fn search_items(&self, filters: &QueryFilters, limit: usize) -> Result<Vec<Item>> {
        let (clause, params) = ItemFilterQueryBuilder::new(filters, 0).build();
        let sql = format!(
            "SELECT {} FROM items WHERE {} ORDER BY created_at DESC LIMIT ${}",
            ITEM_COLUMNS,
            clause,
            params.len() + 1
        );

        let mut q = sqlx::query(&sql);
        for param in &params {
            q = match param {
                QueryParam::String(s) => q.bind(s),
                QueryParam::StringArray(arr) => q.bind(arr),
                QueryParam::Timestamp(ts) => q.bind(ts),
            };
        }
        q = q.bind(limit as i64);

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        debug!(result_count = rows.len(), "Relational search complete");

        rows.into_iter().map(map_row_to_item).collect()
    }
}
