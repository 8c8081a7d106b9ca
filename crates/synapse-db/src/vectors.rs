//! pgvector-backed vector store.
//!
//! Embeddings live in `item_embeddings`, keyed by `(collection, id)`.
//! Distances are pgvector cosine distances (`<=>`), in `[0, 2]`.
//!
//! A collection can hold vectors of several dimensions when the provider
//! fallback embeds with a different model. Queries only consider rows whose
//! dimension matches the query vector, since `<=>` rejects mixed dimensions.

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument};

use synapse_core::{Error, Result, VectorHit, VectorStore};

/// PostgreSQL implementation of VectorStore.
#[derive(Clone)]
pub struct PgVectorStore {
    pool: Pool<Postgres>,
}

impl PgVectorStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn vector_error(e: sqlx::Error) -> Error {
    Error::VectorStore(e.to_string())
}

#[async_trait]
impl VectorStore for PgVectorStore {
    #[instrument(skip(self, vector, attributes), fields(subsystem = "db", component = "vectors", op = "add_embedding", dimension = vector.len()))]
    async fn add_embedding(
        &self,
        collection: &str,
        id: &str,
        vector: &[f32],
        attributes: JsonValue,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO item_embeddings (collection, id, vector, dimension, attributes) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (collection, id) DO UPDATE \
             SET vector = EXCLUDED.vector, dimension = EXCLUDED.dimension, \
                 attributes = EXCLUDED.attributes",
        )
        .bind(collection)
        .bind(id)
        .bind(Vector::from(vector.to_vec()))
        .bind(vector.len() as i32)
        .bind(attributes)
        .execute(&self.pool)
        .await
        .map_err(vector_error)?;

        Ok(())
    }

    #[instrument(skip(self, vector), fields(subsystem = "db", component = "vectors", op = "query", dimension = vector.len()))]
    async fn query(&self, collection: &str, vector: &[f32], k: usize) -> Result<Vec<VectorHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT id, (vector <=> $2::vector)::float4 AS distance \
             FROM item_embeddings \
             WHERE collection = $1 AND dimension = $4 \
             ORDER BY vector <=> $2::vector \
             LIMIT $3",
        )
        .bind(collection)
        .bind(Vector::from(vector.to_vec()))
        .bind(k as i64)
        .bind(vector.len() as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(vector_error)?;

        let hits = rows
            .into_iter()
            .map(|row| {
                Ok(VectorHit {
                    id: row.try_get("id").map_err(vector_error)?,
                    distance: row
                        .try_get::<Option<f32>, _>("distance")
                        .map_err(vector_error)?
                        .filter(|d| !d.is_nan())
                        .unwrap_or(f32::MAX)
                        .max(0.0),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(result_count = hits.len(), "Vector query complete");
        Ok(hits)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM item_embeddings WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(vector_error)?;
        Ok(())
    }
}
