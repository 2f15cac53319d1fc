use std::marker::PhantomData;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use sqlx::{PgPool, Row};

use super::types::{QueuedMessage, QueuedMessageStatus};

#[async_trait]
pub trait QueueStore<P: Send + Sync>: Send + Sync {
    async fn enqueue(&self, payload: P, max_attempts: u32) -> Result<i64>;
    async fn pick_next(&self) -> Result<Option<QueuedMessage<P>>>;
    async fn mark_completed(&self, id: i64) -> Result<()>;
    async fn mark_retrying(&self, id: i64, error: &str) -> Result<()>;
    async fn mark_failed(&self, id: i64, error: &str) -> Result<()>;
    async fn pending_count(&self) -> Result<i64>;
}

/// A single Postgres-backed durable queue, parameterized by its JSON payload
/// type and table name. One instance per queue (crawl/ocr/analysis/webhook).
#[derive(Debug, Clone)]
pub struct PgQueueStore<P> {
    pool: PgPool,
    table: &'static str,
    _payload: PhantomData<P>,
}

impl<P> PgQueueStore<P> {
    pub fn new(pool: PgPool, table: &'static str) -> Self {
        Self {
            pool,
            table,
            _payload: PhantomData,
        }
    }
}

#[async_trait]
impl<P: Serialize + DeserializeOwned + Send + Sync> QueueStore<P> for PgQueueStore<P> {
    async fn enqueue(&self, payload: P, max_attempts: u32) -> Result<i64> {
        let payload_json = json!(payload);
        let sql = format!(
            "INSERT INTO {} (payload, max_attempts, status) VALUES ($1, $2, 'pending') RETURNING id",
            self.table
        );
        let row = sqlx::query(&sql)
            .bind(payload_json)
            .bind(max_attempts as i32)
            .fetch_one(&self.pool)
            .await
            .context("failed to enqueue message")?;
        Ok(row.try_get::<i64, _>("id")?)
    }

    async fn pick_next(&self) -> Result<Option<QueuedMessage<P>>> {
        let sql = format!(
            r"SELECT id, status, payload, attempt, max_attempts, created_at
              FROM {}
              WHERE status IN ('pending', 'retrying')
              ORDER BY created_at ASC
              FOR UPDATE SKIP LOCKED
              LIMIT 1",
            self.table
        );
        let row = sqlx::query(&sql)
            .fetch_optional(&self.pool)
            .await
            .context("failed to pick next message")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let status_str: String = row.try_get("status")?;
        let status = QueuedMessageStatus::parse_str(&status_str).context("invalid message status")?;
        let payload_json: serde_json::Value = row.try_get("payload")?;
        let payload: P = serde_json::from_value(payload_json).context("failed to deserialize payload")?;

        let mark_sql = format!("UPDATE {} SET status = 'running' WHERE id = $1", self.table);
        let id: i64 = row.try_get("id")?;
        sqlx::query(&mark_sql).bind(id).execute(&self.pool).await.context("failed to mark running")?;

        Ok(Some(QueuedMessage {
            id,
            status,
            payload,
            attempt: u32::try_from(row.try_get::<i32, _>("attempt")?).unwrap_or(0),
            max_attempts: u32::try_from(row.try_get::<i32, _>("max_attempts")?).unwrap_or(3),
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn mark_completed(&self, id: i64) -> Result<()> {
        let sql = format!("UPDATE {} SET status = 'completed', completed_at = NOW() WHERE id = $1", self.table);
        sqlx::query(&sql).bind(id).execute(&self.pool).await.context("failed to mark completed")?;
        Ok(())
    }

    async fn mark_retrying(&self, id: i64, error: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET status = 'retrying', attempt = attempt + 1, error_message = $2 WHERE id = $1",
            self.table
        );
        sqlx::query(&sql).bind(id).bind(error).execute(&self.pool).await.context("failed to mark retrying")?;
        Ok(())
    }

    async fn mark_failed(&self, id: i64, error: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET status = 'failed', error_message = $2, completed_at = NOW() WHERE id = $1",
            self.table
        );
        sqlx::query(&sql).bind(id).bind(error).execute(&self.pool).await.context("failed to mark failed")?;
        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) AS n FROM {} WHERE status IN ('pending', 'retrying')", self.table);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await.context("failed to count pending")?;
        Ok(row.try_get("n")?)
    }
}
