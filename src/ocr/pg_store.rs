use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::OcrResult;
use super::store::OcrStore;

#[derive(Debug, Clone)]
pub struct PgOcrStore {
    pool: PgPool,
}

impl PgOcrStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_result(row: sqlx::postgres::PgRow) -> Result<OcrResult> {
        Ok(OcrResult {
            gazette_id: row.try_get("gazette_id")?,
            extracted_text: row.try_get("extracted_text")?,
            text_length: row.try_get::<i32, _>("text_length")? as usize,
            confidence: row.try_get("confidence")?,
            language: row.try_get("language")?,
            method: row.try_get("method")?,
            pages_processed: row.try_get::<i32, _>("pages_processed")? as u32,
            processing_time_ms: row.try_get::<i64, _>("processing_time_ms")? as u64,
            archive_key: row.try_get("archive_key")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OcrStore for PgOcrStore {
    async fn get(&self, gazette_id: Uuid) -> Result<Option<OcrResult>> {
        let row = sqlx::query(
            r"SELECT gazette_id, extracted_text, text_length, confidence, language, method,
                     pages_processed, processing_time_ms, archive_key, created_at
              FROM ocr_results WHERE gazette_id = $1",
        )
        .bind(gazette_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load ocr result")?;

        row.map(Self::row_to_result).transpose()
    }

    async fn put_if_absent(&self, result: OcrResult) -> Result<OcrResult> {
        sqlx::query(
            r"
            INSERT INTO ocr_results
                (gazette_id, extracted_text, text_length, confidence, language, method,
                 pages_processed, processing_time_ms, archive_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
            ON CONFLICT (gazette_id) DO NOTHING
            ",
        )
        .bind(result.gazette_id)
        .bind(&result.extracted_text)
        .bind(result.text_length as i32)
        .bind(result.confidence)
        .bind(&result.language)
        .bind(&result.method)
        .bind(result.pages_processed as i32)
        .bind(result.processing_time_ms as i64)
        .bind(&result.archive_key)
        .execute(&self.pool)
        .await
        .context("failed to insert ocr result")?;

        self.get(result.gazette_id)
            .await?
            .context("ocr result missing immediately after insert")
    }
}
