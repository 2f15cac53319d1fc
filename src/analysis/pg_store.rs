use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::models::AnalysisResult;
use super::store::AnalysisStore;

#[derive(Debug, Clone)]
pub struct PgAnalysisStore {
    pool: PgPool,
}

impl PgAnalysisStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_result(row: sqlx::postgres::PgRow) -> Result<AnalysisResult> {
        let categories: serde_json::Value = row.try_get("categories")?;
        let keywords: serde_json::Value = row.try_get("keywords")?;
        let findings: serde_json::Value = row.try_get("findings")?;
        let territory_filter: Option<serde_json::Value> = row.try_get("territory_filter")?;

        Ok(AnalysisResult {
            analysis_id: row.try_get("analysis_id")?,
            job_id: row.try_get("job_id")?,
            territory_id: row.try_get("territory_id")?,
            publication_date: row.try_get("publication_date")?,
            total_findings: row.try_get::<i32, _>("total_findings")? as usize,
            high_confidence_findings: row.try_get::<i32, _>("high_confidence_findings")? as usize,
            categories: serde_json::from_value(categories).unwrap_or_default(),
            keywords: serde_json::from_value(keywords).unwrap_or_default(),
            findings: serde_json::from_value(findings).unwrap_or_default(),
            summary: row.try_get("summary")?,
            analyzed_at: row.try_get("analyzed_at")?,
            config_signature: row.try_get("config_signature")?,
            territory_filter: territory_filter.and_then(|v| serde_json::from_value(v).ok()),
        })
    }
}

#[async_trait]
impl AnalysisStore for PgAnalysisStore {
    async fn get(&self, job_id: &str) -> Result<Option<AnalysisResult>> {
        let row = sqlx::query(
            r"SELECT analysis_id, job_id, territory_id, publication_date, total_findings,
                     high_confidence_findings, categories, keywords, findings, summary,
                     analyzed_at, config_signature, territory_filter
              FROM analysis_results WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load analysis result")?;

        row.map(Self::row_to_result).transpose()
    }

    async fn put_if_absent(&self, result: AnalysisResult) -> Result<AnalysisResult> {
        sqlx::query(
            r"
            INSERT INTO analysis_results
                (analysis_id, job_id, territory_id, publication_date, total_findings,
                 high_confidence_findings, categories, keywords, findings, summary,
                 analyzed_at, config_signature, territory_filter)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (job_id) DO NOTHING
            ",
        )
        .bind(result.analysis_id)
        .bind(&result.job_id)
        .bind(&result.territory_id)
        .bind(result.publication_date)
        .bind(result.total_findings as i32)
        .bind(result.high_confidence_findings as i32)
        .bind(serde_json::to_value(&result.categories)?)
        .bind(serde_json::to_value(&result.keywords)?)
        .bind(serde_json::to_value(&result.findings)?)
        .bind(&result.summary)
        .bind(result.analyzed_at)
        .bind(&result.config_signature)
        .bind(result.territory_filter.as_ref().map(serde_json::to_value).transpose()?)
        .execute(&self.pool)
        .await
        .context("failed to insert analysis result")?;

        self.get(&result.job_id)
            .await?
            .context("analysis result missing immediately after insert")
    }
}
