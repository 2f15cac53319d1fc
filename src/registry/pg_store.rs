use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{
    CrawlJob, CrawlJobStatus, CrawlStatus, Gazette, GazetteCandidate, GazetteCrawl, GazetteStatus,
    NewCrawlAttempt, Power,
};
use super::store::RegistryStore;

#[derive(Debug, Clone)]
pub struct PgRegistryStore {
    pool: PgPool,
}

impl PgRegistryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_gazette(row: sqlx::postgres::PgRow) -> Result<Gazette> {
        let status_str: String = row.try_get("status")?;
        let power_str: String = row.try_get("power")?;
        Ok(Gazette {
            gazette_id: row.try_get("gazette_id")?,
            pdf_url: row.try_get("pdf_url")?,
            publication_date: row.try_get("publication_date")?,
            edition_number: row.try_get("edition_number")?,
            is_extra_edition: row.try_get("is_extra_edition")?,
            power: Power::parse_str(&power_str).context("invalid power")?,
            pdf_object_key: row.try_get("pdf_object_key")?,
            status: GazetteStatus::parse_str(&status_str).context("invalid gazette status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_crawl(row: sqlx::postgres::PgRow) -> Result<GazetteCrawl> {
        let status_str: String = row.try_get("status")?;
        Ok(GazetteCrawl {
            crawl_id: row.try_get("crawl_id")?,
            job_id: row.try_get("job_id")?,
            territory_id: row.try_get("territory_id")?,
            spider_id: row.try_get("spider_id")?,
            gazette_id: row.try_get("gazette_id")?,
            scraped_at: row.try_get("scraped_at")?,
            status: CrawlStatus::parse_str(&status_str).context("invalid crawl status")?,
            analysis_result_id: row.try_get("analysis_result_id")?,
        })
    }

    fn row_to_job(row: sqlx::postgres::PgRow) -> Result<CrawlJob> {
        let status_str: String = row.try_get("status")?;
        Ok(CrawlJob {
            job_id: row.try_get("job_id")?,
            status: CrawlJobStatus::parse_str(&status_str).context("invalid job status")?,
            total_spiders: row.try_get("total_spiders")?,
            completed_spiders: row.try_get("completed_spiders")?,
            failed_spiders: row.try_get("failed_spiders")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl RegistryStore for PgRegistryStore {
    async fn find_or_create(&self, canonical_url: &str, candidate: &GazetteCandidate) -> Result<Gazette> {
        let row = sqlx::query(
            r"
            INSERT INTO gazettes
                (gazette_id, pdf_url, publication_date, edition_number, is_extra_edition, power, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW())
            ON CONFLICT (pdf_url) DO UPDATE SET pdf_url = EXCLUDED.pdf_url
            RETURNING gazette_id, pdf_url, publication_date, edition_number, is_extra_edition,
                      power, pdf_object_key, status, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(canonical_url)
        .bind(candidate.publication_date)
        .bind(&candidate.edition_number)
        .bind(candidate.is_extra_edition)
        .bind(candidate.power.as_str())
        .fetch_one(&self.pool)
        .await
        .context("failed to find_or_create gazette")?;

        Self::row_to_gazette(row)
    }

    async fn get_gazette(&self, gazette_id: Uuid) -> Result<Option<Gazette>> {
        let row = sqlx::query(
            r"SELECT gazette_id, pdf_url, publication_date, edition_number, is_extra_edition,
                     power, pdf_object_key, status, created_at
              FROM gazettes WHERE gazette_id = $1",
        )
        .bind(gazette_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get gazette")?;

        row.map(Self::row_to_gazette).transpose()
    }

    async fn claim_for_processing(&self, gazette_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r"UPDATE gazettes SET status = 'ocr_processing'
              WHERE gazette_id = $1 AND status <> 'ocr_processing'",
        )
        .bind(gazette_id)
        .execute(&self.pool)
        .await
        .context("failed to claim gazette for processing")?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_status(&self, gazette_id: Uuid, status: GazetteStatus) -> Result<()> {
        sqlx::query("UPDATE gazettes SET status = $2 WHERE gazette_id = $1")
            .bind(gazette_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .context("failed to set gazette status")?;
        Ok(())
    }

    async fn set_object_key(&self, gazette_id: Uuid, key: &str) -> Result<()> {
        sqlx::query(
            "UPDATE gazettes SET pdf_object_key = $2 WHERE gazette_id = $1 AND pdf_object_key IS NULL",
        )
        .bind(gazette_id)
        .bind(key)
        .execute(&self.pool)
        .await
        .context("failed to set object key")?;
        Ok(())
    }

    async fn create_crawl(&self, attempt: NewCrawlAttempt) -> Result<GazetteCrawl> {
        let row = sqlx::query(
            r"
            INSERT INTO gazette_crawls
                (crawl_id, job_id, territory_id, spider_id, gazette_id, scraped_at, status)
            VALUES ($1, $2, $3, $4, $5, NOW(), 'created')
            RETURNING crawl_id, job_id, territory_id, spider_id, gazette_id, scraped_at,
                      status, analysis_result_id
            ",
        )
        .bind(Uuid::new_v4())
        .bind(attempt.job_id)
        .bind(&attempt.territory_id)
        .bind(&attempt.spider_id)
        .bind(attempt.gazette_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to create crawl attempt")?;

        Self::row_to_crawl(row)
    }

    async fn get_crawl(&self, crawl_id: Uuid) -> Result<Option<GazetteCrawl>> {
        let row = sqlx::query(
            r"SELECT crawl_id, job_id, territory_id, spider_id, gazette_id, scraped_at,
                     status, analysis_result_id
              FROM gazette_crawls WHERE crawl_id = $1",
        )
        .bind(crawl_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get crawl")?;

        row.map(Self::row_to_crawl).transpose()
    }

    async fn set_crawl_status(&self, crawl_id: Uuid, status: CrawlStatus) -> Result<()> {
        sqlx::query(
            r"UPDATE gazette_crawls SET status = $2
              WHERE crawl_id = $1 AND status NOT IN ('success', 'failed')",
        )
        .bind(crawl_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await
        .context("failed to set crawl status")?;
        Ok(())
    }

    async fn link_analysis(&self, crawl_id: Uuid, analysis_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE gazette_crawls SET analysis_result_id = $2 WHERE crawl_id = $1")
            .bind(crawl_id)
            .bind(analysis_id)
            .execute(&self.pool)
            .await
            .context("failed to link analysis")?;
        Ok(())
    }

    async fn create_crawl_job(&self, total_spiders: i32, start_date: NaiveDate, end_date: NaiveDate) -> Result<CrawlJob> {
        let row = sqlx::query(
            r"
            INSERT INTO crawl_jobs (job_id, status, total_spiders, completed_spiders, failed_spiders,
                                     start_date, end_date, created_at)
            VALUES ($1, 'pending', $2, 0, 0, $3, $4, NOW())
            RETURNING job_id, status, total_spiders, completed_spiders, failed_spiders,
                      start_date, end_date, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(total_spiders)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await
        .context("failed to create crawl job")?;

        Self::row_to_job(row)
    }

    async fn set_crawl_job_status(&self, job_id: Uuid, status: CrawlJobStatus) -> Result<()> {
        sqlx::query("UPDATE crawl_jobs SET status = $2 WHERE job_id = $1")
            .bind(job_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .context("failed to set crawl job status")?;
        Ok(())
    }

    async fn increment_crawl_job_counters(&self, job_id: Uuid, completed: i32, failed: i32) -> Result<()> {
        sqlx::query(
            r"UPDATE crawl_jobs SET completed_spiders = completed_spiders + $2,
                                     failed_spiders = failed_spiders + $3
              WHERE job_id = $1",
        )
        .bind(job_id)
        .bind(completed)
        .bind(failed)
        .execute(&self.pool)
        .await
        .context("failed to increment crawl job counters")?;
        Ok(())
    }
}
