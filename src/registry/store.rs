use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::models::{
    CrawlJob, CrawlJobStatus, CrawlStatus, Gazette, GazetteCandidate, GazetteCrawl, GazetteStatus,
    NewCrawlAttempt,
};

#[async_trait]
pub trait RegistryStore: Send + Sync {
    async fn find_or_create(&self, canonical_url: &str, candidate: &GazetteCandidate) -> anyhow::Result<Gazette>;
    async fn get_gazette(&self, gazette_id: Uuid) -> anyhow::Result<Option<Gazette>>;
    /// Compare-and-swap into `ocr_processing`; `false` if another worker holds the claim.
    async fn claim_for_processing(&self, gazette_id: Uuid) -> anyhow::Result<bool>;
    async fn set_status(&self, gazette_id: Uuid, status: GazetteStatus) -> anyhow::Result<()>;
    async fn set_object_key(&self, gazette_id: Uuid, key: &str) -> anyhow::Result<()>;

    async fn create_crawl(&self, attempt: NewCrawlAttempt) -> anyhow::Result<GazetteCrawl>;
    async fn get_crawl(&self, crawl_id: Uuid) -> anyhow::Result<Option<GazetteCrawl>>;
    async fn set_crawl_status(&self, crawl_id: Uuid, status: CrawlStatus) -> anyhow::Result<()>;
    async fn link_analysis(&self, crawl_id: Uuid, analysis_id: Uuid) -> anyhow::Result<()>;

    async fn create_crawl_job(
        &self,
        total_spiders: i32,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
    ) -> anyhow::Result<CrawlJob>;
    async fn set_crawl_job_status(&self, job_id: Uuid, status: CrawlJobStatus) -> anyhow::Result<()>;
    async fn increment_crawl_job_counters(&self, job_id: Uuid, completed: i32, failed: i32) -> anyhow::Result<()>;
}

/// In-memory store backing tests that don't need a live database.
#[derive(Default)]
pub struct MockRegistryStore {
    gazettes: dashmap::DashMap<Uuid, Gazette>,
    by_url: dashmap::DashMap<String, Uuid>,
    crawls: dashmap::DashMap<Uuid, GazetteCrawl>,
    jobs: dashmap::DashMap<Uuid, CrawlJob>,
}

impl MockRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for MockRegistryStore {
    async fn find_or_create(&self, canonical_url: &str, candidate: &GazetteCandidate) -> anyhow::Result<Gazette> {
        if let Some(id) = self.by_url.get(canonical_url)
            && let Some(existing) = self.gazettes.get(&id)
        {
            return Ok(existing.clone());
        }

        let gazette = Gazette {
            gazette_id: Uuid::new_v4(),
            pdf_url: canonical_url.to_string(),
            publication_date: candidate.publication_date,
            edition_number: candidate.edition_number.clone(),
            is_extra_edition: candidate.is_extra_edition,
            power: candidate.power,
            pdf_object_key: None,
            status: GazetteStatus::Pending,
            created_at: Utc::now(),
        };
        self.by_url.insert(canonical_url.to_string(), gazette.gazette_id);
        self.gazettes.insert(gazette.gazette_id, gazette.clone());
        Ok(gazette)
    }

    async fn get_gazette(&self, gazette_id: Uuid) -> anyhow::Result<Option<Gazette>> {
        Ok(self.gazettes.get(&gazette_id).map(|g| g.clone()))
    }

    async fn claim_for_processing(&self, gazette_id: Uuid) -> anyhow::Result<bool> {
        let Some(mut entry) = self.gazettes.get_mut(&gazette_id) else {
            return Ok(false);
        };
        if !entry.status.claimable() {
            return Ok(false);
        }
        entry.status = GazetteStatus::OcrProcessing;
        Ok(true)
    }

    async fn set_status(&self, gazette_id: Uuid, status: GazetteStatus) -> anyhow::Result<()> {
        if let Some(mut entry) = self.gazettes.get_mut(&gazette_id) {
            entry.status = status;
        }
        Ok(())
    }

    async fn set_object_key(&self, gazette_id: Uuid, key: &str) -> anyhow::Result<()> {
        if let Some(mut entry) = self.gazettes.get_mut(&gazette_id)
            && entry.pdf_object_key.is_none()
        {
            entry.pdf_object_key = Some(key.to_string());
        }
        Ok(())
    }

    async fn create_crawl(&self, attempt: NewCrawlAttempt) -> anyhow::Result<GazetteCrawl> {
        let crawl = GazetteCrawl {
            crawl_id: Uuid::new_v4(),
            job_id: attempt.job_id,
            territory_id: attempt.territory_id,
            spider_id: attempt.spider_id,
            gazette_id: attempt.gazette_id,
            scraped_at: Utc::now(),
            status: CrawlStatus::Created,
            analysis_result_id: None,
        };
        self.crawls.insert(crawl.crawl_id, crawl.clone());
        Ok(crawl)
    }

    async fn get_crawl(&self, crawl_id: Uuid) -> anyhow::Result<Option<GazetteCrawl>> {
        Ok(self.crawls.get(&crawl_id).map(|c| c.clone()))
    }

    async fn set_crawl_status(&self, crawl_id: Uuid, status: CrawlStatus) -> anyhow::Result<()> {
        if let Some(mut entry) = self.crawls.get_mut(&crawl_id)
            && !entry.status.is_terminal()
        {
            entry.status = status;
        }
        Ok(())
    }

    async fn link_analysis(&self, crawl_id: Uuid, analysis_id: Uuid) -> anyhow::Result<()> {
        if let Some(mut entry) = self.crawls.get_mut(&crawl_id) {
            entry.analysis_result_id = Some(analysis_id);
        }
        Ok(())
    }

    async fn create_crawl_job(
        &self,
        total_spiders: i32,
        start_date: chrono::NaiveDate,
        end_date: chrono::NaiveDate,
    ) -> anyhow::Result<CrawlJob> {
        let job = CrawlJob {
            job_id: Uuid::new_v4(),
            status: CrawlJobStatus::Pending,
            total_spiders,
            completed_spiders: 0,
            failed_spiders: 0,
            start_date,
            end_date,
            created_at: Utc::now(),
        };
        self.jobs.insert(job.job_id, job.clone());
        Ok(job)
    }

    async fn set_crawl_job_status(&self, job_id: Uuid, status: CrawlJobStatus) -> anyhow::Result<()> {
        if let Some(mut entry) = self.jobs.get_mut(&job_id) {
            entry.status = status;
        }
        Ok(())
    }

    async fn increment_crawl_job_counters(&self, job_id: Uuid, completed: i32, failed: i32) -> anyhow::Result<()> {
        if let Some(mut entry) = self.jobs.get_mut(&job_id) {
            entry.completed_spiders += completed;
            entry.failed_spiders += failed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::models::Power;

    fn candidate() -> GazetteCandidate {
        GazetteCandidate {
            pdf_url: "https://example.gov.br/a.pdf".to_string(),
            publication_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            edition_number: Some("1".to_string()),
            is_extra_edition: false,
            power: Power::Executive,
        }
    }

    #[tokio::test]
    async fn find_or_create_dedupes_by_canonical_url() {
        let store = MockRegistryStore::new();
        let a = store.find_or_create("https://example.gov.br/a.pdf", &candidate()).await.unwrap();
        let b = store.find_or_create("https://example.gov.br/a.pdf", &candidate()).await.unwrap();
        assert_eq!(a.gazette_id, b.gazette_id);
    }

    #[tokio::test]
    async fn claim_for_processing_is_single_flight() {
        let store = MockRegistryStore::new();
        let gazette = store.find_or_create("https://example.gov.br/b.pdf", &candidate()).await.unwrap();

        let first = store.claim_for_processing(gazette.gazette_id).await.unwrap();
        let second = store.claim_for_processing(gazette.gazette_id).await.unwrap();

        assert!(first);
        assert!(!second);
    }

    #[tokio::test]
    async fn crawl_status_never_changes_after_terminal() {
        let store = MockRegistryStore::new();
        let gazette = store.find_or_create("https://example.gov.br/c.pdf", &candidate()).await.unwrap();
        let crawl = store
            .create_crawl(NewCrawlAttempt {
                job_id: Uuid::new_v4(),
                territory_id: "2927408".to_string(),
                spider_id: "ba_salvador".to_string(),
                gazette_id: gazette.gazette_id,
            })
            .await
            .unwrap();

        store.set_crawl_status(crawl.crawl_id, CrawlStatus::Success).await.unwrap();
        store.set_crawl_status(crawl.crawl_id, CrawlStatus::Failed).await.unwrap();

        let reloaded = store.get_crawl(crawl.crawl_id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, CrawlStatus::Success);
    }
}
