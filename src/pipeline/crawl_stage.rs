use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::queue::{CrawlMessage, OcrMessage, Outcome, QueueStore};
use crate::registry::{CrawlJobStatus, CrawlStatus, NewCrawlAttempt, RegistryStore};
use crate::spiders::{PlatformSpider, Spider, SpiderRegistry};

/// Runs one spider end to end, registering each discovered gazette and
/// fanning out an OCR job per crawl row (spec.md §4.3).
pub struct CrawlStage<R, Q> {
    registry: Arc<R>,
    spiders: Arc<SpiderRegistry>,
    http: reqwest::Client,
    resolver: crate::registry::UrlResolver,
    ocr_queue: Arc<Q>,
    ocr_max_attempts: u32,
}

impl<R, Q> CrawlStage<R, Q>
where
    R: RegistryStore + 'static,
    Q: QueueStore<OcrMessage> + 'static,
{
    pub fn new(
        registry: Arc<R>,
        spiders: Arc<SpiderRegistry>,
        http: reqwest::Client,
        resolver: crate::registry::UrlResolver,
        ocr_queue: Arc<Q>,
        ocr_max_attempts: u32,
    ) -> Self {
        Self { registry, spiders, http, resolver, ocr_queue, ocr_max_attempts }
    }

    pub async fn handle(&self, message: CrawlMessage) -> Outcome {
        match self.run(message).await {
            Ok(()) => Outcome::Ack,
            Err(error) => Outcome::Retry(error),
        }
    }

    async fn run(&self, message: CrawlMessage) -> anyhow::Result<()> {
        info!(spider_id = %message.spider_id, crawl_job_id = %message.crawl_job_id, "crawl_start");

        let config = self
            .spiders
            .by_id(&message.spider_id)
            .ok_or_else(|| anyhow::anyhow!("unknown spider_id {}", message.spider_id))?
            .clone();

        let spider = PlatformSpider::new(config, self.http.clone(), self.resolver.clone());
        let candidates = spider.crawl(message.start_date, message.end_date).await?;

        let mut completed = 0;
        let mut failed = 0;

        for candidate in candidates {
            match self.enqueue_one(&message, candidate).await {
                Ok(()) => completed += 1,
                Err(error) => {
                    tracing::warn!(error = %error, "failed to register gazette candidate");
                    failed += 1;
                }
            }
        }

        self.registry
            .increment_crawl_job_counters(message.crawl_job_id, completed, failed)
            .await?;
        if failed == 0 {
            self.registry.set_crawl_job_status(message.crawl_job_id, CrawlJobStatus::Completed).await?;
        }

        info!(spider_id = %message.spider_id, completed, failed, "crawl_end");
        Ok(())
    }

    async fn enqueue_one(
        &self,
        message: &CrawlMessage,
        candidate: crate::registry::GazetteCandidate,
    ) -> anyhow::Result<()> {
        let gazette = self.registry.find_or_create(&candidate.pdf_url, &candidate).await?;

        let crawl = self
            .registry
            .create_crawl(NewCrawlAttempt {
                job_id: message.crawl_job_id,
                territory_id: message.territory_id.clone(),
                spider_id: message.spider_id.clone(),
                gazette_id: gazette.gazette_id,
            })
            .await?;
        self.registry.set_crawl_status(crawl.crawl_id, CrawlStatus::Created).await?;

        self.ocr_queue
            .enqueue(
                OcrMessage {
                    job_id: crawl.job_id,
                    gazette_crawl_id: crawl.crawl_id,
                    gazette_id: gazette.gazette_id,
                    crawl_job_id: message.crawl_job_id,
                    queued_at: Utc::now(),
                },
                self.ocr_max_attempts,
            )
            .await?;

        Ok(())
    }
}
