use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::ocr::{self, KvCache, OcrClient, OcrResult, OcrStore, ObjectStoreClient};
use crate::queue::{AnalysisMessage, OcrMessage, Outcome, QueueStore};
use crate::registry::{GazetteStatus, RegistryStore};

/// Resolves a gazette through cache-aside OCR with write-through persistence
/// and best-effort archival, then fans out to analysis (spec.md §4.4).
pub struct OcrStage<R, O, Q> {
    registry: Arc<R>,
    ocr_store: Arc<O>,
    cache: Arc<dyn KvCache<OcrResult>>,
    ocr_client: Arc<OcrClient>,
    object_store: Arc<ObjectStoreClient>,
    analysis_queue: Arc<Q>,
    cache_ttl: Duration,
    analysis_max_attempts: u32,
}

impl<R, O, Q> OcrStage<R, O, Q>
where
    R: RegistryStore + 'static,
    O: OcrStore + 'static,
    Q: QueueStore<AnalysisMessage> + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<R>,
        ocr_store: Arc<O>,
        cache: Arc<dyn KvCache<OcrResult>>,
        ocr_client: Arc<OcrClient>,
        object_store: Arc<ObjectStoreClient>,
        analysis_queue: Arc<Q>,
        cache_ttl: Duration,
        analysis_max_attempts: u32,
    ) -> Self {
        Self {
            registry,
            ocr_store,
            cache,
            ocr_client,
            object_store,
            analysis_queue,
            cache_ttl,
            analysis_max_attempts,
        }
    }

    pub async fn handle(&self, message: OcrMessage) -> Outcome {
        match self.run(&message).await {
            Ok(()) => Outcome::Ack,
            Err(error) => Outcome::Retry(error),
        }
    }

    async fn run(&self, message: &OcrMessage) -> anyhow::Result<()> {
        let gazette = self
            .registry
            .get_gazette(message.gazette_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("gazette {} not found", message.gazette_id))?;

        match gazette.status {
            GazetteStatus::OcrSuccess => {
                // Short-circuit: backfill archival if needed, then move straight to analysis.
                if gazette.pdf_object_key.is_none()
                    && let Some(key) = self.object_store.archive(&gazette.pdf_url).await
                {
                    self.registry.set_object_key(message.gazette_id, &key).await?;
                }
                self.enqueue_analysis(message).await?;
                return Ok(());
            }
            GazetteStatus::OcrFailure => {
                self.registry.set_status(message.gazette_id, GazetteStatus::OcrRetrying).await?;
            }
            GazetteStatus::OcrProcessing | GazetteStatus::OcrRetrying => {
                // A previous attempt registered a claim but never completed; retry in place.
            }
            GazetteStatus::Pending | GazetteStatus::Uploaded => {
                let claimed = self.registry.claim_for_processing(message.gazette_id).await?;
                if !claimed {
                    info!(gazette_id = %message.gazette_id, "ocr claim lost to another worker");
                    return Ok(());
                }
            }
        }

        let cache_key = ocr::cache_key(&gazette.pdf_url);
        if let Some(cached) = self.cache.get(&cache_key) {
            self.ocr_store.put_if_absent(cached).await?;
            self.registry.set_status(message.gazette_id, GazetteStatus::OcrSuccess).await?;
            self.enqueue_analysis(message).await?;
            return Ok(());
        }

        if let Some(existing) = self.ocr_store.get(message.gazette_id).await? {
            self.cache.put_with_ttl(cache_key, existing, self.cache_ttl);
            self.registry.set_status(message.gazette_id, GazetteStatus::OcrSuccess).await?;
            self.enqueue_analysis(message).await?;
            return Ok(());
        }

        let archive_key = self.object_store.archive(&gazette.pdf_url).await;
        if let Some(key) = &archive_key {
            self.registry.set_object_key(message.gazette_id, key).await?;
        }

        let started = Instant::now();
        let ocr_outcome = match self.ocr_client.ocr(&gazette.pdf_url).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.registry.set_status(message.gazette_id, GazetteStatus::OcrFailure).await?;
                return Err(error);
            }
        };

        let mut result = OcrResult::new(message.gazette_id, ocr_outcome.markdown, "external_api");
        result.pages_processed = ocr_outcome.pages_processed;
        result.processing_time_ms = started.elapsed().as_millis() as u64;
        result.archive_key = archive_key;

        let persisted = self.ocr_store.put_if_absent(result).await?;
        self.cache.put_with_ttl(cache_key, persisted, self.cache_ttl);
        self.registry.set_status(message.gazette_id, GazetteStatus::OcrSuccess).await?;

        self.enqueue_analysis(message).await?;
        Ok(())
    }

    async fn enqueue_analysis(&self, message: &OcrMessage) -> anyhow::Result<()> {
        let crawl = self
            .registry
            .get_crawl(message.gazette_crawl_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("crawl {} not found", message.gazette_crawl_id))?;

        self.analysis_queue
            .enqueue(
                AnalysisMessage {
                    job_id: Uuid::new_v4(),
                    gazette_crawl_id: message.gazette_crawl_id,
                    gazette_id: message.gazette_id,
                    spider_id: crawl.spider_id,
                    crawl_job_id: message.crawl_job_id,
                    queued_at: Utc::now(),
                },
                self.analysis_max_attempts,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ocr::InProcessCache;
    use crate::queue::MockQueueStore;
    use crate::registry::{GazetteCandidate, MockRegistryStore, NewCrawlAttempt, Power, RegistryStore};

    async fn build_stage(
        ocr_server: &MockServer,
    ) -> (OcrStage<MockRegistryStore, crate::ocr::MockOcrStore, MockQueueStore<AnalysisMessage>>, Uuid, Uuid) {
        let registry = Arc::new(MockRegistryStore::new());
        let ocr_store = Arc::new(crate::ocr::MockOcrStore::new());
        let cache: Arc<dyn KvCache<OcrResult>> = Arc::new(InProcessCache::new());
        let ocr_client = Arc::new(OcrClient::new(format!("{}/ocr", ocr_server.uri()), "key".to_string(), "model".to_string(), Duration::from_secs(5)).unwrap());
        let object_store = Arc::new(ObjectStoreClient::new(ocr_server.uri(), "bucket".to_string()));
        let analysis_queue = Arc::new(MockQueueStore::<AnalysisMessage>::new());

        let candidate = GazetteCandidate {
            pdf_url: "https://example.gov.br/edition-1.pdf".to_string(),
            publication_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            edition_number: Some("1".to_string()),
            is_extra_edition: false,
            power: Power::Executive,
        };
        let gazette = registry.find_or_create(&candidate.pdf_url, &candidate).await.unwrap();
        let crawl = registry
            .create_crawl(NewCrawlAttempt {
                job_id: Uuid::new_v4(),
                territory_id: "2927408".to_string(),
                spider_id: "ba_salvador".to_string(),
                gazette_id: gazette.gazette_id,
            })
            .await
            .unwrap();

        let stage = OcrStage::new(
            Arc::clone(&registry),
            ocr_store,
            cache,
            ocr_client,
            object_store,
            Arc::clone(&analysis_queue),
            Duration::from_secs(60),
            3,
        );

        (stage, gazette.gazette_id, crawl.crawl_id)
    }

    #[tokio::test]
    async fn redelivery_calls_ocr_once_and_enqueues_analysis_every_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ocr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "pages": [{"index": 0, "markdown": "edital text"}],
            })))
            .expect(1)
            .mount(&server)
            .await;
        // Archival PUT/GET best-effort; any response is fine since failures are swallowed.
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec())).mount(&server).await;
        Mock::given(method("PUT")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let (stage, gazette_id, crawl_id) = build_stage(&server).await;
        let message = OcrMessage {
            job_id: Uuid::new_v4(),
            gazette_crawl_id: crawl_id,
            gazette_id,
            crawl_job_id: Uuid::new_v4(),
            queued_at: Utc::now(),
        };

        for _ in 0..3 {
            let outcome = stage.handle(message.clone()).await;
            assert!(matches!(outcome, Outcome::Ack));
        }

        assert_eq!(stage.analysis_queue.enqueue_count.load(Ordering::SeqCst), 3);
        server.verify().await;
    }

    #[tokio::test]
    async fn ocr_store_hit_skips_external_api_and_rehydrates_cache() {
        let server = MockServer::start().await;
        // No mock mounted for POST /ocr: a call to the external OCR API fails the test.

        let (stage, gazette_id, crawl_id) = build_stage(&server).await;
        let cache_key = ocr::cache_key("https://example.gov.br/edition-1.pdf");
        stage
            .ocr_store
            .put_if_absent(OcrResult::new(gazette_id, "edital text".to_string(), "external_api"))
            .await
            .unwrap();

        let message = OcrMessage {
            job_id: Uuid::new_v4(),
            gazette_crawl_id: crawl_id,
            gazette_id,
            crawl_job_id: Uuid::new_v4(),
            queued_at: Utc::now(),
        };

        let outcome = stage.handle(message).await;
        assert!(matches!(outcome, Outcome::Ack));
        assert!(stage.cache.get(&cache_key).is_some());
        assert_eq!(stage.analysis_queue.enqueue_count.load(Ordering::SeqCst), 1);
    }
}
