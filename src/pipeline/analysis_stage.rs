use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::analysis::{AnalysisOrchestrator, AnalysisRequest, AnalysisResult};
use crate::ocr::{KvCache, OcrStore};
use crate::queue::{AnalysisMessage, Outcome, QueueStore, WebhookMessage};
use crate::registry::{CrawlStatus, RegistryStore};
use crate::spiders::SpiderRegistry;
use crate::webhook::AnalysisCallback;

/// Runs the two-phase analyzer pipeline for one gazette crawl and enqueues a
/// webhook callback on success (spec.md §4.5).
pub struct AnalysisStage<R, O, A, Q> {
    registry: Arc<R>,
    ocr_store: Arc<O>,
    analysis_store: Arc<A>,
    cache: Arc<dyn KvCache<AnalysisResult>>,
    orchestrator: Arc<AnalysisOrchestrator>,
    spiders: Arc<SpiderRegistry>,
    webhook_queue: Arc<Q>,
    webhook_max_attempts: u32,
}

impl<R, O, A, Q> AnalysisStage<R, O, A, Q>
where
    R: RegistryStore + 'static,
    O: OcrStore + 'static,
    A: crate::analysis::AnalysisStore + 'static,
    Q: QueueStore<WebhookMessage> + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<R>,
        ocr_store: Arc<O>,
        analysis_store: Arc<A>,
        cache: Arc<dyn KvCache<AnalysisResult>>,
        orchestrator: Arc<AnalysisOrchestrator>,
        spiders: Arc<SpiderRegistry>,
        webhook_queue: Arc<Q>,
        webhook_max_attempts: u32,
    ) -> Self {
        Self {
            registry,
            ocr_store,
            analysis_store,
            cache,
            orchestrator,
            spiders,
            webhook_queue,
            webhook_max_attempts,
        }
    }

    pub async fn handle(&self, message: AnalysisMessage) -> Outcome {
        match self.run(&message).await {
            Ok(()) => Outcome::Ack,
            Err(error) => Outcome::Retry(error),
        }
    }

    async fn run(&self, message: &AnalysisMessage) -> anyhow::Result<()> {
        let crawl = self
            .registry
            .get_crawl(message.gazette_crawl_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("crawl {} not found", message.gazette_crawl_id))?;
        self.registry.set_crawl_status(crawl.crawl_id, CrawlStatus::Processing).await?;

        let ocr_result = self
            .ocr_store
            .get(message.gazette_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("ocr result for gazette {} not found", message.gazette_id))?;

        let gazette = self
            .registry
            .get_gazette(message.gazette_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("gazette {} not found", message.gazette_id))?;

        let member_territories = self
            .spiders
            .by_id(&message.spider_id)
            .filter(|c| c.gazette_scope == "state")
            .map(|c| c.member_territories.clone())
            .unwrap_or_default();

        let publish_result = if member_territories.is_empty() {
            self.publish_analysis(
                message,
                crawl.crawl_id,
                message.gazette_id,
                gazette.publication_date,
                &ocr_result.extracted_text,
                crawl.territory_id.clone(),
                None,
            )
            .await
        } else {
            let mut outcome = Ok(());
            for territory in &member_territories {
                outcome = self
                    .publish_analysis(
                        message,
                        crawl.crawl_id,
                        message.gazette_id,
                        gazette.publication_date,
                        &ocr_result.extracted_text,
                        territory.territory_id.clone(),
                        Some(territory.name.clone()),
                    )
                    .await;
                if outcome.is_err() {
                    break;
                }
            }
            outcome
        };

        match publish_result {
            Ok(()) => {
                self.registry.set_crawl_status(crawl.crawl_id, CrawlStatus::Success).await?;
                Ok(())
            }
            Err(error) => {
                self.registry.set_crawl_status(crawl.crawl_id, CrawlStatus::Failed).await?;
                Err(error)
            }
        }
    }

    /// Runs the orchestrator for one territory (the gazette's own city, or one
    /// member city of a state gazette) and enqueues a webhook callback if it
    /// produced a result (spec.md §4.5 step 7, scenario S5).
    #[allow(clippy::too_many_arguments)]
    async fn publish_analysis(
        &self,
        message: &AnalysisMessage,
        crawl_id: Uuid,
        gazette_id: Uuid,
        publication_date: NaiveDate,
        text: &str,
        territory_id: String,
        city_filter: Option<String>,
    ) -> anyhow::Result<()> {
        let request = AnalysisRequest {
            gazette_id,
            territory_id,
            publication_date,
            text: text.to_string(),
            city_filter,
        };

        let outcome = self.orchestrator.run(request, self.cache.as_ref(), self.analysis_store.as_ref()).await?;

        self.registry.set_crawl_status(crawl_id, CrawlStatus::AnalysisPending).await?;

        let Some(result) = outcome else {
            // No matching city filter for this territory: nothing to publish.
            return Ok(());
        };

        self.registry.link_analysis(crawl_id, result.analysis_id).await?;

        let has_concurso = result.has_category("concurso");
        let has_licitacao = result.has_category("licitacao");

        self.webhook_queue
            .enqueue(
                WebhookMessage {
                    kind: "analysis".to_string(),
                    payload: AnalysisCallback {
                        analysis_result_id: result.analysis_id,
                        gazette_crawl_id: crawl_id,
                        territory_id: result.territory_id.clone(),
                        findings_count: result.total_findings,
                        categories: result.categories.clone(),
                        high_confidence_findings: result.high_confidence_findings,
                        keywords: result.keywords.clone(),
                        job_id: message.job_id,
                        gazette_id,
                        publication_date: result.publication_date,
                        analyzed_at: Utc::now(),
                        has_concurso,
                        has_licitacao,
                    },
                    timestamp: Utc::now(),
                },
                self.webhook_max_attempts,
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::analysis::{AnalysisOrchestrator, KeywordAnalyzer, MockAnalysisStore};
    use crate::ocr::{InProcessCache, MockOcrStore, OcrResult};
    use crate::queue::MockQueueStore;
    use crate::registry::{GazetteCandidate, MockRegistryStore, NewCrawlAttempt, Power, RegistryStore};
    use crate::spiders::SpiderRegistry;

    type Stage = AnalysisStage<MockRegistryStore, MockOcrStore, MockAnalysisStore, MockQueueStore<WebhookMessage>>;

    async fn build_stage(spider_id: &str, territory_id: &str, text: &str) -> (Stage, Arc<MockQueueStore<WebhookMessage>>, Uuid) {
        let registry = Arc::new(MockRegistryStore::new());
        let ocr_store = Arc::new(MockOcrStore::new());
        let analysis_store = Arc::new(MockAnalysisStore::new());
        let cache: Arc<dyn KvCache<AnalysisResult>> = Arc::new(InProcessCache::new());
        let keyword = Arc::new(KeywordAnalyzer::default_catalog("keyword", 10.0).unwrap());
        let orchestrator = Arc::new(AnalysisOrchestrator::new(vec![keyword], vec![], "v1", vec![]));
        let spiders = Arc::new(SpiderRegistry::from_embedded_catalog().unwrap());
        let webhook_queue = Arc::new(MockQueueStore::<WebhookMessage>::new());

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
                territory_id: territory_id.to_string(),
                spider_id: spider_id.to_string(),
                gazette_id: gazette.gazette_id,
            })
            .await
            .unwrap();
        ocr_store.put_if_absent(OcrResult::new(gazette.gazette_id, text.to_string(), "external_api")).await.unwrap();

        let stage = AnalysisStage::new(
            Arc::clone(&registry),
            ocr_store,
            analysis_store,
            cache,
            orchestrator,
            spiders,
            Arc::clone(&webhook_queue),
            3,
        );

        (stage, webhook_queue, crawl.crawl_id)
    }

    #[tokio::test]
    async fn city_scope_spider_publishes_once() {
        let text = "Aviso de licitação para pregão presencial número 12/2026 referente a materiais de limpeza.";
        let (stage, webhook_queue, crawl_id) = build_stage("ba_salvador", "2927408", text).await;
        let message = AnalysisMessage {
            job_id: Uuid::new_v4(),
            gazette_crawl_id: crawl_id,
            gazette_id: stage.registry.get_crawl(crawl_id).await.unwrap().unwrap().gazette_id,
            spider_id: "ba_salvador".to_string(),
            crawl_job_id: Uuid::new_v4(),
            queued_at: Utc::now(),
        };

        let outcome = stage.handle(message).await;
        assert!(matches!(outcome, Outcome::Ack));
        assert_eq!(webhook_queue.enqueue_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn state_scope_spider_publishes_once_per_matched_member_city() {
        let text = "\
            Aviso de licitação na cidade de Salvador para pregão presencial número 1/2026.\n\n\
            Aviso de licitação na cidade de Feira de Santana para pregão presencial número 2/2026.\n\n\
            Decreto sem relação com nenhuma das cidades cobertas pelo diário estadual.";
        let (stage, webhook_queue, crawl_id) = build_stage("ba_state", "ba", text).await;
        let message = AnalysisMessage {
            job_id: Uuid::new_v4(),
            gazette_crawl_id: crawl_id,
            gazette_id: stage.registry.get_crawl(crawl_id).await.unwrap().unwrap().gazette_id,
            spider_id: "ba_state".to_string(),
            crawl_job_id: Uuid::new_v4(),
            queued_at: Utc::now(),
        };

        let outcome = stage.handle(message).await;
        assert!(matches!(outcome, Outcome::Ack));
        // Three member cities configured (Salvador, Feira de Santana, Vitória da
        // Conquista), but only the first two are mentioned in the text.
        assert_eq!(webhook_queue.enqueue_count.load(Ordering::SeqCst), 2);
    }
}
