pub mod analyzers;
pub mod config_signature;
pub mod models;
pub mod pg_store;
pub mod store;
pub mod territory;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::ocr::KvCache;
use crate::util::hash::short_hash16;

pub use analyzers::{AiAnalyzer, Analyzer, ConcursoAnalyzer, EntityAnalyzer, KeywordAnalyzer};
pub use models::{AnalysisContext, AnalysisResult, AnalyzerOutcome, AnalyzerStatus, AnalyzerType, Finding, TerritoryFilterMetadata};
pub use pg_store::PgAnalysisStore;
pub use store::{AnalysisStore, MockAnalysisStore};
pub use territory::TerritoryFilter;

/// Everything the two-phase run needs to know about a single gazette
/// (spec.md §4.5).
pub struct AnalysisRequest {
    pub gazette_id: Uuid,
    pub territory_id: String,
    pub publication_date: NaiveDate,
    pub text: String,
    pub city_filter: Option<String>,
}

/// Drives Phase A (keyword/concurso/entity) then Phase B (ai) over a
/// gazette's text, deduplicating by `configHash` and, for state gazettes,
/// by the additional city filter (spec.md §4.5 steps 3-7).
pub struct AnalysisOrchestrator {
    phase_a: Vec<Arc<dyn Analyzer>>,
    phase_b: Vec<Arc<dyn Analyzer>>,
    config_version: String,
    enabled_analyzers: Vec<String>,
    custom_keywords: Vec<String>,
}

impl AnalysisOrchestrator {
    pub fn new(
        phase_a: Vec<Arc<dyn Analyzer>>,
        phase_b: Vec<Arc<dyn Analyzer>>,
        config_version: impl Into<String>,
        custom_keywords: Vec<String>,
    ) -> Self {
        let enabled_analyzers =
            phase_a.iter().chain(phase_b.iter()).map(|a| a.id().to_string()).collect();
        Self { phase_a, phase_b, config_version: config_version.into(), enabled_analyzers, custom_keywords }
    }

    fn job_id(&self, request: &AnalysisRequest, config_signature: &str) -> String {
        let gazette_id = request.gazette_id.to_string();
        let mut parts = vec![request.territory_id.as_str(), gazette_id.as_str(), config_signature];
        if let Some(city) = &request.city_filter {
            parts.push(city.as_str());
        }
        format!("analysis-{}", short_hash16(&parts))
    }

    /// Runs the full pipeline for one gazette against cache + durable store,
    /// returning the existing result on a dedup hit without re-running
    /// analyzers (spec.md §4.7, §8 invariant 3, scenario S6).
    pub async fn run(
        &self,
        request: AnalysisRequest,
        cache: &dyn KvCache<AnalysisResult>,
        store: &dyn AnalysisStore,
    ) -> anyhow::Result<Option<AnalysisResult>> {
        let config_signature = config_signature::compute(
            &self.config_version,
            &self.enabled_analyzers.iter().map(String::as_str).collect::<Vec<_>>(),
            &self.custom_keywords,
            &request.territory_id,
        );

        let job_id = self.job_id(&request, &config_signature);

        let cache_key = format!(
            "analysis:dedup:{}:{}:{}{}",
            request.territory_id,
            request.gazette_id,
            config_signature,
            request.city_filter.as_deref().map(|c| format!(":{c}")).unwrap_or_default()
        );

        if let Some(cached) = cache.get(&cache_key) {
            return Ok(Some(cached));
        }
        if let Some(existing) = store.get(&job_id).await? {
            cache.put_with_ttl(cache_key, existing.clone(), std::time::Duration::from_secs(3600));
            return Ok(Some(existing));
        }

        let (text, territory_filter) = match &request.city_filter {
            None => (request.text.clone(), None),
            Some(city) => {
                let filter = TerritoryFilter::new(city);
                let outcome = filter.apply(&request.text);
                if !outcome.matched {
                    return Ok(None);
                }
                (
                    outcome.filtered_text,
                    Some(TerritoryFilterMetadata {
                        city_name: filter.city_name().to_string(),
                        city_regex: filter.city_regex().to_string(),
                        filtered_text_length: outcome.filtered_text_length,
                        original_text_length: outcome.original_text_length,
                    }),
                )
            }
        };

        let mut context = AnalysisContext::default();
        let mut findings = Vec::new();

        for analyzer in &self.phase_a {
            let outcome = analyzer.analyze(&text, &context).await;
            context.absorb(&outcome);
            findings.extend(outcome.findings);
        }

        for analyzer in &self.phase_b {
            let outcome = analyzer.analyze(&text, &context).await;
            findings.extend(outcome.findings);
        }

        let high_confidence_findings = findings.iter().filter(|f| f.is_high_confidence()).count();
        let mut categories: Vec<String> = findings
            .iter()
            .flat_map(|f| {
                let mut cats = f.categories();
                if let Some(single) = f.category() {
                    cats.push(single);
                }
                cats
            })
            .collect();
        categories.sort_unstable();
        categories.dedup();

        let result = AnalysisResult {
            analysis_id: Uuid::new_v4(),
            job_id: job_id.clone(),
            territory_id: request.territory_id.clone(),
            publication_date: request.publication_date,
            total_findings: findings.len(),
            high_confidence_findings,
            categories,
            keywords: self.custom_keywords.clone(),
            findings,
            summary: json!({ "documentType": context.primary_document_type() }),
            analyzed_at: Utc::now(),
            config_signature,
            territory_filter,
        };

        let persisted = store.put_if_absent(result).await?;
        cache.put_with_ttl(cache_key, persisted.clone(), std::time::Duration::from_secs(3600));

        Ok(Some(persisted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::InProcessCache;

    fn orchestrator() -> AnalysisOrchestrator {
        let keyword = Arc::new(KeywordAnalyzer::default_catalog("keyword", 10.0).unwrap());
        let concurso = Arc::new(ConcursoAnalyzer::new("concurso", 20.0, 100));
        let entity = Arc::new(EntityAnalyzer::new("entity", 5.0));
        AnalysisOrchestrator::new(vec![keyword, concurso, entity], vec![], "v1", vec![])
    }

    #[tokio::test]
    async fn redelivery_does_not_duplicate_analysis_result() {
        let orchestrator = orchestrator();
        let cache: InProcessCache<AnalysisResult> = InProcessCache::default();
        let store = MockAnalysisStore::new();

        let make_request = || AnalysisRequest {
            gazette_id: Uuid::new_v4(),
            territory_id: "2927408".to_string(),
            publication_date: Utc::now().date_naive(),
            text: "Edital de convocação para concurso público municipal.".to_string(),
            city_filter: None,
        };
        let request = make_request();
        let gazette_id = request.gazette_id;

        let mut results = Vec::new();
        for _ in 0..3 {
            let req = AnalysisRequest {
                gazette_id,
                territory_id: "2927408".to_string(),
                publication_date: request.publication_date,
                text: request.text.clone(),
                city_filter: None,
            };
            results.push(orchestrator.run(req, &cache, &store).await.unwrap().unwrap());
        }

        assert!(results.windows(2).all(|w| w[0].analysis_id == w[1].analysis_id));
    }

    #[tokio::test]
    async fn state_gazette_filters_to_matching_city_only() {
        let orchestrator = orchestrator();
        let cache: InProcessCache<AnalysisResult> = InProcessCache::default();
        let store = MockAnalysisStore::new();

        let text = "Texto introdutório do estado.\n\nArt. 1º Dispõe sobre Salvador e a convocação de concurso público municipal de Salvador.\n\nArt. 2º Dispõe sobre Feira de Santana e outros assuntos administrativos locais.\n\nArt. 3º Disposições finais gerais do estado sem menção a cidade específica.".to_string();

        let request = AnalysisRequest {
            gazette_id: Uuid::new_v4(),
            territory_id: "2927408".to_string(),
            publication_date: Utc::now().date_naive(),
            text,
            city_filter: Some("Salvador".to_string()),
        };

        let result = orchestrator.run(request, &cache, &store).await.unwrap().unwrap();
        let filter = result.territory_filter.as_ref().unwrap();
        assert!(filter.original_text_length > filter.filtered_text_length);
        assert!(filter.filtered_text_length > 0);
    }

    #[tokio::test]
    async fn unmatched_city_filter_yields_no_result() {
        let orchestrator = orchestrator();
        let cache: InProcessCache<AnalysisResult> = InProcessCache::default();
        let store = MockAnalysisStore::new();

        let request = AnalysisRequest {
            gazette_id: Uuid::new_v4(),
            territory_id: "2927408".to_string(),
            publication_date: Utc::now().date_naive(),
            text: "Texto sobre outra localidade qualquer.".to_string(),
            city_filter: Some("Salvador".to_string()),
        };

        let result = orchestrator.run(request, &cache, &store).await.unwrap();
        assert!(result.is_none());
    }
}
