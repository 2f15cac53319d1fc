use async_trait::async_trait;
use dashmap::DashMap;

use super::models::AnalysisResult;

/// Keyed by `(territory_id, job_id)` — `job_id` already folds in the gazette
/// id, config signature, and optional city filter (spec.md §4.5/§4.7).
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn get(&self, job_id: &str) -> anyhow::Result<Option<AnalysisResult>>;

    /// Insert-or-ignore then read-back, so redelivery never creates a
    /// duplicate row for the same `job_id` (spec.md §8 invariant 3).
    async fn put_if_absent(&self, result: AnalysisResult) -> anyhow::Result<AnalysisResult>;
}

#[derive(Default)]
pub struct MockAnalysisStore {
    results: DashMap<String, AnalysisResult>,
}

impl MockAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisStore for MockAnalysisStore {
    async fn get(&self, job_id: &str) -> anyhow::Result<Option<AnalysisResult>> {
        Ok(self.results.get(job_id).map(|r| r.clone()))
    }

    async fn put_if_absent(&self, result: AnalysisResult) -> anyhow::Result<AnalysisResult> {
        let job_id = result.job_id.clone();
        let entry = self.results.entry(job_id).or_insert(result);
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn sample(job_id: &str) -> AnalysisResult {
        AnalysisResult {
            analysis_id: Uuid::new_v4(),
            job_id: job_id.to_string(),
            territory_id: "2927408".to_string(),
            publication_date: Utc::now().date_naive(),
            total_findings: 1,
            high_confidence_findings: 1,
            categories: vec!["concurso".to_string()],
            keywords: vec![],
            findings: vec![],
            summary: json!({}),
            analyzed_at: Utc::now(),
            config_signature: "sig".to_string(),
            territory_filter: None,
        }
    }

    #[tokio::test]
    async fn put_if_absent_does_not_duplicate() {
        let store = MockAnalysisStore::new();
        let first = store.put_if_absent(sample("job-1")).await.unwrap();
        let second = store.put_if_absent(sample("job-1")).await.unwrap();
        assert_eq!(first.analysis_id, second.analysis_id);
    }
}
