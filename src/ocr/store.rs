use async_trait::async_trait;
use uuid::Uuid;

use super::models::OcrResult;

#[async_trait]
pub trait OcrStore: Send + Sync {
    async fn get(&self, gazette_id: Uuid) -> anyhow::Result<Option<OcrResult>>;
    /// Insert-or-ignore then read-back (spec.md §4.7 determinism contract).
    async fn put_if_absent(&self, result: OcrResult) -> anyhow::Result<OcrResult>;
}

#[derive(Default)]
pub struct MockOcrStore {
    results: dashmap::DashMap<Uuid, OcrResult>,
}

impl MockOcrStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OcrStore for MockOcrStore {
    async fn get(&self, gazette_id: Uuid) -> anyhow::Result<Option<OcrResult>> {
        Ok(self.results.get(&gazette_id).map(|r| r.clone()))
    }

    async fn put_if_absent(&self, result: OcrResult) -> anyhow::Result<OcrResult> {
        let entry = self.results.entry(result.gazette_id).or_insert_with(|| result.clone());
        Ok(entry.clone())
    }
}
