use async_trait::async_trait;
use uuid::Uuid;

use super::models::{DeliveryOutcome, Subscription};

#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn active_subscriptions(&self) -> anyhow::Result<Vec<Subscription>>;
    async fn record_delivery(&self, outcome: DeliveryOutcome) -> anyhow::Result<()>;
    /// Count of `sent` deliveries already recorded for this (subscription, analysis) pair.
    async fn delivered_count(&self, subscription_id: Uuid, analysis_result_id: Uuid) -> anyhow::Result<u32>;
}

#[derive(Default)]
pub struct MockWebhookStore {
    subscriptions: dashmap::DashMap<Uuid, Subscription>,
    deliveries: dashmap::DashMap<(Uuid, Uuid), u32>,
    pub delivery_log: std::sync::Mutex<Vec<DeliveryOutcome>>,
}

impl MockWebhookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscription(&self, subscription: Subscription) {
        self.subscriptions.insert(subscription.id, subscription);
    }
}

#[async_trait]
impl WebhookStore for MockWebhookStore {
    async fn active_subscriptions(&self) -> anyhow::Result<Vec<Subscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|e| e.active)
            .map(|e| e.clone())
            .collect())
    }

    async fn record_delivery(&self, outcome: DeliveryOutcome) -> anyhow::Result<()> {
        if matches!(outcome.status, super::models::DeliveryStatus::Sent) {
            *self
                .deliveries
                .entry((outcome.subscription_id, outcome.analysis_result_id))
                .or_insert(0) += 1;
        }
        self.delivery_log.lock().unwrap().push(outcome);
        Ok(())
    }

    async fn delivered_count(&self, subscription_id: Uuid, analysis_result_id: Uuid) -> anyhow::Result<u32> {
        Ok(*self.deliveries.get(&(subscription_id, analysis_result_id)).as_deref().unwrap_or(&0))
    }
}
