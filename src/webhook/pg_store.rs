use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::models::{
    Auth, AuthKind, DeliveryOutcome, DeliveryStatus, MaxDeliveries, Subscription, SubscriptionFilters,
};
use super::store::WebhookStore;

#[derive(Debug, Clone)]
pub struct PgWebhookStore {
    pool: PgPool,
}

impl PgWebhookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookStore for PgWebhookStore {
    async fn active_subscriptions(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(
            r"SELECT id, client_id, webhook_url, filters, auth, max_attempts, backoff_ms,
                     max_deliveries, active, created_at
              FROM webhook_subscriptions WHERE active = TRUE",
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to load active subscriptions")?;

        rows.into_iter()
            .map(|row| {
                let filters_json: serde_json::Value = row.try_get("filters")?;
                let filters: SubscriptionFilters = serde_json::from_value(filters_json)?;
                let auth_json: serde_json::Value = row.try_get("auth")?;
                let auth: Auth = serde_json::from_value(auth_json).unwrap_or(Auth {
                    kind: AuthKind::None,
                    token: None,
                    username: None,
                    password: None,
                    headers: Vec::new(),
                });
                let max_deliveries_raw: Option<i32> = row.try_get("max_deliveries")?;
                let max_deliveries = match max_deliveries_raw {
                    Some(n) => MaxDeliveries::Bounded(n as u32),
                    None => MaxDeliveries::Always,
                };

                Ok(Subscription {
                    id: row.try_get("id")?,
                    client_id: row.try_get("client_id")?,
                    webhook_url: row.try_get("webhook_url")?,
                    filters,
                    auth,
                    max_attempts: row.try_get::<i32, _>("max_attempts")? as u32,
                    backoff_ms: row.try_get::<i64, _>("backoff_ms")? as u64,
                    max_deliveries,
                    active: row.try_get("active")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect::<Result<Vec<_>>>()
    }

    async fn record_delivery(&self, outcome: DeliveryOutcome) -> Result<()> {
        let status_str = match outcome.status {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Retry => "retry",
            DeliveryStatus::Pending => "pending",
        };
        sqlx::query(
            r"INSERT INTO webhook_deliveries
                (subscription_id, analysis_result_id, status, status_code, response_body,
                 delivery_time_ms, attempt, delivered_at)
              VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())",
        )
        .bind(outcome.subscription_id)
        .bind(outcome.analysis_result_id)
        .bind(status_str)
        .bind(outcome.status_code.map(i32::from))
        .bind(json!(outcome.response_body))
        .bind(outcome.delivery_time_ms as i64)
        .bind(outcome.attempt as i32)
        .execute(&self.pool)
        .await
        .context("failed to record delivery")?;
        Ok(())
    }

    async fn delivered_count(&self, subscription_id: Uuid, analysis_result_id: Uuid) -> Result<u32> {
        let row = sqlx::query(
            r"SELECT COUNT(*) AS n FROM webhook_deliveries
              WHERE subscription_id = $1 AND analysis_result_id = $2 AND status = 'sent'",
        )
        .bind(subscription_id)
        .bind(analysis_result_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to count deliveries")?;
        let n: i64 = row.try_get("n")?;
        Ok(n as u32)
    }
}
