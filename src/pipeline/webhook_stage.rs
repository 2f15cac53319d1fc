use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::warn;

use crate::queue::{Outcome, WebhookMessage};
use crate::webhook::{self, WebhookStore};

/// Delivers one analysis callback to every matching active subscription
/// (spec.md §4.6/§6). Per-subscription retry/backoff lives in
/// [`webhook::deliver`]; this stage never fails the message for an
/// individual subscriber's delivery failure, since that delivery will be
/// retried again on its own backoff schedule by `deliver` itself.
pub struct WebhookStage<S> {
    store: Arc<S>,
    client: Client,
    timeout: Duration,
}

impl<S> WebhookStage<S>
where
    S: WebhookStore + 'static,
{
    pub fn new(store: Arc<S>, client: Client, timeout: Duration) -> Self {
        Self { store, client, timeout }
    }

    pub async fn handle(&self, message: WebhookMessage) -> Outcome {
        match self.run(&message).await {
            Ok(()) => Outcome::Ack,
            Err(error) => Outcome::Retry(error),
        }
    }

    async fn run(&self, message: &WebhookMessage) -> anyhow::Result<()> {
        let subscriptions = self.store.active_subscriptions().await?;

        for subscription in subscriptions {
            if !webhook::matches(&subscription, &message.payload) {
                continue;
            }
            if let Err(error) =
                webhook::deliver(&self.client, self.store.as_ref(), self.timeout, &subscription, &message.payload).await
            {
                warn!(subscription_id = %subscription.id, error = %error, "webhook delivery attempt errored");
            }
        }

        Ok(())
    }
}
