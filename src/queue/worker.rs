use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::util::error::{ErrorKind, classify_error};
use crate::util::retry::RetryConfig;

use super::store::QueueStore;

/// Outcome a stage handler returns for one message.
pub enum Outcome {
    Ack,
    Retry(anyhow::Error),
}

/// Generic semaphore-bounded consumer loop shared by all four queues. The
/// handler decides ack/retry; this loop owns claiming, backoff, and the
/// terminal-failure bookkeeping.
pub struct QueueWorker<P, S, H, Fut>
where
    P: Send + Sync,
    S: QueueStore<P>,
    H: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send,
{
    store: Arc<S>,
    handler: H,
    semaphore: Arc<Semaphore>,
    poll_interval: Duration,
    retry: RetryConfig,
    name: &'static str,
    _payload: std::marker::PhantomData<P>,
}

impl<P, S, H, Fut> QueueWorker<P, S, H, Fut>
where
    P: Send + Sync + 'static,
    S: QueueStore<P> + 'static,
    H: Fn(P) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    pub fn new(
        name: &'static str,
        store: Arc<S>,
        concurrency: usize,
        poll_interval: Duration,
        retry: RetryConfig,
        handler: H,
    ) -> Self {
        Self {
            store,
            handler,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            poll_interval,
            retry,
            name,
            _payload: std::marker::PhantomData,
        }
    }

    pub async fn run(self: Arc<Self>) {
        info!(queue = self.name, concurrency = self.semaphore.available_permits(), "starting queue worker");

        loop {
            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                break;
            };

            let message = match self.store.pick_next().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    drop(permit);
                    sleep(self.poll_interval).await;
                    continue;
                }
                Err(error) => {
                    error!(queue = self.name, error = %error, "failed to pick next message");
                    drop(permit);
                    sleep(self.poll_interval * 4).await;
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let handler = self.handler.clone();
            let retry = self.retry;
            let name = self.name;

            tokio::spawn(async move {
                let _permit = permit;
                let id = message.id;
                let attempt = message.attempt;
                let max_attempts = message.max_attempts;

                match (handler)(message.payload).await {
                    Outcome::Ack => {
                        if let Err(error) = store.mark_completed(id).await {
                            error!(queue = name, message_id = id, error = %error, "failed to mark message completed");
                        }
                    }
                    Outcome::Retry(error) => {
                        let fatal = matches!(classify_error(&error), ErrorKind::Fatal);
                        let exhausted = !retry.can_retry(attempt) || attempt + 1 >= max_attempts;

                        if fatal || exhausted {
                            warn!(queue = name, message_id = id, error = %error, "message failed permanently");
                            if let Err(store_error) = store.mark_failed(id, &error.to_string()).await {
                                error!(queue = name, message_id = id, error = %store_error, "failed to mark message failed");
                            }
                        } else {
                            warn!(queue = name, message_id = id, attempt, error = %error, "message failed, will retry");
                            if let Err(store_error) = store.mark_retrying(id, &error.to_string()).await {
                                error!(queue = name, message_id = id, error = %store_error, "failed to mark message retrying");
                            }
                            sleep(retry.delay_for_attempt(attempt + 1)).await;
                        }
                    }
                }
            });
        }
    }
}
