#[cfg(test)]
pub mod mock_store;
pub mod store;
pub mod types;
pub mod worker;

#[cfg(test)]
pub use mock_store::MockQueueStore;
pub use store::{PgQueueStore, QueueStore};
pub use types::{AnalysisMessage, CrawlMessage, OcrMessage, QueueName, WebhookMessage};
pub use worker::{Outcome, QueueWorker};
