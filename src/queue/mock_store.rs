use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::store::QueueStore;
use super::types::{QueuedMessage, QueuedMessageStatus};

/// In-memory queue used by tests that exercise stage handlers without a database.
pub struct MockQueueStore<P> {
    next_id: std::sync::atomic::AtomicI64,
    messages: Mutex<VecDeque<QueuedMessage<P>>>,
    pub enqueue_count: std::sync::atomic::AtomicUsize,
}

impl<P> Default for MockQueueStore<P> {
    fn default() -> Self {
        Self {
            next_id: std::sync::atomic::AtomicI64::new(1),
            messages: Mutex::new(VecDeque::new()),
            enqueue_count: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl<P> MockQueueStore<P> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<P: Clone + Send + Sync> QueueStore<P> for MockQueueStore<P> {
    async fn enqueue(&self, payload: P, max_attempts: u32) -> anyhow::Result<i64> {
        let id = self.next_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.enqueue_count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.messages.lock().unwrap().push_back(QueuedMessage {
            id,
            status: QueuedMessageStatus::Pending,
            payload,
            attempt: 0,
            max_attempts,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn pick_next(&self) -> anyhow::Result<Option<QueuedMessage<P>>> {
        Ok(self.messages.lock().unwrap().pop_front())
    }

    async fn mark_completed(&self, _id: i64) -> anyhow::Result<()> {
        Ok(())
    }

    async fn mark_retrying(&self, id: i64, _error: &str) -> anyhow::Result<()> {
        let mut guard = self.messages.lock().unwrap();
        if let Some(mut msg) = guard.iter().find(|m| m.id == id).cloned() {
            msg.attempt += 1;
            msg.status = QueuedMessageStatus::Retrying;
            guard.push_back(msg);
        }
        Ok(())
    }

    async fn mark_failed(&self, _id: i64, _error: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn pending_count(&self) -> anyhow::Result<i64> {
        Ok(self.messages.lock().unwrap().len() as i64)
    }
}
