use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueName {
    Crawl,
    Ocr,
    Analysis,
    Webhook,
}

impl QueueName {
    pub fn table(self) -> &'static str {
        match self {
            QueueName::Crawl => "crawl_queue",
            QueueName::Ocr => "ocr_queue",
            QueueName::Analysis => "analysis_queue",
            QueueName::Webhook => "webhook_queue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuedMessageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Retrying,
}

impl QueuedMessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QueuedMessageStatus::Pending => "pending",
            QueuedMessageStatus::Running => "running",
            QueuedMessageStatus::Completed => "completed",
            QueuedMessageStatus::Failed => "failed",
            QueuedMessageStatus::Retrying => "retrying",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "retrying" => Some(Self::Retrying),
            _ => None,
        }
    }
}

/// A durable message row, generic over its JSON payload.
#[derive(Debug, Clone)]
pub struct QueuedMessage<P> {
    pub id: i64,
    pub status: QueuedMessageStatus,
    pub payload: P,
    pub attempt: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

/// crawl queue payload — spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlMessage {
    pub spider_id: String,
    pub territory_id: String,
    pub spider_type: String,
    pub gazette_scope: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub crawl_job_id: Uuid,
}

/// ocr queue payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrMessage {
    pub job_id: Uuid,
    pub gazette_crawl_id: Uuid,
    pub gazette_id: Uuid,
    pub crawl_job_id: Uuid,
    pub queued_at: DateTime<Utc>,
}

/// analysis queue payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMessage {
    pub job_id: Uuid,
    pub gazette_crawl_id: Uuid,
    pub gazette_id: Uuid,
    pub spider_id: String,
    pub crawl_job_id: Uuid,
    pub queued_at: DateTime<Utc>,
}

/// webhook queue payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: crate::webhook::AnalysisCallback,
    pub timestamp: DateTime<Utc>,
}
