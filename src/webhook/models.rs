use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionFilters {
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub min_confidence: f64,
    pub territory_ids: Vec<String>,
    pub spider_ids: Vec<String>,
    pub require_concurso: bool,
}

impl Default for SubscriptionFilters {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            keywords: Vec::new(),
            min_confidence: 0.0,
            territory_ids: Vec::new(),
            spider_ids: Vec::new(),
            require_concurso: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    None,
    Bearer,
    Basic,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub kind: AuthKind,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxDeliveries {
    Always,
    Bounded(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub client_id: String,
    pub webhook_url: String,
    pub filters: SubscriptionFilters,
    pub auth: Auth,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub max_deliveries: MaxDeliveries,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    GazetteAnalyzed,
    ConcursoDetected,
    LicitacaoDetected,
}

impl WebhookEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookEvent::GazetteAnalyzed => "gazette.analyzed",
            WebhookEvent::ConcursoDetected => "concurso.detected",
            WebhookEvent::LicitacaoDetected => "licitacao.detected",
        }
    }
}

/// The payload enqueued on the webhook queue, matching spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCallback {
    pub analysis_result_id: Uuid,
    pub gazette_crawl_id: Uuid,
    pub territory_id: String,
    pub findings_count: usize,
    pub categories: Vec<String>,
    pub high_confidence_findings: usize,
    pub keywords: Vec<String>,
    pub job_id: Uuid,
    pub gazette_id: Uuid,
    pub publication_date: NaiveDate,
    pub analyzed_at: DateTime<Utc>,
    pub has_concurso: bool,
    pub has_licitacao: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Retry,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub subscription_id: Uuid,
    pub analysis_result_id: Uuid,
    pub status: DeliveryStatus,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    pub delivery_time_ms: u64,
    pub attempt: u32,
}
