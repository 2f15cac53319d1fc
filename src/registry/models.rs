use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Power {
    Executive,
    Legislative,
    ExecutiveLegislative,
}

impl Power {
    pub fn as_str(self) -> &'static str {
        match self {
            Power::Executive => "executive",
            Power::Legislative => "legislative",
            Power::ExecutiveLegislative => "executive_legislative",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "executive" => Some(Power::Executive),
            "legislative" => Some(Power::Legislative),
            "executive_legislative" => Some(Power::ExecutiveLegislative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazetteStatus {
    Pending,
    Uploaded,
    OcrProcessing,
    OcrRetrying,
    OcrFailure,
    OcrSuccess,
}

impl GazetteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GazetteStatus::Pending => "pending",
            GazetteStatus::Uploaded => "uploaded",
            GazetteStatus::OcrProcessing => "ocr_processing",
            GazetteStatus::OcrRetrying => "ocr_retrying",
            GazetteStatus::OcrFailure => "ocr_failure",
            GazetteStatus::OcrSuccess => "ocr_success",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(GazetteStatus::Pending),
            "uploaded" => Some(GazetteStatus::Uploaded),
            "ocr_processing" => Some(GazetteStatus::OcrProcessing),
            "ocr_retrying" => Some(GazetteStatus::OcrRetrying),
            "ocr_failure" => Some(GazetteStatus::OcrFailure),
            "ocr_success" => Some(GazetteStatus::OcrSuccess),
            _ => None,
        }
    }

    /// True when the row is not mid-OCR, i.e. a `claim_for_processing` CAS may succeed.
    pub fn claimable(self) -> bool {
        !matches!(self, GazetteStatus::OcrProcessing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStatus {
    Created,
    Processing,
    AnalysisPending,
    Success,
    Failed,
}

impl CrawlStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlStatus::Created => "created",
            CrawlStatus::Processing => "processing",
            CrawlStatus::AnalysisPending => "analysis_pending",
            CrawlStatus::Success => "success",
            CrawlStatus::Failed => "failed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(CrawlStatus::Created),
            "processing" => Some(CrawlStatus::Processing),
            "analysis_pending" => Some(CrawlStatus::AnalysisPending),
            "success" => Some(CrawlStatus::Success),
            "failed" => Some(CrawlStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CrawlStatus::Success | CrawlStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlJobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl CrawlJobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlJobStatus::Pending => "pending",
            CrawlJobStatus::Running => "running",
            CrawlJobStatus::Completed => "completed",
            CrawlJobStatus::Failed => "failed",
        }
    }

    pub fn parse_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CrawlJobStatus::Pending),
            "running" => Some(CrawlJobStatus::Running),
            "completed" => Some(CrawlJobStatus::Completed),
            "failed" => Some(CrawlJobStatus::Failed),
            _ => None,
        }
    }
}

/// A gazette candidate as emitted by a spider, before registry dedup/canonicalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteCandidate {
    pub pdf_url: String,
    pub publication_date: NaiveDate,
    pub edition_number: Option<String>,
    pub is_extra_edition: bool,
    pub power: Power,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gazette {
    pub gazette_id: Uuid,
    pub pdf_url: String,
    pub publication_date: NaiveDate,
    pub edition_number: Option<String>,
    pub is_extra_edition: bool,
    pub power: Power,
    pub pdf_object_key: Option<String>,
    pub status: GazetteStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GazetteCrawl {
    pub crawl_id: Uuid,
    pub job_id: Uuid,
    pub territory_id: String,
    pub spider_id: String,
    pub gazette_id: Uuid,
    pub scraped_at: DateTime<Utc>,
    pub status: CrawlStatus,
    pub analysis_result_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCrawlAttempt {
    pub job_id: Uuid,
    pub territory_id: String,
    pub spider_id: String,
    pub gazette_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub job_id: Uuid,
    pub status: CrawlJobStatus,
    pub total_spiders: i32,
    pub completed_spiders: i32,
    pub failed_spiders: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Progress-event telemetry row, append-only, hint not source-of-truth (spec.md §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: Uuid,
    pub event: &'static str,
    pub status: &'static str,
    pub duration_ms: Option<u64>,
}
