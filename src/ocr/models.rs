use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub gazette_id: Uuid,
    pub extracted_text: String,
    pub text_length: usize,
    pub confidence: Option<f64>,
    pub language: Option<String>,
    pub method: String,
    pub pages_processed: u32,
    pub processing_time_ms: u64,
    pub archive_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OcrResult {
    pub fn new(gazette_id: Uuid, extracted_text: String, method: impl Into<String>) -> Self {
        let text_length = extracted_text.chars().count();
        Self {
            gazette_id,
            extracted_text,
            text_length,
            confidence: None,
            language: Some("pt".to_string()),
            method: method.into(),
            pages_processed: 0,
            processing_time_ms: 0,
            archive_key: None,
            created_at: Utc::now(),
        }
    }
}
