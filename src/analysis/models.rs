use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerType {
    Keyword,
    Concurso,
    Entity,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: String,
    pub confidence: f64,
    pub data: Value,
    pub context: Option<String>,
    pub position: Option<usize>,
}

impl Finding {
    pub fn is_high_confidence(&self) -> bool {
        self.confidence >= 0.8
    }

    pub fn category(&self) -> Option<String> {
        self.data.get("category").and_then(|v| v.as_str()).map(str::to_string)
    }

    pub fn categories(&self) -> Vec<String> {
        self.data
            .get("category")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// `{status: failure, findings: []}` when an analyzer itself errors (spec §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerOutcome {
    pub analyzer_id: String,
    pub status: AnalyzerStatus,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerStatus {
    Success,
    Failure,
}

/// Accumulates Phase A findings so Phase B (AI) analyzers run with structured
/// priors instead of raw text alone (spec §4.5 step 5).
#[derive(Debug, Clone, Default)]
pub struct AnalysisContext {
    pub document_types: HashMap<String, f64>,
    pub categories: HashSet<String>,
    pub high_confidence_findings: Vec<Finding>,
    pub entities_by_type: HashMap<String, Vec<String>>,
}

impl AnalysisContext {
    pub fn absorb(&mut self, outcome: &AnalyzerOutcome) {
        for finding in &outcome.findings {
            if let Some(document_type) = finding.data.get("documentType").and_then(|v| v.as_str()) {
                let slot = self.document_types.entry(document_type.to_string()).or_insert(0.0);
                if finding.confidence > *slot {
                    *slot = finding.confidence;
                }
            }
            for category in finding.categories() {
                self.categories.insert(category);
            }
            if let Some(category) = finding.category() {
                self.categories.insert(category);
            }
            if finding.is_high_confidence() {
                self.high_confidence_findings.push(finding.clone());
            }
            if finding.kind == "entity"
                && let (Some(entity_type), Some(value)) = (
                    finding.data.get("entityType").and_then(|v| v.as_str()),
                    finding.data.get("value").and_then(|v| v.as_str()),
                )
            {
                self.entities_by_type
                    .entry(entity_type.to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }
    }

    pub fn primary_document_type(&self) -> Option<String> {
        self.document_types
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(k, _)| k.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritoryFilterMetadata {
    pub city_name: String,
    pub city_regex: String,
    pub filtered_text_length: usize,
    pub original_text_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub job_id: String,
    pub territory_id: String,
    pub publication_date: NaiveDate,
    pub total_findings: usize,
    pub high_confidence_findings: usize,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub findings: Vec<Finding>,
    pub summary: Value,
    pub analyzed_at: DateTime<Utc>,
    pub config_signature: String,
    pub territory_filter: Option<TerritoryFilterMetadata>,
}

impl AnalysisResult {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}
