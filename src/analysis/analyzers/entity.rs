use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::analysis::models::{AnalysisContext, AnalyzerOutcome, AnalyzerStatus, AnalyzerType, Finding};

use super::Analyzer;

static CPF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").unwrap());
static CNPJ_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").unwrap());
static MONEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"R\$\s*\d{1,3}(?:\.\d{3})*(?:,\d{2})?").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap());

/// Extracts structured entities (CPF/CNPJ, monetary values, dates) so later
/// analyzers and downstream consumers get typed data rather than raw text
/// (SPEC_FULL.md analysis component notes).
pub struct EntityAnalyzer {
    id: String,
    priority: f64,
}

impl EntityAnalyzer {
    pub fn new(id: impl Into<String>, priority: f64) -> Self {
        Self { id: id.into(), priority }
    }

    fn extract(text: &str, regex: &Regex, entity_type: &str, confidence: f64) -> Vec<Finding> {
        regex
            .find_iter(text)
            .map(|m| Finding {
                kind: "entity".to_string(),
                confidence,
                data: json!({ "entityType": entity_type, "value": m.as_str() }),
                context: None,
                position: Some(m.start()),
            })
            .collect()
    }
}

#[async_trait]
impl Analyzer for EntityAnalyzer {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> AnalyzerType {
        AnalyzerType::Entity
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    async fn analyze(&self, text: &str, _context: &AnalysisContext) -> AnalyzerOutcome {
        let mut findings = Vec::new();
        findings.extend(Self::extract(text, &CNPJ_RE, "cnpj", 0.95));
        findings.extend(Self::extract(text, &CPF_RE, "cpf", 0.95));
        findings.extend(Self::extract(text, &MONEY_RE, "monetary_value", 0.9));
        findings.extend(Self::extract(text, &DATE_RE, "date", 0.85));

        AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_cnpj_and_money() {
        let analyzer = EntityAnalyzer::new("entity-1", 5.0);
        let context = AnalysisContext::default();
        let text = "A empresa 12.345.678/0001-99 recebeu o valor de R$ 1.234,56 em 01/02/2026.";
        let outcome = analyzer.analyze(text, &context).await;
        let types: Vec<&str> = outcome
            .findings
            .iter()
            .filter_map(|f| f.data.get("entityType").and_then(|v| v.as_str()))
            .collect();
        assert!(types.contains(&"cnpj"));
        assert!(types.contains(&"monetary_value"));
        assert!(types.contains(&"date"));
    }
}
