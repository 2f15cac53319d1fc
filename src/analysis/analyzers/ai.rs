use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::analysis::models::{AnalysisContext, AnalyzerOutcome, AnalyzerStatus, AnalyzerType, Finding};

use super::Analyzer;

#[derive(Debug, Serialize)]
struct AiRequest<'a> {
    text: &'a str,
    priors: AiPriors,
}

#[derive(Debug, Serialize)]
struct AiPriors {
    document_types: Vec<String>,
    categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AiResponse {
    findings: Vec<AiFinding>,
}

#[derive(Debug, Deserialize)]
struct AiFinding {
    category: String,
    confidence: f64,
    #[serde(default)]
    summary: Option<String>,
}

/// Phase B analyzer: consumes the `AnalysisContext` accumulated by Phase A
/// (keyword/concurso/entity) as priors and calls a pluggable external model
/// endpoint. The model's own reasoning is out of scope here; only the
/// request/response contract and failure isolation are (spec.md §4.5 step 5,
/// Non-goals excluding LLM internals).
pub struct AiAnalyzer {
    id: String,
    priority: f64,
    client: Client,
    base_url: Option<String>,
}

impl AiAnalyzer {
    pub fn new(id: impl Into<String>, priority: f64, base_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder().timeout(timeout).build().unwrap_or_else(|_| Client::new());
        Self { id: id.into(), priority, client, base_url }
    }
}

#[async_trait]
impl Analyzer for AiAnalyzer {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> AnalyzerType {
        AnalyzerType::Ai
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    async fn analyze(&self, text: &str, context: &AnalysisContext) -> AnalyzerOutcome {
        let Some(base_url) = &self.base_url else {
            return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings: vec![] };
        };

        let request = AiRequest {
            text,
            priors: AiPriors {
                document_types: context.document_types.keys().cloned().collect(),
                categories: context.categories.iter().cloned().collect(),
            },
        };

        let result = self.client.post(base_url).json(&request).send().await;

        let response = match result {
            Ok(resp) if resp.status().is_success() => resp.json::<AiResponse>().await,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "ai analyzer endpoint returned non-success");
                return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Failure, findings: vec![] };
            }
            Err(err) => {
                tracing::warn!(error = %err, "ai analyzer request failed");
                return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Failure, findings: vec![] };
            }
        };

        match response {
            Ok(parsed) => {
                let findings = parsed
                    .findings
                    .into_iter()
                    .map(|f| Finding {
                        kind: "ai".to_string(),
                        confidence: f.confidence,
                        data: json!({ "category": [f.category], "summary": f.summary }),
                        context: None,
                        position: None,
                    })
                    .collect();
                AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings }
            }
            Err(err) => {
                tracing::warn!(error = %err, "ai analyzer response could not be decoded");
                AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Failure, findings: vec![] }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn without_base_url_yields_no_findings_and_success() {
        let analyzer = AiAnalyzer::new("ai-1", 1.0, None, Duration::from_secs(5));
        let context = AnalysisContext::default();
        let outcome = analyzer.analyze("texto qualquer", &context).await;
        assert_eq!(outcome.status, AnalyzerStatus::Success);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn parses_findings_from_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "findings": [{"category": "licitacao", "confidence": 0.9, "summary": "obras"}]
            })))
            .mount(&server)
            .await;

        let analyzer = AiAnalyzer::new("ai-1", 1.0, Some(server.uri()), Duration::from_secs(5));
        let context = AnalysisContext::default();
        let outcome = analyzer.analyze("texto", &context).await;
        assert_eq!(outcome.status, AnalyzerStatus::Success);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].categories(), vec!["licitacao".to_string()]);
    }

    #[tokio::test]
    async fn endpoint_failure_is_isolated_as_analyzer_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let analyzer = AiAnalyzer::new("ai-1", 1.0, Some(server.uri()), Duration::from_secs(5));
        let context = AnalysisContext::default();
        let outcome = analyzer.analyze("texto", &context).await;
        assert_eq!(outcome.status, AnalyzerStatus::Failure);
        assert!(outcome.findings.is_empty());
    }
}
