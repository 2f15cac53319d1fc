use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use async_trait::async_trait;
use serde_json::json;

use crate::analysis::models::{AnalysisContext, AnalyzerOutcome, AnalyzerStatus, AnalyzerType, Finding};

use super::Analyzer;

#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub category: String,
    pub weight: f64,
    pub phrase: String,
}

/// Fast multi-pattern keyword matcher grouping hits by declared category
/// (spec.md §4.5 step 3 — `keyword` analyzer type).
pub struct KeywordAnalyzer {
    id: String,
    priority: f64,
    entries: Vec<KeywordEntry>,
    matcher: AhoCorasick,
}

impl KeywordAnalyzer {
    pub fn new(id: impl Into<String>, priority: f64, entries: Vec<KeywordEntry>) -> anyhow::Result<Self> {
        let patterns: Vec<&str> = entries.iter().map(|e| e.phrase.as_str()).collect();
        let matcher = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(true)
            .build(&patterns)?;
        Ok(Self { id: id.into(), priority, entries, matcher })
    }

    pub fn default_catalog(id: impl Into<String>, priority: f64) -> anyhow::Result<Self> {
        Self::new(
            id,
            priority,
            vec![
                KeywordEntry { category: "licitacao".to_string(), weight: 0.7, phrase: "licitação".to_string() },
                KeywordEntry { category: "licitacao".to_string(), weight: 0.7, phrase: "pregão".to_string() },
                KeywordEntry { category: "licitacao".to_string(), weight: 0.6, phrase: "tomada de preços".to_string() },
                KeywordEntry { category: "concurso".to_string(), weight: 0.6, phrase: "concurso público".to_string() },
                KeywordEntry { category: "concurso".to_string(), weight: 0.5, phrase: "processo seletivo".to_string() },
                KeywordEntry { category: "nomeacao".to_string(), weight: 0.5, phrase: "nomeação".to_string() },
            ],
        )
    }
}

#[async_trait]
impl Analyzer for KeywordAnalyzer {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> AnalyzerType {
        AnalyzerType::Keyword
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    async fn analyze(&self, text: &str, _context: &AnalysisContext) -> AnalyzerOutcome {
        let mut findings = Vec::new();
        for hit in self.matcher.find_iter(text) {
            let entry = &self.entries[hit.pattern().as_usize()];
            findings.push(Finding {
                kind: "keyword".to_string(),
                confidence: entry.weight,
                data: json!({ "category": entry.category, "phrase": entry.phrase }),
                context: Some(excerpt(text, hit.start(), hit.end())),
                position: Some(hit.start()),
            });
        }

        AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings }
    }
}

fn excerpt(text: &str, start: usize, end: usize) -> String {
    let window = 40;
    let lo = start.saturating_sub(window);
    let hi = (end + window).min(text.len());
    text.get(lo..hi).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn finds_licitacao_keyword() {
        let analyzer = KeywordAnalyzer::default_catalog("keyword-1", 10.0).unwrap();
        let context = AnalysisContext::default();
        let outcome = analyzer.analyze("Aviso de licitação para obras públicas.", &context).await;
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].category(), Some("licitacao".to_string()));
    }
}
