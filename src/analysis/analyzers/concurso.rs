use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::analysis::models::{AnalysisContext, AnalyzerOutcome, AnalyzerStatus, AnalyzerType, Finding};

use super::Analyzer;

const REQUIRED_KEYWORDS: &[&str] = &["concurso", "convoca"];
const SUPPORTING_KEYWORDS: &[&str] = &["edital", "candidato", "classificação", "nomeação", "posse"];

/// Cuts `text` at up to `n` bytes, backing off to the nearest char boundary
/// so OCR text with multibyte Portuguese diacritics never panics mid-slice.
fn char_safe_prefix(text: &str, n: usize) -> &str {
    let mut end = n.min(text.len());
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Detects recruitment-notice ("concurso") gazettes by combining title
/// patterns with keyword proximity, rather than scattered keyword presence
/// alone (spec.md §4.5 "concurso" analyzer invariant + scenarios S1-S4).
pub struct ConcursoAnalyzer {
    id: String,
    priority: f64,
    proximity_window: usize,
    title_patterns: Vec<Regex>,
}

impl ConcursoAnalyzer {
    pub fn new(id: impl Into<String>, priority: f64, proximity_window: usize) -> Self {
        let title_patterns = vec![
            Regex::new(r"(?i)edital\s+de\s+abertura").unwrap(),
            Regex::new(r"(?i)\d+\s*ª?\s*convocação").unwrap(),
            Regex::new(r"(?i)edital\s+de\s+convocação").unwrap(),
            Regex::new(r"(?i)concurso\s+público\s+n[oº.]").unwrap(),
        ];
        Self { id: id.into(), priority, proximity_window, title_patterns }
    }

    fn has_title_pattern(&self, text: &str) -> bool {
        let head = char_safe_prefix(text, 400);
        self.title_patterns.iter().any(|re| re.is_match(head))
    }

    fn is_edital_abertura(&self, text: &str) -> bool {
        let head = char_safe_prefix(text, 400);
        Regex::new(r"(?i)edital\s+de\s+abertura").unwrap().is_match(head)
    }

    /// Finds positions of each keyword and groups them by proximity window,
    /// returning the best group's keyword coverage and average spread.
    fn proximity_score(&self, text: &str) -> Option<(f64, bool)> {
        let lower = text.to_lowercase();
        let mut required_positions: Vec<(&str, Vec<usize>)> = Vec::new();
        for kw in REQUIRED_KEYWORDS {
            let positions: Vec<usize> = lower.match_indices(kw).map(|(i, _)| i).collect();
            required_positions.push((kw, positions));
        }

        if required_positions.iter().any(|(_, positions)| positions.is_empty()) {
            return None;
        }

        let mut supporting_positions: Vec<usize> = Vec::new();
        for kw in SUPPORTING_KEYWORDS {
            supporting_positions.extend(lower.match_indices(kw).map(|(i, _)| i));
        }

        let anchors: Vec<usize> = required_positions.iter().flat_map(|(_, positions)| positions.iter().copied()).collect();

        let mut best_window_hits = 0usize;
        let mut best_all_required_near = false;

        for anchor in anchors {
            let lo = anchor.saturating_sub(self.proximity_window);
            let hi = anchor + self.proximity_window;

            let required_hits =
                required_positions.iter().filter(|(_, positions)| positions.iter().any(|&p| p >= lo && p <= hi)).count();
            let supporting_hits = supporting_positions.iter().filter(|&&p| p >= lo && p <= hi).count();
            let all_required_near = required_hits == required_positions.len();

            let total_hits = required_hits + supporting_hits;
            if total_hits > best_window_hits || (total_hits == best_window_hits && all_required_near && !best_all_required_near) {
                best_window_hits = total_hits;
                best_all_required_near = all_required_near;
            }
        }

        let coverage = (best_window_hits as f64) / ((REQUIRED_KEYWORDS.len() + SUPPORTING_KEYWORDS.len()) as f64);
        let proximity_bonus = if best_all_required_near { 0.15 } else { 0.0 };

        Some((coverage.min(1.0) + proximity_bonus, true))
    }
}

#[async_trait]
impl Analyzer for ConcursoAnalyzer {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> AnalyzerType {
        AnalyzerType::Concurso
    }

    fn priority(&self) -> f64 {
        self.priority
    }

    async fn analyze(&self, text: &str, _context: &AnalysisContext) -> AnalyzerOutcome {
        let Some((proximity_score, all_required_found)) = self.proximity_score(text) else {
            return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings: vec![] };
        };

        if !all_required_found {
            return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings: vec![] };
        }

        let has_title = self.has_title_pattern(text);

        let mut confidence = 0.55 + proximity_score * 0.25;
        if has_title {
            confidence += 0.2;
        }
        let confidence = confidence.min(0.98);

        // Scattered keywords with no title and weak proximity fall below the
        // detection floor entirely (scenario S3).
        if !has_title && proximity_score < 0.35 {
            return AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings: vec![] };
        }

        // REQUIRED_KEYWORDS above guarantees "convoca" occurs at least once
        // whenever a finding fires at all, so the non-abertura case is always
        // a convocação notice.
        let document_type = if self.is_edital_abertura(text) { "edital_abertura" } else { "convocacao" };

        let finding = Finding {
            kind: "concurso".to_string(),
            confidence,
            data: json!({
                "category": "concurso",
                "documentType": document_type,
                "hasTitlePattern": has_title,
            }),
            context: Some(char_safe_prefix(text, 200).to_string()),
            position: Some(0),
        };

        AnalyzerOutcome { analyzer_id: self.id.clone(), status: AnalyzerStatus::Success, findings: vec![finding] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> ConcursoAnalyzer {
        ConcursoAnalyzer::new("concurso-1", 20.0, 100)
    }

    #[tokio::test]
    async fn s1_title_convocacao_is_high_confidence() {
        let text = "EDITAL DE CONVOCAÇÃO Nº 12/2026\n\nO Município convoca os candidatos aprovados no concurso público para comparecerem e tomarem posse, conforme classificação final.";
        let context = AnalysisContext::default();
        let outcome = analyzer().analyze(text, &context).await;
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].confidence >= 0.80, "got {}", outcome.findings[0].confidence);
        assert_eq!(outcome.findings[0].data.get("documentType").and_then(|v| v.as_str()), Some("convocacao"));
    }

    #[tokio::test]
    async fn s2_weak_convocacao_is_moderate_confidence() {
        let text = "Fica convocado o candidato aprovado no concurso público municipal para comparecer à sede da Secretaria de Administração e tomar posse do cargo.";
        let context = AnalysisContext::default();
        let outcome = analyzer().analyze(text, &context).await;
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].confidence >= 0.70, "got {}", outcome.findings[0].confidence);
        assert_eq!(outcome.findings[0].data.get("documentType").and_then(|v| v.as_str()), Some("convocacao"));
    }

    #[tokio::test]
    async fn s3_scattered_keywords_do_not_fire() {
        let text = format!(
            "Uma nota qualquer sobre concurso de fotografia municipal. {} Mais adiante, sem relação alguma, cita-se uma convocação de reunião comunitária.",
            "Lorem ipsum dolor sit amet consectetur adipiscing elit. ".repeat(8),
        );
        let context = AnalysisContext::default();
        let outcome = analyzer().analyze(&text, &context).await;
        assert!(outcome.findings.is_empty(), "expected no findings, got {:?}", outcome.findings);
    }

    #[tokio::test]
    async fn s4_edital_de_abertura_is_very_high_confidence() {
        let text = "EDITAL DE ABERTURA DO CONCURSO PÚBLICO Nº 01/2026\n\nO Prefeito torna público a abertura de concurso público para provimento de cargos, convocação para inscrição dos candidatos.";
        let context = AnalysisContext::default();
        let outcome = analyzer().analyze(text, &context).await;
        assert_eq!(outcome.findings.len(), 1);
        assert!(outcome.findings[0].confidence >= 0.85, "got {}", outcome.findings[0].confidence);
        assert_eq!(outcome.findings[0].data.get("documentType").and_then(|v| v.as_str()), Some("edital_abertura"));
    }
}
