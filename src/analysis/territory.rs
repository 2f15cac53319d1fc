use regex::RegexBuilder;

const LEGAL_SECTION_MARKERS: &[&str] = &["Art.", "CAPÍTULO", "SEÇÃO", "TÍTULO", "ANEXO"];

/// Filters a state-level gazette's text down to the paragraphs mentioning a
/// given city, plus one paragraph of context on each side, so each
/// territory within a state gazette gets its own `AnalysisResult`
/// (spec.md §4.5 step 7, scenario S5).
pub struct TerritoryFilter {
    city_name: String,
    city_regex: String,
}

pub struct FilterOutcome {
    pub filtered_text: String,
    pub original_text_length: usize,
    pub filtered_text_length: usize,
    pub matched: bool,
}

impl TerritoryFilter {
    pub fn new(city_name: impl Into<String>) -> Self {
        let city_name = city_name.into();
        let city_regex = regex::escape(&city_name);
        Self { city_name, city_regex }
    }

    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    pub fn city_regex(&self) -> &str {
        &self.city_regex
    }

    pub fn apply(&self, text: &str) -> FilterOutcome {
        let paragraphs = split_paragraphs(text);
        let matcher = RegexBuilder::new(&self.city_regex).case_insensitive(true).build().expect("valid city regex");

        let matching_indices: Vec<usize> =
            paragraphs.iter().enumerate().filter(|(_, p)| matcher.is_match(p)).map(|(i, _)| i).collect();

        if matching_indices.is_empty() {
            return FilterOutcome {
                filtered_text: String::new(),
                original_text_length: text.chars().count(),
                filtered_text_length: 0,
                matched: false,
            };
        }

        let mut keep = vec![false; paragraphs.len()];
        for &idx in &matching_indices {
            if idx > 0 {
                keep[idx - 1] = true;
            }
            keep[idx] = true;
            if idx + 1 < paragraphs.len() {
                keep[idx + 1] = true;
            }
        }

        let filtered_text = paragraphs
            .iter()
            .enumerate()
            .filter(|(i, _)| keep[*i])
            .map(|(_, p)| p.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        FilterOutcome {
            original_text_length: text.chars().count(),
            filtered_text_length: filtered_text.chars().count(),
            filtered_text,
            matched: true,
        }
    }
}

/// Splits on blank lines and on lines starting a new legal section, so a
/// section heading always begins its own paragraph.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        let starts_section = LEGAL_SECTION_MARKERS.iter().any(|marker| trimmed.starts_with(marker));

        if trimmed.is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(current.trim().to_string());
            }
            current.clear();
            continue;
        }

        if starts_section && !current.trim().is_empty() {
            paragraphs.push(current.trim().to_string());
            current.clear();
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.trim().is_empty() {
        paragraphs.push(current.trim().to_string());
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_matching_paragraph_and_context() {
        let text = "Intro geral do estado.\n\nArt. 1º Disposição preliminar qualquer.\n\nArt. 2º Dispõe sobre Salvador e seus distritos.\n\nArt. 3º Disposição final qualquer.\n\nArt. 4º Dispõe sobre Feira de Santana.";
        let filter = TerritoryFilter::new("Salvador");
        let outcome = filter.apply(text);
        assert!(outcome.matched);
        assert!(outcome.filtered_text.contains("Salvador"));
        assert!(!outcome.filtered_text.contains("Feira de Santana"));
        assert!(outcome.filtered_text_length > 0);
        assert!(outcome.filtered_text_length < outcome.original_text_length);
    }

    #[test]
    fn no_match_returns_unmatched() {
        let text = "Texto sobre outra cidade qualquer.\n\nArt. 1º Nada relevante aqui.";
        let filter = TerritoryFilter::new("Salvador");
        let outcome = filter.apply(text);
        assert!(!outcome.matched);
        assert_eq!(outcome.filtered_text_length, 0);
    }
}
