use crate::util::hash::config_hash;

/// Composes `{version, enabled_analyzers (sorted), custom_keywords (sorted),
/// territory_id}` into the stable `configHash` that keys analysis dedup
/// (spec.md §4.5 step 4).
pub fn compute(
    version: &str,
    enabled_analyzers: &[&str],
    custom_keywords: &[String],
    territory_id: &str,
) -> String {
    let mut analyzers = enabled_analyzers.to_vec();
    analyzers.sort_unstable();
    let mut keywords: Vec<&str> = custom_keywords.iter().map(String::as_str).collect();
    keywords.sort_unstable();

    let full = config_hash(&[version, &analyzers.join(","), &keywords.join(","), territory_id]);
    full[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_order_independent_in_inputs() {
        let a = compute("v1", &["keyword", "concurso"], &["edital".to_string()], "2927408");
        let b = compute("v1", &["concurso", "keyword"], &["edital".to_string()], "2927408");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_is_32_chars() {
        let sig = compute("v1", &["keyword"], &[], "2927408");
        assert_eq!(sig.len(), 32);
    }

    #[test]
    fn different_territory_changes_signature() {
        let a = compute("v1", &["keyword"], &[], "2927408");
        let b = compute("v1", &["keyword"], &[], "2111300");
        assert_ne!(a, b);
    }
}
