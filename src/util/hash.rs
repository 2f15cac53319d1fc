//! Deterministic identifiers used for dedup keys and idempotent job ids.
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the input, used as a stable config/version signature.
#[must_use]
pub fn config_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

/// First 16 hex chars of a SHA-256 digest, used for short, stable job ids.
#[must_use]
pub fn short_hash16(parts: &[&str]) -> String {
    config_hash(parts)[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_is_deterministic() {
        let a = config_hash(&["territory-1", "gazette-1", "v1"]);
        let b = config_hash(&["territory-1", "gazette-1", "v1"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn config_hash_distinguishes_field_boundaries() {
        let a = config_hash(&["ab", "c"]);
        let b = config_hash(&["a", "bc"]);
        assert_ne!(a, b);
    }

    #[test]
    fn short_hash16_is_prefix_of_full_hash() {
        let full = config_hash(&["x"]);
        let short = short_hash16(&["x"]);
        assert_eq!(short, &full[..16]);
        assert_eq!(short.len(), 16);
    }
}
