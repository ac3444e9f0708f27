//! Cache entry key generation.

use sha2::{Digest, Sha256};

/// Compute the storage key for a normalized request URL.
///
/// Callers normalize first; the key is only as stable as its input.
pub fn compute_entry_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_entry_key("https://example.com/static/js/main.js");
        let hash2 = compute_entry_key("https://example.com/static/js/main.js");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_query_significant() {
        let plain = compute_entry_key("https://fonts.googleapis.com/css2");
        let with_query = compute_entry_key("https://fonts.googleapis.com/css2?family=Poppins");
        assert_ne!(plain, with_query);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_entry_key("https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
