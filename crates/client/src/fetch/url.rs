//! URL normalization for consistent cache keys.

use url::Url;

/// Error type for URL normalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a request locator against the site origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative locators (`/`, `/static/js/main.js`) against `origin`;
///    absolute ones (including cross-origin) are kept
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn normalize(input: &str, origin: &Url) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_normalize_root() {
        let url = normalize("/", &origin()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_normalize_relative_path() {
        let url = normalize("/static/css/main.css", &origin()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/static/css/main.css");
    }

    #[test]
    fn test_normalize_cross_origin_kept() {
        let input = "https://fonts.googleapis.com/css2?family=Poppins:wght@300;400&display=swap";
        let url = normalize(input, &origin()).unwrap();
        assert_eq!(url.host_str(), Some("fonts.googleapis.com"));
        assert_eq!(url.query(), Some("family=Poppins:wght@300;400&display=swap"));
    }

    #[test]
    fn test_normalize_lowercase_host() {
        let url = normalize("https://EXAMPLE.COM/Path", &origin()).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.path(), "/Path");
    }

    #[test]
    fn test_normalize_remove_fragment() {
        let url = normalize("/about#skills", &origin()).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.as_str(), "http://localhost:3000/about");
    }

    #[test]
    fn test_normalize_trim_whitespace() {
        let url = normalize("  /static/js/main.js  ", &origin()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/static/js/main.js");
    }

    #[test]
    fn test_normalize_same_key_for_equivalent_inputs() {
        let a = normalize("/static/js/main.js", &origin()).unwrap();
        let b = normalize("http://LOCALHOST:3000/static/js/main.js#x", &origin()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_unsupported_scheme() {
        let result = normalize("file:///etc/passwd", &origin());
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(matches!(normalize("", &origin()), Err(UrlError::Empty)));
        assert!(matches!(normalize("   ", &origin()), Err(UrlError::Empty)));
    }
}
