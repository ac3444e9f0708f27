//! The fixed list of resources a generation is populated with.

use precache_core::{AppConfig, Error};
use url::Url;

use crate::fetch::normalize;

/// Version label plus the normalized URLs installed under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    version: String,
    origin: Url,
    urls: Vec<Url>,
}

impl Manifest {
    /// Build a manifest, normalizing every entry against `origin`.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if the version label is empty or two entries
    ///   normalize to the same URL
    /// - `Error::InvalidUrl` if an entry cannot be normalized
    pub fn new<S: AsRef<str>>(version: impl Into<String>, origin: Url, entries: &[S]) -> Result<Self, Error> {
        let version = version.into();
        if version.trim().is_empty() {
            return Err(Error::InvalidInput("cache version label cannot be empty".into()));
        }

        let mut urls: Vec<Url> = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_ref();
            let url = normalize(entry, &origin).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")))?;
            if urls.contains(&url) {
                return Err(Error::InvalidInput(format!("duplicate manifest entry: {url}")));
            }
            urls.push(url);
        }

        Ok(Self { version, origin, urls })
    }

    /// Build the manifest described by the loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Self::new(config.cache_version.clone(), origin, &config.manifest)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn urls(&self) -> &[Url] {
        &self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:3000").unwrap()
    }

    #[test]
    fn test_from_default_config() {
        let manifest = Manifest::from_config(&AppConfig::default()).unwrap();
        assert_eq!(manifest.version(), "portfolio-v1");
        assert_eq!(manifest.urls().len(), 6);
        assert_eq!(manifest.urls()[0].as_str(), "http://localhost:3000/");
        assert_eq!(manifest.urls()[5].host_str(), Some("fonts.googleapis.com"));
    }

    #[test]
    fn test_order_preserved() {
        let manifest = Manifest::new("v1", origin(), &["/b.js", "/a.js"]).unwrap();
        let paths: Vec<&str> = manifest.urls().iter().map(Url::path).collect();
        assert_eq!(paths, vec!["/b.js", "/a.js"]);
    }

    #[test]
    fn test_duplicate_after_normalization_rejected() {
        let entries = ["/static/js/main.js", "http://localhost:3000/static/js/main.js#top"];
        let result = Manifest::new("v1", origin(), &entries);
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_empty_version_rejected() {
        let result = Manifest::new("", origin(), &["/"]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_bad_entry_rejected() {
        let result = Manifest::new("v1", origin(), &["ftp://example.com/file"]);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
