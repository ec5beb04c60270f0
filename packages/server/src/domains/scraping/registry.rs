use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use listing_extraction::{FetcherConfig, HttpFetcher, ListingScraper, SiteExtractor};
use tracing::{info, warn};

use crate::config::SiteConfig;

/// Site name to extractor, built once at startup.
#[derive(Default, Clone)]
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn ListingScraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every enabled site that has a supported extractor.
    ///
    /// Enabled sites naming an unknown extractor are logged and skipped.
    pub fn from_sites(sites: &[SiteConfig]) -> Result<Self> {
        let mut registry = Self::new();

        for site in sites.iter().filter(|s| s.enabled) {
            let fetcher = HttpFetcher::new(
                FetcherConfig::default()
                    .with_timeout(site.timeout())
                    .with_rate_limit(site.rate_limit),
            )
            .with_context(|| format!("Failed to create HTTP client for {}", site.name))?;

            let built = SiteExtractor::build(
                site.extractor_kind(),
                &site.name,
                &site.selectors,
                Arc::new(fetcher),
            )
            .with_context(|| format!("Failed to build extractor for {}", site.name))?;

            match built {
                Some(extractor) => {
                    info!(site = %site.name, extractor = extractor.kind(), "Registered scraper");
                    registry.register(&site.name, Arc::new(extractor));
                }
                None => {
                    warn!(
                        site = %site.name,
                        extractor = %site.extractor_kind(),
                        "No extractor available for site, skipping"
                    );
                }
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, site_name: impl Into<String>, scraper: Arc<dyn ListingScraper>) {
        self.scrapers.insert(site_name.into(), scraper);
    }

    pub fn get(&self, site_name: &str) -> Option<Arc<dyn ListingScraper>> {
        self.scrapers.get(site_name).cloned()
    }

    pub fn contains(&self, site_name: &str) -> bool {
        self.scrapers.contains_key(site_name)
    }

    /// Registered site names, sorted.
    pub fn sites(&self) -> Vec<String> {
        let mut sites: Vec<String> = self.scrapers.keys().cloned().collect();
        sites.sort();
        sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_sites;

    const SITES: &str = r#"
[[sites]]
name = "rumah123"
base_url = "https://www.rumah123.com/jual/rumah/"
schedule = "0 0 * * * *"
[sites.selectors]
list_item = ".card"
title = "h2"
price = ".price"
location = ".loc"
detail_url = "a"

[[sites]]
name = "olx"
base_url = "https://www.olx.co.id/properti/"
schedule = "0 0 * * * *"
[sites.selectors]
list_item = ".card"
title = "h2"
price = ".price"
location = ".loc"
detail_url = "a"

[[sites]]
name = "lamudi"
base_url = "https://www.lamudi.co.id/jual/"
schedule = "0 0 * * * *"
extractor = "generic"
enabled = false
[sites.selectors]
list_item = ".card"
title = "h2"
price = ".price"
location = ".loc"
detail_url = "a"
"#;

    #[test]
    fn test_registers_supported_enabled_sites_only() {
        let sites = parse_sites(SITES).unwrap();
        let registry = ScraperRegistry::from_sites(&sites).unwrap();

        assert_eq!(registry.sites(), vec!["rumah123".to_string()]);
        assert!(registry.contains("rumah123"));
        assert!(!registry.contains("olx"));
        assert!(!registry.contains("lamudi"));
        assert_eq!(registry.get("rumah123").unwrap().site_name(), "rumah123");
    }
}
