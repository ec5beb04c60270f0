use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use listing_extraction::SelectorConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub nats_url: String,
    pub notification_subject: String,
    pub port: u16,
    pub worker_id: String,
    pub shutdown_timeout: Duration,
    pub lock_ttl: Duration,
    pub sites_config: PathBuf,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            nats_url: env::var("NATS_URL")
                .unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            notification_subject: env::var("NOTIFICATION_SUBJECT")
                .unwrap_or_else(|_| "scraper.notifications".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            worker_id: env::var("WORKER_ID").unwrap_or_else(|_| default_worker_id()),
            shutdown_timeout: Duration::from_secs(
                env::var("SHUTDOWN_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("SHUTDOWN_TIMEOUT_SECS must be a valid number")?,
            ),
            lock_ttl: Duration::from_secs(
                env::var("LOCK_TTL_SECS")
                    .unwrap_or_else(|_| "600".to_string())
                    .parse()
                    .context("LOCK_TTL_SECS must be a valid number")?,
            ),
            sites_config: env::var("SITES_CONFIG")
                .unwrap_or_else(|_| "config/sites.toml".to_string())
                .into(),
            log_format: LogFormat::parse(&env::var("LOG_FORMAT").unwrap_or_default()),
        })
    }
}

/// Host name if known, otherwise the process id.
fn default_worker_id() -> String {
    env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| format!("pid-{}", std::process::id()))
}

/// One scraped site, as written in the sites file.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,

    /// Cron expression with a leading seconds field
    pub schedule: String,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Requests per second against this site
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extractor to use; defaults to the site name
    #[serde(default)]
    pub extractor: Option<String>,

    pub selectors: SelectorConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_rate_limit() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    30
}

impl SiteConfig {
    pub fn extractor_kind(&self) -> &str {
        self.extractor.as_deref().unwrap_or(&self.name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
struct SitesFile {
    #[serde(default)]
    sites: Vec<SiteConfig>,
}

/// Read and validate the sites file.
pub fn load_sites(path: &Path) -> Result<Vec<SiteConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read sites config {}", path.display()))?;
    parse_sites(&raw).with_context(|| format!("Invalid sites config {}", path.display()))
}

/// Parse and validate sites from TOML text.
pub fn parse_sites(raw: &str) -> Result<Vec<SiteConfig>> {
    let file: SitesFile = toml::from_str(raw).context("Failed to parse sites TOML")?;
    validate_sites(&file.sites)?;
    Ok(file.sites)
}

fn validate_sites(sites: &[SiteConfig]) -> Result<()> {
    if sites.is_empty() {
        bail!("at least one site must be configured");
    }

    let mut seen = HashSet::new();
    for site in sites {
        let name = site.name.trim();
        if name.is_empty() {
            bail!("site name must not be empty");
        }
        if !seen.insert(name.to_string()) {
            bail!("duplicate site name: {}", name);
        }

        let base = Url::parse(&site.base_url)
            .with_context(|| format!("site {}: base_url is not a valid URL", name))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("site {}: base_url must be http or https", name);
        }

        if site.schedule.trim().is_empty() {
            bail!("site {}: schedule must not be empty", name);
        }
        if site.rate_limit == 0 {
            bail!("site {}: rate_limit must be at least 1", name);
        }
        if site.timeout_secs == 0 {
            bail!("site {}: timeout_secs must be at least 1", name);
        }

        site.selectors
            .compile()
            .with_context(|| format!("site {}: invalid selectors", name))?;
    }

    Ok(())
}
