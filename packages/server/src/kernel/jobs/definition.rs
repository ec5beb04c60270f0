use crate::config::SiteConfig;

/// A recurring scrape: one per enabled, registered site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub site: String,
    /// Cron expression with a leading seconds field
    pub schedule: String,
    pub seed_url: String,
}

impl JobDefinition {
    pub fn new(
        site: impl Into<String>,
        schedule: impl Into<String>,
        seed_url: impl Into<String>,
    ) -> Self {
        Self {
            site: site.into(),
            schedule: schedule.into(),
            seed_url: seed_url.into(),
        }
    }
}

impl From<&SiteConfig> for JobDefinition {
    fn from(site: &SiteConfig) -> Self {
        Self::new(&site.name, &site.schedule, &site.base_url)
    }
}
