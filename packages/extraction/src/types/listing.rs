//! Listing - one property advertised on a listing site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent contact attached to a listing, when the site exposes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContact {
    pub name: String,
    pub phone: String,
}

/// A property listing extracted from a site.
///
/// Identity is the canonical `url` (the detail page). Stores upsert on it and
/// keep `first_seen_at` from the first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub site_name: String,

    /// Canonical detail-page URL (natural key)
    pub url: String,

    pub title: String,

    /// Asking price, always > 0
    pub price: f64,

    pub location: String,

    pub bedrooms: u32,
    pub bathrooms: u32,

    /// Land area in square metres (0 when unknown)
    pub land_area: f64,

    /// Building area in square metres (0 when unknown)
    pub building_area: f64,

    pub description: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentContact>,

    pub first_seen_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create a listing with the required fields; optional fields are empty.
    pub fn new(
        site_name: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        price: f64,
        location: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            site_name: site_name.into(),
            url: url.into(),
            title: title.into(),
            price,
            location: location.into(),
            bedrooms: 0,
            bathrooms: 0,
            land_area: 0.0,
            building_area: 0.0,
            description: String::new(),
            images: Vec::new(),
            agent: None,
            first_seen_at: now,
            scraped_at: now,
            updated_at: now,
        }
    }

    pub fn with_rooms(mut self, bedrooms: u32, bathrooms: u32) -> Self {
        self.bedrooms = bedrooms;
        self.bathrooms = bathrooms;
        self
    }

    pub fn with_areas(mut self, land_area: f64, building_area: f64) -> Self {
        self.land_area = land_area;
        self.building_area = building_area;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    pub fn with_agent(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.agent = Some(AgentContact {
            name: name.into(),
            phone: phone.into(),
        });
        self
    }
}
