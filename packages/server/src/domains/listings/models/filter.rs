use listing_extraction::Listing;
use serde::Deserialize;

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

/// Query over stored listings. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingFilter {
    #[serde(default, rename = "site")]
    pub site_name: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    /// Case-insensitive substring of the location
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub min_bathrooms: Option<u32>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl ListingFilter {
    pub fn for_site(site_name: impl Into<String>) -> Self {
        Self {
            site_name: Some(site_name.into()),
            ..Default::default()
        }
    }

    /// Page size clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Location needle, if set to something non-blank.
    pub fn location_needle(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whether `listing` passes every filter (pagination aside).
    pub fn matches(&self, listing: &Listing) -> bool {
        if let Some(site) = &self.site_name {
            if &listing.site_name != site {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| listing.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| listing.price > max) {
            return false;
        }
        if let Some(needle) = self.location_needle() {
            if !listing
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        if self.min_bedrooms.is_some_and(|min| listing.bedrooms < min) {
            return false;
        }
        if self.min_bathrooms.is_some_and(|min| listing.bathrooms < min) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Listing {
        Listing::new(
            "rumah123",
            "https://www.rumah123.com/properti/1",
            "Rumah",
            750_000_000.0,
            "Kebayoran Baru, Jakarta Selatan",
        )
        .with_rooms(3, 2)
    }

    #[test]
    fn test_limit_defaults_and_clamps() {
        assert_eq!(ListingFilter::default().limit(), DEFAULT_LIMIT);
        let f = ListingFilter {
            limit: Some(10_000),
            offset: Some(-5),
            ..Default::default()
        };
        assert_eq!(f.limit(), MAX_LIMIT);
        assert_eq!(f.offset(), 0);
    }

    #[test]
    fn test_location_is_case_insensitive_substring() {
        let f = ListingFilter {
            location: Some("jakarta SELATAN".into()),
            ..Default::default()
        };
        assert!(f.matches(&listing()));
    }

    #[test]
    fn test_price_and_room_bounds() {
        let f = ListingFilter {
            min_price: Some(500_000_000.0),
            max_price: Some(800_000_000.0),
            min_bedrooms: Some(3),
            min_bathrooms: Some(3),
            ..Default::default()
        };
        assert!(!f.matches(&listing()));

        let f = ListingFilter {
            min_bathrooms: Some(2),
            ..f
        };
        assert!(f.matches(&listing()));
    }

    #[test]
    fn test_site_filter() {
        assert!(ListingFilter::for_site("rumah123").matches(&listing()));
        assert!(!ListingFilter::for_site("lamudi").matches(&listing()));
    }
}
