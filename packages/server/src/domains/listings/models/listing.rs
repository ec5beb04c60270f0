use chrono::{DateTime, Utc};
use listing_extraction::{AgentContact, Listing};

/// A row of the `listings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingRow {
    pub site_name: String,
    pub url: String,
    pub title: String,
    pub price: f64,
    pub location: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub land_area: f64,
    pub building_area: f64,
    pub description: String,
    pub images: Vec<String>,
    pub agent_name: Option<String>,
    pub agent_phone: Option<String>,
    pub first_seen_at: DateTime<Utc>,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        let agent = match (row.agent_name, row.agent_phone) {
            (None, None) => None,
            (name, phone) => Some(AgentContact {
                name: name.unwrap_or_default(),
                phone: phone.unwrap_or_default(),
            }),
        };

        Listing {
            site_name: row.site_name,
            url: row.url,
            title: row.title,
            price: row.price,
            location: row.location,
            bedrooms: row.bedrooms.max(0) as u32,
            bathrooms: row.bathrooms.max(0) as u32,
            land_area: row.land_area,
            building_area: row.building_area,
            description: row.description,
            images: row.images,
            agent,
            first_seen_at: row.first_seen_at,
            scraped_at: row.scraped_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ListingRow {
        let now = Utc::now();
        ListingRow {
            site_name: "rumah123".into(),
            url: "https://www.rumah123.com/properti/1".into(),
            title: "Rumah".into(),
            price: 1.0e9,
            location: "Depok".into(),
            bedrooms: 3,
            bathrooms: -1,
            land_area: 90.0,
            building_area: 72.5,
            description: String::new(),
            images: vec![],
            agent_name: None,
            agent_phone: None,
            first_seen_at: now,
            scraped_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_without_agent() {
        let listing: Listing = row().into();
        assert!(listing.agent.is_none());
        assert_eq!(listing.bedrooms, 3);
        assert_eq!(listing.bathrooms, 0);
    }

    #[test]
    fn test_row_with_agent_phone_only() {
        let mut r = row();
        r.agent_phone = Some("0812".into());
        let listing: Listing = r.into();
        assert_eq!(
            listing.agent,
            Some(AgentContact {
                name: String::new(),
                phone: "0812".into()
            })
        );
    }
}
