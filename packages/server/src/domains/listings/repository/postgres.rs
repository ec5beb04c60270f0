use anyhow::{Context, Result};
use async_trait::async_trait;
use listing_extraction::Listing;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::ListingRepository;
use crate::domains::listings::models::{filter::ListingFilter, listing::ListingRow};

const COLUMNS: &str = "site_name, url, title, price, location, bedrooms, bathrooms, \
     land_area, building_area, description, images, agent_name, agent_phone, \
     first_seen_at, scraped_at, updated_at";

/// Listings stored in the `listings` table.
#[derive(Clone)]
pub struct PostgresListingRepository {
    pool: PgPool,
}

impl PostgresListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
    qb.push(" WHERE TRUE");

    if let Some(site) = &filter.site_name {
        qb.push(" AND site_name = ").push_bind(site.clone());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(needle) = filter.location_needle() {
        qb.push(" AND location ILIKE ")
            .push_bind(format!("%{}%", escape_like(needle)));
    }
    if let Some(min) = filter.min_bedrooms {
        qb.push(" AND bedrooms >= ").push_bind(min as i32);
    }
    if let Some(min) = filter.min_bathrooms {
        qb.push(" AND bathrooms >= ").push_bind(min as i32);
    }
}

#[async_trait]
impl ListingRepository for PostgresListingRepository {
    async fn save(&self, listing: &Listing) -> Result<()> {
        let (agent_name, agent_phone) = match &listing.agent {
            Some(agent) => (Some(agent.name.clone()), Some(agent.phone.clone())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO listings (
                site_name, url, title, price, location, bedrooms, bathrooms,
                land_area, building_area, description, images, agent_name, agent_phone,
                first_seen_at, scraped_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (url) DO UPDATE SET
                site_name = EXCLUDED.site_name,
                title = EXCLUDED.title,
                price = EXCLUDED.price,
                location = EXCLUDED.location,
                bedrooms = EXCLUDED.bedrooms,
                bathrooms = EXCLUDED.bathrooms,
                land_area = EXCLUDED.land_area,
                building_area = EXCLUDED.building_area,
                description = EXCLUDED.description,
                images = EXCLUDED.images,
                agent_name = EXCLUDED.agent_name,
                agent_phone = EXCLUDED.agent_phone,
                scraped_at = EXCLUDED.scraped_at,
                updated_at = NOW()
            "#,
        )
        .bind(&listing.site_name)
        .bind(&listing.url)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.location)
        .bind(listing.bedrooms as i32)
        .bind(listing.bathrooms as i32)
        .bind(listing.land_area)
        .bind(listing.building_area)
        .bind(&listing.description)
        .bind(&listing.images)
        .bind(agent_name)
        .bind(agent_phone)
        .bind(listing.first_seen_at)
        .bind(listing.scraped_at)
        .bind(listing.updated_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save listing {}", listing.url))?;

        Ok(())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(&format!(
            "SELECT {} FROM listings WHERE url = $1",
            COLUMNS
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load listing")?;

        Ok(row.map(Listing::from))
    }

    async fn find_all(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM listings", COLUMNS));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY scraped_at DESC, url ASC LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let rows = qb
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to query listings")?;

        Ok(rows.into_iter().map(Listing::from).collect())
    }

    async fn count(&self, filter: &ListingFilter) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM listings");
        push_filters(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count listings")
    }
}
