//! CSS selector configuration for a listing page.

use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractionError, Result};

/// Field selectors for one site, as written in configuration.
///
/// All selectors except `list_item` are evaluated relative to a matched
/// list item; `next_page` is evaluated against the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub list_item: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub detail_url: String,

    #[serde(default)]
    pub bedrooms: Option<String>,
    #[serde(default)]
    pub bathrooms: Option<String>,
    #[serde(default)]
    pub land_area: Option<String>,
    #[serde(default)]
    pub building_area: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub agent_phone: Option<String>,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Parsed selectors, built once per extractor.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub list_item: Selector,
    pub title: Selector,
    pub price: Selector,
    pub location: Selector,
    pub detail_url: Selector,
    pub bedrooms: Option<Selector>,
    pub bathrooms: Option<Selector>,
    pub land_area: Option<Selector>,
    pub building_area: Option<Selector>,
    pub description: Option<Selector>,
    pub images: Option<Selector>,
    pub agent_name: Option<Selector>,
    pub agent_phone: Option<Selector>,
    pub next_page: Option<Selector>,
}

impl SelectorConfig {
    /// Parse every configured selector. Blank optional selectors count as unset.
    pub fn compile(&self) -> Result<CompiledSelectors> {
        Ok(CompiledSelectors {
            list_item: required("list_item", &self.list_item)?,
            title: required("title", &self.title)?,
            price: required("price", &self.price)?,
            location: required("location", &self.location)?,
            detail_url: required("detail_url", &self.detail_url)?,
            bedrooms: optional("bedrooms", &self.bedrooms)?,
            bathrooms: optional("bathrooms", &self.bathrooms)?,
            land_area: optional("land_area", &self.land_area)?,
            building_area: optional("building_area", &self.building_area)?,
            description: optional("description", &self.description)?,
            images: optional("images", &self.images)?,
            agent_name: optional("agent_name", &self.agent_name)?,
            agent_phone: optional("agent_phone", &self.agent_phone)?,
            next_page: optional("next_page", &self.next_page)?,
        })
    }
}

fn required(field: &'static str, selector: &str) -> Result<Selector> {
    if selector.trim().is_empty() {
        return Err(ExtractionError::Selector {
            field,
            selector: selector.to_string(),
        });
    }
    Selector::parse(selector).map_err(|_| ExtractionError::Selector {
        field,
        selector: selector.to_string(),
    })
}

fn optional(field: &'static str, selector: &Option<String>) -> Result<Option<Selector>> {
    match selector.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => required(field, s).map(Some),
    }
}
