use serde::{Deserialize, Serialize};

/// One card's metadata as served by the external catalog.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "manaCost", default)]
    pub mana_cost: String,
    #[serde(rename = "typeLine", default)]
    pub type_line: String,
    #[serde(rename = "oracleText", default)]
    pub oracle_text: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl CatalogEntry {
    /// Placeholder entry for an id the catalog cannot resolve. Hydration
    /// substitutes this instead of failing so stale or foreign ids never
    /// crash a room.
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: "Unknown card".to_string(),
            mana_cost: String::new(),
            type_line: String::new(),
            oracle_text: String::new(),
            image_url: String::new(),
        }
    }
}

/// Response body of the catalog's text-search endpoint.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub cards: Vec<CatalogEntry>,
}
