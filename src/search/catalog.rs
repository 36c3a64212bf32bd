//! Sample land records served by the search service

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::SearchError;

/// Embedded sample data (source of truth: src/search/sample_records.json)
const SAMPLE_RECORDS: &str = include_str!("sample_records.json");

/// Summary row of a land record.
///
/// Which columns are filled depends on the search category: owner searches
/// carry addresses, location searches carry coordinates and owner names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    pub area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RecordSummary {
    /// Address when known, coordinates otherwise
    pub fn location(&self) -> &str {
        self.address
            .as_deref()
            .or(self.coordinates.as_deref())
            .unwrap_or_default()
    }
}

/// Full record shown in the details view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub id: String,
    #[serde(rename = "type")]
    pub property_type: String,
    pub area: String,
    pub address: String,
    pub coordinates: String,
    pub owner: String,
    pub owner_id: String,
    pub registration_date: String,
    pub last_transfer: String,
    pub status: String,
    pub valuation: String,
    pub zoning: String,
    pub restrictions: String,
    #[serde(default)]
    pub documents: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    property: RecordSummary,
    owner: Vec<RecordSummary>,
    location: Vec<RecordSummary>,
    default_details: String,
    details: Vec<PropertyDetails>,
}

/// Static record set backing every search
#[derive(Debug, Clone)]
pub struct SampleCatalog {
    pub(crate) property: RecordSummary,
    pub(crate) by_owner: Vec<RecordSummary>,
    pub(crate) by_location: Vec<RecordSummary>,
    details: HashMap<String, PropertyDetails>,
    default_details: String,
}

impl SampleCatalog {
    /// Parse the catalog embedded in the binary
    pub fn embedded() -> Result<Self, SearchError> {
        Self::from_json(SAMPLE_RECORDS)
    }

    pub fn from_json(json: &str) -> Result<Self, SearchError> {
        let raw: RawCatalog =
            serde_json::from_str(json).map_err(|e| SearchError::Catalog(e.to_string()))?;

        let details: HashMap<String, PropertyDetails> = raw
            .details
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();

        if !details.contains_key(&raw.default_details) {
            return Err(SearchError::Catalog(format!(
                "default record '{}' has no details",
                raw.default_details
            )));
        }

        Ok(Self {
            property: raw.property,
            by_owner: raw.owner,
            by_location: raw.location,
            details,
            default_details: raw.default_details,
        })
    }

    /// Details for a record id, falling back to the default record
    pub fn details(&self, id: &str) -> &PropertyDetails {
        match self.details.get(id) {
            Some(details) => details,
            None => {
                tracing::debug!(id, fallback = %self.default_details, "No details for record");
                &self.details[&self.default_details]
            }
        }
    }

    /// Whether a record id has its own details entry
    pub fn has_details(&self, id: &str) -> bool {
        self.details.contains_key(id)
    }
}
