//! Land record search over the sample catalog
//!
//! Searches are asynchronous and wait a configurable latency before answering,
//! standing in for a registry lookup service.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

mod catalog;

pub use catalog::{PropertyDetails, RecordSummary, SampleCatalog};

/// Errors from the search service
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Please enter search criteria")]
    EmptyQuery,

    #[error("unknown search category '{0}' (expected property, owner or location)")]
    UnknownCategory(String),

    #[error("sample catalog is invalid: {0}")]
    Catalog(String),
}

/// Search tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    /// Lookup by property id, yields a single record
    Property,
    /// Lookup by owner name or id
    Owner,
    /// Lookup by address or coordinates
    Location,
}

impl SearchCategory {
    pub fn all() -> &'static [SearchCategory] {
        &[
            SearchCategory::Property,
            SearchCategory::Owner,
            SearchCategory::Location,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchCategory::Property => "property",
            SearchCategory::Owner => "owner",
            SearchCategory::Location => "location",
        }
    }
}

impl fmt::Display for SearchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchCategory {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchCategory::all()
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SearchError::UnknownCategory(s.to_string()))
    }
}

/// Records returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "lowercase")]
pub enum SearchResults {
    Single(RecordSummary),
    Many(Vec<RecordSummary>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Single(_) => 1,
            SearchResults::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every returned record
    pub fn ids(&self) -> Vec<&str> {
        match self {
            SearchResults::Single(record) => vec![record.id.as_str()],
            SearchResults::Many(records) => records.iter().map(|r| r.id.as_str()).collect(),
        }
    }
}

/// Asynchronous lookup over a [`SampleCatalog`]
#[derive(Debug, Clone)]
pub struct SearchService {
    catalog: Arc<SampleCatalog>,
    latency: Duration,
}

impl SearchService {
    pub fn new(catalog: SampleCatalog, latency: Duration) -> Self {
        Self {
            catalog: Arc::new(catalog),
            latency,
        }
    }

    /// Service over the embedded catalog
    pub fn embedded(latency: Duration) -> Result<Self, SearchError> {
        Ok(Self::new(SampleCatalog::embedded()?, latency))
    }

    pub fn catalog(&self) -> &SampleCatalog {
        &self.catalog
    }

    /// Run a search.
    ///
    /// The query only has to be non-blank; the sample catalog answers every
    /// query in a category with the same records.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        category: SearchCategory,
        query: &str,
    ) -> Result<SearchResults, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        debug!(latency_ms = self.latency.as_millis() as u64, "Searching");
        tokio::time::sleep(self.latency).await;

        let results = match category {
            SearchCategory::Property => SearchResults::Single(self.catalog.property.clone()),
            SearchCategory::Owner => SearchResults::Many(self.catalog.by_owner.clone()),
            SearchCategory::Location => SearchResults::Many(self.catalog.by_location.clone()),
        };
        debug!(count = results.len(), "Search complete");
        Ok(results)
    }

    /// Full details for a record; unknown ids get the default record
    pub async fn details(&self, id: &str) -> PropertyDetails {
        tokio::time::sleep(self.latency).await;
        self.catalog.details(id).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "Owner".parse::<SearchCategory>().unwrap(),
            SearchCategory::Owner
        );
        assert_eq!(
            " location ".parse::<SearchCategory>().unwrap(),
            SearchCategory::Location
        );
        assert!(matches!(
            "parcel".parse::<SearchCategory>(),
            Err(SearchError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_empty_query_message() {
        assert_eq!(
            SearchError::EmptyQuery.to_string(),
            "Please enter search criteria"
        );
    }

    #[test]
    fn test_results_serialize_tagged() {
        let catalog = SampleCatalog::embedded().unwrap();
        let results = SearchResults::Single(catalog.property.clone());
        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["kind"], "single");
        assert_eq!(json["records"]["id"], "LR-2023-5842");
        assert_eq!(json["records"]["registrationDate"], "2023-05-15");
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let service = SearchService::embedded(Duration::ZERO).unwrap();
        let err = service
            .search(SearchCategory::Property, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::EmptyQuery));
    }
}
