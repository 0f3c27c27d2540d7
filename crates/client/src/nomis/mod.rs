//! Client for the census tabular-data API.
//!
//! Three endpoints are used, all read through a [`PageSource`] (normally the
//! caching source):
//!
//! - **Catalog**: `dataset/def.sdmx.json`, every dataset definition
//! - **Code list**: `dataset/{table}/{dimension}.def.sdmx.json`
//! - **Data**: `dataset/{table}.data.csv`, paged with `RecordLimit`/`RecordOffset`

pub mod catalog;
pub mod codes;
pub mod endpoints;
pub mod retriever;

pub use catalog::Catalog;
pub use codes::{Code, CodeList};
pub use endpoints::{DataQuery, EndpointError, Endpoints};
pub use retriever::{PagedRetriever, RetrievalStats};

use census_core::Error;

use crate::fetch::PageSource;

/// API client over any page source.
pub struct NomisApi<S> {
    source: S,
    endpoints: Endpoints,
}

impl<S: PageSource> NomisApi<S> {
    /// Create a client for the API rooted at `base_url`.
    pub fn new(source: S, base_url: &str) -> Result<Self, Error> {
        let endpoints = Endpoints::new(base_url).map_err(|e| Error::InvalidInput(e.to_string()))?;
        Ok(Self { source, endpoints })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Fetch and parse the dataset catalog.
    pub async fn catalog(&self) -> Result<Catalog, Error> {
        let body = self.source.get_page(&self.endpoints.catalog()).await?;
        let catalog = Catalog::parse(&body)?;
        tracing::info!(datasets = catalog.len(), "loaded dataset catalog");
        Ok(catalog)
    }

    /// Fetch the codes of one dimension of a dataset, in document order.
    pub async fn codes(&self, table_id: &str, dimension: &str) -> Result<CodeList, Error> {
        let body = self.source.get_page(&self.endpoints.codelist(table_id, dimension)).await?;
        CodeList::parse(&body)
    }

    /// Fetch one raw CSV page.
    pub async fn data_page(&self, query: &DataQuery, limit: u64, offset: u64) -> Result<String, Error> {
        self.source.get_page(&self.endpoints.data(query, limit, offset)).await
    }
}
