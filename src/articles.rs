//! Article query service
//!
//! Turns [`FilterParams`] into list-endpoint queries and maps the raw payloads into
//! display-ready [`PageResult`]s. The [`ArticleSource`] trait is the seam the
//! pagination controller depends on, so it can be driven by any page provider.

use crate::client::FetchClient;
use crate::error::Result;
use crate::types::{ArticlePageDto, FilterParams, HealthStatus, PageResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// List endpoint, relative to the API base URL
pub const ARTICLES_ENDPOINT: &str = "articles/";
/// Categories endpoint, relative to the API base URL
pub const CATEGORIES_ENDPOINT: &str = "articles/categories";
/// Health endpoint, relative to the API base URL
pub const HEALTH_ENDPOINT: &str = "health";

/// Provider of article pages
///
/// Implementations must return [`Error::Cancelled`](crate::Error::Cancelled)
/// unchanged when `cancel` fires, and should stop work as soon as they notice it.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch one page for `params`
    async fn get_articles(
        &self,
        params: &FilterParams,
        cancel: CancellationToken,
    ) -> Result<PageResult>;
}

/// Build the list-endpoint query string
///
/// Only present filters are serialized, in `page`, `size`, `category`, `q` order.
pub fn articles_query(params: &FilterParams) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("page", &params.page.to_string())
        .append_pair("size", &params.page_size.to_string());
    if let Some(category) = params.category.as_deref().filter(|c| !c.is_empty()) {
        query.append_pair("category", category);
    }
    if let Some(text) = params.search_text.as_deref().filter(|t| !t.is_empty()) {
        query.append_pair("q", text);
    }
    query.finish()
}

/// Article API service backed by a [`FetchClient`]
#[derive(Clone, Debug)]
pub struct ArticleService {
    client: Arc<FetchClient>,
}

impl ArticleService {
    /// Create a service sharing `client` (and its response cache)
    pub fn new(client: Arc<FetchClient>) -> Self {
        Self { client }
    }

    /// Underlying fetch client
    pub fn client(&self) -> &Arc<FetchClient> {
        &self.client
    }

    /// Fetch one page of articles
    ///
    /// # Errors
    /// Cancellation is returned unchanged; every other failure keeps the fetch
    /// client's message.
    pub async fn fetch_page(
        &self,
        params: &FilterParams,
        cancel: Option<&CancellationToken>,
    ) -> Result<PageResult> {
        let endpoint = format!("{ARTICLES_ENDPOINT}?{}", articles_query(params));
        debug!(endpoint = %endpoint, "fetching articles");

        let page: ArticlePageDto = self.client.get(&endpoint, cancel).await.map_err(|e| {
            if !e.is_cancelled() {
                warn!(page = params.page, error = %e, "failed to fetch articles");
            }
            e
        })?;

        Ok(PageResult::from(page))
    }

    /// Fetch the list of category names, in server order
    ///
    /// # Errors
    /// Returns the fetch client's error unchanged.
    pub async fn get_categories(&self) -> Result<Vec<String>> {
        self.client.get(CATEGORIES_ENDPOINT, None).await
    }

    /// Query the health endpoint
    ///
    /// Always bypasses the response cache so monitors see the live status.
    ///
    /// # Errors
    /// Returns the fetch client's error unchanged.
    pub async fn check_health(&self) -> Result<HealthStatus> {
        self.client
            .request(
                HEALTH_ENDPOINT,
                reqwest::Method::GET,
                None,
                None,
                crate::client::RequestOptions::no_store(),
            )
            .await
    }
}

#[async_trait]
impl ArticleSource for ArticleService {
    async fn get_articles(
        &self,
        params: &FilterParams,
        cancel: CancellationToken,
    ) -> Result<PageResult> {
        self.fetch_page(params, Some(&cancel)).await
    }
}
