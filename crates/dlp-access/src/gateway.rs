//! Read operations against the data API.
//!
//! Every operation is fail-safe: transport failures, HTTP errors, GraphQL
//! errors and undecodable payloads are logged and turned into the
//! operation's empty sentinel (`None` or an empty [`Listing`]). Callers
//! render "no data" instead of handling errors.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::{ClientHandle, GraphqlOperation};
use crate::queries;
use crate::types::{
    AccessResult, Archive, Collection, Listing, PageContent, RouteParam, SiteConfig, SortOption,
};

/// Default namespace prefix for archive custom keys.
pub const DEFAULT_ARK_PREFIX: &str = "ark:/53696/";

/// Default bound on waiting for the client to become ready.
pub const DEFAULT_READY_TIMEOUT_MS: u64 = 5_000;

/// Gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub ark_prefix: String,
    pub ready_timeout: Duration,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            ark_prefix: DEFAULT_ARK_PREFIX.to_string(),
            ready_timeout: Duration::from_millis(DEFAULT_READY_TIMEOUT_MS),
        }
    }
}

/// Fail-safe query gateway over an injected client handle.
#[derive(Clone)]
pub struct QueryGateway {
    client: ClientHandle,
    options: GatewayOptions,
}

impl QueryGateway {
    pub fn new(client: ClientHandle) -> Self {
        Self::with_options(client, GatewayOptions::default())
    }

    pub fn with_options(client: ClientHandle, options: GatewayOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &ClientHandle {
        &self.client
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    async fn run(&self, operation: &GraphqlOperation) -> AccessResult<Value> {
        let transport = self.client.ready_within(self.options.ready_timeout).await?;
        transport.execute(operation).await
    }

    async fn fetch<T: DeserializeOwned>(&self, operation: &GraphqlOperation) -> AccessResult<T> {
        let value = self.run(operation).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Site settings, or `None` on failure.
    pub async fn get_site_config(&self) -> Option<SiteConfig> {
        match self.fetch::<Option<SiteConfig>>(&queries::get_site()).await {
            Ok(site) => site,
            Err(e) => {
                tracing::error!("Error fetching site configuration: {e}");
                None
            }
        }
    }

    /// Visible top-level collections for the browse view.
    pub async fn list_top_level_collections(
        &self,
        sort: SortOption,
        limit: u32,
        next_token: Option<&str>,
    ) -> Listing<Collection> {
        let operation = queries::search_top_level_collections(sort, limit, next_token);
        match self.fetch::<Option<Listing<Collection>>>(&operation).await {
            Ok(listing) => listing.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Error fetching browse collections: {e}");
                Listing::default()
            }
        }
    }

    /// Look up a visible collection by custom key.
    ///
    /// Only a single non-blank key is accepted; anything else returns `None`
    /// without touching the network.
    pub async fn get_collection_by_key(&self, key: &RouteParam) -> Option<Collection> {
        let key = key.as_key()?;
        let operation = queries::search_collection_by_key(key);
        match self.fetch::<Option<Listing<Collection>>>(&operation).await {
            Ok(listing) => listing.and_then(|l| l.items.into_iter().next()),
            Err(e) => {
                tracing::error!("Error fetching collection: {key}: {e}");
                None
            }
        }
    }

    /// The root of `collection`'s hierarchy.
    ///
    /// A collection without a hierarchy path is its own root and is returned
    /// unchanged, as is the input when the root cannot be fetched.
    pub async fn get_top_level_ancestor(&self, collection: Collection) -> Collection {
        let Some(root_id) = collection.hierarchy_path.first() else {
            return collection;
        };
        if *root_id == collection.id {
            return collection;
        }

        match self
            .fetch::<Option<Collection>>(&queries::get_collection(root_id))
            .await
        {
            Ok(Some(root)) => root,
            Ok(None) => {
                tracing::debug!("Top level collection {root_id} not found for {}", collection.id);
                collection
            }
            Err(e) => {
                tracing::error!("Error getting top level parent for: {}: {e}", collection.id);
                collection
            }
        }
    }

    /// Visible items of a collection, title ascending.
    pub async fn list_collection_items(
        &self,
        collection_id: &str,
        limit: u32,
        offset: u64,
    ) -> Listing<Archive> {
        self.list_collection_items_sorted(collection_id, limit, offset, SortOption::default())
            .await
    }

    /// Visible items of a collection in the requested order.
    pub async fn list_collection_items_sorted(
        &self,
        collection_id: &str,
        limit: u32,
        offset: u64,
        sort: SortOption,
    ) -> Listing<Archive> {
        let operation = queries::search_collection_items(collection_id, sort, limit, offset);
        match self.fetch::<Option<Listing<Archive>>>(&operation).await {
            Ok(listing) => listing.unwrap_or_default(),
            Err(e) => {
                tracing::error!("Error fetching collection items for: {collection_id}: {e}");
                Listing::default()
            }
        }
    }

    /// Look up a visible archive item by the key segment of its ARK.
    pub async fn get_archive_by_key(&self, key: &RouteParam) -> Option<Archive> {
        let key = key.as_key()?;
        let custom_key = if key.starts_with(&self.options.ark_prefix) {
            key.to_string()
        } else {
            format!("{}{key}", self.options.ark_prefix)
        };

        let operation = queries::search_archive_by_key(&custom_key);
        match self.fetch::<Option<Listing<Archive>>>(&operation).await {
            Ok(listing) => listing.and_then(|l| l.items.into_iter().next()),
            Err(e) => {
                tracing::error!("Error fetching archive item: {custom_key}: {e}");
                None
            }
        }
    }

    /// A CMS content blob, or `None` on failure.
    pub async fn get_page_content(&self, content_id: &str) -> Option<PageContent> {
        match self
            .fetch::<Option<PageContent>>(&queries::get_page_content(content_id))
            .await
        {
            Ok(content) => content,
            Err(e) => {
                tracing::error!("Error fetching page content: {content_id}: {e}");
                None
            }
        }
    }
}
