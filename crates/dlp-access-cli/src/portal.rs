//! Wiring of the gateway, content loader and listings from configuration.

use std::sync::Arc;

use dlp_access::{
    ClientHandle, CollectionItems, ContentLoader, GraphqlTransport, ListingController,
    QueryGateway, TopLevelCollections,
};

use crate::config::{AccessConfig, ConfigError, SiteSettings};

/// Everything a command needs to talk to the data API.
#[derive(Clone)]
pub struct Portal {
    gateway: QueryGateway,
    content: ContentLoader,
    site: SiteSettings,
}

impl Portal {
    /// Connect using the HTTP transport described by `config`.
    pub fn connect(config: &AccessConfig) -> Result<Self, ConfigError> {
        let transport = config.transport()?;
        tracing::info!("Data API: {}", transport.endpoint());
        Self::with_transport(config, Arc::new(transport))
    }

    /// Build over an already constructed transport.
    pub fn with_transport(
        config: &AccessConfig,
        transport: Arc<dyn GraphqlTransport>,
    ) -> Result<Self, ConfigError> {
        let client = ClientHandle::pending();
        let gateway = QueryGateway::with_options(client.clone(), config.gateway_options());
        let content = ContentLoader::new(
            gateway.clone(),
            config.content_registry()?,
            config.rewriter()?,
        );
        client.install(transport);
        Ok(Self {
            gateway,
            content,
            site: config.site.clone(),
        })
    }

    pub fn gateway(&self) -> &QueryGateway {
        &self.gateway
    }

    pub fn content(&self) -> &ContentLoader {
        &self.content
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    /// Pager over the items of one collection. Nothing is fetched until
    /// the caller loads a ticket.
    pub fn collection_items(&self, collection_id: &str) -> ListingController<CollectionItems> {
        ListingController::new(CollectionItems::new(self.gateway.clone(), collection_id))
    }

    /// Pager over the top-level collections.
    pub fn top_level(&self) -> ListingController<TopLevelCollections> {
        ListingController::new(TopLevelCollections::new(self.gateway.clone()))
    }
}
