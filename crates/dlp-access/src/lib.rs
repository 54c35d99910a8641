//! DLP Access — client library for the digital-library public site.
//!
//! The query gateway reads from the data API and never fails loudly. Listings
//! page and sort through `ListingController`, and CMS pages are sanitized
//! before display.

pub mod client;
pub mod content;
pub mod facets;
pub mod gateway;
pub mod listing;
mod markup;
pub mod queries;
pub mod sanitize;
pub mod types;

pub use client::{ClientHandle, GraphqlOperation, GraphqlTransport, HttpTransport};
pub use content::{ContentLoader, ContentRegistry, ContentSlot};
pub use facets::{FacetLink, FacetLinkRewriter};
pub use gateway::{GatewayOptions, QueryGateway};
pub use listing::{
    CollectionItems, FetchStatus, FetchTicket, ListingController, ListingSource, ListingState,
    PageRequest, TopLevelCollections, PAGE_SIZE_OPTIONS,
};
pub use sanitize::sanitize_html;
pub use types::*;
