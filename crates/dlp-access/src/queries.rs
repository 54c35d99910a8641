//! GraphQL documents and variable builders for the data API.
//!
//! Selection sets are generated from the field lists in [`crate::types`] so
//! a record never requests a field it cannot hold.

use serde_json::{json, Value};

use crate::client::GraphqlOperation;
use crate::types::{
    SortOption, ARCHIVE_FIELDS, COLLECTION_FIELDS, PAGE_CONTENT_FIELDS, SITE_FIELDS,
};

/// Id of the single site settings record.
pub const SITE_ID: &str = "1";

fn selection(fields: &[&str]) -> String {
    fields.join("\n      ")
}

fn listing_selection(fields: &[&str]) -> String {
    format!(
        "items {{\n      {}\n    }}\n    total\n    nextToken",
        selection(fields)
    )
}

/// `getSite(id: "1")`.
pub fn get_site() -> GraphqlOperation {
    let query = format!(
        "query GetSite($id: ID!) {{\n  getSite(id: $id) {{\n    {}\n  }}\n}}",
        selection(SITE_FIELDS)
    );
    GraphqlOperation::new("getSite", query, json!({ "id": SITE_ID }))
}

fn search_collections_document() -> String {
    format!(
        "query SearchCollections(\n  \
           $filter: SearchableCollectionFilterInput\n  \
           $sort: [SearchableCollectionSortInput]\n  \
           $limit: Int\n  \
           $nextToken: String\n\
         ) {{\n  \
           searchCollections(filter: $filter, sort: $sort, limit: $limit, nextToken: $nextToken) {{\n    \
             {}\n  \
           }}\n\
         }}",
        listing_selection(COLLECTION_FIELDS)
    )
}

/// Visible top-level collections, sorted and paged by continuation token.
pub fn search_top_level_collections(
    sort: SortOption,
    limit: u32,
    next_token: Option<&str>,
) -> GraphqlOperation {
    let variables = json!({
        "filter": {
            "visibility": { "eq": true },
            "parent_collection": { "exists": false }
        },
        "sort": [sort],
        "limit": limit,
        "nextToken": next_token,
    });
    GraphqlOperation::new("searchCollections", search_collections_document(), variables)
}

/// The visible collection whose custom key matches `custom_key`.
pub fn search_collection_by_key(custom_key: &str) -> GraphqlOperation {
    let variables = json!({
        "filter": {
            "visibility": { "eq": true },
            "custom_key": { "matchPhrase": custom_key }
        },
        "limit": 1,
    });
    GraphqlOperation::new("searchCollections", search_collections_document(), variables)
}

/// `getCollection(id)`.
pub fn get_collection(id: &str) -> GraphqlOperation {
    let query = format!(
        "query GetCollection($id: ID!) {{\n  getCollection(id: $id) {{\n    {}\n  }}\n}}",
        selection(COLLECTION_FIELDS)
    );
    GraphqlOperation::new("getCollection", query, json!({ "id": id }))
}

fn search_archives_document() -> String {
    format!(
        "query SearchArchives(\n  \
           $filter: SearchableArchiveFilterInput\n  \
           $sort: [SearchableArchiveSortInput]\n  \
           $limit: Int\n  \
           $nextToken: String\n  \
           $from: Int\n\
         ) {{\n  \
           searchArchives(filter: $filter, sort: $sort, limit: $limit, nextToken: $nextToken, from: $from) {{\n    \
             {}\n  \
           }}\n\
         }}",
        listing_selection(ARCHIVE_FIELDS)
    )
}

/// Visible items whose hierarchy path contains `collection_id`.
pub fn search_collection_items(
    collection_id: &str,
    sort: SortOption,
    limit: u32,
    offset: u64,
) -> GraphqlOperation {
    let variables = json!({
        "filter": {
            "heirarchy_path": { "eq": collection_id },
            "visibility": { "eq": true }
        },
        "sort": [sort],
        "limit": limit,
        "nextToken": Value::Null,
        "from": offset,
    });
    GraphqlOperation::new("searchArchives", search_archives_document(), variables)
}

/// The visible archive whose custom key equals `custom_key` exactly.
pub fn search_archive_by_key(custom_key: &str) -> GraphqlOperation {
    let variables = json!({
        "filter": {
            "visibility": { "eq": true },
            "custom_key": { "eq": custom_key }
        },
        "limit": 1,
    });
    GraphqlOperation::new("searchArchives", search_archives_document(), variables)
}

/// `getPageContent(id)`.
pub fn get_page_content(content_id: &str) -> GraphqlOperation {
    let query = format!(
        "query GetPageContent($id: ID!) {{\n  getPageContent(id: $id) {{\n    {}\n  }}\n}}",
        selection(PAGE_CONTENT_FIELDS)
    );
    GraphqlOperation::new("getPageContent", query, json!({ "id": content_id }))
}
