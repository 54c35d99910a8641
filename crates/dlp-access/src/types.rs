//! Core data types for collections, archive items, and site content.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Placeholder shown for metadata fields that have no value.
pub const NOT_AVAILABLE: &str = "N/A";

/// A page of results from a listing query.
///
/// `Listing::default()` is the empty-result sentinel returned when a
/// backend call fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "lenient_total")]
    pub total: u64,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            next_token: None,
        }
    }
}

impl<T> Listing<T> {
    /// Whether the listing carries no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A collection record. Nested collections carry their ancestors in
/// `hierarchy_path`, root first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub description: Vec<String>,
    #[serde(default)]
    pub custom_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub creator: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub date: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub size: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub subject: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub language: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub rights: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub rights_holder: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub bibliographic_citation: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub relation: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    // The backend schema spells it this way.
    #[serde(rename = "heirarchy_path", default, deserialize_with = "one_or_many")]
    pub hierarchy_path: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub parent_collection: Vec<String>,
    #[serde(default)]
    pub visibility: Option<bool>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<String>,
}

/// Fields requested for every collection query.
pub const COLLECTION_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "custom_key",
    "identifier",
    "creator",
    "date",
    "size",
    "subject",
    "language",
    "rights",
    "rights_holder",
    "bibliographic_citation",
    "relation",
    "tags",
    "thumbnail_path",
    "heirarchy_path",
    "parent_collection",
    "visibility",
    "createdAt",
    "updatedAt",
];

impl Collection {
    /// Display title, falling back to the custom key and then the id.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.custom_key.as_deref())
            .unwrap_or(&self.id)
    }

    /// Whether this collection sits at the top of its hierarchy.
    pub fn is_top_level(&self) -> bool {
        self.hierarchy_path.is_empty()
    }

    /// Metadata rows that have a value, in display order.
    pub fn metadata_rows(&self) -> Vec<MetadataRow> {
        let identifier = self
            .identifier
            .clone()
            .or_else(|| self.custom_key.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let created = if self.date.is_empty() {
            self.created_at.as_deref().map(format_date)
        } else {
            Some(join_values(&self.date.iter().map(|d| format_date(d)).collect::<Vec<_>>()))
        };

        let rows = [
            ("Size", self.size.clone()),
            ("Identifier", Some(identifier)),
            ("Creator", non_empty(&self.creator)),
            ("Date Created", created),
            ("Last Modified", self.updated_at.as_deref().map(format_date)),
            ("Subject", non_empty(&self.subject)),
            ("Language", non_empty(&self.language)),
            ("Rights", non_empty(&self.rights)),
            ("Rights Holder", non_empty(&self.rights_holder)),
            ("Bibliographic Citation", non_empty(&self.bibliographic_citation)),
            ("Related URL", non_empty(&self.relation)),
            ("Tags", non_empty(&self.tags)),
        ];

        rows.into_iter()
            .filter_map(|(label, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|value| MetadataRow { label, value })
            })
            .collect()
    }
}

/// An archive item (document, image, map, recording) inside a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub description: Vec<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub custom_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub identifier: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub creator: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub rights: Vec<String>,
    #[serde(rename = "archiveOptions", default)]
    pub archive_options: Option<Value>,
}

/// Fields requested for every archive query.
pub const ARCHIVE_FIELDS: &[&str] = &[
    "id",
    "title",
    "description",
    "start_date",
    "thumbnail_path",
    "custom_key",
    "identifier",
    "tags",
    "creator",
    "rights",
    "archiveOptions",
];

impl Archive {
    /// Multi-valued descriptions joined into one paragraph.
    pub fn description_text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .description
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Display title, falling back to the custom key.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.custom_key.as_deref())
            .unwrap_or("Untitled")
    }
}

/// Site-wide settings stored in the data API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// Fields requested for the site query.
pub const SITE_FIELDS: &[&str] = &["id", "title", "lang"];

/// A CMS content blob. `content` holds raw, untrusted HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Fields requested for page content.
pub const PAGE_CONTENT_FIELDS: &[&str] = &["id", "content"];

impl PageContent {
    /// The HTML body if present and non-blank.
    pub fn html(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// One label/value line of a record's metadata table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRow {
    pub label: &'static str,
    pub value: String,
}

/// Attributes a listing can be sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "start_date")]
    StartDate,
    #[serde(rename = "identifier")]
    Identifier,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Title,
        SortField::StartDate,
        SortField::Identifier,
        SortField::CreatedAt,
    ];

    /// Backend field name.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::StartDate => "start_date",
            SortField::Identifier => "identifier",
            SortField::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "start_date" | "date" => Ok(SortField::StartDate),
            "identifier" => Ok(SortField::Identifier),
            "createdat" | "created" => Ok(SortField::CreatedAt),
            other => Err(AccessError::InvalidInput(format!(
                "unknown sort field '{other}'"
            ))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(AccessError::InvalidInput(format!(
                "unknown sort direction '{other}'"
            ))),
        }
    }
}

/// A field plus direction, serialized the way the search API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortOption {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOption {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction)
    }
}

/// A dynamic route segment as handed over by a router: absent, a single
/// value, or repeated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteParam {
    #[default]
    Missing,
    One(String),
    Many(Vec<String>),
}

impl RouteParam {
    /// The value when it is a single non-blank string.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            RouteParam::One(key) if !key.trim().is_empty() => Some(key.trim()),
            _ => None,
        }
    }
}

impl From<&str> for RouteParam {
    fn from(value: &str) -> Self {
        RouteParam::One(value.to_string())
    }
}

impl From<String> for RouteParam {
    fn from(value: String) -> Self {
        RouteParam::One(value)
    }
}

impl From<Vec<String>> for RouteParam {
    fn from(values: Vec<String>) -> Self {
        RouteParam::Many(values)
    }
}

impl From<Option<String>> for RouteParam {
    fn from(value: Option<String>) -> Self {
        value.map(RouteParam::One).unwrap_or_default()
    }
}

/// Parse a `total` value the way the search API reports it: a number, a
/// numeric string, or garbage. Anything unparsable counts as zero.
pub fn parse_total(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
            })
            .unwrap_or(0),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Render an ISO timestamp as "Month D, YYYY"; other values pass through.
pub fn format_date(value: &str) -> String {
    if value.contains('T') {
        if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(value) {
            return ts.format("%B %-d, %Y").to_string();
        }
        if let Ok(ts) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
            return ts.format("%B %-d, %Y").to_string();
        }
    }
    value.to_string()
}

fn join_values(values: &[String]) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_empty(values: &[String]) -> Option<String> {
    let joined = join_values(values);
    (!joined.is_empty()).then_some(joined)
}

fn lenient_total<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_total).unwrap_or(0))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(values)) => values.iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(&other).into_iter().collect(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(values)) => {
            let joined = values
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        Some(other) => scalar_to_string(&other),
        None => None,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Errors that can occur talking to the data API.
#[derive(thiserror::Error, Debug)]
pub enum AccessError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Response missing data: {0}")]
    MissingData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Data API client is not ready")]
    NotReady,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience result type.
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_total(&json!(25)), 25);
        assert_eq!(parse_total(&json!("25")), 25);
        assert_eq!(parse_total(&json!(" 7 ")), 7);
        assert_eq!(parse_total(&json!("12 items")), 12);
    }

    #[test]
    fn test_unparsable_total_is_zero() {
        assert_eq!(parse_total(&json!("lots")), 0);
        assert_eq!(parse_total(&json!(null)), 0);
        assert_eq!(parse_total(&json!(-3)), 0);
        assert_eq!(parse_total(&json!({"value": 3})), 0);

        let listing: Listing<Archive> =
            serde_json::from_value(json!({"items": [], "total": "NaN", "nextToken": null}))
                .unwrap();
        assert_eq!(listing.total, 0);
    }

    #[test]
    fn test_listing_tolerates_missing_fields() {
        let listing: Listing<Archive> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(listing, Listing::default());
    }

    #[test]
    fn test_string_or_list_fields() {
        let archive: Archive = serde_json::from_value(json!({
            "title": "Letter",
            "description": "single",
            "creator": ["A", null, "B"],
            "identifier": 1927
        }))
        .unwrap();
        assert_eq!(archive.description, vec!["single"]);
        assert_eq!(archive.creator, vec!["A", "B"]);
        assert_eq!(archive.identifier.as_deref(), Some("1927"));
    }

    #[test]
    fn test_every_requested_collection_field_is_declared() {
        let value = serde_json::to_value(Collection::default()).unwrap();
        let object = value.as_object().unwrap();
        for field in COLLECTION_FIELDS {
            assert!(object.contains_key(*field), "Collection lacks field {field}");
        }
    }

    #[test]
    fn test_every_requested_archive_field_is_declared() {
        let value = serde_json::to_value(Archive::default()).unwrap();
        let object = value.as_object().unwrap();
        for field in ARCHIVE_FIELDS {
            assert!(object.contains_key(*field), "Archive lacks field {field}");
        }
    }

    #[test]
    fn test_every_requested_site_and_content_field_is_declared() {
        let site = serde_json::to_value(SiteConfig::default()).unwrap();
        for field in SITE_FIELDS {
            assert!(site.get(*field).is_some(), "SiteConfig lacks field {field}");
        }
        let content = serde_json::to_value(PageContent::default()).unwrap();
        for field in PAGE_CONTENT_FIELDS {
            assert!(content.get(*field).is_some(), "PageContent lacks field {field}");
        }
    }

    #[test]
    fn test_metadata_rows_skip_empty_fields() {
        let collection = Collection {
            id: "c1".into(),
            custom_key: Some("ark:/53696/abc".into()),
            creator: vec!["Smith".into(), "".into(), "Jones".into()],
            updated_at: Some("2024-03-05T10:00:00.000Z".into()),
            ..Default::default()
        };
        let rows = collection.metadata_rows();
        let labels: Vec<&str> = rows.iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["Identifier", "Creator", "Last Modified"]);
        assert_eq!(rows[0].value, "ark:/53696/abc");
        assert_eq!(rows[1].value, "Smith, Jones");
        assert_eq!(rows[2].value, "March 5, 2024");
    }

    #[test]
    fn test_identifier_row_falls_back_to_placeholder() {
        let rows = Collection::default().metadata_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, NOT_AVAILABLE);
    }

    #[test]
    fn test_format_date_passes_through_plain_values() {
        assert_eq!(format_date("1927"), "1927");
        assert_eq!(format_date("circa 1900"), "circa 1900");
        assert_eq!(format_date("2021-01-09T00:00:00Z"), "January 9, 2021");
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("Title".parse::<SortField>().unwrap(), SortField::Title);
        assert_eq!("date".parse::<SortField>().unwrap(), SortField::StartDate);
        assert!("color".parse::<SortField>().is_err());
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert_eq!(
            serde_json::to_value(SortOption::default()).unwrap(),
            json!({"field": "title", "direction": "asc"})
        );
    }

    #[test]
    fn test_route_param_key() {
        assert_eq!(RouteParam::from("abc").as_key(), Some("abc"));
        assert_eq!(RouteParam::from("  ").as_key(), None);
        assert_eq!(RouteParam::Missing.as_key(), None);
        assert_eq!(RouteParam::from(vec!["a".to_string()]).as_key(), None);
    }
}
