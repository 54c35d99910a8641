//! Registry of CMS content blobs behind the static site pages.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::facets::FacetLinkRewriter;
use crate::gateway::QueryGateway;
use crate::sanitize::sanitize_html;
use crate::types::{AccessError, AccessResult};

/// A page section whose body lives in the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSlot {
    About,
    Team,
    Organizations,
    Maps,
    Formats,
    HarmfulContentStatement,
    DigitalCollectionStrategy,
}

impl ContentSlot {
    pub const ALL: [ContentSlot; 7] = [
        ContentSlot::About,
        ContentSlot::Team,
        ContentSlot::Organizations,
        ContentSlot::Maps,
        ContentSlot::Formats,
        ContentSlot::HarmfulContentStatement,
        ContentSlot::DigitalCollectionStrategy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContentSlot::About => "about",
            ContentSlot::Team => "team",
            ContentSlot::Organizations => "organizations",
            ContentSlot::Maps => "maps",
            ContentSlot::Formats => "formats",
            ContentSlot::HarmfulContentStatement => "harmful-content-statement",
            ContentSlot::DigitalCollectionStrategy => "digital-collection-strategy",
        }
    }

    /// Content id used when no override is configured.
    pub fn default_id(self) -> &'static str {
        match self {
            ContentSlot::HarmfulContentStatement => "3b35f9f9-82cb-4632-9489-efda0f30594b",
            other => other.name(),
        }
    }

    /// Site route that shows this section.
    pub fn route(self) -> &'static str {
        match self {
            ContentSlot::About => "/about",
            ContentSlot::Team => "/about/team",
            ContentSlot::Organizations => "/about/organizations",
            ContentSlot::Maps => "/maps",
            ContentSlot::Formats => "/about/formats",
            ContentSlot::HarmfulContentStatement => "/about/harmful-content-statement",
            ContentSlot::DigitalCollectionStrategy => "/about/digital-collection-strategy",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ContentSlot::About => "About",
            ContentSlot::Team => "Team",
            ContentSlot::Organizations => "Organizations",
            ContentSlot::Maps => "Maps",
            ContentSlot::Formats => "Formats",
            ContentSlot::HarmfulContentStatement => "Harmful Content Statement",
            ContentSlot::DigitalCollectionStrategy => "Digital Collection Strategy",
        }
    }

    /// Search facet the section's list items link to, if any.
    pub fn facet(self) -> Option<&'static str> {
        match self {
            ContentSlot::Formats => Some("format"),
            _ => None,
        }
    }
}

impl fmt::Display for ContentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentSlot {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ContentSlot::ALL
            .into_iter()
            .find(|slot| slot.name() == wanted)
            .ok_or_else(|| AccessError::InvalidInput(format!("unknown content section '{s}'")))
    }
}

/// Maps sections to CMS content ids.
#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    overrides: HashMap<ContentSlot, String>,
}

impl ContentRegistry {
    /// Build a registry from `section name -> content id` overrides.
    pub fn from_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> AccessResult<Self> {
        let mut registry = Self::default();
        for (name, id) in overrides {
            registry.set(name.parse()?, id);
        }
        Ok(registry)
    }

    pub fn set(&mut self, slot: ContentSlot, id: impl Into<String>) {
        self.overrides.insert(slot, id.into());
    }

    pub fn id(&self, slot: ContentSlot) -> &str {
        self.overrides
            .get(&slot)
            .map(String::as_str)
            .unwrap_or_else(|| slot.default_id())
    }
}

/// Fetches page sections and prepares them for display.
#[derive(Clone)]
pub struct ContentLoader {
    gateway: QueryGateway,
    registry: ContentRegistry,
    rewriter: FacetLinkRewriter,
}

impl ContentLoader {
    pub fn new(
        gateway: QueryGateway,
        registry: ContentRegistry,
        rewriter: FacetLinkRewriter,
    ) -> Self {
        Self {
            gateway,
            registry,
            rewriter,
        }
    }

    pub fn registry(&self) -> &ContentRegistry {
        &self.registry
    }

    pub fn rewriter(&self) -> &FacetLinkRewriter {
        &self.rewriter
    }

    /// Sanitized HTML for a section, with facet links applied where the
    /// section has a facet. `None` when the CMS has nothing to show.
    pub async fn section(&self, slot: ContentSlot) -> Option<String> {
        let id = self.registry.id(slot);
        let content = self.gateway.get_page_content(id).await?;
        let html = sanitize_html(content.html()?);
        match slot.facet() {
            Some(facet) => Some(self.rewriter.rewrite(&html, facet)),
            None => Some(html),
        }
    }

    /// Sanitized HTML for an arbitrary content id.
    pub async fn by_id(&self, content_id: &str) -> Option<String> {
        let content = self.gateway.get_page_content(content_id).await?;
        content.html().map(sanitize_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids() {
        let registry = ContentRegistry::default();
        assert_eq!(registry.id(ContentSlot::About), "about");
        assert_eq!(
            registry.id(ContentSlot::HarmfulContentStatement),
            "3b35f9f9-82cb-4632-9489-efda0f30594b"
        );
        assert_eq!(
            registry.id(ContentSlot::DigitalCollectionStrategy),
            "digital-collection-strategy"
        );
    }

    #[test]
    fn test_overrides() {
        let registry =
            ContentRegistry::from_overrides([("team", "abc-123"), ("digital_collection_strategy", "dcs")])
                .unwrap();
        assert_eq!(registry.id(ContentSlot::Team), "abc-123");
        assert_eq!(registry.id(ContentSlot::DigitalCollectionStrategy), "dcs");
        assert_eq!(registry.id(ContentSlot::Maps), "maps");

        assert!(ContentRegistry::from_overrides([("gallery", "x")]).is_err());
    }

    #[test]
    fn test_slot_names_round_trip() {
        for slot in ContentSlot::ALL {
            assert_eq!(slot.name().parse::<ContentSlot>().unwrap(), slot);
            assert!(slot.route().starts_with('/'));
        }
    }
}
