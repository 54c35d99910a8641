//! Turn CMS list markup into outbound facet search links.
//!
//! CMS pages such as "formats" hold a plain `<ul>` of values. The rewriter
//! pulls the text of every leaf `<li>` and can rewrite each item into a
//! link to the external search interface filtered on that value.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::markup::{collapsed_text, has_descendant, push_end_tag, push_start_tag, push_text};
use crate::types::{AccessError, AccessResult};

/// Search endpoint facet links point at.
pub const DEFAULT_SEARCH_URL: &str = "https://digital.lib.vt.edu/search";

/// One outbound facet link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetLink {
    pub label: String,
    pub href: String,
}

/// Builds facet search links from list markup.
#[derive(Debug, Clone)]
pub struct FacetLinkRewriter {
    search_url: String,
}

impl Default for FacetLinkRewriter {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
        }
    }
}

impl FacetLinkRewriter {
    /// A rewriter targeting a different search endpoint.
    pub fn with_search_url(search_url: &str) -> AccessResult<Self> {
        let parsed = url::Url::parse(search_url).map_err(|e| {
            AccessError::InvalidInput(format!("bad search url '{search_url}': {e}"))
        })?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(AccessError::InvalidInput(format!(
                "search url '{search_url}' must not carry a query or fragment"
            )));
        }
        Ok(Self {
            search_url: parsed.as_str().to_string(),
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    /// Search link for `value` under `facet`.
    pub fn link_for(&self, facet: &str, value: &str) -> String {
        format!(
            "{}?q=&field=all&view=gallery&{}={}",
            self.search_url,
            urlencoding::encode(facet),
            urlencoding::encode(value)
        )
    }

    /// Trimmed, non-empty text of every leaf list item, in document order.
    pub fn extract_values(&self, html: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(html);
        let Ok(selector) = Selector::parse("li") else {
            return Vec::new();
        };

        fragment
            .select(&selector)
            .filter(|li| !has_descendant(*li, "li"))
            .map(collapsed_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Label/href pairs for every extracted value.
    pub fn facet_links(&self, html: &str, facet: &str) -> Vec<FacetLink> {
        self.extract_values(html)
            .into_iter()
            .map(|label| FacetLink {
                href: self.link_for(facet, &label),
                label,
            })
            .collect()
    }

    /// Copy of `html` with every non-empty leaf `<li>` wrapped in a facet
    /// link that opens in a new tab. Markup without list items comes back
    /// unchanged.
    pub fn rewrite(&self, html: &str, facet: &str) -> String {
        let fragment = Html::parse_fragment(html);
        let root = fragment.root_element();
        if !has_descendant(root, "li") {
            return html.to_string();
        }

        let mut out = String::with_capacity(html.len() * 2);
        self.rewrite_children(root, facet, &mut out);
        out
    }

    fn rewrite_children(&self, element: ElementRef<'_>, facet: &str, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => push_text(out, text),
                Node::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.rewrite_element(child, facet, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn rewrite_element(&self, element: ElementRef<'_>, facet: &str, out: &mut String) {
        let name = element.value().name();
        let contains_items = has_descendant(element, "li");

        if name == "li" && !contains_items {
            let label = collapsed_text(element);
            if label.is_empty() {
                out.push_str(&element.html());
                return;
            }
            let href = self.link_for(facet, &label);
            push_start_tag(out, name, element.value().attrs());
            push_start_tag(
                out,
                "a",
                [
                    ("href", href.as_str()),
                    ("target", "_blank"),
                    ("rel", "noopener noreferrer"),
                ],
            );
            push_text(out, &label);
            push_end_tag(out, "a");
            push_end_tag(out, name);
        } else if contains_items {
            push_start_tag(out, name, element.value().attrs());
            self.rewrite_children(element, facet, out);
            push_end_tag(out, name);
        } else {
            out.push_str(&element.html());
        }
    }
}
