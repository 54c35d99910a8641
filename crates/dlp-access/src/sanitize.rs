//! Allow-list sanitizer for CMS-provided HTML.
//!
//! Page content comes from an editable store and is shown as markup, so it
//! is filtered before display: unknown elements are unwrapped, scripting
//! elements are removed with their content, and only inert attributes and
//! safe URL schemes survive.

use std::borrow::Cow;

use scraper::node::Node;
use scraper::{ElementRef, Html};

use crate::markup::{is_void, push_end_tag, push_start_tag, push_text};

const ALLOWED_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "cite", "code", "dd", "div", "dl", "dt",
    "em", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i", "img", "li",
    "ol", "p", "pre", "section", "small", "span", "strong", "sub", "sup", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

/// Removed together with everything inside them.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "noscript", "template", "frame", "frameset",
    "applet", "form", "input", "button", "select", "textarea", "svg", "math",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "title", "id", "class", "target", "rel", "colspan", "rowspan",
    "width", "height", "lang",
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Sanitize an HTML fragment.
pub fn sanitize_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    sanitize_children(fragment.root_element(), &mut out);
    out
}

/// Whether a URL attribute value is relative or uses an allowed scheme.
pub fn is_safe_url(value: &str) -> bool {
    // Browsers ignore embedded whitespace and control characters in schemes.
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = compact.find(':');
    let path_start = compact.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(slash)) if slash < colon => true,
        (Some(colon), _) => SAFE_SCHEMES.contains(&&compact[..colon]),
        (None, _) => true,
    }
}

fn sanitize_children(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => push_text(out, text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    sanitize_element(child, out);
                }
            }
            // Comments, doctypes and processing instructions are dropped.
            _ => {}
        }
    }
}

fn sanitize_element(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }
    if !ALLOWED_ELEMENTS.contains(&name) {
        sanitize_children(element, out);
        return;
    }

    let attrs = allowed_attributes(element);
    push_start_tag(out, name, attrs.iter().map(|(k, v)| (*k, v.as_ref())));
    if is_void(name) {
        return;
    }
    sanitize_children(element, out);
    push_end_tag(out, name);
}

fn allowed_attributes<'a>(element: ElementRef<'a>) -> Vec<(&'a str, Cow<'a, str>)> {
    let mut attrs: Vec<(&'a str, Cow<'a, str>)> = element
        .value()
        .attrs()
        .filter(|(key, _)| ALLOWED_ATTRIBUTES.contains(key))
        .filter(|(key, value)| !URL_ATTRIBUTES.contains(key) || is_safe_url(value))
        .filter(|(key, _)| *key != "rel")
        .map(|(key, value)| (key, Cow::Borrowed(value)))
        .collect();

    let new_tab = attrs
        .iter()
        .any(|(key, value)| *key == "target" && value.eq_ignore_ascii_case("_blank"));
    if new_tab {
        attrs.push(("rel", Cow::Borrowed("noopener noreferrer")));
    }
    attrs
}
