//! Small HTML serialization helpers shared by the rewriter and sanitizer.

use scraper::ElementRef;

/// Elements that never have an end tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

pub(crate) fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn push_attr_value(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn push_start_tag<'a>(
    out: &mut String,
    name: &str,
    attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        push_attr_value(out, value);
        out.push('"');
    }
    out.push('>');
}

pub(crate) fn push_end_tag(out: &mut String, name: &str) {
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

pub(crate) fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Text content with whitespace runs collapsed and the ends trimmed.
pub(crate) fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether any element strictly below `element` is named `name`.
pub(crate) fn has_descendant(element: ElementRef<'_>, name: &str) -> bool {
    element
        .descendants()
        .skip(1)
        .any(|node| node.value().as_element().is_some_and(|e| e.name() == name))
}
