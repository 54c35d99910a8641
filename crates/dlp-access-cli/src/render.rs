//! Plain-text rendering of records and listing state.

use std::fmt::Write;

use dlp_access::{format_date, Archive, Collection, ListingState, SiteConfig};

use crate::config::SiteSettings;

/// Header line for a site.
pub fn site_summary(settings: &SiteSettings, site: Option<&SiteConfig>) -> String {
    let mut out = String::new();
    let title = site
        .and_then(|s| s.title.as_deref())
        .unwrap_or(&settings.name);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "  URL:      {}", settings.url);
    let _ = writeln!(out, "  Search:   {}", settings.search_url);
    if let Some(lang) = site.and_then(|s| s.lang.as_deref()) {
        let _ = writeln!(out, "  Language: {lang}");
    }
    if site.is_none() {
        let _ = writeln!(out, "  (site settings unavailable)");
    }
    out
}

/// One line of a collection listing.
pub fn collection_line(collection: &Collection) -> String {
    match collection.custom_key.as_deref() {
        Some(key) => format!("{:<48} {key}", collection.display_title()),
        None => collection.display_title().to_string(),
    }
}

/// One line of an item listing.
pub fn archive_line(archive: &Archive) -> String {
    let mut line = format!("{:<48}", archive.display_title());
    if let Some(date) = archive.start_date.as_deref() {
        let _ = write!(line, " {}", format_date(date));
    }
    if let Some(key) = archive.custom_key.as_deref() {
        let _ = write!(line, " {key}");
    }
    line.trim_end().to_string()
}

/// Collection heading, metadata table and description.
pub fn collection_detail(collection: &Collection, top_level: Option<&Collection>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", collection.display_title());

    if let Some(root) = top_level.filter(|root| root.id != collection.id) {
        let _ = writeln!(out, "  Part of {}", root.display_title());
    }
    let _ = writeln!(out);

    let rows = collection.metadata_rows();
    let width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
    for row in &rows {
        let _ = writeln!(out, "  {:<width$}  {}", row.label, row.value);
    }

    let description: Vec<&str> = collection
        .description
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect();
    if !description.is_empty() {
        let _ = writeln!(out);
        for paragraph in description {
            let _ = writeln!(out, "  {paragraph}");
        }
    }
    out
}

/// Archive heading and its populated fields.
pub fn archive_detail(archive: &Archive) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", archive.display_title());
    let _ = writeln!(out);

    let rows = [
        ("Identifier", archive.identifier.clone()),
        ("Key", archive.custom_key.clone()),
        ("Date", archive.start_date.as_deref().map(format_date)),
        ("Creator", joined(&archive.creator)),
        ("Rights", joined(&archive.rights)),
        ("Tags", joined(&archive.tags)),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            let _ = writeln!(out, "  {label:<10}  {value}");
        }
    }

    if let Some(text) = archive.description_text() {
        let _ = writeln!(out);
        let _ = writeln!(out, "  {text}");
    }
    out
}

/// Pager footer, e.g. `Page 2 of 3 · 25 items · 10 per page · title asc`.
pub fn page_footer(state: &ListingState) -> String {
    if state.total_pages == 0 {
        return format!("No items · {} per page · {}", state.limit, state.sort);
    }
    format!(
        "Page {} of {} · {} items · {} per page · {}",
        state.page + 1,
        state.total_pages,
        state.total,
        state.limit,
        state.sort
    )
}

fn joined(values: &[String]) -> Option<String> {
    let parts: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}
