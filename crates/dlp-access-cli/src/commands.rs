//! One-shot command implementations.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;

use dlp_access::{
    ContentRegistry, ContentSlot, FacetLinkRewriter, ListingController, ListingSource,
    RouteParam, SortOption,
};

use crate::portal::Portal;
use crate::render;

/// Print a value as pretty JSON.
fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Load the 1-based `page` at `sort` and `limit`. Offset-paged listings
/// fetch the page directly; token-paged ones walk forward from the first
/// page. Past the end, the last page is shown. Returns the 0-based page
/// reached.
pub async fn open_page<S: ListingSource>(
    pager: &mut ListingController<S>,
    sort: SortOption,
    limit: u32,
    page: u32,
) -> anyhow::Result<u32> {
    pager.set_sort(sort)?;
    let first = pager.set_page_size(limit)?;
    let wanted = page.saturating_sub(1);

    if S::NEEDS_TOKENS || wanted == 0 {
        pager.load(first).await;
        while pager.state().page < wanted {
            let ticket = pager.next_page();
            if !pager.load_if(ticket).await {
                break;
            }
        }
    } else {
        let ticket = pager.jump_to(wanted)?;
        pager.load(ticket).await;
        if pager.state().page < wanted && pager.state().total_pages > 0 {
            pager.refresh().await;
        }
    }
    Ok(pager.state().page)
}

pub async fn site(portal: &Portal, json: bool) -> anyhow::Result<()> {
    let site = portal.gateway().get_site_config().await;
    if json {
        return print_json(&site);
    }
    print!("{}", render::site_summary(portal.site(), site.as_ref()));
    Ok(())
}

pub async fn browse(
    portal: &Portal,
    sort: SortOption,
    limit: u32,
    page: u32,
    json: bool,
) -> anyhow::Result<()> {
    let mut pager = portal.top_level();
    open_page(&mut pager, sort, limit, page).await?;
    let items = pager.items().unwrap_or_default();

    if json {
        return print_json(items);
    }
    for collection in items {
        println!("{}", render::collection_line(collection));
    }
    println!();
    println!("{}", render::page_footer(pager.state()));
    Ok(())
}

pub async fn collection(
    portal: &Portal,
    key: &str,
    sort: SortOption,
    limit: u32,
    page: u32,
    json: bool,
) -> anyhow::Result<()> {
    let gateway = portal.gateway();
    let Some(collection) = gateway.get_collection_by_key(&RouteParam::from(key)).await else {
        bail!("Collection '{key}' not found");
    };
    let top_level = gateway.get_top_level_ancestor(collection.clone()).await;

    let mut pager = portal.collection_items(&collection.id);
    open_page(&mut pager, sort, limit, page).await?;
    let items = pager.items().unwrap_or_default();

    if json {
        return print_json(&serde_json::json!({
            "collection": collection,
            "top_level": top_level,
            "items": items,
            "page": pager.state().page + 1,
            "total_pages": pager.state().total_pages,
            "total": pager.state().total,
        }));
    }

    print!("{}", render::collection_detail(&collection, Some(&top_level)));
    println!();
    for archive in items {
        println!("  {}", render::archive_line(archive));
    }
    println!();
    println!("{}", render::page_footer(pager.state()));
    Ok(())
}

pub async fn archive(portal: &Portal, key: &str, json: bool) -> anyhow::Result<()> {
    let Some(archive) = portal
        .gateway()
        .get_archive_by_key(&RouteParam::from(key))
        .await
    else {
        bail!("Item '{key}' not found");
    };
    if json {
        return print_json(&archive);
    }
    print!("{}", render::archive_detail(&archive));
    Ok(())
}

/// What the `page` command shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTarget {
    Section(ContentSlot),
    Id(String),
}

pub async fn page(portal: &Portal, target: PageTarget) -> anyhow::Result<()> {
    let content = portal.content();
    let html = match &target {
        PageTarget::Section(slot) => content.section(*slot).await,
        PageTarget::Id(id) => content.by_id(id).await,
    };
    match html {
        Some(html) => println!("{html}"),
        None => match target {
            PageTarget::Section(slot) => eprintln!("No content for {} ({})", slot.title(), slot.route()),
            PageTarget::Id(id) => eprintln!("No content for '{id}'"),
        },
    }
    Ok(())
}

/// List the page sections and the content ids they resolve to.
pub fn sections(registry: &ContentRegistry) {
    for slot in ContentSlot::ALL {
        println!(
            "{:<28} {:<36} {}",
            slot.name(),
            registry.id(slot),
            slot.route()
        );
    }
}

/// Read HTML from `file`, or stdin when `None`.
pub fn read_html(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("Cannot read stdin"),
    }
}

/// Show facet links for an HTML list, or print the rewritten HTML.
pub fn facets(
    rewriter: &FacetLinkRewriter,
    html: &str,
    facet: &str,
    rewrite: bool,
    json: bool,
) -> anyhow::Result<()> {
    if rewrite {
        println!("{}", rewriter.rewrite(html, facet));
        return Ok(());
    }

    let links = rewriter.facet_links(html, facet);
    if json {
        return print_json(&links);
    }
    for link in links {
        println!("{:<24} {}", link.label, link.href);
    }
    Ok(())
}
