// src/fetch.rs
//! Filtered pagination loop: keep fetching pages and filtering them until
//! the target count is reached or a budget runs out. Page failures are not
//! caught here; any error aborts the whole run and propagates.

use std::collections::HashSet;

use metrics::counter;
use tracing::info;

use crate::config::{DEFAULT_MAX_PAGES, DEFAULT_TARGET_ITEMS};
use crate::error::ServeError;
use crate::filter::{apply_filters, FilterRule};
use crate::pagination::PaginationCursor;
use crate::registry::SourceRegistry;
use crate::types::{ContentItem, ItemId};

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Maximum items returned to the caller per request.
    pub target_items: usize,
    /// Maximum upstream page fetches per filtered pagination run.
    pub max_pages: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            target_items: DEFAULT_TARGET_ITEMS,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[derive(Debug)]
pub struct FilteredFetch {
    pub items: Vec<ContentItem>,
    /// True whenever the paginated path actually ran, even if it stopped
    /// after one page. The orchestrator must not cache such results.
    pub from_pagination: bool,
}

/// Fetch items for `id` with filtering, paginating as needed to reach the
/// target count.
///
/// Without active rules, or for sources without true pagination support,
/// this is a single fetch with post-hoc filtering and truncation.
pub async fn fetch_with_filter(
    registry: &SourceRegistry,
    id: &str,
    rules: &[FilterRule],
    limits: &FetchLimits,
) -> Result<FilteredFetch, ServeError> {
    let Some(getter) = registry.paginated_getter(id) else {
        return Err(ServeError::NoGetter(id.to_string()));
    };

    if rules.is_empty() || !registry.supports_pagination(id) {
        let page = getter
            .fetch_page(None)
            .await
            .map_err(|e| ServeError::upstream(id, e))?;
        let mut items = if rules.is_empty() {
            page.items
        } else {
            apply_filters(&page.items, rules)
        };
        items.truncate(limits.target_items);
        return Ok(FilteredFetch {
            items,
            from_pagination: false,
        });
    }

    let mut collected: Vec<ContentItem> = Vec::new();
    let mut seen: HashSet<ItemId> = HashSet::new();
    let mut cursor: Option<PaginationCursor> = None;
    let mut page_count = 0usize;

    while collected.len() < limits.target_items && page_count < limits.max_pages {
        let page = getter
            .fetch_page(cursor.as_ref())
            .await
            .map_err(|e| ServeError::upstream(id, e))?;
        page_count += 1;
        counter!("fetch_pages_total").increment(1);

        let filtered = apply_filters(&page.items, rules);
        for item in filtered {
            if seen.insert(item.id.clone()) {
                collected.push(item);
                if collected.len() >= limits.target_items {
                    break;
                }
            }
        }

        if !page.has_more {
            break;
        }
        match page.advance() {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    info!(
        id,
        pages = page_count,
        items = collected.len(),
        "filtered paginated fetch"
    );
    Ok(FilteredFetch {
        items: collected,
        from_pagination: true,
    })
}
