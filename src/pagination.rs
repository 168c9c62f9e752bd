// src/pagination.rs
//! Getter contracts and the pagination model. Upstreams paginate by page
//! number, offset, or opaque cursor; whichever field the last response
//! provided drives the next request. `NonPaginated` wraps a plain getter so
//! every source presents the same paginated interface.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::types::ContentItem;

/// Single-shot source getter: one call, one item list.
#[async_trait]
pub trait SourceGetter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ContentItem>>;
}

/// Continuation token for the next page. Absence signals end of pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationCursor {
    Page(u32),
    Offset(u32),
    Cursor(String),
}

#[derive(Debug, Clone, Default)]
pub struct PaginatedPage {
    pub items: Vec<ContentItem>,
    pub has_more: bool,
    pub next_page: Option<u32>,
    pub next_offset: Option<u32>,
    pub next_cursor: Option<String>,
}

impl PaginatedPage {
    /// One page holding everything, nothing after it.
    pub fn single(items: Vec<ContentItem>) -> Self {
        Self {
            items,
            has_more: false,
            ..Default::default()
        }
    }

    /// Cursor for the next request. Precedence: page, then offset, then
    /// opaque cursor.
    pub fn advance(&self) -> Option<PaginationCursor> {
        if let Some(page) = self.next_page {
            Some(PaginationCursor::Page(page))
        } else if let Some(offset) = self.next_offset {
            Some(PaginationCursor::Offset(offset))
        } else {
            self.next_cursor.clone().map(PaginationCursor::Cursor)
        }
    }
}

/// Paginated source getter. `cursor = None` requests the first page.
#[async_trait]
pub trait PaginatedSourceGetter: Send + Sync {
    async fn fetch_page(&self, cursor: Option<&PaginationCursor>) -> Result<PaginatedPage>;
}

/// Adapter presenting a plain getter as a one-page paginated getter. The
/// cursor argument is ignored; the single page reports `has_more = false`
/// and no continuation fields.
pub struct NonPaginated {
    inner: Arc<dyn SourceGetter>,
}

impl NonPaginated {
    pub fn new(inner: Arc<dyn SourceGetter>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl PaginatedSourceGetter for NonPaginated {
    async fn fetch_page(&self, _cursor: Option<&PaginationCursor>) -> Result<PaginatedPage> {
        let items = self.inner.fetch().await?;
        Ok(PaginatedPage::single(items))
    }
}
