// src/registry.rs
//! Explicit source registry, constructed at startup and injected into the
//! orchestrator. Maps a source id to its getters and refresh interval and
//! resolves alias redirects (single hop).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::config::SourceOverrides;
use crate::error::ServeError;
use crate::pagination::{NonPaginated, PaginatedSourceGetter, SourceGetter};

#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub id: String,
    pub refresh_interval_ms: i64,
    pub redirects_to: Option<String>,
    pub supports_pagination: bool,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<String>, refresh_interval_ms: i64) -> Self {
        Self {
            id: id.into(),
            refresh_interval_ms,
            redirects_to: None,
            supports_pagination: false,
        }
    }
}

struct SourceEntry {
    descriptor: SourceDescriptor,
    getter: Option<Arc<dyn SourceGetter>>,
    paginated: Option<Arc<dyn PaginatedSourceGetter>>,
}

#[derive(Default)]
pub struct SourceRegistry {
    entries: HashMap<String, SourceEntry>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source with its plain getter. Every servable source needs
    /// one; pagination support is an optional extra.
    pub fn register(&mut self, descriptor: SourceDescriptor, getter: Arc<dyn SourceGetter>) {
        let id = descriptor.id.clone();
        self.entries.insert(
            id,
            SourceEntry {
                descriptor,
                getter: Some(getter),
                paginated: None,
            },
        );
    }

    /// Attach a true paginated getter to an already registered source.
    pub fn register_paginated(&mut self, id: &str, getter: Arc<dyn PaginatedSourceGetter>) {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.descriptor.supports_pagination = true;
                entry.paginated = Some(getter);
            }
            None => warn!(id, "register_paginated for unknown source"),
        }
    }

    /// Register an alias id that redirects to `target`. Resolution is a
    /// single hop; the target must itself be a servable source.
    pub fn register_alias(&mut self, alias: &str, target: &str) {
        if self
            .entries
            .get(alias)
            .is_some_and(|e| e.getter.is_some())
        {
            warn!(alias, "alias would shadow a registered source, skipping");
            return;
        }
        let mut descriptor = SourceDescriptor::new(alias, 0);
        descriptor.redirects_to = Some(target.to_string());
        self.entries.insert(
            alias.to_string(),
            SourceEntry {
                descriptor,
                getter: None,
                paginated: None,
            },
        );
    }

    /// Apply per-source interval overrides and alias declarations from
    /// configuration.
    pub fn apply_overrides(&mut self, overrides: &SourceOverrides) {
        for (id, interval_ms) in &overrides.intervals {
            match self.entries.get_mut(id) {
                Some(entry) => entry.descriptor.refresh_interval_ms = *interval_ms,
                None => warn!(%id, "interval override for unknown source"),
            }
        }
        let aliases: Vec<(String, String)> = overrides
            .aliases
            .iter()
            .map(|(a, t)| (a.clone(), t.clone()))
            .collect();
        for (alias, target) in aliases {
            self.register_alias(&alias, &target);
        }
    }

    fn servable(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.getter.is_some())
    }

    /// Resolve a requested id to a servable canonical id, following at most
    /// one `redirects_to` hop.
    pub fn resolve(&self, id: &str) -> Result<String, ServeError> {
        if self.servable(id) {
            return Ok(id.to_string());
        }
        if let Some(target) = self
            .entries
            .get(id)
            .and_then(|e| e.descriptor.redirects_to.as_deref())
        {
            if self.servable(target) {
                return Ok(target.to_string());
            }
        }
        Err(ServeError::InvalidSource(id.to_string()))
    }

    pub fn descriptor(&self, id: &str) -> Option<&SourceDescriptor> {
        self.entries.get(id).map(|e| &e.descriptor)
    }

    pub fn refresh_interval_ms(&self, id: &str) -> Option<i64> {
        self.descriptor(id).map(|d| d.refresh_interval_ms)
    }

    /// True only when the source registered a real paginated getter; the
    /// `NonPaginated` wrapper does not count.
    pub fn supports_pagination(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.paginated.is_some())
    }

    pub fn plain_getter(&self, id: &str) -> Option<Arc<dyn SourceGetter>> {
        self.entries.get(id).and_then(|e| e.getter.clone())
    }

    /// Paginated getter for a source, falling back to wrapping the plain
    /// getter when no true paginated version exists.
    pub fn paginated_getter(&self, id: &str) -> Option<Arc<dyn PaginatedSourceGetter>> {
        let entry = self.entries.get(id)?;
        if let Some(paginated) = &entry.paginated {
            return Some(paginated.clone());
        }
        entry
            .getter
            .clone()
            .map(|g| Arc::new(NonPaginated::new(g)) as Arc<dyn PaginatedSourceGetter>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{PaginatedPage, PaginationCursor};
    use crate::types::ContentItem;
    use anyhow::Result;
    use async_trait::async_trait;

    struct StubGetter;

    #[async_trait]
    impl SourceGetter for StubGetter {
        async fn fetch(&self) -> Result<Vec<ContentItem>> {
            Ok(vec![ContentItem::new("a", "title", "https://example.com")])
        }
    }

    struct StubPaginated;

    #[async_trait]
    impl PaginatedSourceGetter for StubPaginated {
        async fn fetch_page(&self, _cursor: Option<&PaginationCursor>) -> Result<PaginatedPage> {
            Ok(PaginatedPage::single(vec![]))
        }
    }

    fn registry_with(id: &str) -> SourceRegistry {
        let mut reg = SourceRegistry::new();
        reg.register(SourceDescriptor::new(id, 300_000), Arc::new(StubGetter));
        reg
    }

    #[test]
    fn resolve_known_source() {
        let reg = registry_with("hackernews");
        assert_eq!(reg.resolve("hackernews").unwrap(), "hackernews");
    }

    #[test]
    fn resolve_unknown_source_fails() {
        let reg = registry_with("hackernews");
        let err = reg.resolve("doesnotexist").unwrap_err();
        assert!(matches!(err, ServeError::InvalidSource(_)));
    }

    #[test]
    fn alias_resolves_one_hop_only() {
        let mut reg = registry_with("hackernews");
        reg.register_alias("hn", "hackernews");
        reg.register_alias("news", "hn");

        assert_eq!(reg.resolve("hn").unwrap(), "hackernews");
        // Second hop is not followed: "news" -> "hn" which has no getter.
        assert!(reg.resolve("news").is_err());
    }

    #[test]
    fn alias_cannot_shadow_registered_source() {
        let mut reg = registry_with("hackernews");
        reg.register(
            SourceDescriptor::new("reddit", 300_000),
            Arc::new(StubGetter),
        );
        reg.register_alias("reddit", "hackernews");
        assert_eq!(reg.resolve("reddit").unwrap(), "reddit");
    }

    #[test]
    fn pagination_support_requires_true_paginated_getter() {
        let mut reg = registry_with("reddit");
        assert!(!reg.supports_pagination("reddit"));
        // Wrapped fallback still exists for uniform access.
        assert!(reg.paginated_getter("reddit").is_some());

        reg.register_paginated("reddit", Arc::new(StubPaginated));
        assert!(reg.supports_pagination("reddit"));
        assert!(reg.descriptor("reddit").unwrap().supports_pagination);
    }

    #[test]
    fn interval_overrides_apply() {
        let mut reg = registry_with("reddit");
        let mut overrides = SourceOverrides::default();
        overrides.intervals.insert("reddit".into(), 60_000);
        overrides
            .aliases
            .insert("popular".into(), "reddit".into());
        reg.apply_overrides(&overrides);

        assert_eq!(reg.refresh_interval_ms("reddit"), Some(60_000));
        assert_eq!(reg.resolve("popular").unwrap(), "reddit");
    }
}
