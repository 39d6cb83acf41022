//! Page markup snapshots and the browser capability the pipeline consumes
//!
//! A snapshot is the rendered markup of the product page at one moment. It
//! is cheap to clone and safe to hand to any worker thread; each worker
//! parses its own `scraper::Html` from it because a parsed document cannot
//! be shared between threads.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use url::Url;

use crate::error::{ExtractError, Result};

#[derive(Debug, Clone)]
pub struct MarkupSnapshot {
    markup: Arc<str>,
    base_url: Option<Url>,
}

impl MarkupSnapshot {
    /// Wrap rendered markup. Blank markup means the page never produced
    /// anything to extract from.
    pub fn new(markup: impl Into<String>) -> Result<Self> {
        let markup: String = markup.into();
        if markup.trim().is_empty() {
            return Err(ExtractError::unavailable("page markup is empty"));
        }
        Ok(Self {
            markup: Arc::from(markup),
            base_url: None,
        })
    }

    /// Base used to resolve relative image URLs.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn document(&self) -> Html {
        Html::parse_document(&self.markup)
    }
}

/// What the extraction needs from a live browser session.
///
/// Implementations wrap whatever automation drives the page. The pipeline
/// never depends on a concrete browser, and works without one: when no
/// provider is given, offers come from the main-page fallback only.
pub trait SnapshotProvider: Send + Sync {
    /// Markup of the page as currently rendered.
    fn snapshot(&self) -> Result<MarkupSnapshot>;

    /// Click the first element matched by `locator` whose visible text
    /// contains any of `keywords`. `Ok(false)` when nothing matched.
    fn reveal(&self, locator: &str, keywords: &[String]) -> Result<bool>;

    /// Wait for `settle`, then return the refreshed markup.
    fn refresh(&self, settle: Duration) -> Result<MarkupSnapshot>;
}

/// Provider backed by markup captured ahead of time.
///
/// `revealed` plays the role of the page after the offers panel was opened.
/// No waiting happens; the settle delay only matters for live pages.
#[derive(Debug, Clone, Default)]
pub struct StaticSnapshotProvider {
    initial: Option<String>,
    revealed: Option<String>,
    base_url: Option<Url>,
}

impl StaticSnapshotProvider {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            initial: Some(initial.into()),
            ..Self::default()
        }
    }

    pub fn with_revealed(mut self, revealed: impl Into<String>) -> Self {
        self.revealed = Some(revealed.into());
        self
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    fn wrap(&self, markup: &str) -> Result<MarkupSnapshot> {
        let snapshot = MarkupSnapshot::new(markup)?;
        Ok(match &self.base_url {
            Some(base) => snapshot.with_base_url(base.clone()),
            None => snapshot,
        })
    }
}

impl SnapshotProvider for StaticSnapshotProvider {
    fn snapshot(&self) -> Result<MarkupSnapshot> {
        match &self.initial {
            Some(markup) => self.wrap(markup),
            None => Err(ExtractError::unavailable("no page markup captured")),
        }
    }

    fn reveal(&self, _locator: &str, _keywords: &[String]) -> Result<bool> {
        Ok(self.revealed.is_some())
    }

    fn refresh(&self, _settle: Duration) -> Result<MarkupSnapshot> {
        match self.revealed.as_deref().or(self.initial.as_deref()) {
            Some(markup) => self.wrap(markup),
            None => Err(ExtractError::unavailable("no page markup captured")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_markup_is_unavailable() {
        let err = MarkupSnapshot::new("  \n ").unwrap_err();
        assert!(matches!(err, ExtractError::SnapshotUnavailable(_)));
    }

    #[test]
    fn test_snapshot_parses_per_call() {
        let snapshot = MarkupSnapshot::new("<p id='x'>hi</p>").unwrap();
        let copy = snapshot.clone();
        let sel = scraper::Selector::parse("#x").unwrap();
        assert_eq!(snapshot.document().select(&sel).count(), 1);
        assert_eq!(copy.document().select(&sel).count(), 1);
        assert!(snapshot.base_url().is_none());
    }

    #[test]
    fn test_static_provider() {
        let provider = StaticSnapshotProvider::new("<p>page</p>").with_revealed("<p>panel</p>");
        assert!(provider.reveal(".a-carousel-card", &[]).unwrap());
        assert!(provider.refresh(Duration::from_secs(2)).unwrap().markup().contains("panel"));
        assert!(provider.snapshot().unwrap().markup().contains("page"));

        let plain = StaticSnapshotProvider::new("<p>page</p>");
        assert!(!plain.reveal(".a-carousel-card", &[]).unwrap());

        let nothing = StaticSnapshotProvider::default();
        assert!(nothing.snapshot().is_err());
    }
}
