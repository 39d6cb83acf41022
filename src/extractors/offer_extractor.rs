//! Bank offer collection
//!
//! Two phases. The side panel, opened by a click in the live browser, is
//! read from the refreshed page. Only when that yields nothing is the
//! original page's main content scanned for offer-looking text.

use std::collections::HashSet;
use std::time::Duration;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use crate::chain::{compile, compile_one, element_text, first_match, own_text, FallbackChain, Scope};
use crate::config::{BankPattern, OfferConfig};
use crate::error::Result;
use crate::offer_parser::OfferParser;
use crate::record::{BankOffer, OfferSource};
use crate::snapshot::{MarkupSnapshot, SnapshotProvider};

pub struct OfferExtractor {
    parser: OfferParser,
    reveal_locator: String,
    reveal_keywords: Vec<String>,
    side_panel: Vec<Selector>,
    panel_items: FallbackChain<String>,
    main_content: Vec<Selector>,
    fallback_elements: Selector,
    min_text_len: usize,
}

impl OfferExtractor {
    pub fn new(offers: &OfferConfig, banks: &[BankPattern]) -> Result<Self> {
        let min_text_len = offers.min_text_len;

        Ok(Self {
            parser: OfferParser::new(banks)?,
            reveal_locator: offers.reveal_locator.clone(),
            reveal_keywords: offers.reveal_keywords.clone(),
            side_panel: compile("bank_offers", &offers.side_panel)?,
            panel_items: FallbackChain::from_selectors("bank_offers", &offers.panel_items, move |el| {
                let text = element_text(el);
                long_enough(&text, min_text_len).then_some(text)
            })?,
            main_content: compile("bank_offers", &offers.main_content)?,
            fallback_elements: compile_one("bank_offers", &offers.fallback_elements)?,
            min_text_len,
        })
    }

    /// Full two-phase extraction. `provider` is the live page, if any.
    pub fn extract(
        &self,
        original: &MarkupSnapshot,
        provider: Option<&dyn SnapshotProvider>,
        settle: Duration,
    ) -> Vec<BankOffer> {
        if let Some(revealed) = provider.and_then(|p| self.reveal(p, settle)) {
            let offers = self.from_side_panel(&revealed.document());
            if !offers.is_empty() {
                debug!(count = offers.len(), "bank offers from side panel");
                return offers;
            }
        }

        let offers = self.from_main_page(&original.document());
        if offers.is_empty() {
            debug!("no bank offers found");
        } else {
            debug!(count = offers.len(), "bank offers from main page");
        }
        offers
    }

    /// Ask the browser to open the offers panel and hand back the refreshed page.
    fn reveal(&self, provider: &dyn SnapshotProvider, settle: Duration) -> Option<MarkupSnapshot> {
        match provider.reveal(&self.reveal_locator, &self.reveal_keywords) {
            Ok(true) => debug!(locator = %self.reveal_locator, "offers panel revealed"),
            Ok(false) => debug!(locator = %self.reveal_locator, "no offer card to click"),
            Err(e) => {
                warn!(error = %e, "offers reveal failed, using main page only");
                return None;
            }
        }

        match provider.refresh(settle) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "could not refresh page after reveal, using main page only");
                None
            }
        }
    }

    /// Phase 1: offer items inside the side panel.
    pub fn from_side_panel(&self, document: &Html) -> Vec<BankOffer> {
        let Some(panel) = first_match(document, &self.side_panel) else {
            return Vec::new();
        };

        let texts = self.panel_items.resolve_all(&panel);
        self.parse_unique(texts, OfferSource::SidePanel)
    }

    /// Phase 2: elements of the main content whose own text reads like an offer.
    pub fn from_main_page(&self, document: &Html) -> Vec<BankOffer> {
        let texts: Vec<String> = match first_match(document, &self.main_content) {
            Some(scope) => self.scan(&scope),
            None => self.scan(document),
        };
        self.parse_unique(texts, OfferSource::MainPage)
    }

    fn scan<S: Scope + ?Sized>(&self, scope: &S) -> Vec<String> {
        scope
            .all(&self.fallback_elements)
            .into_iter()
            .filter(|el| self.parser.looks_like_offer(&own_text(*el)))
            .map(element_text)
            // bare card headings like "Bank Offer" sit exactly at the limit
            .filter(|text| text.chars().count() > self.min_text_len)
            .collect()
    }

    fn parse_unique(&self, texts: Vec<String>, source: OfferSource) -> Vec<BankOffer> {
        let mut seen = HashSet::new();
        texts
            .into_iter()
            .filter(|text| seen.insert(text.clone()))
            .filter_map(|text| self.parser.parse(&text, source))
            .collect()
    }
}

fn long_enough(text: &str, min_len: usize) -> bool {
    !text.is_empty() && text.chars().count() >= min_len
}
