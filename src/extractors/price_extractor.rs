//! Selling price, MRP and discount extraction

use scraper::{ElementRef, Html, Selector};

use crate::chain::{compile_one, element_text, FallbackChain};
use crate::config::SelectorConfig;
use crate::error::Result;
use crate::normalize::parse_decimal;
use crate::record::PriceInfo;

pub struct PriceExtractor {
    selling: FallbackChain<f64>,
    mrp: FallbackChain<f64>,
}

impl PriceExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        let inner = compile_one("mrp", "span")?;

        Ok(Self {
            selling: FallbackChain::from_selectors("selling_price", &selectors.selling_price, |el| {
                parse_decimal(&element_text(el))
            })?,
            mrp: FallbackChain::from_selectors("mrp", &selectors.mrp, move |el| {
                strike_price(el, &inner).filter(|v| *v > 0.0)
            })?,
        })
    }

    pub fn extract(&self, document: &Html) -> PriceInfo {
        PriceInfo::new(self.selling.resolve(document), self.mrp.resolve(document))
    }
}

/// Strikethrough blocks usually wrap the amount in a nested span; fall back
/// to the block's own text when they don't.
fn strike_price(element: ElementRef<'_>, inner: &Selector) -> Option<f64> {
    let text = match element.select(inner).next() {
        Some(span) => element_text(span),
        None => element_text(element),
    };
    parse_decimal(&text)
}
