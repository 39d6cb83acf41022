//! Product title extraction

use scraper::Html;

use crate::chain::{element_text, FallbackChain};
use crate::config::SelectorConfig;
use crate::error::Result;

pub struct NameExtractor {
    chain: FallbackChain<String>,
}

impl NameExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            chain: FallbackChain::from_selectors("product_name", &selectors.title, |el| {
                let text = element_text(el);
                (!text.is_empty()).then_some(text)
            })?,
        })
    }

    pub fn extract(&self, document: &Html) -> Option<String> {
        self.chain.resolve(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let html = Html::parse_document(
            r#"<h1><span id="productTitle">
                Sony Bravia 139 cm (55 inches) 4K Ultra HD Smart LED Google TV
            </span></h1>"#,
        );
        let extractor = NameExtractor::new(&SelectorConfig::default()).unwrap();
        assert_eq!(
            extractor.extract(&html).as_deref(),
            Some("Sony Bravia 139 cm (55 inches) 4K Ultra HD Smart LED Google TV")
        );
    }

    #[test]
    fn test_missing_or_blank_title() {
        let extractor = NameExtractor::new(&SelectorConfig::default()).unwrap();
        assert_eq!(extractor.extract(&Html::parse_document("<p>no title</p>")), None);
        assert_eq!(
            extractor.extract(&Html::parse_document(r#"<span id="productTitle">  </span>"#)),
            None
        );
    }
}
