//! "About this item" bullet extraction

use scraper::Html;

use crate::chain::{element_text, FallbackChain};
use crate::config::SelectorConfig;
use crate::error::Result;

pub struct FeatureExtractor {
    bullets: FallbackChain<String>,
}

impl FeatureExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        Ok(Self {
            bullets: FallbackChain::from_selectors(
                "about_this_item",
                &selectors.feature_bullets,
                |el| {
                    let text = element_text(el);
                    (!text.is_empty()).then_some(text)
                },
            )?,
        })
    }

    /// Bullet texts in page order; empty when the section is missing.
    pub fn extract(&self, document: &Html) -> Vec<String> {
        self.bullets.resolve_all(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullets() {
        let html = Html::parse_document(
            r#"
            <div id="feature-bullets"><ul>
                <li><span class="a-list-item"> Resolution: 4K Ultra HD (3840 x 2160) </span></li>
                <li><span class="a-list-item">Smart TV features: Google TV, Google Assistant, Chromecast</span></li>
                <li><span class="a-list-item">   </span></li>
            </ul></div>
            <span class="a-list-item">Outside the section</span>
            "#,
        );
        let bullets = FeatureExtractor::new(&SelectorConfig::default())
            .unwrap()
            .extract(&html);
        assert_eq!(
            bullets,
            vec![
                "Resolution: 4K Ultra HD (3840 x 2160)",
                "Smart TV features: Google TV, Google Assistant, Chromecast",
            ]
        );
    }

    #[test]
    fn test_missing_section_is_empty() {
        let bullets = FeatureExtractor::new(&SelectorConfig::default())
            .unwrap()
            .extract(&Html::parse_document("<div></div>"));
        assert!(bullets.is_empty());
    }
}
