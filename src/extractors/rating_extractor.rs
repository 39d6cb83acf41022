//! Star rating and rating count extraction
//!
//! The two halves come from independent elements and fail independently.

use scraper::Html;

use crate::chain::{element_text, FallbackChain};
use crate::config::SelectorConfig;
use crate::error::Result;
use crate::normalize::text_before;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingInfo {
    pub rating: Option<String>,
    pub number_of_ratings: Option<String>,
}

pub struct RatingExtractor {
    rating: FallbackChain<String>,
    count: FallbackChain<String>,
}

impl RatingExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        let rating_delimiter = selectors.rating_delimiter.clone();
        let count_delimiter = selectors.rating_count_delimiter.clone();

        Ok(Self {
            rating: FallbackChain::from_selectors("rating", &selectors.rating, move |el| {
                text_before(&element_text(el), &rating_delimiter)
            })?,
            count: FallbackChain::from_selectors(
                "number_of_ratings",
                &selectors.rating_count,
                move |el| text_before(&element_text(el), &count_delimiter),
            )?,
        })
    }

    pub fn extract(&self, document: &Html) -> RatingInfo {
        RatingInfo {
            rating: self.rating.resolve(document),
            number_of_ratings: self.count.resolve(document),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> RatingExtractor {
        RatingExtractor::new(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_rating_and_count() {
        let html = Html::parse_document(
            r#"
            <i class="a-icon a-icon-star"><span class="a-icon-alt">4.3 out of 5 stars</span></i>
            <span id="acrCustomerReviewText" class="a-size-base">2,417 ratings</span>
            "#,
        );
        let info = extractor().extract(&html);
        assert_eq!(info.rating.as_deref(), Some("4.3"));
        assert_eq!(info.number_of_ratings.as_deref(), Some("2,417"));
    }

    #[test]
    fn test_halves_fail_independently() {
        let html = Html::parse_document(
            r#"<span id="acrCustomerReviewText">87 ratings</span>"#,
        );
        let info = extractor().extract(&html);
        assert_eq!(info.rating, None);
        assert_eq!(info.number_of_ratings.as_deref(), Some("87"));
    }
}
