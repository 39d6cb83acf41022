//! Field extractors
//!
//! One module per product attribute family. Every extractor compiles its
//! selectors once, then reads a parsed document without side effects.

mod feature_extractor;
mod image_extractor;
mod name_extractor;
mod offer_extractor;
mod price_extractor;
mod rating_extractor;
mod spec_table_extractor;

pub use feature_extractor::*;
pub use image_extractor::*;
pub use name_extractor::*;
pub use offer_extractor::*;
pub use price_extractor::*;
pub use rating_extractor::*;
pub use spec_table_extractor::*;

use crate::config::ExtractorConfig;
use crate::error::Result;

/// Every field extractor, built from one configuration.
pub struct FieldExtractors {
    pub name: NameExtractor,
    pub rating: RatingExtractor,
    pub price: PriceExtractor,
    pub features: FeatureExtractor,
    pub spec_table: SpecTableExtractor,
    pub images: ImageExtractor,
    pub manufacturer_images: ManufacturerImageExtractor,
    pub offers: OfferExtractor,
}

impl FieldExtractors {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let selectors = &config.selectors;
        Ok(Self {
            name: NameExtractor::new(selectors)?,
            rating: RatingExtractor::new(selectors)?,
            price: PriceExtractor::new(selectors)?,
            features: FeatureExtractor::new(selectors)?,
            spec_table: SpecTableExtractor::new(selectors)?,
            images: ImageExtractor::new(selectors, &config.images)?,
            manufacturer_images: ManufacturerImageExtractor::new(selectors, &config.images)?,
            offers: OfferExtractor::new(&config.offers, &config.banks)?,
        })
    }
}
