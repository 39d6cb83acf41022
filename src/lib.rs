//! Product page parser
//!
//! Turns the rendered HTML of a product page into one structured record:
//! - name, rating and rating count
//! - selling price, MRP and derived discount
//! - bank offers (side panel first, main page as fallback)
//! - feature bullets and the technical details table
//! - product and manufacturer images
//! - a rule-based review summary
//!
//! Field extractors run in parallel against an immutable snapshot and fail
//! independently. An FFI entry point and a CLI sit on top of the library.

pub mod chain;
pub mod config;
pub mod error;
pub mod extractors;
pub mod fetch;
pub mod ffi;
pub mod normalize;
pub mod offer_parser;
pub mod pipeline;
pub mod record;
pub mod snapshot;
pub mod summary;

pub use config::ExtractorConfig;
pub use error::{ExtractError, Result};
pub use fetch::{validate_product_url, PageFetcher};
pub use ffi::*;
pub use pipeline::ProductExtractor;
pub use record::{BankOffer, OfferSource, PriceInfo, ProductRecord};
pub use snapshot::{MarkupSnapshot, SnapshotProvider, StaticSnapshotProvider};
pub use summary::SummarySynthesizer;
