//! The structured product record and its parts
//!
//! Every field is independently optional. List and map fields default to
//! empty, which is a valid outcome on its own. Serialized field names are
//! the JSON contract callers rely on.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::normalize::round2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_name: Option<String>,
    pub rating: Option<String>,
    pub number_of_ratings: Option<String>,
    pub selling_price: Option<f64>,
    pub mrp: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub bank_offers: Vec<BankOffer>,
    pub about_this_item: Vec<String>,
    pub product_information: BTreeMap<String, String>,
    pub product_images: Vec<String>,
    pub manufacturer_images: Vec<String>,
    pub ai_review_summary: Option<String>,
}

impl ProductRecord {
    pub fn set_price(&mut self, price: PriceInfo) {
        self.selling_price = price.selling_price;
        self.mrp = price.mrp;
        self.discount_percentage = price.discount_percent;
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the record as pretty JSON. Non-ASCII text is kept as is.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceInfo {
    pub selling_price: Option<f64>,
    pub mrp: Option<f64>,
    pub discount_percent: Option<f64>,
}

impl PriceInfo {
    /// Build from the two observed prices, deriving the discount.
    pub fn new(selling_price: Option<f64>, mrp: Option<f64>) -> Self {
        Self {
            selling_price,
            mrp,
            discount_percent: discount_percent(selling_price, mrp),
        }
    }
}

/// (mrp - selling) / mrp * 100 rounded to 2 dp, only when selling < mrp.
///
/// A positive selling price never reads as a 100% discount, even when
/// rounding would get there.
pub fn discount_percent(selling_price: Option<f64>, mrp: Option<f64>) -> Option<f64> {
    let (selling, mrp) = (selling_price?, mrp?);
    if selling <= 0.0 || mrp <= 0.0 || selling >= mrp {
        return None;
    }
    Some(round2((mrp - selling) / mrp * 100.0).min(MAX_DISCOUNT))
}

const MAX_DISCOUNT: f64 = 99.99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSource {
    SidePanel,
    MainPage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankOffer {
    #[serde(rename = "offer_text")]
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_purchase: Option<f64>,
    pub emi_available: bool,
    #[serde(
        rename = "emi_duration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub emi_duration_months: Option<u32>,
    /// Only main-page offers carry a source tag.
    #[serde(default = "side_panel", skip_serializing_if = "is_side_panel")]
    pub source: OfferSource,
}

fn side_panel() -> OfferSource {
    OfferSource::SidePanel
}

fn is_side_panel(source: &OfferSource) -> bool {
    *source == OfferSource::SidePanel
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_requires_both_prices() {
        assert_eq!(discount_percent(Some(100.0), None), None);
        assert_eq!(discount_percent(None, Some(100.0)), None);
        assert_eq!(discount_percent(None, None), None);
    }

    #[test]
    fn test_no_discount_when_not_cheaper() {
        assert_eq!(discount_percent(Some(100.0), Some(100.0)), None);
        assert_eq!(discount_percent(Some(120.0), Some(100.0)), None);
    }

    #[test]
    fn test_discount_rounding() {
        assert_eq!(discount_percent(Some(45999.0), Some(69900.0)), Some(34.19));
        assert_eq!(discount_percent(Some(2.0), Some(3.0)), Some(33.33));

        for (selling, mrp) in [(1.0, 1000000.0), (999.99, 1000.0), (10.0, 11.0)] {
            let d = discount_percent(Some(selling), Some(mrp)).unwrap();
            assert!((0.0..100.0).contains(&d), "{d} out of range");
        }
    }

    #[test]
    fn test_record_json_field_names() {
        let mut record = ProductRecord::default();
        record.set_price(PriceInfo::new(Some(90.0), Some(100.0)));
        record.bank_offers.push(BankOffer {
            raw_text: "10% Instant Discount on HDFC".to_string(),
            bank_name: Some("HDFC".to_string()),
            discount_amount: None,
            min_purchase: None,
            emi_available: false,
            emi_duration_months: None,
            source: OfferSource::MainPage,
        });

        let json: serde_json::Value = serde_json::from_str(&record.to_json_pretty().unwrap()).unwrap();
        for key in [
            "product_name",
            "rating",
            "number_of_ratings",
            "selling_price",
            "mrp",
            "discount_percentage",
            "bank_offers",
            "about_this_item",
            "product_information",
            "product_images",
            "manufacturer_images",
            "ai_review_summary",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["discount_percentage"], 10.0);
        let offer = &json["bank_offers"][0];
        assert_eq!(offer["offer_text"], "10% Instant Discount on HDFC");
        assert_eq!(offer["emi_available"], false);
        assert_eq!(offer["source"], "main_page");
        assert!(offer.get("discount_amount").is_none());
    }

    #[test]
    fn test_side_panel_offer_has_no_source_tag() {
        let offer = BankOffer {
            raw_text: "Flat ₹500 Cashback".to_string(),
            bank_name: None,
            discount_amount: Some(500.0),
            min_purchase: None,
            emi_available: false,
            emi_duration_months: None,
            source: OfferSource::SidePanel,
        };
        let json = serde_json::to_value(&offer).unwrap();
        assert!(json.get("source").is_none());
        assert_eq!(json["offer_text"], "Flat ₹500 Cashback");
    }
}
