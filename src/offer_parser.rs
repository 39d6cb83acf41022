//! Free-text bank offer parsing
//!
//! Turns strings like "Flat ₹1,500 Instant Discount on HDFC Bank Credit
//! Cards. Min purchase ₹5,000" into structured offers. Every pattern is
//! best effort; a pattern that does not match leaves its field empty and
//! the offer is still kept.

use regex::Regex;

use crate::config::BankPattern;
use crate::error::Result;
use crate::normalize::parse_decimal;
use crate::record::{BankOffer, OfferSource};

const AMOUNT: &str = r"(\d[\d,]*(?:\.\d{1,2})?)";
const CURRENCY: &str = r"(?:INR|Rs\.?|₹)?";

pub struct OfferParser {
    banks: Vec<BankPattern>,
    discount: Regex,
    min_purchase: Regex,
    emi_months: Regex,
    /// Main-page text that looks like a bank offer.
    offer_hint: Regex,
}

impl OfferParser {
    pub fn new(banks: &[BankPattern]) -> Result<Self> {
        let banks = banks
            .iter()
            .map(|bank| BankPattern {
                name: bank.name.clone(),
                patterns: bank.patterns.iter().map(|p| p.to_lowercase()).collect(),
            })
            .collect();

        Ok(Self {
            banks,
            discount: Regex::new(&format!(
                r"(?i)(?:Flat|Get|Up\s*to)?\s*{CURRENCY}\s*{AMOUNT}\s*(?:Instant\s+)?(?:Discount|Cashback)"
            ))?,
            min_purchase: Regex::new(&format!(
                r"(?i)(?:Min(?:imum)?\.?\s*(?:purchase|order)(?:\s*value)?|Min\.?\s*value)\s*(?:of\s*)?:?\s*{CURRENCY}\s*{AMOUNT}"
            ))?,
            emi_months: Regex::new(r"(?i)(\d+)\s*-?\s*months?")?,
            offer_hint: Regex::new(
                r"(?i)(?:Bank\s+Offer|Credit\s+Card|₹\s*\d+(?:,\d+)*(?:\.\d{2})?\s*(?:discount|cashback))",
            )?,
        })
    }

    /// Structured offer from its visible text. `None` only when there is no text.
    pub fn parse(&self, text: &str, source: OfferSource) -> Option<BankOffer> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let emi_available = text.contains("EMI");
        Some(BankOffer {
            raw_text: text.to_string(),
            bank_name: self.bank_name(text),
            discount_amount: self.discount_amount(text),
            min_purchase: self.min_purchase(text),
            emi_available,
            emi_duration_months: if emi_available { self.emi_months(text) } else { None },
            source,
        })
    }

    /// First bank in table order with a pattern occurring in the text.
    pub fn bank_name(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        self.banks
            .iter()
            .find(|bank| bank.patterns.iter().any(|p| lower.contains(p.as_str())))
            .map(|bank| bank.name.clone())
    }

    pub fn discount_amount(&self, text: &str) -> Option<f64> {
        capture_amount(&self.discount, text)
    }

    pub fn min_purchase(&self, text: &str) -> Option<f64> {
        capture_amount(&self.min_purchase, text)
    }

    pub fn emi_months(&self, text: &str) -> Option<u32> {
        self.emi_months
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    pub fn looks_like_offer(&self, text: &str) -> bool {
        self.offer_hint.is_match(text)
    }
}

fn capture_amount(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
}
