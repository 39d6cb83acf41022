//! Rule-based review summary
//!
//! Composes a short paragraph from fields that were already extracted. The
//! wording is fixed; only the choice of clauses depends on the product.

use crate::config::SummaryRules;
use crate::record::ProductRecord;

const BUDGET_CEILING: f64 = 25_000.0;
const MID_RANGE_CEILING: f64 = 50_000.0;
const VALUE_CLOSING_CEILING: f64 = 30_000.0;
const BALANCED_CLOSING_CEILING: f64 = 50_000.0;

pub const INSUFFICIENT_INFORMATION: &str =
    "Unable to generate review summary due to insufficient product information.";

pub struct SummarySynthesizer {
    rules: SummaryRules,
}

impl SummarySynthesizer {
    pub fn new(rules: SummaryRules) -> Self {
        Self { rules }
    }

    /// Always returns text; the fixed fallback sentence when no clause applies.
    pub fn summarize(&self, record: &ProductRecord) -> String {
        let clauses = self.clauses(record);
        if clauses.is_empty() {
            return INSUFFICIENT_INFORMATION.to_string();
        }

        format!(
            "{}. Based on the specifications and features, this TV provides {}",
            clauses.join(". "),
            closing(record.selling_price)
        )
    }

    /// Triggered clauses in their fixed order.
    pub fn clauses(&self, record: &ProductRecord) -> Vec<String> {
        let spec = |label: &str| {
            record
                .product_information
                .get(label)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };
        let mut clauses = Vec::new();

        if let Some(resolution) = spec(&self.rules.resolution_label) {
            let resolution = resolution.to_lowercase();
            if self
                .rules
                .resolution_markers
                .iter()
                .any(|marker| resolution.contains(&marker.to_lowercase()))
            {
                clauses.push("This TV offers crisp 4K Ultra HD resolution".to_string());
            }
        }

        if let Some(size) = spec(&self.rules.screen_size_label) {
            clauses.push(format!("With a {size} display"));
        }

        let features = self.smart_features(&record.about_this_item);
        if !features.is_empty() {
            clauses.push(format!("Features {}", features.join(", ")));
        }

        if let Some(output) = spec(&self.rules.speaker_label) {
            clauses.push(format!("Equipped with {output} speaker output"));
        }

        if let Some(price) = record.selling_price.filter(|p| *p > 0.0) {
            clauses.push(format!("This {} TV offers", price_tier(price)));
        }

        if let Some(discount) = record.discount_percentage {
            clauses.push(format!("Currently available at a {discount:.2}% discount"));
        }

        clauses
    }

    /// Feature phrases from bullets that mention the smart marker, each phrase once.
    pub fn smart_features(&self, bullets: &[String]) -> Vec<String> {
        let marker = self.rules.smart_marker.to_lowercase();
        let mut phrases: Vec<String> = Vec::new();

        for bullet in bullets {
            let bullet = bullet.to_lowercase();
            if !bullet.contains(&marker) {
                continue;
            }
            for trigger in &self.rules.feature_triggers {
                let fired = trigger
                    .keywords
                    .iter()
                    .any(|keyword| bullet.contains(&keyword.to_lowercase()));
                if fired && !phrases.contains(&trigger.phrase) {
                    phrases.push(trigger.phrase.clone());
                }
            }
        }

        phrases
    }
}

impl Default for SummarySynthesizer {
    fn default() -> Self {
        Self::new(SummaryRules::default())
    }
}

fn price_tier(price: f64) -> &'static str {
    if price < BUDGET_CEILING {
        "budget-friendly"
    } else if price < MID_RANGE_CEILING {
        "mid-range"
    } else {
        "premium"
    }
}

fn closing(price: Option<f64>) -> &'static str {
    match price.filter(|p| *p > 0.0) {
        Some(p) if p < VALUE_CLOSING_CEILING => {
            "good value for budget-conscious buyers looking for a smart TV with basic features."
        }
        Some(p) if p < BALANCED_CLOSING_CEILING => {
            "a balanced mix of features and performance for the average user."
        }
        _ => "a premium viewing experience with advanced features for demanding users.",
    }
}
