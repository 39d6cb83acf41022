//! Extraction configuration
//!
//! Every selector list, keyword table and timing knob the pipeline reads is
//! plain data here. The defaults describe the current product page markup;
//! a JSON file with any subset of the sections can override them.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub selectors: SelectorConfig,
    /// Ordered bank table; the first bank with a matching pattern wins.
    pub banks: Vec<BankPattern>,
    pub offers: OfferConfig,
    pub images: ImageConfig,
    pub summary: SummaryRules,
    pub fetch: FetchConfig,
    /// Shared deadline for all field workers of one extraction.
    pub timeout_ms: u64,
    /// How long the page is given to settle after the offers reveal click.
    pub settle_delay_ms: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            banks: default_banks(),
            offers: OfferConfig::default(),
            images: ImageConfig::default(),
            summary: SummaryRules::default(),
            fetch: FetchConfig::default(),
            timeout_ms: 15_000,
            settle_delay_ms: 2_000,
        }
    }
}

impl ExtractorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// CSS selector lists per field. Multi-entry lists are fallback chains,
/// tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub title: Vec<String>,
    pub rating: Vec<String>,
    pub rating_delimiter: String,
    pub rating_count: Vec<String>,
    pub rating_count_delimiter: String,
    pub selling_price: Vec<String>,
    /// Strikethrough price variants
    pub mrp: Vec<String>,
    pub feature_bullets: Vec<String>,
    pub spec_table: Vec<String>,
    pub thumbnails: Vec<String>,
    pub main_image: Vec<String>,
    pub dynamic_image: Vec<String>,
    pub manufacturer_images: Vec<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            title: strings(&["span#productTitle"]),
            rating: strings(&["span.a-icon-alt"]),
            rating_delimiter: " out of".to_string(),
            rating_count: strings(&["span#acrCustomerReviewText"]),
            rating_count_delimiter: " ratings".to_string(),
            selling_price: strings(&["span.a-price-whole"]),
            mrp: strings(&[
                "span.a-price.a-text-price",
                "span.priceBlockStrikePriceString",
                r#"span[data-a-strike="true"]"#,
            ]),
            feature_bullets: strings(&["#feature-bullets span.a-list-item"]),
            spec_table: strings(&[
                "table#productDetails_techSpec_section_1",
                "table#productDetails_detailBullets_sections1",
            ]),
            thumbnails: strings(&[
                "li.a-spacing-small.item.imageThumbnail.a-declarative",
                "li.a-spacing-small",
            ]),
            main_image: strings(&["div#imgTagWrapperId img"]),
            dynamic_image: strings(&["img[data-a-dynamic-image]"]),
            manufacturer_images: strings(&["div#aplus img"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BankPattern {
    pub name: String,
    /// Lowercase substrings that identify the bank in offer text.
    pub patterns: Vec<String>,
}

fn default_banks() -> Vec<BankPattern> {
    [
        ("HDFC", &["hdfc", "h.d.f.c"][..]),
        ("SBI", &["sbi", "s.b.i"][..]),
        ("ICICI", &["icici", "i.c.i.c.i"][..]),
        ("Axis", &["axis"][..]),
    ]
    .into_iter()
    .map(|(name, patterns)| BankPattern {
        name: name.to_string(),
        patterns: strings(patterns),
    })
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferConfig {
    /// Elements the browser clicks to open the offers side panel.
    pub reveal_locator: String,
    pub reveal_keywords: Vec<String>,
    pub side_panel: Vec<String>,
    /// Offer item locators inside the side panel.
    pub panel_items: Vec<String>,
    /// Scopes searched by the main-page fallback, in order.
    pub main_content: Vec<String>,
    pub fallback_elements: String,
    /// Item text shorter than this many characters is noise.
    pub min_text_len: usize,
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            reveal_locator: ".a-carousel-card".to_string(),
            reveal_keywords: strings(&["Bank Offer", "Credit Card", "Cashback"]),
            side_panel: strings(&["div#InstantBankDiscount-sideSheet"]),
            panel_items: strings(&[
                "div.a-section.vsx-offers-desktop-lv_item, li.a-section.vsx-offers-desktop-lv_item, \
                 div.a-section.vsx-offers-desktop-lv__item, li.a-section.vsx-offers-desktop-lv__item",
                "div.a-section.a-spacing-mini, li.a-section.a-spacing-mini",
            ]),
            main_content: strings(&["#dp", "#ppd", "body"]),
            fallback_elements: "div, span".to_string(),
            min_text_len: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Thumbnail attribute holding the full-size image URL.
    pub hires_attr: String,
    /// Everything from this token onward is the size suffix of an image URL.
    pub size_token: String,
    pub hires_suffix: String,
    /// Case-insensitive URL markers of non-product images.
    pub excluded_markers: Vec<String>,
    pub dynamic_attr: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            hires_attr: "data-old-hires".to_string(),
            size_token: "._".to_string(),
            hires_suffix: "._SL1500_.jpg".to_string(),
            excluded_markers: strings(&["video", "play", "sprite", "icon", "placeholder", "gif"]),
            dynamic_attr: "data-a-dynamic-image".to_string(),
        }
    }
}

/// A smart-feature phrase added when a bullet mentions any of `keywords`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureTrigger {
    pub keywords: Vec<String>,
    pub phrase: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryRules {
    pub resolution_label: String,
    pub resolution_markers: Vec<String>,
    pub screen_size_label: String,
    pub speaker_label: String,
    /// Bullets must mention this before feature triggers are considered.
    pub smart_marker: String,
    pub feature_triggers: Vec<FeatureTrigger>,
}

impl Default for SummaryRules {
    fn default() -> Self {
        let trigger = |keywords: &[&str], phrase: &str| FeatureTrigger {
            keywords: strings(keywords),
            phrase: phrase.to_string(),
        };

        Self {
            resolution_label: "Resolution".to_string(),
            resolution_markers: strings(&["3840 x 2160", "4k"]),
            screen_size_label: "Standing screen display size".to_string(),
            speaker_label: "Speakers Maximum Output Power".to_string(),
            smart_marker: "smart".to_string(),
            feature_triggers: vec![
                trigger(&["alexa", "google assistant"], "voice control capabilities"),
                trigger(&["wifi", "wireless"], "wireless connectivity"),
                trigger(&["streaming", "ott"], "access to streaming services"),
            ],
        }
    }
}

/// Plain-HTTP page retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
    /// Hosts product URLs may point at.
    pub allowed_hosts: Vec<String>,
    /// A page without this element never finished loading.
    pub ready_selector: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_ms: 30_000,
            allowed_hosts: strings(&["www.amazon.in", "amazon.in"]),
            ready_selector: "#productTitle".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
