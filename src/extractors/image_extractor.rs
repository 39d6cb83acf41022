//! Product gallery and manufacturer ("enhanced content") image extraction
//!
//! Gallery strategies run in strict priority order and the first one that
//! finds anything is the answer; results of different strategies are never
//! merged:
//!
//! 1. thumbnails, preferring the stored full-size URL over the thumbnail `src`
//! 2. the single main image
//! 3. the first URL of each `data-a-dynamic-image` JSON map
//!
//! Thumbnail-sized URLs are rewritten to the high-resolution variant.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use url::Url;

use crate::chain::{compile, compile_one, FallbackChain};
use crate::config::{ImageConfig, SelectorConfig};
use crate::error::Result;

/// Ordered, de-duplicated image URLs. Order is discovery order.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ImageSet {
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

impl FromIterator<String> for ImageSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::default();
        for url in iter {
            set.insert(url);
        }
        set
    }
}

/// URL rewriting and filtering shared by every strategy.
#[derive(Debug, Clone)]
pub struct ImageUrlRules {
    size_token: String,
    hires_suffix: String,
    excluded_markers: Vec<String>,
}

impl ImageUrlRules {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            size_token: config.size_token.clone(),
            hires_suffix: config.hires_suffix.clone(),
            excluded_markers: config
                .excluded_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    /// Drop the size suffix and append the high-resolution one.
    /// Applying it to its own output changes nothing.
    pub fn high_res(&self, url: &str) -> String {
        let base = url.split(self.size_token.as_str()).next().unwrap_or(url);
        format!("{}{}", base, self.hires_suffix)
    }

    pub fn is_excluded(&self, url: &str) -> bool {
        let lower = url.to_lowercase();
        self.excluded_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    /// Absolute http(s) form of `raw`, or `None` if it cannot be made one.
    pub fn absolute(&self, raw: &str, base: Option<&Url>) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("data:") {
            return None;
        }

        let parsed = if let Some(rest) = raw.strip_prefix("//") {
            Url::parse(&format!("https://{rest}")).ok()
        } else {
            match Url::parse(raw) {
                Ok(url) => Some(url),
                Err(url::ParseError::RelativeUrlWithoutBase) => base.and_then(|b| b.join(raw).ok()),
                Err(_) => None,
            }
        }?;

        matches!(parsed.scheme(), "http" | "https").then(|| parsed.to_string())
    }

    /// Final form of a discovered URL, or `None` when it is not a usable product image.
    fn accept(&self, raw: &str, rewrite: bool, base: Option<&Url>) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let candidate = if rewrite { self.high_res(raw) } else { raw.to_string() };
        let url = self.absolute(&candidate, base)?;
        (!self.is_excluded(&url)).then_some(url)
    }
}

/// A URL found on a thumbnail, before rewriting and filtering.
#[derive(Debug, Clone, PartialEq)]
struct Discovered {
    url: String,
    /// Thumbnail-sized, needs the high-resolution rewrite.
    rewrite: bool,
}

pub struct ImageExtractor {
    rules: ImageUrlRules,
    dynamic_attr: String,
    thumbnails: FallbackChain<Discovered>,
    main_image: Vec<Selector>,
    dynamic_image: Vec<Selector>,
}

impl ImageExtractor {
    pub fn new(selectors: &SelectorConfig, images: &ImageConfig) -> Result<Self> {
        let img = compile_one("product_images", "img")?;
        let hires_attr = images.hires_attr.clone();

        Ok(Self {
            rules: ImageUrlRules::new(images),
            dynamic_attr: images.dynamic_attr.clone(),
            thumbnails: FallbackChain::from_selectors(
                "product_images",
                &selectors.thumbnails,
                move |li| thumbnail_url(li, &img, &hires_attr),
            )?,
            main_image: compile("product_images", &selectors.main_image)?,
            dynamic_image: compile("product_images", &selectors.dynamic_image)?,
        })
    }

    pub fn extract(&self, document: &Html, base: Option<&Url>) -> Vec<String> {
        let thumbnails = self.from_thumbnails(document, base);
        if !thumbnails.is_empty() {
            return thumbnails.into_vec();
        }

        if let Some(main) = self.from_main_image(document, base) {
            return vec![main];
        }

        self.from_dynamic_metadata(document, base).into_vec()
    }

    fn from_thumbnails(&self, document: &Html, base: Option<&Url>) -> ImageSet {
        self.thumbnails
            .resolve_all(document)
            .into_iter()
            .filter_map(|found| self.rules.accept(&found.url, found.rewrite, base))
            .collect()
    }

    fn from_main_image(&self, document: &Html, base: Option<&Url>) -> Option<String> {
        self.main_image
            .iter()
            .flat_map(|selector| document.select(selector))
            .filter_map(|img| img.value().attr("src"))
            .find_map(|src| self.rules.accept(src, true, base))
    }

    fn from_dynamic_metadata(&self, document: &Html, base: Option<&Url>) -> ImageSet {
        self.dynamic_image
            .iter()
            .flat_map(|selector| document.select(selector))
            .filter_map(|img| img.value().attr(self.dynamic_attr.as_str()))
            .filter_map(first_dynamic_key)
            .filter_map(|url| self.rules.accept(&url, true, base))
            .collect()
    }
}

fn thumbnail_url(li: ElementRef<'_>, img: &Selector, hires_attr: &str) -> Option<Discovered> {
    let attrs = li.select(img).next()?.value();

    if let Some(hires) = attrs.attr(hires_attr).filter(|v| !v.trim().is_empty()) {
        return Some(Discovered {
            url: hires.to_string(),
            rewrite: false,
        });
    }

    attrs
        .attr("src")
        .filter(|v| !v.trim().is_empty())
        .map(|src| Discovered {
            url: src.to_string(),
            rewrite: true,
        })
}

/// First key of a `{"url": [w, h], ...}` map, in document order.
fn first_dynamic_key(raw: &str) -> Option<String> {
    let map: Map<String, Value> = serde_json::from_str(raw).ok()?;
    map.keys().next().cloned()
}

/// Every `img` inside the enhanced content section, as a set.
pub struct ManufacturerImageExtractor {
    images: Vec<Selector>,
    rules: ImageUrlRules,
}

impl ManufacturerImageExtractor {
    pub fn new(selectors: &SelectorConfig, images: &ImageConfig) -> Result<Self> {
        Ok(Self {
            images: compile("manufacturer_images", &selectors.manufacturer_images)?,
            rules: ImageUrlRules::new(images),
        })
    }

    /// De-duplicated URLs; their order carries no meaning.
    pub fn extract(&self, document: &Html, base: Option<&Url>) -> Vec<String> {
        let urls: HashSet<String> = self
            .images
            .iter()
            .flat_map(|selector| document.select(selector))
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| self.rules.absolute(src, base))
            .collect();
        urls.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ImageExtractor {
        ImageExtractor::new(&SelectorConfig::default(), &ImageConfig::default()).unwrap()
    }

    fn rules() -> ImageUrlRules {
        ImageUrlRules::new(&ImageConfig::default())
    }

    #[test]
    fn test_high_res_rewrite_is_idempotent() {
        let rules = rules();
        let once = rules.high_res("https://m.media-amazon.com/images/I/71abc._SX38_SY50_CR,0,0,38,50_.jpg");
        assert_eq!(once, "https://m.media-amazon.com/images/I/71abc._SL1500_.jpg");
        assert_eq!(rules.high_res(&once), once);

        let bare = rules.high_res("https://example/img.jpg");
        assert_eq!(rules.high_res(&bare), bare);
    }

    #[test]
    fn test_exclusion_markers_ignore_case() {
        let rules = rules();
        assert!(rules.is_excluded("https://x/PKplay-button-overlay._SL1500_.jpg"));
        assert!(rules.is_excluded("https://x/Video-Thumb.jpg"));
        assert!(rules.is_excluded("https://x/sprite.png"));
        assert!(!rules.is_excluded("https://x/71abc._SL1500_.jpg"));
    }

    #[test]
    fn test_absolute_urls() {
        let rules = rules();
        let base = Url::parse("https://www.amazon.in/dp/B0C1234567").unwrap();
        assert_eq!(
            rules.absolute("/images/I/a.jpg", Some(&base)).as_deref(),
            Some("https://www.amazon.in/images/I/a.jpg")
        );
        assert_eq!(
            rules.absolute("//m.media-amazon.com/a.jpg", None).as_deref(),
            Some("https://m.media-amazon.com/a.jpg")
        );
        assert_eq!(rules.absolute("/images/I/a.jpg", None), None);
        assert_eq!(rules.absolute("data:image/gif;base64,R0lGOD", Some(&base)), None);
        assert_eq!(rules.absolute("javascript:void(0)", Some(&base)), None);
    }

    #[test]
    fn test_thumbnails_prefer_stored_high_res() {
        let html = Html::parse_document(
            r#"
            <ul>
              <li class="a-spacing-small item imageThumbnail a-declarative">
                <img src="https://m.media-amazon.com/images/I/A1._SS40_.jpg"
                     data-old-hires="https://m.media-amazon.com/images/I/A1._SL1200_.jpg">
              </li>
              <li class="a-spacing-small item imageThumbnail a-declarative">
                <img src="https://m.media-amazon.com/images/I/B2._SS40_.jpg">
              </li>
              <li class="a-spacing-small item imageThumbnail a-declarative">
                <img src="https://m.media-amazon.com/images/I/B2._SS40_.jpg">
              </li>
              <li class="a-spacing-small item imageThumbnail a-declarative">
                <img src="https://m.media-amazon.com/images/I/play-icon-overlay._SS40_.png">
              </li>
            </ul>
            <div id="imgTagWrapperId"><img src="https://m.media-amazon.com/images/I/MAIN._SX300_.jpg"></div>
            "#,
        );
        assert_eq!(
            extractor().extract(&html, None),
            vec![
                "https://m.media-amazon.com/images/I/A1._SL1200_.jpg",
                "https://m.media-amazon.com/images/I/B2._SL1500_.jpg",
            ]
        );
    }

    #[test]
    fn test_generic_thumbnail_class_fallback() {
        let html = Html::parse_document(
            r#"<ul><li class="a-spacing-small"><img src="https://x/C3._AC_US40_.jpg"></li></ul>"#,
        );
        assert_eq!(extractor().extract(&html, None), vec!["https://x/C3._SL1500_.jpg"]);
    }

    #[test]
    fn test_main_image_when_no_thumbnails() {
        let html = Html::parse_document(
            r#"
            <div id="imgTagWrapperId"><img src="https://x/MAIN._SX300_SY300_.jpg"></div>
            <img data-a-dynamic-image='{"https://x/OTHER._SX300_.jpg":[300,300]}'>
            "#,
        );
        assert_eq!(extractor().extract(&html, None), vec!["https://x/MAIN._SL1500_.jpg"]);
    }

    #[test]
    fn test_dynamic_image_metadata_last_resort() {
        let html = Html::parse_document(
            r#"<div><img data-a-dynamic-image='{"https://example/img._SX300_.jpg":[300,300],"https://example/img._SX600_.jpg":[600,600]}'></div>"#,
        );
        let images = extractor().extract(&html, None);
        assert_eq!(images, vec!["https://example/img._SL1500_.jpg"]);
    }

    #[test]
    fn test_dynamic_image_bad_json_is_skipped() {
        let html = Html::parse_document(
            r#"
            <img data-a-dynamic-image='not json'>
            <img data-a-dynamic-image='{"https://x/D4._SX300_.jpg":[300,300]}'>
            <img data-a-dynamic-image='{"https://x/D4._SX522_.jpg":[522,522]}'>
            "#,
        );
        assert_eq!(extractor().extract(&html, None), vec!["https://x/D4._SL1500_.jpg"]);
    }

    #[test]
    fn test_no_images_anywhere() {
        assert!(extractor().extract(&Html::parse_document("<p></p>"), None).is_empty());
    }

    #[test]
    fn test_manufacturer_images_are_a_set() {
        let html = Html::parse_document(
            r#"
            <div id="aplus">
                <img src="https://x/aplus-1.jpg">
                <img src="https://x/aplus-2.jpg">
                <img src="https://x/aplus-1.jpg">
                <img>
            </div>
            <img src="https://x/not-aplus.jpg">
            "#,
        );
        let extractor =
            ManufacturerImageExtractor::new(&SelectorConfig::default(), &ImageConfig::default())
                .unwrap();
        let mut images = extractor.extract(&html, None);
        images.sort();
        assert_eq!(images, vec!["https://x/aplus-1.jpg", "https://x/aplus-2.jpg"]);
    }
}
