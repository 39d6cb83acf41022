//! Technical details table extraction
//!
//! Rows are `<th>` label / `<td>` value pairs. A row missing either cell is
//! skipped. The first table that yields at least one row wins.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::chain::{compile_one, element_text, FallbackChain};
use crate::config::SelectorConfig;
use crate::error::Result;

pub struct SpecTableExtractor {
    tables: FallbackChain<BTreeMap<String, String>>,
}

struct RowSelectors {
    row: Selector,
    label: Selector,
    value: Selector,
}

impl SpecTableExtractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self> {
        let cells = RowSelectors {
            row: compile_one("product_information", "tr")?,
            label: compile_one("product_information", "th")?,
            value: compile_one("product_information", "td")?,
        };

        Ok(Self {
            tables: FallbackChain::from_selectors(
                "product_information",
                &selectors.spec_table,
                move |table| {
                    let rows = read_rows(table, &cells);
                    (!rows.is_empty()).then_some(rows)
                },
            )?,
        })
    }

    pub fn extract(&self, document: &Html) -> BTreeMap<String, String> {
        self.tables.resolve(document).unwrap_or_default()
    }
}

fn read_rows(table: ElementRef<'_>, cells: &RowSelectors) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();

    for row in table.select(&cells.row) {
        let label = row.select(&cells.label).next().map(element_text);
        let value = row.select(&cells.value).next().map(element_text);

        if let (Some(label), Some(value)) = (label, value) {
            if !label.is_empty() {
                info.insert(label, value);
            }
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SpecTableExtractor {
        SpecTableExtractor::new(&SelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_tech_spec_table() {
        let html = Html::parse_document(
            r#"
            <table id="productDetails_techSpec_section_1">
                <tr><th> Brand </th><td>&lrm;Sony</td></tr>
                <tr><th>Resolution</th><td>&lrm;3840 x 2160 (4K UHD)</td></tr>
                <tr><th>Standing screen display size</th><td>&lrm;55 Inches</td></tr>
                <tr><th>Orphan label</th></tr>
                <tr><td>Orphan value</td></tr>
            </table>
            "#,
        );
        let info = extractor().extract(&html);
        assert_eq!(info.len(), 3);
        assert_eq!(info["Brand"], "Sony");
        assert_eq!(info["Resolution"], "3840 x 2160 (4K UHD)");
        assert_eq!(info["Standing screen display size"], "55 Inches");
    }

    #[test]
    fn test_falls_back_to_detail_bullets_table() {
        let html = Html::parse_document(
            r#"
            <table id="productDetails_techSpec_section_1"></table>
            <table id="productDetails_detailBullets_sections1">
                <tr><th>ASIN</th><td>B0C1234567</td></tr>
            </table>
            "#,
        );
        let info = extractor().extract(&html);
        assert_eq!(info.get("ASIN").map(String::as_str), Some("B0C1234567"));
    }

    #[test]
    fn test_no_table_is_empty_map() {
        assert!(extractor().extract(&Html::parse_document("<p></p>")).is_empty());
    }
}
