//! Page-region classification from block position and shape.

use schemars::JsonSchema;

use super::{
    config::LayoutConfig,
    text_block::{OcrPage, TextBlock},
};
use crate::prelude::*;

/// The kind of region a block belongs to.
///
/// Only `Header`, `Footer`, `Title` and `Text` are produced today. The others
/// are part of the output vocabulary so that downstream consumers don't need
/// to change when we learn to detect them.
#[derive(Clone, Copy, Debug, Deserialize, JsonSchema, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    Text,
    Title,
    Table,
    Figure,
    List,
    Header,
    Footer,
}

/// A classified block.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct LayoutBlock {
    #[serde(rename = "type")]
    pub kind: LayoutKind,

    /// Axis-aligned box as `[x1, y1, x2, y2]`.
    pub bbox: [i32; 4],

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub confidence: f64,
}

/// The classified blocks of one page.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct LayoutPage {
    pub page: usize,
    pub blocks: Vec<LayoutBlock>,
}

/// Classify a single block on a page `page_height` pixels tall.
pub fn classify_block(block: &TextBlock, page_height: u32, config: &LayoutConfig) -> LayoutBlock {
    let bounds = block.bounds();
    let center_y = bounds.center_y();
    let page_height = f64::from(page_height);

    let kind = if center_y < page_height * config.header_band {
        LayoutKind::Header
    } else if center_y > page_height * config.footer_band {
        LayoutKind::Footer
    } else if bounds.height() > config.title_min_height_px
        && block.text.chars().count() < config.title_max_chars
    {
        LayoutKind::Title
    } else {
        LayoutKind::Text
    };

    LayoutBlock {
        kind,
        bbox: bounds.to_array(),
        text: Some(block.text.clone()),
        confidence: block.confidence,
    }
}

/// Classify every block on a page, independently, in provider order.
pub fn classify_page(page: &OcrPage, config: &LayoutConfig) -> LayoutPage {
    LayoutPage {
        page: page.page,
        blocks: page
            .blocks
            .iter()
            .map(|block| classify_block(block, page.height, config))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::text_block::tests::block_at;

    /// Classify a block on a 1000px-tall page with default settings.
    fn kind_of(block: &TextBlock) -> LayoutKind {
        classify_block(block, 1000, &LayoutConfig::default()).kind
    }

    #[test]
    fn position_bands_win_over_shape() {
        // Tall and short, but centered in the top band.
        assert_eq!(kind_of(&block_at("船名", 10, 10, 100, 60)), LayoutKind::Header);
        assert_eq!(kind_of(&block_at("第 1 页", 10, 950, 100, 20)), LayoutKind::Footer);
    }

    #[test]
    fn band_edges_are_exclusive() {
        // Center at exactly 100 (10%) and 900 (90%) is body text.
        assert_eq!(kind_of(&block_at("x", 10, 90, 100, 20)), LayoutKind::Text);
        assert_eq!(kind_of(&block_at("x", 10, 890, 100, 20)), LayoutKind::Text);
    }

    #[test]
    fn tall_short_text_is_a_title() {
        assert_eq!(kind_of(&block_at("检验报告", 10, 300, 400, 41)), LayoutKind::Title);
        // Exactly 40px is not tall enough.
        assert_eq!(kind_of(&block_at("检验报告", 10, 300, 400, 40)), LayoutKind::Text);
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        // 20 CJK characters are 60 bytes but still under the 50-char limit.
        let text = "涂".repeat(20);
        assert_eq!(kind_of(&block_at(&text, 10, 300, 400, 50)), LayoutKind::Title);
        let text = "a".repeat(50);
        assert_eq!(kind_of(&block_at(&text, 10, 300, 400, 50)), LayoutKind::Text);
    }

    #[test]
    fn page_classification_keeps_geometry_and_order() {
        let page = OcrPage {
            page: 3,
            width: 800,
            height: 1000,
            blocks: vec![block_at("b", 20, 500, 30, 10), block_at("a", 10, 5, 30, 10)],
        };
        let layout = classify_page(&page, &LayoutConfig::default());
        assert_eq!(layout.page, 3);
        assert_eq!(layout.blocks[0].bbox, [20, 500, 50, 510]);
        assert_eq!(layout.blocks[0].kind, LayoutKind::Text);
        assert_eq!(layout.blocks[1].kind, LayoutKind::Header);
        assert_eq!(layout.blocks[1].text.as_deref(), Some("a"));
    }

    #[test]
    fn kinds_serialize_in_snake_case() {
        let block = classify_block(&block_at("t", 0, 0, 5, 5), 1000, &LayoutConfig::default());
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "header");
    }
}
