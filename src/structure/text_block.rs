//! OCR text blocks and the pages that hold them.

use schemars::JsonSchema;

use crate::prelude::*;

/// A quadrilateral bounding box: four `[x, y]` points, in whatever order the
/// OCR provider emitted them. Providers we know of start at the top-left
/// corner and go clockwise.
pub type Quad = [[i32; 2]; 4];

/// A fragment of recognized text, as returned by an OCR provider.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TextBlock {
    /// The recognized text.
    pub text: String,

    /// Recognition confidence, normally between 0.0 and 1.0. We pass through
    /// whatever the provider reports.
    pub confidence: f64,

    /// The bounding polygon of the text.
    pub bbox: Quad,
}

impl TextBlock {
    /// Create a new block.
    pub fn new(text: impl Into<String>, confidence: f64, bbox: Quad) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }

    /// The point we use to place this block in reading order: the first
    /// point of the polygon.
    pub fn anchor(&self) -> (i32, i32) {
        let [x, y] = self.bbox[0];
        (x, y)
    }

    /// The axis-aligned rectangle enclosing our polygon.
    pub fn bounds(&self) -> Rect {
        let xs = self.bbox.iter().map(|p| p[0]);
        let ys = self.bbox.iter().map(|p| p[1]);
        Rect {
            x1: xs.clone().min().unwrap_or_default(),
            y1: ys.clone().min().unwrap_or_default(),
            x2: xs.max().unwrap_or_default(),
            y2: ys.max().unwrap_or_default(),
        }
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    /// Vertical center. Kept as a float so that odd heights don't round.
    pub fn center_y(&self) -> f64 {
        (f64::from(self.y1) + f64::from(self.y2)) / 2.0
    }

    /// `[x1, y1, x2, y2]`, the form we serialize.
    pub fn to_array(self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// One OCRed page, with the pixel geometry of the raster it came from.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
pub struct OcrPage {
    /// 1-based page number.
    pub page: usize,

    /// Raster width in pixels.
    pub width: u32,

    /// Raster height in pixels.
    pub height: u32,

    /// Text blocks found on the page.
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

impl OcrPage {
    /// All the text on this page, one block per line, in provider order.
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Text of a whole document, one page after another.
pub fn document_text(pages: &[OcrPage]) -> String {
    pages
        .iter()
        .map(OcrPage::full_text)
        .collect::<Vec<_>>()
        .join("\n")
}
