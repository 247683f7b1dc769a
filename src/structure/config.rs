//! Tunable thresholds for our geometric heuristics.
//!
//! Every number the row grouper, table detector, layout classifier and table
//! merger depend on lives here, so that a config file (or a test) can change
//! them without touching any logic. Missing keys fall back to the defaults,
//! which were tuned on 300 DPI scans.

use schemars::JsonSchema;

use crate::{async_utils::io::read_json_or_toml, prelude::*};

/// All heuristic settings, grouped by component.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructureConfig {
    pub rows: RowConfig,
    pub tables: TableConfig,
    pub layout: LayoutConfig,
    pub merge: MergeConfig,
}

impl StructureConfig {
    /// Load a config from a TOML or JSON file, or use the defaults.
    #[instrument(level = "debug", skip_all)]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = read_json_or_toml::<Self>(path).await?;
                config.validate().with_context(|| {
                    format!("invalid structure config in {:?}", path.display())
                })?;
                debug!(?config, "Loaded structure config");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Reject settings that would make the heuristics meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.rows.gap_px <= 0 {
            return Err(anyhow!("rows.gap_px must be positive"));
        }
        if self.tables.min_columns < 1 || self.tables.min_rows < 1 {
            return Err(anyhow!(
                "tables.min_columns and tables.min_rows must be at least 1"
            ));
        }
        let bands = (self.layout.header_band, self.layout.footer_band);
        if !(0.0..=1.0).contains(&bands.0) || !(0.0..=1.0).contains(&bands.1) {
            return Err(anyhow!("layout bands must be fractions between 0 and 1"));
        }
        for (name, ratio) in [
            ("merge.duplicate_header_ratio", self.merge.duplicate_header_ratio),
            ("merge.header_keyword_ratio", self.merge.header_keyword_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(anyhow!("{name} must be between 0 and 1, got {ratio}"));
            }
        }
        Ok(())
    }
}

/// Settings for grouping blocks into rows.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RowConfig {
    /// A block joins the current row if its y is strictly less than this
    /// many pixels from the row's anchor y.
    pub gap_px: i32,
}

impl Default for RowConfig {
    fn default() -> Self {
        Self { gap_px: 15 }
    }
}

/// Settings for finding table regions among rows.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Rows with fewer blocks than this can't be part of a table.
    pub min_columns: usize,

    /// Runs with fewer rows than this (header included) are discarded.
    pub min_rows: usize,

    /// How far a row's column count may drift from the previous row's
    /// before the run is broken.
    pub column_drift: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            min_columns: 2,
            min_rows: 2,
            column_drift: 1,
        }
    }
}

/// Settings for page-region classification.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Blocks centered above this fraction of the page height are headers.
    pub header_band: f64,

    /// Blocks centered below this fraction of the page height are footers.
    pub footer_band: f64,

    /// Blocks taller than this may be titles.
    pub title_min_height_px: i32,

    /// ...if their text is shorter than this many characters.
    pub title_max_chars: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_band: 0.10,
            footer_band: 0.90,
            title_min_height_px: 40,
            title_max_chars: 50,
        }
    }
}

/// Settings for merging tables across page breaks.
#[derive(Clone, Debug, Deserialize, JsonSchema, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Maximum difference in header width between two tables we'll merge.
    pub column_drift: usize,

    /// Fraction of header cells that must match exactly for the second
    /// table's header to count as a repeat of the first's.
    pub duplicate_header_ratio: f64,

    /// Fraction of cells that must contain a header keyword for a row to
    /// look like a header.
    pub header_keyword_ratio: f64,

    /// Words that suggest a cell is a column heading. Matched as
    /// case-insensitive substrings.
    pub header_keywords: Vec<String>,

    /// Confidence given to rebuilt cells whose source confidence is unknown.
    /// This is a placeholder, not a measurement.
    pub default_cell_confidence: f64,
}

/// Column headings common in shipyard painting lists and bills of quantity.
const DEFAULT_HEADER_KEYWORDS: &[&str] = &[
    "序号", "名称", "规格", "型号", "数量", "单位", "单价", "金额", "备注", "编号",
    "材料", "面积", "涂层", "颜色", "区域", "部位", "no", "name", "spec", "qty",
    "unit", "price", "amount", "remark",
];

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            column_drift: 1,
            duplicate_header_ratio: 0.7,
            header_keyword_ratio: 0.3,
            header_keywords: DEFAULT_HEADER_KEYWORDS
                .iter()
                .map(|&kw| kw.to_owned())
                .collect(),
            default_cell_confidence: 0.9,
        }
    }
}
