//! Classifying structured reports and pulling typed fields out of their text.
//!
//! The pipeline is classify, then extract, then validate. All three are
//! driven by a [`ReportRules`] table, so supporting a new kind of report means
//! writing a rules file, not code.

pub mod classify;
pub mod extract;
pub mod rules;
pub mod validate;

pub use self::{
    classify::{ReportType, classify_report},
    extract::{ReportFields, extract_fields},
    rules::ReportRules,
    validate::validate_quality,
};
