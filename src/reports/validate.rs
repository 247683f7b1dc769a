//! Advisory quality checks on extracted fields.

use std::sync::LazyLock;

use regex::Regex;

use super::{extract::ReportFields, rules::ReportRules};
use crate::prelude::*;

/// A plausible 21st-century year.
static YEAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"20\d{2}").expect("failed to compile regex"));

/// Any decimal digit.
static DIGIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d").expect("failed to compile regex"));

/// Check extracted fields and describe anything suspicious.
///
/// The checks are independent, and none of them stops processing. Empty
/// values count as missing.
#[instrument(level = "debug", skip_all)]
pub fn validate_quality(fields: &ReportFields, rules: &ReportRules) -> Vec<String> {
    let field = |name: &str| fields.get(name).filter(|v| !v.is_empty());
    let mut warnings = vec![];

    for name in &rules.required {
        if field(name.as_str()).is_none() {
            warnings.push(format!("Required field '{name}' not found in document"));
        }
    }

    if let Some(date) = field("date")
        && !YEAR_REGEX.is_match(date)
    {
        warnings.push(format!("Date '{date}' may have invalid year format"));
    }

    if let Some(result) = field("result")
        && !rules.result_values.contains(&result.to_lowercase())
        && !rules.grade.is_match(result)
    {
        warnings.push(format!("Result '{result}' is not a standard pass/fail value"));
    }

    if let Some(thickness) = field("thickness")
        && !DIGIT_REGEX.is_match(thickness)
    {
        warnings.push(format!("Thickness '{thickness}' does not contain a number"));
    }

    if !warnings.is_empty() {
        debug!(?warnings, "Report has quality warnings");
    }
    warnings
}
