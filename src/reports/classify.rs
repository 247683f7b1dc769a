//! Keyword-based report classification.

use std::fmt;

use serde::Serializer;

use super::rules::ReportRules;
use crate::prelude::*;

/// What kind of report a document is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportType {
    /// One of the categories in our rules, by tag.
    Category(String),
    /// No category keyword appears in the text.
    Unknown,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Category(tag) => f.write_str(tag),
            ReportType::Unknown => f.write_str("UNKNOWN"),
        }
    }
}

impl Serialize for ReportType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Classify a document by counting category keywords in its text.
///
/// Each category scores the total number of non-overlapping, case-insensitive
/// occurrences of its keywords. The highest score wins, and ties go to the
/// category listed first.
#[instrument(level = "debug", skip_all)]
pub fn classify_report(text: &str, rules: &ReportRules) -> ReportType {
    let text = text.to_lowercase();
    let scores = rules
        .categories
        .iter()
        .map(|category| {
            let score = category
                .keywords
                .iter()
                .map(|kw| text.matches(kw.as_str()).count())
                .sum::<usize>();
            (category.tag.as_str(), score)
        })
        .collect::<Vec<_>>();

    // `max_by_key` returns the last maximum, and we want the first.
    let best = scores
        .iter()
        .rev()
        .max_by_key(|(_, score)| *score)
        .filter(|(_, score)| *score > 0);
    match best {
        Some((tag, _)) => {
            info!(report_type = tag, ?scores, "Classified report");
            ReportType::Category((*tag).to_owned())
        }
        None => ReportType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ReportType {
        classify_report(text, &ReportRules::builtin())
    }

    #[test]
    fn no_keywords_is_unknown() {
        assert_eq!(classify("船体分段涂装记录"), ReportType::Unknown);
        assert_eq!(classify(""), ReportType::Unknown);
    }

    #[test]
    fn highest_score_wins() {
        assert_eq!(
            classify("超声波检测报告 超声波 射线"),
            ReportType::Category("UT".to_owned())
        );
    }

    #[test]
    fn english_keywords_ignore_case() {
        assert_eq!(
            classify("MAGNETIC PARTICLE INSPECTION"),
            ReportType::Category("MT".to_owned())
        );
    }

    #[test]
    fn ties_go_to_first_category() {
        // One point each for RT and PT.
        assert_eq!(
            classify("radiographic / penetrant"),
            ReportType::Category("RT".to_owned())
        );
    }

    #[test]
    fn classification_is_repeatable() {
        let text = "渗透检测 PT检测";
        assert_eq!(classify(text), classify(text));
    }

    #[test]
    fn report_type_serializes_as_tag() {
        let json = serde_json::to_string(&ReportType::Category("RT".to_owned())).unwrap();
        assert_eq!(json, r#""RT""#);
        let json = serde_json::to_string(&ReportType::Unknown).unwrap();
        assert_eq!(json, r#""UNKNOWN""#);
    }
}
