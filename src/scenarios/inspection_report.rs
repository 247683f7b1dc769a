//! NDT inspection reports: classify, extract fields, and check them.

use std::{collections::BTreeMap, sync::Arc};

use schemars::JsonSchema;

use super::Scenario;
use crate::{
    ocr::OcrDocument,
    prelude::*,
    records::Outcome,
    reports::{ReportFields, ReportRules, ReportType, classify_report, extract_fields, validate_quality},
    structure::document_text,
};

/// Output payload of the `inspection-report` subcommand.
#[derive(Clone, Debug, JsonSchema, PartialEq, Serialize)]
pub struct InspectionReportOutput {
    /// A category tag from the rules, like `UT`, or `UNKNOWN`.
    #[schemars(with = "String")]
    pub report_type: ReportType,

    /// Every field in the rules, in rule order. Missing fields are `null`.
    #[schemars(with = "BTreeMap<String, Option<String>>")]
    pub fields: ReportFields,

    /// Advisory problems with the extracted fields.
    pub warnings: Vec<String>,

    /// The text we searched, with pages in order.
    pub full_text: String,

    pub total_pages: usize,
}

/// Classify a report, pull out its fields and sanity-check them.
pub struct InspectionReportScenario {
    pub rules: Arc<ReportRules>,
}

impl Scenario for InspectionReportScenario {
    type Output = InspectionReportOutput;

    fn process(&self, document: OcrDocument) -> Outcome<InspectionReportOutput> {
        let full_text = document_text(&document.pages);
        if full_text.trim().is_empty() {
            return Outcome::Failure("No text extracted from document".to_owned());
        }

        let report_type = classify_report(&full_text, &self.rules);
        let fields = extract_fields(&full_text, &report_type, &self.rules);
        let warnings = validate_quality(&fields, &self.rules);
        debug!(%report_type, warnings = warnings.len(), "Processed inspection report");
        Outcome::Success(InspectionReportOutput {
            report_type,
            fields,
            warnings,
            full_text,
            total_pages: document.pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::structure::{OcrPage, text_block::tests::block_at};

    fn scenario() -> InspectionReportScenario {
        InspectionReportScenario {
            rules: ReportRules::builtin(),
        }
    }

    fn document(lines: &[&str]) -> OcrDocument {
        let blocks = lines
            .iter()
            .enumerate()
            .map(|(i, line)| block_at(line, 100, 100 + 40 * i as i32, 400, 20))
            .collect();
        OcrDocument {
            pages: vec![OcrPage {
                page: 1,
                width: 1000,
                height: 1400,
                blocks,
            }],
            warnings: vec![],
        }
    }

    #[test]
    fn blank_document_fails() {
        assert_eq!(
            scenario().process(document(&["  ", ""])),
            Outcome::Failure("No text extracted from document".to_owned())
        );
    }

    #[test]
    fn ultrasonic_report_is_extracted() -> Result<()> {
        let doc = document(&[
            "超声波检测报告",
            "报告编号：UT-2023-015",
            "检测日期：2023-05-01",
            "超声波探伤 焊缝",
            "检测结果：合格",
        ]);
        let Outcome::Success(output) = scenario().process(doc) else {
            panic!("expected success");
        };
        assert_eq!(output.report_type, ReportType::Category("UT".to_owned()));
        assert_eq!(output.fields.get("report_no"), Some("UT-2023-015"));
        assert_eq!(output.fields.get("result"), Some("合格"));
        assert_eq!(output.total_pages, 1);
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);

        let json = serde_json::to_value(&output)?;
        assert_eq!(json["report_type"], json!("UT"));
        assert_eq!(json["fields"]["inspector"], Value::Null);
        Ok(())
    }
}
