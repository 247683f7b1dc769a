//! Keyword, pattern and vocabulary tables for report processing.
//!
//! Rules are written in TOML (see `default_rules.toml`) and compiled once into
//! a [`ReportRules`], which is immutable and cheap to share between tasks.

use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};
use schemars::JsonSchema;

use crate::{async_utils::io::read_json_or_toml, prelude::*};

/// Our built-in rules, as TOML source.
const DEFAULT_RULES_TOML: &str = include_str!("default_rules.toml");

/// The compiled built-in rules.
static DEFAULT_RULES: LazyLock<Arc<ReportRules>> = LazyLock::new(|| {
    let file = toml::from_str::<RulesFile>(DEFAULT_RULES_TOML)
        .expect("built-in report rules should parse");
    Arc::new(ReportRules::compile(file).expect("built-in report rules should compile"))
});

/// Report rules as written in a rules file.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RulesFile {
    /// Categories to classify reports into, in priority order.
    pub categories: Vec<CategoryRule>,

    /// Fields to extract, in output order.
    pub fields: Vec<FieldRule>,

    /// Quality checks for extracted fields.
    pub validation: ValidationRule,
}

/// A report category and the keywords that suggest it.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CategoryRule {
    /// The tag we output for this category, e.g. `"UT"`.
    pub tag: String,
    pub keywords: Vec<String>,
}

/// A field and the regular expressions that find it.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldRule {
    pub name: String,
    /// Tried in order. Each must have at least one capture group.
    pub patterns: Vec<String>,
}

/// Vocabulary for the quality validator.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ValidationRule {
    /// Fields that should always be present.
    pub required: Vec<String>,
    /// Standard values for the `result` field.
    pub result_values: Vec<String>,
    /// Grades (like `II级`) that are also acceptable `result` values.
    pub grade_pattern: String,
}

/// A category, ready for scoring.
#[derive(Debug)]
pub struct Category {
    pub tag: String,
    /// Lowercased keywords.
    pub keywords: Vec<String>,
}

/// A field, with compiled patterns.
#[derive(Debug)]
pub struct FieldPatterns {
    pub name: String,
    pub patterns: Vec<Regex>,
}

/// Compiled report rules.
#[derive(Debug)]
pub struct ReportRules {
    pub categories: Vec<Category>,
    pub fields: Vec<FieldPatterns>,
    pub required: Vec<String>,
    /// Lowercased.
    pub result_values: Vec<String>,
    /// Anchored at the start of the value.
    pub grade: Regex,
}

impl ReportRules {
    /// The built-in NDT inspection report rules.
    pub fn builtin() -> Arc<Self> {
        DEFAULT_RULES.clone()
    }

    /// Load rules from a TOML or JSON file, or use the built-in rules.
    #[instrument(level = "debug", skip_all)]
    pub async fn load(path: Option<&Path>) -> Result<Arc<Self>> {
        match path {
            Some(path) => {
                let file = read_json_or_toml::<RulesFile>(path).await?;
                let rules = Self::compile(file)
                    .with_context(|| format!("invalid report rules in {:?}", path.display()))?;
                debug!(
                    categories = rules.categories.len(),
                    fields = rules.fields.len(),
                    "Loaded report rules"
                );
                Ok(Arc::new(rules))
            }
            None => Ok(Self::builtin()),
        }
    }

    /// Compile a rules file, checking every pattern.
    pub fn compile(file: RulesFile) -> Result<Self> {
        let categories = file
            .categories
            .into_iter()
            .map(|c| Category {
                tag: c.tag,
                keywords: c.keywords.iter().map(|kw| kw.to_lowercase()).collect(),
            })
            .collect();

        let fields = file
            .fields
            .into_iter()
            .map(|field| {
                let patterns = field
                    .patterns
                    .iter()
                    .map(|p| compile_field_pattern(&field.name, p))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FieldPatterns {
                    name: field.name,
                    patterns,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let grade_pattern = &file.validation.grade_pattern;
        let grade = Regex::new(&format!("^(?:{grade_pattern})"))
            .with_context(|| format!("invalid grade pattern {grade_pattern:?}"))?;

        Ok(Self {
            categories,
            fields,
            required: file.validation.required,
            result_values: file
                .validation
                .result_values
                .iter()
                .map(|v| v.to_lowercase())
                .collect(),
            grade,
        })
    }
}

/// Compile a case-insensitive field pattern, which must capture its value.
fn compile_field_pattern(field: &str, pattern: &str) -> Result<Regex> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("invalid pattern for field {field:?}: {pattern:?}"))?;
    if re.captures_len() < 2 {
        return Err(anyhow!(
            "pattern for field {field:?} has no capture group: {pattern:?}"
        ));
    }
    Ok(re)
}
