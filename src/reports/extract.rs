//! Pattern-based field extraction.

use serde::{Serializer, ser::SerializeMap as _};

use super::{classify::ReportType, rules::ReportRules};
use crate::prelude::*;

/// Extracted fields, in rule order. A field is `None` when no pattern matched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportFields {
    fields: Vec<(String, Option<String>)>,
}

impl ReportFields {
    /// Look up a field's value. Unknown fields are treated as missing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Iterate over all fields, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }
}

impl FromIterator<(String, Option<String>)> for ReportFields {
    fn from_iter<I: IntoIterator<Item = (String, Option<String>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Serialized as a JSON object, keeping field order.
impl Serialize for ReportFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Extract every field in `rules` from `text`.
///
/// For each field, the patterns are tried in order and the first one that
/// matches anywhere in the text supplies the value (its first capture group,
/// trimmed). The report type doesn't change which patterns we use yet.
#[instrument(level = "debug", skip_all, fields(%report_type))]
pub fn extract_fields(text: &str, report_type: &ReportType, rules: &ReportRules) -> ReportFields {
    rules
        .fields
        .iter()
        .map(|field| {
            let value = field.patterns.iter().find_map(|re| {
                re.captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_owned())
            });
            trace!(field = %field.name, ?value, "Extracted field");
            (field.name.clone(), value)
        })
        .collect()
}
