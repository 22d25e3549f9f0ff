// ============================================================
// ROW NORMALIZER
// ============================================================
// Turn a raw row into a schema-ordered feature vector or a row error

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::prediction::{FeatureVector, NormalizedRow, RowError};
use crate::domain::row::{RawRow, RawValue};
use crate::domain::schema::FeatureSchema;

/// Integers, decimals and scientific notation. Rejects `inf`/`nan`
/// and thousands separators, which `f64::from_str` or spreadsheets allow.
static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid numeric pattern")
});

pub struct RowNormalizer {
    schema: Arc<FeatureSchema>,
}

impl RowNormalizer {
    pub fn new(schema: Arc<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Pure: no I/O, same output for the same row. Columns outside the
    /// schema are ignored.
    pub fn normalize(&self, raw: &RawRow) -> NormalizedRow {
        let mut values = Vec::with_capacity(self.schema.len());
        let mut invalid_fields = Vec::new();

        for field in self.schema.fields() {
            match raw.get(&field.name).filter(|value| !value.is_blank()) {
                None if field.required => invalid_fields.push(field.name.clone()),
                None => values.push(field.default_value),
                Some(value) => match parse_numeric(value) {
                    Some(number) => values.push(number),
                    None => invalid_fields.push(field.name.clone()),
                },
            }
        }

        if invalid_fields.is_empty() {
            NormalizedRow::Features(FeatureVector::new(values))
        } else {
            NormalizedRow::Invalid(RowError {
                raw: raw.clone(),
                invalid_fields,
            })
        }
    }

    pub fn normalize_all(&self, rows: &[RawRow]) -> Vec<NormalizedRow> {
        rows.iter().map(|row| self.normalize(row)).collect()
    }
}

fn parse_numeric(value: &RawValue) -> Option<f64> {
    let number = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if !NUMERIC_PATTERN.is_match(trimmed) {
                return None;
            }
            trimmed.parse::<f64>().ok()?
        }
    };
    number.is_finite().then_some(number)
}
