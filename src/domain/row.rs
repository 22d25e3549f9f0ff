// ============================================================
// RAW ROW TYPES
// ============================================================
// Unvalidated input as it arrived from the form or an uploaded file

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A single raw cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Whether the value carries no content
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Number(_) => false,
            RawValue::Text(text) => text.trim().is_empty(),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display is the shortest representation that parses back exactly
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

/// A named cell; `value` is `None` when the field was absent
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub name: String,
    pub value: Option<RawValue>,
}

/// One row of input keyed by column name, in source column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert used when constructing a row
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Builder-style insert of an absent field
    pub fn with_absent(mut self, name: impl Into<String>) -> Self {
        self.set(name, None);
        self
    }

    /// Set a cell, replacing an existing cell with the same name in place
    pub fn set(&mut self, name: impl Into<String>, value: Option<RawValue>) {
        let name = name.into();
        match self.cells.iter_mut().find(|c| c.name == name) {
            Some(cell) => cell.value = value,
            None => self.cells.push(RawCell { name, value }),
        }
    }

    /// Value for `name`; `None` when the column is missing or the cell is absent
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.value.as_ref())
    }

    pub fn cells(&self) -> &[RawCell] {
        &self.cells
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert a submitted form object. Strings and numbers map directly,
    /// `null` is absent, anything else is kept as its JSON text so that
    /// normalization reports it.
    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut row = RawRow::new();
        for (name, value) in object {
            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(RawValue::Text(s.clone())),
                Value::Number(n) => match n.as_f64() {
                    Some(f) => Some(RawValue::Number(f)),
                    None => Some(RawValue::Text(n.to_string())),
                },
                other => Some(RawValue::Text(other.to_string())),
            };
            row.set(name.clone(), value);
        }
        row
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for cell in &self.cells {
            map.serialize_entry(&cell.name, &cell.value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_replaces_in_place() {
        let mut row = RawRow::new().with("a", "1").with("b", "2");
        row.set("a", Some(RawValue::from("9")));
        assert_eq!(row.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some(&RawValue::Text("9".to_string())));
    }

    #[test]
    fn test_absent_cell_reads_as_none() {
        let row = RawRow::new().with_absent("a");
        assert_eq!(row.len(), 1);
        assert!(row.get("a").is_none());
        assert!(row.get("missing").is_none());
    }

    #[test]
    fn test_blank_detection() {
        assert!(RawValue::from("   ").is_blank());
        assert!(!RawValue::from("0").is_blank());
        assert!(!RawValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_number_display_round_trips() {
        assert_eq!(RawValue::Number(84.5).to_string(), "84.5");
        assert_eq!(RawValue::Number(1_400_000.0).to_string(), "1400000");
        assert_eq!(RawValue::Number(0.1).to_string(), "0.1");
    }

    #[test]
    fn test_from_json_object() {
        let payload = json!({
            "Country": "Kenya",
            "year": 2023,
            "rep_meth": null,
            "flag": true
        });
        let row = RawRow::from_json_object(payload.as_object().unwrap());
        assert_eq!(row.get("Country"), Some(&RawValue::from("Kenya")));
        assert_eq!(row.get("year"), Some(&RawValue::Number(2023.0)));
        assert!(row.get("rep_meth").is_none());
        assert_eq!(row.get("flag"), Some(&RawValue::from("true")));
    }

    #[test]
    fn test_serializes_as_map() {
        let row = RawRow::new().with("a", 1.5).with_absent("b");
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!({"a": 1.5, "b": null}));
    }
}
