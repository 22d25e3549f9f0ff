// ============================================================
// RESULT EXPORTER
// ============================================================
// Serialize joined records back to delimited text for download

use csv::WriterBuilder;

use crate::domain::error::{AppError, Result};
use crate::domain::prediction::JoinedRecord;

pub const PREDICTION_COLUMN: &str = "prediction";
pub const ERROR_COLUMN: &str = "error";

pub struct ResultExporter {
    delimiter: u8,

    /// Written to the prediction column of failed rows
    error_marker: String,
}

impl Default for ResultExporter {
    fn default() -> Self {
        Self {
            delimiter: b',',
            error_marker: "ERROR".to_string(),
        }
    }
}

impl ResultExporter {
    pub fn new(error_marker: impl Into<String>) -> Self {
        Self {
            error_marker: error_marker.into(),
            ..Self::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Header is every raw column in first-seen order followed by the
    /// prediction and error columns. Rows keep the order they were given in.
    /// A raw column already named `prediction` or `error` is kept, and the
    /// added column takes a numeric suffix instead.
    pub fn export(&self, records: &[JoinedRecord]) -> Result<String> {
        let columns = raw_columns(records);

        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        let prediction_column = unused_name(PREDICTION_COLUMN, &columns);
        let error_column = unused_name(ERROR_COLUMN, &columns);
        let mut header: Vec<&str> = columns.iter().map(String::as_str).collect();
        header.push(&prediction_column);
        header.push(&error_column);
        writer.write_record(&header)?;

        for record in records {
            let mut line: Vec<String> = columns
                .iter()
                .map(|name| {
                    record
                        .raw
                        .get(name)
                        .map(|value| value.to_string())
                        .unwrap_or_default()
                })
                .collect();

            match (record.prediction(), record.error_message()) {
                (Some(prediction), _) => {
                    line.push(prediction.coverage().to_string());
                    line.push(String::new());
                }
                (None, message) => {
                    line.push(self.error_marker.clone());
                    line.push(message.unwrap_or_else(|| self.error_marker.clone()));
                }
            }

            writer.write_record(&line)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("Failed to flush export: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("Export is not valid UTF-8: {}", e)))
    }
}

fn raw_columns(records: &[JoinedRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.raw.field_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

fn unused_name(base: &str, columns: &[String]) -> String {
    let taken = |name: &str| columns.iter().any(|c| c == name);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{}_{}", base, n))
        .find(|name| !taken(name))
        .unwrap_or_else(|| base.to_string())
}
