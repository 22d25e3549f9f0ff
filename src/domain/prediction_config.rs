use serde::{Deserialize, Serialize};
use validator::Validate;

use super::error::AppError;

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct PredictionConfig {
    /// Base URL of the remote prediction service
    #[validate(url)]
    pub api_base_url: String,
    #[validate(length(min = 1))]
    pub predict_path: String,
    #[validate(length(min = 1))]
    pub batch_path: String,
    /// Transport timeout; the HTTP client default applies when unset
    #[validate(range(min = 1))]
    pub request_timeout_secs: Option<u64>,
    /// Upload delimiter; detected from the document when unset
    pub delimiter: Option<char>,
    /// Written to the prediction column of rows that failed
    #[validate(length(min = 1))]
    pub error_marker: String,
    #[validate(length(min = 1))]
    pub export_filename: String,
    pub bind_address: String,
    pub port: u16,
    pub keyring_service: String,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            predict_path: "predict".to_string(),
            batch_path: "batch_predict".to_string(),
            request_timeout_secs: None,
            delimiter: None,
            error_marker: "ERROR".to_string(),
            export_filename: "tb_predictions.csv".to_string(),
            bind_address: "127.0.0.1".to_string(),
            port: 4020,
            keyring_service: "TbHivPredict".to_string(),
        }
    }
}

impl PredictionConfig {
    /// Only single-byte ASCII delimiters that cannot be confused with
    /// quoting or line breaks are accepted.
    pub fn check_delimiter(&self) -> super::error::Result<()> {
        match self.delimiter {
            Some(c) if !c.is_ascii() || matches!(c, '"' | '\n' | '\r') => Err(
                AppError::ConfigError(format!("Unsupported delimiter: {:?}", c)),
            ),
            _ => Ok(()),
        }
    }

    /// Delimiter as a byte, if configured. Only ASCII delimiters are supported.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(char::is_ascii).map(|c| c as u8)
    }
}
