// ============================================================
// PREDICTION TYPES
// ============================================================
// Feature vectors, per-row outcomes and joined records

use serde::{Deserialize, Serialize};

use super::risk::RiskAssessment;
use super::row::RawRow;

/// Numeric model input in schema order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A row that could not be turned into a feature vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    pub raw: RawRow,
    /// Schema fields that were missing or unparseable, in schema order
    pub invalid_fields: Vec<String>,
}

impl RowError {
    pub fn describe(&self) -> String {
        format!("missing or invalid: {}", self.invalid_fields.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedRow {
    Features(FeatureVector),
    Invalid(RowError),
}

impl NormalizedRow {
    pub fn is_features(&self) -> bool {
        matches!(self, NormalizedRow::Features(_))
    }

    pub fn features(&self) -> Option<&FeatureVector> {
        match self {
            NormalizedRow::Features(vector) => Some(vector),
            NormalizedRow::Invalid(_) => None,
        }
    }
}

/// Predicted ART coverage, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionValue(pub f64);

impl PredictionValue {
    pub fn coverage(&self) -> f64 {
        self.0
    }

    pub fn assess(&self) -> RiskAssessment {
        RiskAssessment::from_coverage(self.0)
    }
}

/// Failure attributed to a single row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionError {
    /// Zero-based position of the originating row
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionResult {
    Value { prediction: PredictionValue },
    Error(PredictionError),
}

impl PredictionResult {
    pub fn value(prediction: f64) -> Self {
        PredictionResult::Value {
            prediction: PredictionValue(prediction),
        }
    }

    pub fn error(row: usize, message: impl Into<String>) -> Self {
        PredictionResult::Error(PredictionError {
            row,
            message: message.into(),
        })
    }

    pub fn is_value(&self) -> bool {
        matches!(self, PredictionResult::Value { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Prediction { prediction: PredictionValue },
    NormalizationError { invalid_fields: Vec<String> },
    PredictionError(PredictionError),
}

/// A source row paired with its final outcome
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub raw: RawRow,
    pub outcome: Outcome,
}

impl JoinedRecord {
    pub fn is_error(&self) -> bool {
        !matches!(self.outcome, Outcome::Prediction { .. })
    }

    pub fn prediction(&self) -> Option<PredictionValue> {
        match self.outcome {
            Outcome::Prediction { prediction } => Some(prediction),
            _ => None,
        }
    }

    /// Human readable reason for error records
    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            Outcome::Prediction { .. } => None,
            Outcome::NormalizationError { invalid_fields } => Some(format!(
                "missing or invalid: {}",
                invalid_fields.join(", ")
            )),
            Outcome::PredictionError(err) => Some(err.message.clone()),
        }
    }
}
