// ============================================================
// PREDICTION PIPELINE USE CASE
// ============================================================
// Single submission: normalize -> predict
// Batch upload:      parse -> normalize -> predict -> join -> export

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::result_joiner;
use super::row_normalizer::RowNormalizer;
use crate::domain::credential::Credential;
use crate::domain::error::{AppError, Result};
use crate::domain::prediction::{FeatureVector, JoinedRecord, NormalizedRow, PredictionValue};
use crate::domain::prediction_config::PredictionConfig;
use crate::domain::risk::RiskAssessment;
use crate::domain::row::RawRow;
use crate::domain::schema::FeatureSchema;
use crate::infrastructure::csv::{ResultExporter, TabularParser};
use crate::infrastructure::prediction_clients::PredictionClient;
use crate::infrastructure::security::CredentialProvider;

/// Result of a single form submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SingleOutcome {
    Predicted {
        prediction: PredictionValue,
        risk: RiskAssessment,
    },
    Invalid {
        invalid_fields: Vec<String>,
    },
}

/// Result of a batch upload
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub filename: String,
    pub total: usize,
    pub predicted: usize,
    pub normalization_failures: usize,
    pub prediction_failures: usize,
    /// Set when the batch call itself failed; every dispatched row then
    /// carries this message as its prediction error
    pub dispatch_error: Option<String>,
    pub records: Vec<JoinedRecord>,
    /// Exported delimited text, ready for download
    #[serde(skip)]
    pub document: String,
}

pub struct PredictionPipeline {
    normalizer: RowNormalizer,
    parser: TabularParser,
    exporter: ResultExporter,
    client: Arc<dyn PredictionClient>,
    credentials: Arc<dyn CredentialProvider>,
    export_filename: String,
}

impl PredictionPipeline {
    pub fn new(
        schema: Arc<FeatureSchema>,
        config: &PredictionConfig,
        client: Arc<dyn PredictionClient>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let mut parser = TabularParser::new();
        let mut exporter = ResultExporter::new(config.error_marker.clone());
        if let Some(delimiter) = config.delimiter_byte() {
            parser = parser.with_delimiter(delimiter);
            exporter = exporter.with_delimiter(delimiter);
        }

        Self {
            normalizer: RowNormalizer::new(schema),
            parser,
            exporter,
            client,
            credentials,
            export_filename: config.export_filename.clone(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.normalizer.schema()
    }

    pub fn has_credential(&self) -> bool {
        self.credentials.current_credential().is_some()
    }

    fn credential(&self) -> Result<Credential> {
        self.credentials.current_credential().ok_or_else(|| {
            AppError::Unauthorized("Please log in to make predictions".to_string())
        })
    }

    /// Score one manually entered row. A row that fails normalization is
    /// reported as `Invalid` without contacting the service.
    pub async fn predict_single(&self, raw: &RawRow) -> Result<SingleOutcome> {
        let credential = self.credential()?;

        let vector = match self.normalizer.normalize(raw) {
            NormalizedRow::Features(vector) => vector,
            NormalizedRow::Invalid(err) => {
                info!(invalid = err.invalid_fields.len(), "Form submission incomplete");
                return Ok(SingleOutcome::Invalid {
                    invalid_fields: err.invalid_fields,
                });
            }
        };

        let prediction = self
            .client
            .predict_one(&vector, &credential)
            .await
            .map_err(|err| {
                warn!(error = %err, "Single prediction failed");
                err
            })?;

        info!(coverage = prediction.coverage(), "Single prediction completed");
        Ok(SingleOutcome::Predicted {
            prediction,
            risk: prediction.assess(),
        })
    }

    /// Parse an uploaded document and score every row
    pub async fn predict_document(&self, document: &[u8]) -> Result<BatchReport> {
        // Credential is checked before the upload is even parsed
        self.credential()?;
        let rows = self.parser.parse_bytes(document)?;
        self.predict_rows(rows).await
    }

    /// Score already parsed rows, keeping one record per row in order
    pub async fn predict_rows(&self, rows: Vec<RawRow>) -> Result<BatchReport> {
        let run_id = Uuid::new_v4();
        let credential = self.credential()?;

        let normalized = self.normalizer.normalize_all(&rows);
        let vectors: Vec<FeatureVector> = normalized
            .iter()
            .filter_map(|n| n.features().cloned())
            .collect();

        info!(
            %run_id,
            rows = rows.len(),
            dispatched = vectors.len(),
            "Starting batch prediction"
        );

        let mut dispatch_error = None;
        let predictions = if vectors.is_empty() {
            Vec::new()
        } else {
            match self.client.predict_batch(&vectors, &credential).await {
                Ok(predictions) => predictions,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(%run_id, error = %err, "Batch dispatch failed");
                    let message = err.to_string();
                    let failures = result_joiner::dispatch_failure(&normalized, &message);
                    dispatch_error = Some(message);
                    failures
                }
            }
        };

        let records = result_joiner::join(&rows, &normalized, predictions)?;
        let document = self.exporter.export(&records)?;

        let normalization_failures = normalized.len() - vectors.len();
        let predicted = records.iter().filter(|r| !r.is_error()).count();
        let report = BatchReport {
            run_id,
            generated_at: Utc::now(),
            filename: self.export_filename.clone(),
            total: records.len(),
            predicted,
            normalization_failures,
            prediction_failures: records.len() - predicted - normalization_failures,
            dispatch_error,
            records,
            document,
        };

        info!(
            %run_id,
            total = report.total,
            predicted = report.predicted,
            normalization_failures = report.normalization_failures,
            prediction_failures = report.prediction_failures,
            "Batch prediction completed"
        );
        Ok(report)
    }
}
