pub mod http;

use crate::domain::credential::Credential;
use crate::domain::error::Result;
use crate::domain::prediction::{FeatureVector, PredictionResult, PredictionValue};
use async_trait::async_trait;

pub use http::HttpPredictionClient;

/// Remote scoring of feature vectors.
///
/// `predict_batch` returns exactly one result per input, in input order.
/// Faults that affect the whole call are returned as `Err`; faults the
/// service attributes to one row come back as `PredictionResult::Error`
/// at that row's position.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict_one(
        &self,
        vector: &FeatureVector,
        credential: &Credential,
    ) -> Result<PredictionValue>;

    async fn predict_batch(
        &self,
        vectors: &[FeatureVector],
        credential: &Credential,
    ) -> Result<Vec<PredictionResult>>;
}
