pub mod use_cases;

pub use use_cases::prediction_pipeline::{BatchReport, PredictionPipeline, SingleOutcome};
pub use use_cases::row_normalizer::RowNormalizer;
