pub mod prediction_pipeline;
pub mod result_joiner;
pub mod row_normalizer;
