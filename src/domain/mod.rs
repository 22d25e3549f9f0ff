// ============================================================
// DOMAIN LAYER
// ============================================================
// Core types and value objects for the prediction pipeline
// No I/O, no async

pub mod credential;
pub mod error;
pub mod prediction;
pub mod prediction_config;
pub mod risk;
pub mod row;
pub mod sample;
pub mod schema;
