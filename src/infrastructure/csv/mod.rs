// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Upload parsing, encoding detection and result export

mod csv_parser;
mod result_exporter;

pub use csv_parser::{decode_document, TabularParser};
pub use result_exporter::{ResultExporter, ERROR_COLUMN, PREDICTION_COLUMN};
