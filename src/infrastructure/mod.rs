pub mod config;
pub mod csv;
pub mod prediction_clients;
pub mod security;
