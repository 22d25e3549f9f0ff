pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

mod app;

pub use app::{init_tracing, run, TOKEN_ENV};
pub use domain::error::{AppError, Result};
