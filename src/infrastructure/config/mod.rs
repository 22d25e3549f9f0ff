use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::{debug, info};
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::prediction_config::PredictionConfig;

pub const CONFIG_FILE: &str = "tbpredict.toml";
pub const ENV_PREFIX: &str = "TBPREDICT_";

/// Layered configuration: defaults, then `tbpredict.toml`, then
/// `TBPREDICT_*` environment variables (a `.env` file is loaded first).
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_path(CONFIG_FILE)
    }

    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<PredictionConfig> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env"),
            Err(err) if err.not_found() => {}
            Err(err) => {
                return Err(AppError::ConfigError(format!("Failed to read .env: {}", err)))
            }
        }

        self.load_from(self.figment().merge(Env::prefixed(ENV_PREFIX)))
    }

    fn figment(&self) -> Figment {
        Figment::from(Serialized::defaults(PredictionConfig::default()))
            .merge(Toml::file(&self.path))
    }

    fn load_from(&self, figment: Figment) -> Result<PredictionConfig> {
        let config: PredictionConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;

        config
            .validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.check_delimiter()?;

        info!(
            api_base_url = %config.api_base_url,
            config_file = %self.path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
