use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::PredictionPipeline;
use crate::domain::error::{AppError, Result};
use crate::domain::schema::FeatureSchema;
use crate::infrastructure::config::ConfigService;
use crate::infrastructure::prediction_clients::HttpPredictionClient;
use crate::infrastructure::security::{
    CredentialProvider, KeyringCredentialStore, SessionStore, StaticCredential,
};
use crate::interfaces::http::{start_server, HttpState};

/// Environment variable holding a bearer token that bypasses the keyring
pub const TOKEN_ENV: &str = "TBPREDICT_API_TOKEN";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub async fn run() -> Result<()> {
    init_tracing();

    let config = ConfigService::new().load()?;
    let schema = Arc::new(FeatureSchema::tb_hiv()?);
    info!(fields = schema.len(), "Feature schema ready");

    let (credentials, sessions): (Arc<dyn CredentialProvider>, Option<Arc<dyn SessionStore>>) =
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                warn!("Using API token from {}, login disabled", TOKEN_ENV);
                (
                    Arc::new(StaticCredential::new(token)) as Arc<dyn CredentialProvider>,
                    None,
                )
            }
            _ => {
                let store = Arc::new(KeyringCredentialStore::new(&config.keyring_service));
                (
                    store.clone() as Arc<dyn CredentialProvider>,
                    Some(store as Arc<dyn SessionStore>),
                )
            }
        };

    let client = Arc::new(HttpPredictionClient::new(&config)?);
    let pipeline = PredictionPipeline::new(schema, &config, client, credentials);
    let mut state = HttpState::new(pipeline);
    if let Some(sessions) = sessions {
        state = state.with_sessions(sessions);
    }
    let state = web::Data::new(state);

    start_server(state, &config.bind_address, config.port)?
        .await
        .map_err(|e| AppError::IoError(format!("HTTP interface stopped: {}", e)))
}
