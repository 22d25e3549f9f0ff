use super::{CredentialProvider, SessionStore};
use crate::domain::credential::Credential;
use crate::domain::error::{AppError, Result};
use keyring::Entry;
use tracing::warn;

/// Keyring entry the session token is stored under
pub const SESSION_TOKEN_KEY: &str = "session-token";

pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    pub fn set_secret(&self, key: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(&self.service, key)
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))?;

        entry
            .set_password(secret)
            .map_err(|e| AppError::SecurityError(format!("Failed to set password: {}", e)))?;

        Ok(())
    }

    /// `Ok(None)` when nothing is stored under `key`
    pub fn get_secret(&self, key: &str) -> Result<Option<String>> {
        let entry = Entry::new(&self.service, key)
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))?;

        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to get password: {}",
                e
            ))),
        }
    }

    pub fn delete_secret(&self, key: &str) -> Result<()> {
        let entry = Entry::new(&self.service, key)
            .map_err(|e| AppError::SecurityError(format!("Failed to create entry: {}", e)))?;

        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to delete password: {}",
                e
            ))),
        }
    }
}

/// Session token persisted in the OS keyring, written by `/api/session`
pub struct KeyringCredentialStore {
    keyring: KeyringManager,
}

impl KeyringCredentialStore {
    pub fn new(service: &str) -> Self {
        Self {
            keyring: KeyringManager::new(service),
        }
    }
}

impl SessionStore for KeyringCredentialStore {
    fn store(&self, credential: &Credential) -> Result<()> {
        self.keyring.set_secret(SESSION_TOKEN_KEY, credential.token())
    }

    fn clear(&self) -> Result<()> {
        self.keyring.delete_secret(SESSION_TOKEN_KEY)
    }
}

impl CredentialProvider for KeyringCredentialStore {
    fn current_credential(&self) -> Option<Credential> {
        match self.keyring.get_secret(SESSION_TOKEN_KEY) {
            Ok(token) => token.and_then(Credential::new),
            Err(err) => {
                warn!(error = %err, "Could not read session token from keyring");
                None
            }
        }
    }
}
