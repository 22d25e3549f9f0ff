pub mod keyring;

use crate::domain::credential::Credential;
use crate::domain::error::Result;

pub use self::keyring::{KeyringCredentialStore, KeyringManager};

/// Source of the bearer credential, consulted before every dispatch
pub trait CredentialProvider: Send + Sync {
    fn current_credential(&self) -> Option<Credential>;
}

/// Credential source the UI logs in to and out of
pub trait SessionStore: CredentialProvider {
    fn store(&self, credential: &Credential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Fixed credential, e.g. a token passed through the environment
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialProvider for StaticCredential {
    fn current_credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}
