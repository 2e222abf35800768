use thiserror::Error;

use crate::services::client::ContentGenerationClient;
use crate::services::credential::{self, fingerprint};
use crate::services::provider::GenerativeProvider;
use crate::services::rotation::CredentialPool;
use crate::services::store::{self, SettingsStore, StoreError};

/// Outcome of adding a credential. Each variant maps to its own user message.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid key format")]
    Malformed,

    #[error("Key already exists")]
    Duplicate,

    #[error("Key was rejected by the provider: {0}")]
    Rejected(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CredentialError {
    pub fn code(&self) -> &'static str {
        match self {
            CredentialError::Malformed => "malformed",
            CredentialError::Duplicate => "duplicate",
            CredentialError::Rejected(_) => "rejected",
            CredentialError::Store(_) => "store",
        }
    }
}

/// Drops malformed and repeated entries from the persisted list and writes
/// the cleaned list back. Returns it in insertion order. A value that is not
/// a list at all is replaced by an empty one.
pub fn sanitize_persisted(store: &dyn SettingsStore) -> Result<Vec<String>, StoreError> {
    let saved = match store::load_credentials(store) {
        Ok(saved) => saved,
        Err(e @ StoreError::Json { .. }) => {
            tracing::warn!(error = %e, "persisted credential list unreadable, starting empty");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let mut valid: Vec<String> = Vec::with_capacity(saved.len());
    for k in saved.iter() {
        if credential::is_well_formed(k) && !valid.contains(k) {
            valid.push(k.clone());
        }
    }

    if valid.len() != saved.len() {
        tracing::info!(
            dropped = saved.len() - valid.len(),
            kept = valid.len(),
            "cleaned persisted credential list"
        );
    }

    store::save_credentials(store, &valid)?;
    Ok(valid)
}

/// Most recently added persisted credential, else the first pool entry.
pub fn choose_active(persisted: &[String], pool: &CredentialPool) -> Option<String> {
    persisted
        .last()
        .cloned()
        .or_else(|| pool.first().map(str::to_string))
}

/// Format check, duplicate check, liveness round trip, then persist.
/// Returns the normalized credential that was stored.
pub fn admit<P: GenerativeProvider>(
    store: &dyn SettingsStore,
    client: &ContentGenerationClient<P>,
    known: &CredentialPool,
    token: &str,
) -> Result<String, CredentialError> {
    let token = credential::normalize(token);

    if !credential::is_well_formed(&token) {
        return Err(CredentialError::Malformed);
    }

    let mut saved = store::load_credentials(store)?;
    if known.contains(&token) || saved.contains(&token) {
        return Err(CredentialError::Duplicate);
    }

    let fp = fingerprint(&token);
    match client.check_live(&token) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(credential = %fp, "provider answered false to liveness check");
            return Err(CredentialError::Rejected("liveness check returned false".to_string()));
        }
        Err(e) => {
            tracing::warn!(credential = %fp, error = %e, "liveness check failed");
            return Err(CredentialError::Rejected(e.to_string()));
        }
    }

    saved.push(token.clone());
    store::save_credentials(store, &saved)?;

    tracing::info!(credential = %fp, total = saved.len(), "credential added");
    Ok(token)
}
