use thiserror::Error;

use crate::config::CoreConfig;
use crate::model::sentence::GenerationResult;
use crate::services::client::{ContentGenerationClient, GenerationFailure};
use crate::services::credential::fingerprint;
use crate::services::provider::GenerativeProvider;
use crate::services::registry::{self, CredentialError};
use crate::services::rotation::{CredentialPool, ExhaustedPool, FallbackOrchestrator, RotationSuccess};
use crate::services::store::{self, SettingsStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Exhausted(#[from] ExhaustedPool),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Application-lifetime state: the active credential and the last good pair.
/// Refreshes are serialized by `&mut self`.
pub struct Session<P, S> {
    client: ContentGenerationClient<P>,
    store: S,
    extra: Vec<String>,
    active: Option<String>,
    current: GenerationResult,
}

impl<P: GenerativeProvider, S: SettingsStore> Session<P, S> {
    pub fn start(
        client: ContentGenerationClient<P>,
        store: S,
        extra: Vec<String>,
    ) -> Result<Self, StoreError> {
        let persisted = registry::sanitize_persisted(&store)?;
        let active = registry::choose_active(&persisted, &CredentialPool::new(extra.iter().cloned()));

        match &active {
            Some(c) => tracing::info!(credential = %fingerprint(c), "session started"),
            None => tracing::warn!("session started without any credential"),
        }

        Ok(Session {
            client,
            store,
            extra,
            active,
            current: GenerationResult::default(),
        })
    }

    pub fn from_config(provider: P, store: S, cfg: &CoreConfig) -> Result<Self, StoreError> {
        let client = ContentGenerationClient::from_config(provider, cfg);
        Self::start(client, store, cfg.extra_credentials.clone())
    }

    /// Persisted credentials followed by configured extras.
    pub fn pool(&self) -> Result<CredentialPool, StoreError> {
        let persisted = store::load_credentials(&self.store)?;
        Ok(CredentialPool::new(
            persisted.into_iter().chain(self.extra.iter().cloned()),
        ))
    }

    /// One rotation cycle. With `topics == None` the saved topics are used.
    /// On exhaustion `current()` keeps the last good pair.
    pub fn refresh(&mut self, topics: Option<&[String]>) -> Result<RotationSuccess, SessionError> {
        let saved;
        let topics = match topics {
            Some(t) => t,
            None => {
                saved = store::load_topics(&self.store)?;
                &saved[..]
            }
        };

        let pool = self.pool()?;
        let outcome = FallbackOrchestrator::new(&self.client).generate_from(
            &pool,
            self.active.as_deref(),
            topics,
        )?;

        self.active = Some(outcome.credential.clone());
        self.current = outcome.result.clone();
        Ok(outcome)
    }

    /// Admits a new credential; on success it becomes the active one.
    pub fn add_credential(&mut self, token: &str) -> Result<String, CredentialError> {
        let known = CredentialPool::new(self.extra.iter().cloned());
        let stored = registry::admit(&self.store, &self.client, &known, token)?;
        self.active = Some(stored.clone());
        Ok(stored)
    }

    pub fn check_live(&self, token: &str) -> Result<bool, GenerationFailure> {
        self.client.check_live(token)
    }

    pub fn current(&self) -> &GenerationResult {
        &self.current
    }

    pub fn active_credential(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &ContentGenerationClient<P> {
        &self.client
    }
}
