//! Credential-rotating client for schema-validated Japanese practice sentences.
//!
//! The crate asks a Gemini-style structured-generation provider for a formal
//! and an informal sentence (with furigana, romaji, English and Vietnamese
//! meanings) and fails over across a pool of user-supplied API keys when a
//! call fails. The binary wraps the same API in a JSON-lines protocol.

pub mod config;
pub mod model;
pub mod protocol;
pub mod services;

pub use model::sentence::{GenerationResult, Sentence};
pub use services::client::{ContentGenerationClient, GenerationFailure};
pub use services::credential::is_well_formed as validate_format;
pub use services::provider::{GeminiProvider, GenerativeProvider, ProviderError};
pub use services::registry::CredentialError;
pub use services::rotation::{CredentialPool, ExhaustedPool, FallbackOrchestrator, RotationSuccess};
pub use services::session::{Session, SessionError};
pub use services::store::{FileSettingsStore, MemorySettingsStore, SettingsKey, SettingsStore};
