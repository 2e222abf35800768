use serde_json::Value;
use thiserror::Error;

use crate::config::CoreConfig;
use crate::model::sentence::{GenerationResult, Sentence};
use crate::services::provider::{GenerativeProvider, ProviderError};
use crate::services::request::GenerationRequest;
use crate::services::schema;

const LIVENESS_PROMPT: &str = "Return true";

/// Why a single attempt against a single credential failed.
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Invalid JSON from provider: {0}")]
    InvalidJson(String),

    #[error("provider response is not an array")]
    NotAnArray,

    #[error("invalid sentence at index {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("liveness check returned a non-boolean value: {0}")]
    NotABoolean(String),
}

pub struct ContentGenerationClient<P> {
    provider: P,
    generation_model: String,
    liveness_model: String,
}

impl<P: GenerativeProvider> ContentGenerationClient<P> {
    pub fn new(
        provider: P,
        generation_model: impl Into<String>,
        liveness_model: impl Into<String>,
    ) -> Self {
        ContentGenerationClient {
            provider,
            generation_model: generation_model.into(),
            liveness_model: liveness_model.into(),
        }
    }

    pub fn from_config(provider: P, cfg: &CoreConfig) -> Self {
        Self::new(provider, cfg.generation_model.clone(), cfg.liveness_model.clone())
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn generate(
        &self,
        credential: &str,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, GenerationFailure> {
        let text = self.provider.generate_structured(
            credential,
            &self.generation_model,
            &request.instruction,
            &request.schema,
        )?;

        parse_sentence_pair(&text)
    }

    /// One-shot round trip; `Ok(false)` means the provider answered but said no.
    pub fn check_live(&self, credential: &str) -> Result<bool, GenerationFailure> {
        let text = self.provider.generate_structured(
            credential,
            &self.liveness_model,
            LIVENESS_PROMPT,
            &schema::liveness_schema(),
        )?;

        let value: Value = serde_json::from_str(text.trim())
            .map_err(|e| GenerationFailure::InvalidJson(e.to_string()))?;

        value
            .as_bool()
            .ok_or_else(|| GenerationFailure::NotABoolean(value.to_string()))
    }
}

/// Validates a provider payload and maps items 0 and 1 onto formal/informal.
/// Missing slots keep the built-in example; anything present must be a full sentence.
pub fn parse_sentence_pair(text: &str) -> Result<GenerationResult, GenerationFailure> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| GenerationFailure::InvalidJson(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        _ => return Err(GenerationFailure::NotAnArray),
    };

    let mut result = GenerationResult::default();

    let mut slots = items.into_iter().take(2).enumerate();
    if let Some((index, item)) = slots.next() {
        result.formal = parse_item(index, item)?;
    }
    if let Some((index, item)) = slots.next() {
        result.informal = parse_item(index, item)?;
    }

    Ok(result)
}

fn parse_item(index: usize, item: Value) -> Result<Sentence, GenerationFailure> {
    let sentence: Sentence = serde_json::from_value(item).map_err(|e| {
        GenerationFailure::InvalidItem {
            index,
            reason: e.to_string(),
        }
    })?;

    if sentence.en_meaning.trim().is_empty() {
        return Err(GenerationFailure::InvalidItem {
            index,
            reason: "en_meaning is empty".to_string(),
        });
    }

    Ok(sentence)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::sentence::example_sentences;
    use crate::services::request;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Provider double: per-credential canned answers, records every call.
    #[derive(Default)]
    pub struct ScriptedProvider {
        replies: HashMap<String, Result<String, u16>>,
        pub calls: RefCell<Vec<(String, String)>>,
        pub prompts: RefCell<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, credential: &str, text: impl Into<String>) -> Self {
            self.replies.insert(credential.to_string(), Ok(text.into()));
            self
        }

        pub fn fail(mut self, credential: &str, status: u16) -> Self {
            self.replies.insert(credential.to_string(), Err(status));
            self
        }

        pub fn credentials_called(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.borrow().clone()
        }
    }

    impl GenerativeProvider for ScriptedProvider {
        fn generate_structured(
            &self,
            credential: &str,
            model: &str,
            prompt: &str,
            _schema: &Value,
        ) -> Result<String, ProviderError> {
            self.calls
                .borrow_mut()
                .push((credential.to_string(), model.to_string()));
            self.prompts.borrow_mut().push(prompt.to_string());

            match self.replies.get(credential) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(status)) => Err(ProviderError::Status {
                    status: *status,
                    message: "scripted failure".to_string(),
                }),
                None => Err(ProviderError::Status {
                    status: 400,
                    message: "API key not valid".to_string(),
                }),
            }
        }
    }

    pub fn sentence(tag: &str) -> Sentence {
        Sentence {
            content: format!("{tag}の文です。"),
            furigana: format!("{tag}のぶんです。"),
            romaji: format!("{tag} no bun desu."),
            en_meaning: format!("It is the {tag} sentence."),
            vn_meaning: format!("Đây là câu {tag}."),
        }
    }

    pub fn payload(items: &[Sentence]) -> String {
        serde_json::to_string(items).unwrap()
    }

    fn client(provider: ScriptedProvider) -> ContentGenerationClient<ScriptedProvider> {
        ContentGenerationClient::new(provider, "gen-model", "live-model")
    }

    #[test]
    fn two_items_map_to_formal_and_informal() {
        let (a, b) = (sentence("a"), sentence("b"));
        let result = parse_sentence_pair(&payload(&[a.clone(), b.clone()])).unwrap();
        assert_eq!(result.formal, a);
        assert_eq!(result.informal, b);
    }

    #[test]
    fn missing_slots_fall_back_to_examples() {
        let [ex_formal, ex_informal] = example_sentences();

        let empty = parse_sentence_pair("[]").unwrap();
        assert_eq!(empty.formal, ex_formal);
        assert_eq!(empty.informal, ex_informal);

        let a = sentence("a");
        let one = parse_sentence_pair(&payload(&[a.clone()])).unwrap();
        assert_eq!(one.formal, a);
        assert_eq!(one.informal, ex_informal);
    }

    #[test]
    fn extra_items_are_ignored() {
        let items = [sentence("a"), sentence("b"), sentence("c")];
        let result = parse_sentence_pair(&payload(&items)).unwrap();
        assert_eq!(result.informal, items[1]);
    }

    #[test]
    fn unparsable_payloads_are_failures() {
        assert!(matches!(
            parse_sentence_pair(r#"[{"content": "途中"#),
            Err(GenerationFailure::InvalidJson(_))
        ));
        assert!(matches!(
            parse_sentence_pair(r#"{"content":"x"}"#),
            Err(GenerationFailure::NotAnArray)
        ));
        assert!(matches!(
            parse_sentence_pair("true"),
            Err(GenerationFailure::NotAnArray)
        ));
    }

    #[test]
    fn present_but_malformed_items_are_rejected() {
        let missing = json!([sentence("a"), { "content": "x", "furigana": "x", "romaji": "x", "vn_meaning": "x" }]);
        match parse_sentence_pair(&missing.to_string()) {
            Err(GenerationFailure::InvalidItem { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("en_meaning"));
            }
            other => panic!("unexpected: {other:?}"),
        }

        let mut blank = sentence("a");
        blank.en_meaning = " ".to_string();
        assert!(matches!(
            parse_sentence_pair(&payload(&[blank])),
            Err(GenerationFailure::InvalidItem { index: 0, .. })
        ));

        let wrong_type = json!([{ "content": 1, "furigana": "x", "romaji": "x", "vn_meaning": "x", "en_meaning": "x" }]);
        assert!(parse_sentence_pair(&wrong_type.to_string()).is_err());
    }

    #[test]
    fn generate_uses_generation_model() {
        let (a, b) = (sentence("a"), sentence("b"));
        let c = client(ScriptedProvider::new().reply("k1", payload(&[a.clone(), b])));

        let result = c.generate("k1", &request::build(&[])).unwrap();
        assert_eq!(result.formal, a);
        assert_eq!(
            c.provider().calls.borrow()[0],
            ("k1".to_string(), "gen-model".to_string())
        );
    }

    #[test]
    fn generate_surfaces_provider_errors() {
        let c = client(ScriptedProvider::new().fail("k1", 503));
        let err = c.generate("k1", &request::build(&[])).unwrap_err();
        assert!(matches!(
            err,
            GenerationFailure::Provider(ProviderError::Status { status: 503, .. })
        ));
    }

    #[test]
    fn check_live_reads_a_boolean() {
        let c = client(
            ScriptedProvider::new()
                .reply("yes", "true")
                .reply("no", " false\n")
                .reply("odd", r#""true""#)
                .reply("junk", "tru"),
        );

        assert!(c.check_live("yes").unwrap());
        assert!(!c.check_live("no").unwrap());
        assert!(matches!(c.check_live("odd"), Err(GenerationFailure::NotABoolean(_))));
        assert!(matches!(c.check_live("junk"), Err(GenerationFailure::InvalidJson(_))));
        assert!(matches!(c.check_live("unknown"), Err(GenerationFailure::Provider(_))));
        assert!(c
            .provider()
            .calls
            .borrow()
            .iter()
            .all(|(_, model)| model == "live-model"));
    }
}
