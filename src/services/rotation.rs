use std::collections::HashSet;

use thiserror::Error;

use crate::model::sentence::GenerationResult;
use crate::services::client::ContentGenerationClient;
use crate::services::credential::fingerprint;
use crate::services::provider::GenerativeProvider;
use crate::services::request;
use crate::services::rotation_types::RotationReport;

/// Ordered, duplicate-free set of credentials for one rotation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialPool {
    credentials: Vec<String>,
}

impl CredentialPool {
    pub fn new<I, S>(credentials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for c in credentials {
            let c = c.into();
            if !c.is_empty() && !out.contains(&c) {
                out.push(c);
            }
        }
        CredentialPool { credentials: out }
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.credentials.iter()
    }

    pub fn first(&self) -> Option<&str> {
        self.credentials.first().map(String::as_str)
    }

    pub fn contains(&self, credential: &str) -> bool {
        self.credentials.iter().any(|c| c == credential)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationState {
    Trying(String),
    Succeeded {
        credential: String,
        result: GenerationResult,
    },
    Exhausted,
}

/// State of one top-level request. A fresh cycle starts with nothing tried.
#[derive(Debug)]
pub struct RotationCycle<'a> {
    pool: &'a CredentialPool,
    tried: HashSet<String>,
    state: RotationState,
}

impl<'a> RotationCycle<'a> {
    pub fn start(pool: &'a CredentialPool, active: Option<&str>) -> Self {
        let state = match active.filter(|c| !c.is_empty()).or_else(|| pool.first()) {
            Some(c) => RotationState::Trying(c.to_string()),
            None => RotationState::Exhausted,
        };

        RotationCycle {
            pool,
            tried: HashSet::new(),
            state,
        }
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn was_tried(&self, credential: &str) -> bool {
        self.tried.contains(credential)
    }

    fn succeed(&mut self, result: GenerationResult) {
        if let RotationState::Trying(c) = &self.state {
            self.state = RotationState::Succeeded {
                credential: c.clone(),
                result,
            };
        }
    }

    fn fail(&mut self) {
        let current = match &self.state {
            RotationState::Trying(c) => c.clone(),
            _ => return,
        };

        self.tried.insert(current.clone());

        let next = self
            .pool
            .iter()
            .find(|c| **c != current && !self.tried.contains(c.as_str()));

        self.state = match next {
            Some(c) => RotationState::Trying(c.clone()),
            None => RotationState::Exhausted,
        };
    }
}

#[derive(Debug, Clone)]
pub struct RotationSuccess {
    pub result: GenerationResult,
    /// The credential that produced `result`; callers keep it as the active one.
    pub credential: String,
    pub report: RotationReport,
}

#[derive(Debug, Error)]
#[error("every credential failed ({} attempts)", .report.attempt_count())]
pub struct ExhaustedPool {
    pub report: RotationReport,
}

pub struct FallbackOrchestrator<'c, P> {
    client: &'c ContentGenerationClient<P>,
}

impl<'c, P: GenerativeProvider> FallbackOrchestrator<'c, P> {
    pub fn new(client: &'c ContentGenerationClient<P>) -> Self {
        FallbackOrchestrator { client }
    }

    /// Rotates through `pool` starting from its first credential.
    pub fn generate_sentence_pair(
        &self,
        pool: &CredentialPool,
        topics: &[String],
    ) -> Result<RotationSuccess, ExhaustedPool> {
        self.generate_from(pool, None, topics)
    }

    /// Rotates through `pool` starting from `active`, which may sit outside the pool.
    pub fn generate_from(
        &self,
        pool: &CredentialPool,
        active: Option<&str>,
        topics: &[String],
    ) -> Result<RotationSuccess, ExhaustedPool> {
        let mut cycle = RotationCycle::start(pool, active);
        let mut report = RotationReport::default();

        while let RotationState::Trying(credential) = cycle.state() {
            let credential = credential.clone();
            let fp = fingerprint(&credential);
            let req = request::build(topics);

            match self.client.generate(&credential, &req) {
                Ok(result) => {
                    report.record_success(fp);
                    cycle.succeed(result);
                }
                Err(err) => {
                    tracing::warn!(credential = %fp, error = %err, "generation attempt failed, rotating");
                    report.record_failure(fp, err.to_string());
                    cycle.fail();
                }
            }
        }

        match cycle.state {
            RotationState::Succeeded { credential, result } => {
                tracing::info!(
                    credential = %fingerprint(&credential),
                    attempts = report.attempt_count(),
                    "sentence pair generated"
                );
                Ok(RotationSuccess {
                    result,
                    credential,
                    report,
                })
            }
            _ => {
                tracing::error!(attempts = report.attempt_count(), "credential pool exhausted");
                Err(ExhaustedPool { report })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::tests::{payload, sentence, ScriptedProvider};
    use proptest::prelude::*;

    fn key(tag: char) -> String {
        format!("AIza{}", tag.to_string().repeat(35))
    }

    fn client(provider: ScriptedProvider) -> ContentGenerationClient<ScriptedProvider> {
        ContentGenerationClient::new(provider, "gen", "live")
    }

    #[test]
    fn pool_keeps_order_and_drops_duplicates() {
        let pool = CredentialPool::new(["b", "a", "b", "", "c"]);
        let keys: Vec<&String> = pool.iter().collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(pool.first(), Some("b"));
        assert!(pool.contains("a"));
        assert!(!pool.contains(""));
    }

    #[test]
    fn second_credential_rescues_the_request() {
        let (a, b) = (key('A'), key('B'));
        let (formal, informal) = (sentence("f"), sentence("i"));
        let c = client(
            ScriptedProvider::new()
                .fail(&a, 429)
                .reply(&b, payload(&[formal.clone(), informal.clone()])),
        );
        let pool = CredentialPool::new([a.clone(), b.clone()]);

        let ok = FallbackOrchestrator::new(&c)
            .generate_sentence_pair(&pool, &["Food".to_string()])
            .unwrap();

        assert_eq!(ok.result.formal, formal);
        assert_eq!(ok.result.informal, informal);
        assert_eq!(ok.credential, b);
        assert_eq!(ok.report.attempt_count(), 2);
        assert_eq!(ok.report.failed, 1);
        assert_eq!(c.provider().credentials_called(), vec![a, b]);

        // every attempt gets a freshly built request carrying the topics
        let prompts = c.provider().prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("random topics from: Food.")));
    }

    #[test]
    fn unparsable_response_counts_as_failure() {
        let (a, b) = (key('A'), key('B'));
        let c = client(
            ScriptedProvider::new()
                .reply(&a, "[{\"content\":")
                .reply(&b, payload(&[sentence("x")])),
        );
        let pool = CredentialPool::new([a, b.clone()]);

        let ok = FallbackOrchestrator::new(&c)
            .generate_sentence_pair(&pool, &[])
            .unwrap();
        assert_eq!(ok.credential, b);
        assert!(ok.report.attempts[0]
            .error
            .as_deref()
            .is_some_and(|e| e.contains("Invalid JSON")));
    }

    #[test]
    fn active_outside_pool_is_tried_first() {
        let (outside, a) = (key('O'), key('A'));
        let c = client(ScriptedProvider::new().fail(&outside, 500).fail(&a, 500));
        let pool = CredentialPool::new([a.clone()]);

        let err = FallbackOrchestrator::new(&c)
            .generate_from(&pool, Some(&outside), &[])
            .unwrap_err();
        assert_eq!(err.report.attempt_count(), 2);
        assert_eq!(c.provider().credentials_called(), vec![outside, a]);
    }

    #[test]
    fn active_in_pool_is_not_repeated() {
        let (a, b, c_key) = (key('A'), key('B'), key('C'));
        let c = client(ScriptedProvider::new());
        let pool = CredentialPool::new([a.clone(), b.clone(), c_key.clone()]);

        let err = FallbackOrchestrator::new(&c)
            .generate_from(&pool, Some(&b), &[])
            .unwrap_err();
        assert_eq!(err.report.attempt_count(), 3);
        assert_eq!(c.provider().credentials_called(), vec![b, a, c_key]);
    }

    #[test]
    fn empty_pool_is_exhausted_without_calls() {
        let c = client(ScriptedProvider::new());
        let err = FallbackOrchestrator::new(&c)
            .generate_sentence_pair(&CredentialPool::default(), &[])
            .unwrap_err();
        assert_eq!(err.report.attempt_count(), 0);
        assert!(c.provider().calls.borrow().is_empty());
    }

    #[test]
    fn each_cycle_starts_with_nothing_tried() {
        let a = key('A');
        let c = client(ScriptedProvider::new().fail(&a, 500));
        let pool = CredentialPool::new([a.clone()]);
        let orch = FallbackOrchestrator::new(&c);

        assert!(orch.generate_sentence_pair(&pool, &[]).is_err());
        assert!(orch.generate_sentence_pair(&pool, &[]).is_err());
        assert_eq!(c.provider().credentials_called(), vec![a.clone(), a]);
    }

    #[test]
    fn cycle_marks_failed_credentials() {
        let pool = CredentialPool::new(["a", "b"]);
        let mut cycle = RotationCycle::start(&pool, None);
        assert_eq!(cycle.state(), &RotationState::Trying("a".to_string()));

        cycle.fail();
        assert!(cycle.was_tried("a"));
        assert_eq!(cycle.state(), &RotationState::Trying("b".to_string()));

        cycle.fail();
        assert_eq!(cycle.state(), &RotationState::Exhausted);

        // terminal states ignore further transitions
        cycle.fail();
        cycle.succeed(GenerationResult::default());
        assert_eq!(cycle.state(), &RotationState::Exhausted);
    }

    fn pool_of(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("AIza{i:0>35}")).collect()
    }

    proptest! {
        #[test]
        fn always_failing_pool_is_tried_once_each(n in 1usize..12) {
            let keys = pool_of(n);
            let c = client(ScriptedProvider::new());
            let pool = CredentialPool::new(keys.clone());

            let err = FallbackOrchestrator::new(&c)
                .generate_sentence_pair(&pool, &[])
                .unwrap_err();

            prop_assert_eq!(err.report.attempt_count(), n);
            prop_assert_eq!(err.report.failed, n);
            prop_assert_eq!(c.provider().credentials_called(), keys);
        }

        #[test]
        fn first_good_credential_ends_the_cycle((n, k) in (1usize..12).prop_flat_map(|n| (Just(n), 1..=n))) {
            let keys = pool_of(n);
            let winner = sentence("win");

            let mut provider = ScriptedProvider::new();
            for (i, key) in keys.iter().enumerate() {
                provider = if i + 1 == k {
                    provider.reply(key, payload(&[winner.clone()]))
                } else if i + 1 < k {
                    provider.fail(key, 500)
                } else {
                    provider.reply(key, payload(&[sentence("late")]))
                };
            }
            let c = client(provider);
            let pool = CredentialPool::new(keys.clone());

            let ok = FallbackOrchestrator::new(&c)
                .generate_sentence_pair(&pool, &[])
                .unwrap();

            prop_assert_eq!(ok.report.attempt_count(), k);
            prop_assert_eq!(&ok.credential, &keys[k - 1]);
            prop_assert_eq!(ok.result.formal, winner);
            prop_assert_eq!(c.provider().credentials_called(), keys[..k].to_vec());
        }
    }
}
