use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptRecord {
    pub credential: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Every attempt of one rotation cycle, in the order they were made.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RotationReport {
    pub succeeded: usize,
    pub failed: usize,
    pub attempts: Vec<AttemptRecord>,
}

impl RotationReport {
    pub fn record_success(&mut self, fingerprint: String) {
        self.succeeded += 1;
        self.attempts.push(AttemptRecord {
            credential: fingerprint,
            ok: true,
            error: None,
        });
    }

    pub fn record_failure(&mut self, fingerprint: String, error: String) {
        self.failed += 1;
        self.attempts.push(AttemptRecord {
            credential: fingerprint,
            ok: false,
            error: Some(error),
        });
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}
