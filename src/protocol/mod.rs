use serde_json::{json, Value};

use crate::model::sentence::GenerationResult;
use crate::model::settings::{DisplayOptions, VoiceSelection};
use crate::services::credential::{self, fingerprint};
use crate::services::provider::GenerativeProvider;
use crate::services::session::{Session, SessionError};
use crate::services::store::{self, SettingsStore, StoreError};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, code: &str, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "code": code,
        "message": message.into()
    })
    .to_string()
}

fn store_err(id: Value, e: StoreError) -> String {
    err(id, "store", e.to_string())
}

fn credential_from_payload(payload: &Value) -> &str {
    payload
        .get("credential")
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

fn topics_from_payload(payload: &Value) -> Result<Option<Vec<String>>, String> {
    match payload.get("topics") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value::<Vec<String>>(v.clone())
            .map(Some)
            .map_err(|e| format!("payload.topics must be an array of strings: {e}")),
    }
}

/// The sentence the card shows under the saved options, with the meaning in
/// the sub-voice language. Unreadable settings fall back to defaults.
fn selected_view(store: &dyn SettingsStore, result: &GenerationResult) -> Value {
    let options = store::load_options(store).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "display options unreadable, using defaults");
        DisplayOptions::default()
    });
    let voices = store::load_voices(store).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "voice selection unreadable, using defaults");
        VoiceSelection::default()
    });

    let shown = result.pick(options.informal);
    json!({
        "sentence": shown,
        "meaning": shown.meaning_for(&voices.sub.lang),
        "lang": voices.sub.lang
    })
}

pub fn handle<P, S>(session: &mut Session<P, S>, input: &str) -> String
where
    P: GenerativeProvider,
    S: SettingsStore,
{
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "code": "invalid_request",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let payload = get_payload(&req);

    match Command::from(get_cmd(&req)) {
        Command::Ping => ok(id, json!({ "message": "bunrei-core alive" })),

        Command::ValidateCredential => {
            let token = credential_from_payload(payload);
            ok(id, json!({ "valid": credential::is_well_formed(token) }))
        }

        Command::CheckCredential => {
            let token = credential::normalize(credential_from_payload(payload));
            if token.is_empty() {
                return err(id, "invalid_request", "payload.credential is required");
            }
            match session.check_live(&token) {
                Ok(live) => ok(id, json!({ "live": live })),
                Err(e) => err(id, "generation_failure", e.to_string()),
            }
        }

        Command::AddCredential => {
            let token = credential_from_payload(payload);
            match session.add_credential(token) {
                Ok(stored) => ok(id, json!({ "credential": fingerprint(&stored) })),
                Err(e) => err(id, e.code(), e.to_string()),
            }
        }

        Command::ListCredentials => match session.pool() {
            Ok(pool) => {
                let keys: Vec<String> = pool.iter().map(|k| fingerprint(k)).collect();
                let active = session.active_credential().map(fingerprint);
                ok(id, json!({ "credentials": keys, "active": active }))
            }
            Err(e) => store_err(id, e),
        },

        Command::GenerateSentence => {
            let topics = match topics_from_payload(payload) {
                Ok(t) => t,
                Err(e) => return err(id, "invalid_request", e),
            };

            match session.refresh(topics.as_deref()) {
                Ok(outcome) => ok(
                    id,
                    json!({
                        "formal": outcome.result.formal,
                        "informal": outcome.result.informal,
                        "selected": selected_view(session.store(), &outcome.result),
                        "credential": fingerprint(&outcome.credential),
                        "report": outcome.report
                    }),
                ),
                Err(SessionError::Exhausted(e)) => json!({
                    "id": id,
                    "status": "error",
                    "code": "exhausted_pool",
                    "message": e.to_string(),
                    "payload": {
                        "fallback": session.current(),
                        "selected": selected_view(session.store(), session.current()),
                        "report": e.report
                    }
                })
                .to_string(),
                Err(SessionError::Store(e)) => store_err(id, e),
            }
        }

        Command::GetSettings => {
            let store = session.store();
            let loaded = (|| -> Result<Value, StoreError> {
                Ok(json!({
                    "topics": store::load_topics(store)?,
                    "options": store::load_options(store)?,
                    "voices": store::load_voices(store)?
                }))
            })();
            match loaded {
                Ok(v) => ok(id, v),
                Err(e) => store_err(id, e),
            }
        }

        Command::SetTopics => {
            let topics = match topics_from_payload(payload) {
                Ok(Some(t)) => t,
                Ok(None) => return err(id, "invalid_request", "payload.topics is required"),
                Err(e) => return err(id, "invalid_request", e),
            };
            match store::save_topics(session.store(), &topics) {
                Ok(()) => ok(id, json!({ "topics": topics })),
                Err(e) => store_err(id, e),
            }
        }

        Command::SetOptions => {
            let options: DisplayOptions =
                match serde_json::from_value(payload.get("options").cloned().unwrap_or(Value::Null)) {
                    Ok(v) => v,
                    Err(e) => return err(id, "invalid_request", format!("invalid payload.options: {e}")),
                };
            match store::save_options(session.store(), &options) {
                Ok(()) => ok(id, json!({ "options": options })),
                Err(e) => store_err(id, e),
            }
        }

        Command::SetVoices => {
            let voices: VoiceSelection =
                match serde_json::from_value(payload.get("voices").cloned().unwrap_or(Value::Null)) {
                    Ok(v) => v,
                    Err(e) => return err(id, "invalid_request", format!("invalid payload.voices: {e}")),
                };
            match store::save_voices(session.store(), &voices) {
                Ok(()) => ok(id, json!({ "voices": voices })),
                Err(e) => store_err(id, e),
            }
        }

        Command::Unknown => err(id, "unknown_command", "unknown command"),
    }
}
