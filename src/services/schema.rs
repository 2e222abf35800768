use serde_json::{json, Value};

pub const SENTENCE_FIELDS: [&str; 5] = ["content", "furigana", "romaji", "vn_meaning", "en_meaning"];

/// Response constraint for a generation call: an array of sentence objects.
pub fn sentence_pair_schema() -> Value {
    json!({
        "description": "List of 2 Japanese sentences (formal and informal versions of the same sentence)",
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "required": SENTENCE_FIELDS,
            "properties": {
                "content": {
                    "type": "STRING",
                    "description": "A Japanese sentence in kanji and kana."
                },
                "furigana": {
                    "type": "STRING",
                    "description": "The furigana (phonetic reading) of the 'content' property."
                },
                "romaji": {
                    "type": "STRING",
                    "description": "The romaji (Latin script representation) of the 'content' property."
                },
                "vn_meaning": {
                    "type": "STRING",
                    "description": "The Vietnamese translation of the 'content' property."
                },
                "en_meaning": {
                    "type": "STRING",
                    "description": "The English translation of the 'content' property. This must always be provided."
                }
            }
        }
    })
}

/// Response constraint for the liveness call.
pub fn liveness_schema() -> Value {
    json!({
        "description": "boolean value for checking API key",
        "type": "BOOLEAN"
    })
}
