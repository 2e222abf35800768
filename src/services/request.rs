use serde_json::Value;

use crate::model::sentence::example_sentences;
use crate::services::schema;

/// One structured generation request. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub instruction: String,
    pub example_payload: String,
    pub schema: Value,
}

pub fn example_payload() -> String {
    serde_json::to_string(&example_sentences()).unwrap_or_default()
}

pub fn build(topics: &[String]) -> GenerationRequest {
    let topics: Vec<&str> = topics
        .iter()
        .map(String::as_str)
        .filter(|t| !t.trim().is_empty())
        .collect();

    let example = example_payload();
    let instruction = build_instruction(&topics, &example);

    tracing::debug!(topics = topics.len(), chars = instruction.len(), "built generation request");

    GenerationRequest {
        instruction,
        example_payload: example,
        schema: schema::sentence_pair_schema(),
    }
}

fn build_instruction(topics: &[&str], example: &str) -> String {
    let mut p = String::new();

    p.push_str("Return an array with 2 items as Japanese sentences. ");

    if topics.is_empty() {
        p.push_str(
            "The first one should be a formal sentence about an everyday topic of your choice. ",
        );
    } else {
        p.push_str(&format!(
            "The first one should be a formal sentence related to 2-3 random topics from: {}. ",
            topics.join(", ")
        ));
    }

    p.push_str("The second sentence should be the informal form of the first sentence. ");
    p.push_str("For each sentence, provide the following fields: \n");
    p.push_str("- content: The Japanese sentence in kanji and kana.\n");
    p.push_str("- furigana: The furigana (phonetic reading) for the content.\n");
    p.push_str("- romaji: The romaji representation.\n");
    p.push_str("- vn_meaning: The Vietnamese translation.\n");
    p.push_str("- en_meaning: The English translation (MUST always be provided).\n");
    p.push_str("Make sure the 'en_meaning' field is always included in the response. \n\n");
    p.push_str("Here is an example:\n");
    p.push_str(example);

    p
}
