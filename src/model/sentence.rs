use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub content: String,

    pub furigana: String,

    pub romaji: String,

    pub en_meaning: String,

    pub vn_meaning: String,
}

impl Sentence {
    /// Meaning to show for a sub-voice language. Only `en-US` maps to English.
    pub fn meaning_for(&self, lang: &str) -> &str {
        if lang == "en-US" {
            &self.en_meaning
        } else {
            &self.vn_meaning
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub formal: Sentence,
    pub informal: Sentence,
}

impl GenerationResult {
    pub fn pick(&self, informal: bool) -> &Sentence {
        if informal {
            &self.informal
        } else {
            &self.formal
        }
    }
}

impl Default for GenerationResult {
    fn default() -> Self {
        let [formal, informal] = example_sentences();
        GenerationResult { formal, informal }
    }
}

/// Built-in pair shown before the first generation and used to fill missing slots.
pub fn example_sentences() -> [Sentence; 2] {
    [
        Sentence {
            content: "私は毎朝公園を散歩します。".to_string(),
            furigana: "わたしはまいあさこうえんをさんぽします。".to_string(),
            romaji: "Watashi wa maiasa kōen o sanpo shimasu.".to_string(),
            en_meaning: "I take a walk in the park every morning.".to_string(),
            vn_meaning: "Tôi đi dạo trong công viên mỗi sáng.".to_string(),
        },
        Sentence {
            content: "毎朝公園を散歩する。".to_string(),
            furigana: "まいあさこうえんをさんぽする。".to_string(),
            romaji: "Maiasa kōen o sanpo suru.".to_string(),
            en_meaning: "I take a walk in the park every morning.".to_string(),
            vn_meaning: "Mình đi dạo trong công viên mỗi sáng.".to_string(),
        },
    ]
}
