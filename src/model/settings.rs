use serde::{Deserialize, Serialize};

fn default_sub_lang() -> String {
    "en-US".to_string()
}

/// Which parts of a sentence the UI shows.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    #[serde(default)]
    pub informal: bool,

    #[serde(default)]
    pub furigana: bool,

    #[serde(default)]
    pub romaji: bool,

    #[serde(default)]
    pub meaning: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SubVoice {
    #[serde(default)]
    pub index: usize,

    #[serde(default = "default_sub_lang")]
    pub lang: String,
}

impl Default for SubVoice {
    fn default() -> Self {
        SubVoice {
            index: 0,
            lang: default_sub_lang(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct VoiceSelection {
    #[serde(default)]
    pub main: usize,

    #[serde(default)]
    pub sub: SubVoice,
}
