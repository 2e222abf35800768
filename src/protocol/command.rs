#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    ValidateCredential,
    CheckCredential,
    AddCredential,
    ListCredentials,
    GenerateSentence,
    GetSettings,
    SetTopics,
    SetOptions,
    SetVoices,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "credential.validate" => Command::ValidateCredential,
            "credential.check" => Command::CheckCredential,
            "credential.add" => Command::AddCredential,
            "credential.list" => Command::ListCredentials,
            "sentence.generate" | "refresh" => Command::GenerateSentence,
            "settings.get" => Command::GetSettings,
            "settings.set_topics" => Command::SetTopics,
            "settings.set_options" => Command::SetOptions,
            "settings.set_voices" => Command::SetVoices,
            _ => Command::Unknown,
        }
    }
}
