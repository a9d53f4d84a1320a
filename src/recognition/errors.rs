use serde::{Serialize, Serializer};

/// Error codes reported by a recognition engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NoSpeech,
    Aborted,
    AudioCapture,
    Network,
    NotAllowed,
    ServiceNotAllowed,
    BadGrammar,
    LanguageNotSupported,
    Unknown(String),
}

impl RecognitionErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "aborted" => Self::Aborted,
            "audio-capture" => Self::AudioCapture,
            "network" => Self::Network,
            "not-allowed" => Self::NotAllowed,
            "service-not-allowed" => Self::ServiceNotAllowed,
            "bad-grammar" => Self::BadGrammar,
            "language-not-supported" => Self::LanguageNotSupported,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> String {
        match self {
            Self::NoSpeech => "no-speech".to_string(),
            Self::Aborted => "aborted".to_string(),
            Self::AudioCapture => "audio-capture".to_string(),
            Self::Network => "network".to_string(),
            Self::NotAllowed => "not-allowed".to_string(),
            Self::ServiceNotAllowed => "service-not-allowed".to_string(),
            Self::BadGrammar => "bad-grammar".to_string(),
            Self::LanguageNotSupported => "language-not-supported".to_string(),
            Self::Unknown(code) => format!("unknown:{}", code),
        }
    }

    /// Human-readable message for display
    pub fn message(&self) -> String {
        match self {
            Self::NoSpeech => "No speech was detected.".to_string(),
            Self::Aborted => "Speech recognition was aborted.".to_string(),
            Self::AudioCapture => "Audio capture failed.".to_string(),
            Self::Network => "Network error occurred.".to_string(),
            Self::NotAllowed => "Speech recognition not allowed.".to_string(),
            Self::ServiceNotAllowed => "Speech recognition service not allowed.".to_string(),
            Self::BadGrammar => "Grammar error.".to_string(),
            Self::LanguageNotSupported => "Language not supported.".to_string(),
            Self::Unknown(code) => format!("Unknown error: {}", code),
        }
    }
}

impl Serialize for RecognitionErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("RecognitionError", 2)?;
        state.serialize_field("error", &self.code())?;
        state.serialize_field("message", &self.message())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_roundtrip() {
        for code in [
            "no-speech",
            "aborted",
            "audio-capture",
            "network",
            "not-allowed",
            "service-not-allowed",
            "bad-grammar",
            "language-not-supported",
        ] {
            assert_eq!(RecognitionErrorKind::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_unknown_code_fallback() {
        let kind = RecognitionErrorKind::from_code("phaser-overload");
        assert_eq!(kind.code(), "unknown:phaser-overload");
        assert_eq!(kind.message(), "Unknown error: phaser-overload");
    }

    #[test]
    fn test_serializes_code_and_message() {
        let json = serde_json::to_value(RecognitionErrorKind::NoSpeech).unwrap();
        assert_eq!(json["error"], "no-speech");
        assert_eq!(json["message"], "No speech was detected.");
    }
}
