//! Provider identifiers.

/// Chat completion provider kinds understood by the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Any server speaking the OpenAI `/chat/completions` dialect (LM Studio, llama.cpp)
    OpenAiCompatible,
    /// api.openai.com; requires a key
    OpenAI,
    /// Offline deterministic client
    Mock,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "openai-compatible" | "lmstudio" | "local" => Some(Self::OpenAiCompatible),
            "openai" => Some(Self::OpenAI),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAiCompatible => "openai-compatible",
            Self::OpenAI => "openai",
            Self::Mock => "mock",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(
            ProviderType::parse("openai-compatible"),
            Some(ProviderType::OpenAiCompatible)
        );
        assert_eq!(
            ProviderType::parse("LMStudio"),
            Some(ProviderType::OpenAiCompatible)
        );
        assert_eq!(ProviderType::parse("openai"), Some(ProviderType::OpenAI));
        assert_eq!(ProviderType::parse("mock"), Some(ProviderType::Mock));
        assert_eq!(ProviderType::parse("ollama"), None);
    }

    #[test]
    fn test_as_str_round_trips() {
        for p in [
            ProviderType::OpenAiCompatible,
            ProviderType::OpenAI,
            ProviderType::Mock,
        ] {
            assert_eq!(ProviderType::parse(p.as_str()), Some(p));
        }
    }
}
