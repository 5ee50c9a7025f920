//! The closed provider set and its static metadata.
//!
//! Provider-specific behavior elsewhere in the workspace is dispatched over
//! [`ProviderId`], never over raw string tags; unknown identifiers fail at
//! the parse boundary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a supported provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Anthropic,
    Google,
    Ollama,
}

#[derive(Debug, Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProviderError(String);

impl ProviderId {
    /// Every supported provider, in display order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::OpenAi,
        ProviderId::Anthropic,
        ProviderId::Google,
        ProviderId::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Google => "google",
            ProviderId::Ollama => "ollama",
        }
    }

    /// Static metadata for this provider.
    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        match self {
            ProviderId::OpenAi => &OPENAI,
            ProviderId::Anthropic => &ANTHROPIC,
            ProviderId::Google => &GOOGLE,
            ProviderId::Ollama => &OLLAMA,
        }
    }

    /// Whether `key` matches this provider's credential format.
    ///
    /// The input is trimmed first. Keyless providers accept anything,
    /// including the empty string.
    pub fn is_valid_key_format(&self, key: &str) -> bool {
        let descriptor = self.descriptor();
        if !descriptor.requires_key {
            return true;
        }

        let key = key.trim();
        if key.is_empty() {
            return false;
        }

        key.starts_with(descriptor.key_prefix) && key.len() >= MIN_KEY_LEN
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" => Ok(ProviderId::Anthropic),
            "google" => Ok(ProviderId::Google),
            "ollama" => Ok(ProviderId::Ollama),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

/// Minimum accepted credential length for every credentialed provider.
const MIN_KEY_LEN: usize = 20;

/// Static, process-lifetime metadata for one provider.
#[derive(Debug)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    /// Human-readable display name.
    pub name: &'static str,
    /// Whether the provider needs a credential at all. Keyless providers
    /// are probed for reachability instead of key validity.
    pub requires_key: bool,
    /// Required credential prefix (empty for keyless providers).
    pub key_prefix: &'static str,
    /// Placeholder shown in credential input fields.
    pub key_placeholder: &'static str,
}

static OPENAI: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::OpenAi,
    name: "OpenAI",
    requires_key: true,
    key_prefix: "sk-",
    key_placeholder: "sk-proj-...",
};

static ANTHROPIC: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Anthropic,
    name: "Anthropic",
    requires_key: true,
    key_prefix: "sk-ant-",
    key_placeholder: "sk-ant-...",
};

static GOOGLE: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Google,
    name: "Google AI",
    requires_key: true,
    key_prefix: "AIza",
    key_placeholder: "AIza...",
};

static OLLAMA: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Ollama,
    name: "Ollama",
    requires_key: false,
    key_prefix: "",
    key_placeholder: "",
};

/// Mask a credential for display: first 7 and last 4 characters are kept.
/// Counts characters, not bytes, so multibyte input cannot split a
/// boundary.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "••••••••".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}••••{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_round_trips_through_str() {
        for id in ProviderId::ALL {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
    }

    #[test]
    fn unknown_provider_fails_to_parse() {
        let err = "mistral".parse::<ProviderId>().unwrap_err();
        assert!(err.to_string().contains("mistral"));
    }

    #[test]
    fn provider_id_serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&ProviderId::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let id: ProviderId = serde_json::from_str("\"google\"").unwrap();
        assert_eq!(id, ProviderId::Google);
    }

    #[test]
    fn openai_key_format() {
        let id = ProviderId::OpenAi;
        assert!(id.is_valid_key_format(&format!("sk-{}", "x".repeat(20))));
        assert!(!id.is_valid_key_format("sk-short"));
        assert!(!id.is_valid_key_format(&format!("pk-{}", "x".repeat(20))));
        assert!(!id.is_valid_key_format(""));
        assert!(!id.is_valid_key_format("   "));
    }

    #[test]
    fn anthropic_key_format_requires_its_own_prefix() {
        let id = ProviderId::Anthropic;
        assert!(id.is_valid_key_format(&format!("sk-ant-{}", "x".repeat(20))));
        // A plain OpenAI-shaped key is not an Anthropic key.
        assert!(!id.is_valid_key_format(&format!("sk-{}", "x".repeat(20))));
    }

    #[test]
    fn google_key_format() {
        let id = ProviderId::Google;
        assert!(id.is_valid_key_format(&format!("AIza{}", "y".repeat(20))));
        assert!(!id.is_valid_key_format("AIza"));
    }

    #[test]
    fn keyless_provider_accepts_anything() {
        assert!(ProviderId::Ollama.is_valid_key_format(""));
        assert!(ProviderId::Ollama.is_valid_key_format("whatever"));
    }

    #[test]
    fn key_format_trims_input() {
        let key = format!("  sk-{}  ", "x".repeat(20));
        assert!(ProviderId::OpenAi.is_valid_key_format(&key));
    }

    #[test]
    fn mask_key_keeps_edges() {
        let masked = mask_key("sk-proj-abcdefgh1234");
        assert!(masked.starts_with("sk-proj"));
        assert!(masked.ends_with("1234"));
        assert!(!masked.contains("abcdefgh"));
    }

    #[test]
    fn mask_key_hides_short_keys_entirely() {
        assert_eq!(mask_key("sk-short"), "••••••••");
    }

    #[test]
    fn mask_key_handles_multibyte_input() {
        let key = "ключ-аутентификации";
        let masked = mask_key(key);
        assert_eq!(masked, "ключ-ау••••ации");
    }
}
