/// Default model for the Anthropic generator.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default bound on repair round trips per instruction.
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: u32 = 2;

/// Default response token budget.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Environment variable holding the Anthropic API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Configuration for the compiler facade and the Anthropic generator.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Maximum repair round trips after the first draft.
    pub max_repair_attempts: u32,
    /// Model identifier (defaults to claude-sonnet-4-20250514).
    pub model: String,
    pub max_tokens: u32,
    /// Anthropic API key. When `None`, `ANTHROPIC_API_KEY` is consulted.
    pub api_key: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_repair_attempts(mut self, attempts: u32) -> Self {
        self.max_repair_attempts = attempts;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The configured API key, falling back to `ANTHROPIC_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |key: &String| !key.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(present))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CompilerConfig::new();
        assert_eq!(config.max_repair_attempts, 2);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.max_tokens, 4096);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn builders_override_defaults() {
        let config = CompilerConfig::new()
            .with_model("claude-opus-4-1")
            .with_max_repair_attempts(5)
            .with_max_tokens(1024)
            .with_api_key("sk-test");
        assert_eq!(config.model, "claude-opus-4-1");
        assert_eq!(config.max_repair_attempts, 5);
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.resolve_api_key().as_deref(), Some("sk-test"));
    }

    #[test]
    fn blank_explicit_key_is_not_a_key() {
        let config = CompilerConfig::new().with_api_key("   ");
        // Falls through to the environment, which may or may not be set; a
        // blank explicit key must never be returned.
        assert_ne!(config.resolve_api_key().as_deref(), Some("   "));
    }
}
