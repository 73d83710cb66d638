use std::path::PathBuf;
use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::summarize::{Category, Language, Provider, Style};

pub const DEFAULT_WORD_LIMIT: u32 = 250;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SUMMARIZE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub word_limit: Option<u32>,
    pub style: Option<Style>,
    pub language: Option<Language>,
    pub category: Option<Category>,
    pub instruction: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub fetch_timeout_secs: Option<u64>,
    pub summarize_timeout_secs: Option<u64>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self, PipelineError> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .map_err(|e| PipelineError::Config(format!("reading {}: {e}", path.display())))?;
            Self::parse(&content).map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS))
    }

    pub fn summarize_timeout(&self) -> Duration {
        Duration::from_secs(self.summarize_timeout_secs.unwrap_or(DEFAULT_SUMMARIZE_TIMEOUT_SECS))
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

/// Read the provider's API key from the environment; a missing or blank key is fatal
pub fn api_key(provider: Provider) -> Result<String, PipelineError> {
    api_key_from(provider, |name| std::env::var(name).ok())
}

fn api_key_from(provider: Provider, lookup: impl Fn(&str) -> Option<String>) -> Result<String, PipelineError> {
    let var = provider.env_var();
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(PipelineError::Config(format!(
            "{var} environment variable not set (required for {provider} summarization)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
provider = "openai"
model = "gpt-4o"
word_limit = 300
style = "Concise"
language = "spanish"
category = "Science"
instruction = "Summarize in bullet points."
output_dir = "/tmp/summaries"
fetch_timeout_secs = 10
"#;
        let config = Config::parse(toml_str).unwrap();
        assert_eq!(config.provider, Some(Provider::Openai));
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.word_limit, Some(300));
        assert_eq!(config.style, Some(Style::Concise));
        assert_eq!(config.language, Some(Language::Spanish));
        assert_eq!(config.category, Some(Category::Science));
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/summaries")));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert_eq!(config.summarize_timeout(), Duration::from_secs(DEFAULT_SUMMARIZE_TIMEOUT_SECS));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.provider.is_none());
        assert!(config.style.is_none());
        assert_eq!(config.fetch_timeout(), Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS));
    }

    #[test]
    fn test_invalid_style_rejected() {
        let err = Config::parse(r#"style = "verbose""#).unwrap_err();
        assert!(err.to_string().contains("unknown summary style"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse(r#"default_lang = "fr""#).is_err());
    }

    #[test]
    fn test_api_key_present() {
        let key = api_key_from(Provider::Gemini, |name| {
            assert_eq!(name, "GOOGLE_API_KEY");
            Some(" secret \n".to_string())
        });
        assert_eq!(key.unwrap(), "secret");
    }

    #[test]
    fn test_api_key_missing_is_config_error() {
        let err = api_key_from(Provider::Anthropic, |_| None).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(api_key_from(Provider::Gemini, |_| Some("  ".to_string())).is_err());
    }
}
