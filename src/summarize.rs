use std::future::Future;
use std::str::FromStr;

use eyre::{Result, bail};
use log::{debug, info};
use serde::Deserialize;

use crate::error::PipelineError;

pub const DEFAULT_INSTRUCTION: &str = "You are a YouTube video transcribe summarizer. \
You'll be given the transcript text and summarize the entire text and provide the important parts \
in points within the specified word limit.";

/// Summary verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(try_from = "String")]
pub enum Style {
    #[default]
    Detailed,
    Concise,
}

impl Style {
    fn prefix(&self) -> &'static str {
        match self {
            Style::Detailed => "Provide a detailed summary",
            Style::Concise => "Provide a concise summary",
        }
    }
}

impl FromStr for Style {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detailed" => Ok(Style::Detailed),
            "concise" => Ok(Style::Concise),
            other => Err(PipelineError::Config(format!(
                "unknown summary style '{other}' (expected detailed or concise)"
            ))),
        }
    }
}

impl TryFrom<String> for Style {
    type Error = PipelineError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Spoken language of the video, passed through to the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(try_from = "String")]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Other,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Other => "Other",
        }
    }

    /// Caption track language code to ask for first
    pub fn caption_code(&self) -> Option<&'static str> {
        match self {
            Language::English => Some("en"),
            Language::Spanish => Some("es"),
            Language::French => Some("fr"),
            Language::German => Some("de"),
            Language::Other => None,
        }
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(Language::English),
            "spanish" => Ok(Language::Spanish),
            "french" => Ok(Language::French),
            "german" => Ok(Language::German),
            "other" => Ok(Language::Other),
            other => Err(PipelineError::Config(format!("unknown language '{other}'"))),
        }
    }
}

impl TryFrom<String> for Language {
    type Error = PipelineError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Subject category of the video, passed through to the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    Education,
    Entertainment,
    Technology,
    Science,
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Education => "Education",
            Category::Entertainment => "Entertainment",
            Category::Technology => "Technology",
            Category::Science => "Science",
            Category::Other => "Other",
        }
    }
}

impl FromStr for Category {
    type Err = PipelineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "education" => Ok(Category::Education),
            "entertainment" => Ok(Category::Entertainment),
            "technology" => Ok(Category::Technology),
            "science" => Ok(Category::Science),
            "other" => Ok(Category::Other),
            other => Err(PipelineError::Config(format!("unknown category '{other}'"))),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = PipelineError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        s.parse()
    }
}

/// Everything the summarizer needs besides the transcript itself
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub instruction: String,
    pub word_limit: u32,
    pub style: Style,
    pub language: Option<Language>,
    pub category: Option<Category>,
}

impl SummaryRequest {
    pub fn new(word_limit: u32, style: Style) -> std::result::Result<Self, PipelineError> {
        if word_limit == 0 {
            return Err(PipelineError::Config("word limit must be a positive integer".to_string()));
        }
        Ok(Self {
            instruction: DEFAULT_INSTRUCTION.to_string(),
            word_limit,
            style,
            language: None,
            category: None,
        })
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }
}

/// Build the single string sent to the model: instruction first, transcript appended verbatim
pub fn build_prompt(request: &SummaryRequest, transcript_text: &str) -> String {
    let mut prompt = format!(
        "{}: {} Limit your response to {} words.",
        request.style.prefix(),
        request.instruction,
        request.word_limit
    );
    if let Some(language) = request.language {
        prompt.push_str(&format!(" Language: {}.", language.label()));
    }
    if let Some(category) = request.category {
        prompt.push_str(&format!(" Category: {}.", category.label()));
    }
    prompt.push_str("  ");
    prompt.push_str(transcript_text);
    prompt
}

/// A hosted model that turns one prompt into one text response
pub trait TextGenerator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Builds the prompt and delegates to a [`TextGenerator`]
#[derive(Debug, Clone)]
pub struct Summarizer<G> {
    generator: G,
}

impl<G: TextGenerator + Sync> Summarizer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub async fn summarize(
        &self,
        transcript_text: &str,
        request: &SummaryRequest,
    ) -> std::result::Result<String, PipelineError> {
        let prompt = build_prompt(request, transcript_text);
        debug!(
            "Summarizing {} chars of transcript ({:?}, {} words)",
            transcript_text.len(),
            request.style,
            request.word_limit
        );

        let summary = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|e| PipelineError::Summarize { reason: format!("{e:#}") })?;

        if summary.trim().is_empty() {
            return Err(PipelineError::Summarize {
                reason: "model returned an empty response".to_string(),
            });
        }
        info!("Summary generated ({} chars)", summary.len());
        Ok(summary)
    }
}

/// Hosted generative-text service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Anthropic,
}

impl Provider {
    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_API_KEY",
            Provider::Openai => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Openai => "gpt-4o-mini",
            Provider::Anthropic => "claude-sonnet-4-6",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "Gemini"),
            Provider::Openai => write!(f, "OpenAI"),
            Provider::Anthropic => write!(f, "Anthropic"),
        }
    }
}

/// HTTP client for one provider, holding its API key
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    provider: Provider,
    model: String,
    api_key: String,
}

impl LlmClient {
    pub fn new(client: reqwest::Client, provider: Provider, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            provider,
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!("Generating via {} with model {}", self.provider, self.model);
        match self.provider {
            Provider::Gemini => generate_gemini(&self.client, &self.api_key, &self.model, prompt).await,
            Provider::Openai => generate_openai(&self.client, &self.api_key, &self.model, prompt).await,
            Provider::Anthropic => generate_anthropic(&self.client, &self.api_key, &self.model, prompt).await,
        }
    }
}

async fn generate_gemini(client: &reqwest::Client, api_key: &str, model: &str, prompt: &str) -> Result<String> {
    let url = format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent");

    let body = serde_json::json!({
        "contents": [
            {
                "parts": [
                    { "text": prompt }
                ]
            }
        ]
    });

    let resp = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Gemini API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_gemini_text(&json)
}

fn extract_gemini_text(json: &serde_json::Value) -> Result<String> {
    if let Some(parts) = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();
        if !text.is_empty() {
            return Ok(text);
        }
    }
    if let Some(reason) = json
        .get("promptFeedback")
        .and_then(|f| f.get("blockReason"))
        .and_then(|r| r.as_str())
    {
        bail!("Gemini blocked the prompt: {reason}");
    }
    bail!("unexpected Gemini API response format");
}

async fn generate_anthropic(client: &reqwest::Client, api_key: &str, model: &str, prompt: &str) -> Result<String> {
    let body = serde_json::json!({
        "model": model,
        "max_tokens": 4096,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let resp = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("Anthropic API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_anthropic_text(&json)
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    bail!("unexpected Anthropic API response format");
}

async fn generate_openai(client: &reqwest::Client, api_key: &str, model: &str, prompt: &str) -> Result<String> {
    let body = serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": prompt
            }
        ]
    });

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("OpenAI API returned {status}: {body}");
    }

    let json: serde_json::Value = resp.json().await?;
    extract_openai_text(&json)
}

fn extract_openai_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    bail!("unexpected OpenAI API response format");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Echo;

    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    struct Fixed(&'static str, Mutex<u32>);

    impl TextGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            *self.1.lock().unwrap() += 1;
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    impl TextGenerator for Failing {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            bail!("quota exceeded")
        }
    }

    #[test]
    fn test_detailed_prefix() {
        let request = SummaryRequest::new(100, Style::Detailed).unwrap();
        assert!(build_prompt(&request, " x").starts_with("Provide a detailed summary: "));
    }

    #[test]
    fn test_concise_prefix() {
        let request = SummaryRequest::new(100, Style::Concise).unwrap();
        assert!(build_prompt(&request, " x").starts_with("Provide a concise summary: "));
    }

    #[test]
    fn test_unrecognized_style_rejected() {
        assert!("Summary".parse::<Style>().is_err());
        assert!("".parse::<Style>().is_err());
        assert_eq!("Detailed".parse::<Style>().unwrap(), Style::Detailed);
        assert_eq!("concise".parse::<Style>().unwrap(), Style::Concise);
    }

    #[test]
    fn test_zero_word_limit_rejected() {
        assert!(matches!(SummaryRequest::new(0, Style::Concise), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_prompt_layering() {
        let request = SummaryRequest::new(250, Style::Concise).unwrap();
        let prompt = build_prompt(&request, " a b c");
        assert_eq!(
            prompt,
            format!("Provide a concise summary: {DEFAULT_INSTRUCTION} Limit your response to 250 words.   a b c")
        );
        assert!(prompt.contains("Limit your response to 250 words"));
        assert!(prompt.ends_with(" a b c"));
    }

    #[test]
    fn test_prompt_with_language_and_category() {
        let request = SummaryRequest::new(50, Style::Detailed)
            .unwrap()
            .with_instruction("Summarize.")
            .with_language(Some(Language::French))
            .with_category(Some(Category::Science));
        assert_eq!(
            build_prompt(&request, " bonjour"),
            "Provide a detailed summary: Summarize. Limit your response to 50 words. \
             Language: French. Category: Science.   bonjour"
        );
    }

    #[test]
    fn test_prompt_category_only() {
        let request = SummaryRequest::new(50, Style::Detailed)
            .unwrap()
            .with_category(Some(Category::Technology));
        let prompt = build_prompt(&request, "");
        assert!(prompt.contains(" Category: Technology."));
        assert!(!prompt.contains("Language:"));
    }

    #[test]
    fn test_language_caption_code() {
        assert_eq!(Language::English.caption_code(), Some("en"));
        assert_eq!(Language::German.caption_code(), Some("de"));
        assert_eq!(Language::Other.caption_code(), None);
        assert!("Klingon".parse::<Language>().is_err());
        assert_eq!("Science".parse::<Category>().unwrap(), Category::Science);
    }

    #[tokio::test]
    async fn test_summarizer_sends_combined_prompt() {
        let summarizer = Summarizer::new(Echo);
        let request = SummaryRequest::new(250, Style::Concise).unwrap();
        let sent = summarizer.summarize(" a b c", &request).await.unwrap();
        assert!(sent.starts_with("Provide a concise summary"));
        assert!(sent.ends_with(" a b c"));
    }

    #[tokio::test]
    async fn test_summarizer_returns_response_verbatim() {
        let summarizer = Summarizer::new(Fixed("  - point one\n- point two\n", Mutex::new(0)));
        let request = SummaryRequest::new(50, Style::Detailed).unwrap();
        let summary = summarizer.summarize(" text", &request).await.unwrap();
        assert_eq!(summary, "  - point one\n- point two\n");
        assert_eq!(*summarizer.generator.1.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_summarizer_empty_response_is_failure() {
        let summarizer = Summarizer::new(Fixed("   ", Mutex::new(0)));
        let request = SummaryRequest::new(50, Style::Detailed).unwrap();
        let err = summarizer.summarize(" text", &request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Summarize { .. }));
    }

    #[tokio::test]
    async fn test_summarizer_error_carries_reason() {
        let summarizer = Summarizer::new(Failing);
        let request = SummaryRequest::new(50, Style::Detailed).unwrap();
        match summarizer.summarize(" text", &request).await {
            Err(PipelineError::Summarize { reason }) => assert!(reason.contains("quota exceeded")),
            other => panic!("expected summarize error, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_gemini_text() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [ { "text": "First part. " }, { "text": "Second part." } ],
                        "role": "model"
                    }
                }
            ]
        });
        assert_eq!(extract_gemini_text(&json).unwrap(), "First part. Second part.");
    }

    #[test]
    fn test_extract_gemini_text_blocked() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = extract_gemini_text(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_extract_gemini_text_empty() {
        let json = serde_json::json!({ "candidates": [] });
        assert!(extract_gemini_text(&json).is_err());
    }

    #[test]
    fn test_extract_anthropic_text() {
        let json = serde_json::json!({
            "content": [
                {
                    "type": "text",
                    "text": "Here is the summary."
                }
            ]
        });
        assert_eq!(extract_anthropic_text(&json).unwrap(), "Here is the summary.");
    }

    #[test]
    fn test_extract_anthropic_text_empty() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_text(&json).is_err());
    }

    #[test]
    fn test_extract_openai_text() {
        let json = serde_json::json!({
            "choices": [
                {
                    "message": {
                        "role": "assistant",
                        "content": "Summary of the video."
                    }
                }
            ]
        });
        assert_eq!(extract_openai_text(&json).unwrap(), "Summary of the video.");
    }

    #[test]
    fn test_extract_openai_text_empty() {
        let json = serde_json::json!({"choices": []});
        assert!(extract_openai_text(&json).is_err());
    }

    #[test]
    fn test_provider_env_vars() {
        assert_eq!(Provider::default(), Provider::Gemini);
        assert_eq!(Provider::Gemini.env_var(), "GOOGLE_API_KEY");
        assert_eq!(Provider::Anthropic.env_var(), "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_llm_client_reports_provider_and_model() {
        let llm = LlmClient::new(reqwest::Client::new(), Provider::Openai, "gpt-4o", "key");
        assert_eq!(llm.provider(), Provider::Openai);
        assert_eq!(llm.model(), "gpt-4o");
    }
}
