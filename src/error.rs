use std::time::Duration;

use thiserror::Error;

/// Pipeline stage that owns an external call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Summarize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Fetch => write!(f, "transcript fetch"),
            Stage::Summarize => write!(f, "summarization"),
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("could not extract video ID from: {url}")]
    InvalidUrl { url: String },

    #[error("error extracting transcript for {video_id}: {reason}")]
    Fetch { video_id: String, reason: String },

    #[error("error generating summary: {reason}")]
    Summarize { reason: String },

    #[error("{stage} timed out after {}s", after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("error rendering document: {0}")]
    Render(String),
}

impl PipelineError {
    /// Render errors are bugs, not user-recoverable failures
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Render(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
