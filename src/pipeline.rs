use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::config::{DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_SUMMARIZE_TIMEOUT_SECS};
use crate::error::{PipelineError, Result, Stage};
use crate::summarize::{Summarizer, SummaryRequest, TextGenerator};
use crate::youtube::CaptionSource;
use crate::{Transcript, VideoId, extract_video_id};

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub fetch: Duration,
    pub summarize: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            summarize: Duration::from_secs(DEFAULT_SUMMARIZE_TIMEOUT_SECS),
        }
    }
}

/// Result of a successful run: both transcript and summary are present
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub video_id: VideoId,
    pub thumbnail_url: String,
    pub title: String,
    pub language: String,
    pub transcript: String,
    pub summary: String,
}

impl Report {
    pub fn new(transcript: &Transcript, summary: String) -> Self {
        Self {
            video_id: transcript.video_id.clone(),
            thumbnail_url: transcript.video_id.thumbnail_url(),
            title: transcript.title.clone(),
            language: transcript.language.clone(),
            transcript: transcript.text(),
            summary,
        }
    }
}

/// URL in, transcript and summary out. Each stage runs once, in order.
pub struct Pipeline<S, G> {
    source: S,
    summarizer: Summarizer<G>,
    timeouts: Timeouts,
}

impl<S, G> Pipeline<S, G>
where
    S: CaptionSource + Sync,
    G: TextGenerator + Sync,
{
    pub fn new(source: S, generator: G) -> Self {
        Self {
            source,
            summarizer: Summarizer::new(generator),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Extract the video id and fetch its captions
    pub async fn fetch_transcript(&self, url: &str, lang: Option<&str>) -> Result<Transcript> {
        let video_id = extract_video_id(url).ok_or_else(|| PipelineError::InvalidUrl { url: url.to_string() })?;
        debug!("Fetching transcript for {video_id}");

        let transcript = with_timeout(Stage::Fetch, self.timeouts.fetch, self.source.fetch(&video_id, lang))
            .await?
            .map_err(|e| PipelineError::Fetch {
                video_id: video_id.to_string(),
                reason: format!("{e:#}"),
            })?;

        info!(
            "Fetched {} caption fragments for {video_id} ({})",
            transcript.fragments.len(),
            transcript.language
        );
        Ok(transcript)
    }

    pub async fn summarize(&self, transcript: &Transcript, request: &SummaryRequest) -> Result<String> {
        let text = transcript.text();
        with_timeout(
            Stage::Summarize,
            self.timeouts.summarize,
            self.summarizer.summarize(&text, request),
        )
        .await?
    }

    /// Run every stage; the first failure stops the run
    pub async fn run(&self, url: &str, request: &SummaryRequest) -> Result<Report> {
        let lang = request.language.and_then(|l| l.caption_code());
        let transcript = self.fetch_transcript(url, lang).await?;
        let summary = self.summarize(&transcript, request).await?;
        Ok(Report::new(&transcript, summary))
    }
}

async fn with_timeout<T>(stage: Stage, after: Duration, fut: impl Future<Output = T>) -> Result<T> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| PipelineError::Timeout { stage, after })
}
