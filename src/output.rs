use std::path::{Path, PathBuf};

use eyre::Result;
use log::{debug, warn};

use crate::document::render_document;
use crate::pipeline::Report;

/// Which downloadable files to produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Export {
    Txt,
    Pdf,
    #[default]
    All,
    None,
}

impl Export {
    fn text(&self) -> bool {
        matches!(self, Export::Txt | Export::All)
    }

    fn pdf(&self) -> bool {
        matches!(self, Export::Pdf | Export::All)
    }
}

/// A downloadable file held in memory
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: &'static str,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Render the report for the terminal: thumbnail, summary, and optionally the transcript
pub fn render_text(report: &Report, show_transcript: bool) -> String {
    let mut out = String::new();
    if !report.title.is_empty() {
        out.push_str(&format!("# {}\n\n", report.title));
    }
    out.push_str(&format!("Thumbnail: {}\n\n## Summary\n\n{}\n", report.thumbnail_url, report.summary.trim_end()));
    if show_transcript {
        out.push_str(&format!("\n## Full Transcript\n\n{}\n", report.transcript.trim()));
    }
    out
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Build every requested artifact before anything is written
pub fn build_artifacts(report: &Report, export: Export) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    if export.text() {
        artifacts.push(Artifact {
            file_name: "summary.txt",
            mime: "text/plain",
            bytes: report.summary.clone().into_bytes(),
        });
        artifacts.push(Artifact {
            file_name: "transcript.txt",
            mime: "text/plain",
            bytes: report.transcript.clone().into_bytes(),
        });
    }
    if export.pdf() {
        artifacts.push(Artifact {
            file_name: "summary.pdf",
            mime: "application/pdf",
            bytes: render_document(&report.summary)?,
        });
        artifacts.push(Artifact {
            file_name: "transcript.pdf",
            mime: "application/pdf",
            bytes: render_document(&report.transcript)?,
        });
    }
    Ok(artifacts)
}

/// Write artifacts into `dir`, overwriting earlier files of the same name.
///
/// Every artifact is first written under a temporary name; the real names only
/// appear once all writes succeeded. On failure nothing from this run is left behind.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>> {
    if artifacts.is_empty() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(dir)?;

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let tmp = dir.join(format!(".{}.part", artifact.file_name));
        if let Err(e) = std::fs::write(&tmp, &artifact.bytes) {
            discard(staged.iter().map(|(tmp, _)| tmp));
            return Err(eyre::eyre!("writing {}: {e}", tmp.display()));
        }
        debug!("Staged {} ({}, {} bytes)", tmp.display(), artifact.mime, artifact.bytes.len());
        staged.push((tmp, dir.join(artifact.file_name)));
    }

    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(tmp, path) {
            discard(staged[..i].iter().map(|(_, path)| path));
            discard(staged[i..].iter().map(|(tmp, _)| tmp));
            return Err(eyre::eyre!("saving {}: {e}", path.display()));
        }
    }

    Ok(staged.into_iter().map(|(_, path)| path).collect())
}

fn discard<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove {}: {e}", path.display());
        }
    }
}
