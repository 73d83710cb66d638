use clap::Parser;
use std::path::PathBuf;

use ytsum::output::Export;
use ytsum::summarize::{Category, Language, Provider, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize a YouTube video from its captions",
    version,
)]
pub struct Cli {
    /// YouTube video URL (watch?v=ID or youtu.be/ID)
    pub url: String,

    /// Number of words for the summary [default: 250]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(50..=500))]
    pub words: Option<u32>,

    /// Summary type [default: detailed]
    #[arg(short, long, value_enum)]
    pub style: Option<Style>,

    /// Video language, passed to the model and used to pick the caption track
    #[arg(short, long, value_enum)]
    pub language: Option<Language>,

    /// Video category, passed to the model
    #[arg(short, long, value_enum)]
    pub category: Option<Category>,

    /// LLM provider [default: gemini]
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// LLM model (defaults per provider)
    #[arg(long)]
    pub model: Option<String>,

    /// Output format for stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Files to write: txt, pdf, all, none
    #[arg(long, value_enum, default_value_t = Export::All)]
    pub save: Export,

    /// Directory for summary/transcript files [default: .]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also print the full transcript
    #[arg(short = 't', long)]
    pub show_transcript: bool,

    /// Show extraction metadata
    #[arg(short, long)]
    pub verbose: bool,
}
