use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};

use ytsum::config::{self, Config, DEFAULT_WORD_LIMIT};
use ytsum::PipelineError;
use ytsum::output;
use ytsum::pipeline::{Pipeline, Report, Timeouts};
use ytsum::summarize::{DEFAULT_INSTRUCTION, LlmClient, Provider, SummaryRequest};
use ytsum::youtube::YouTubeCaptions;

mod cli;

use cli::{Cli, OutputFormat};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let key_lines = [Provider::Gemini, Provider::Openai, Provider::Anthropic]
        .iter()
        .map(|p| {
            let var = p.env_var();
            if std::env::var(var).is_ok_and(|v| !v.trim().is_empty()) {
                format!("  \x1b[32m✅\x1b[0m {var:<18} ({p})")
            } else {
                format!("  \x1b[31m❌\x1b[0m {var:<18} ({p}, not set)")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\nAPI KEYS:\n{key_lines}\n\nConfig file: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    match run(cli).await {
        Err(e) if e.downcast_ref::<PipelineError>().is_some_and(PipelineError::is_fatal) => {
            error!("Internal error: {e:#}");
            Err(e.wrap_err("internal error while rendering documents (this is a bug, please report it)"))
        }
        other => other,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    if cli.verbose {
        let config_path = config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
    }

    // CLI flags take priority over the config file
    let provider = cli.provider.or(config.provider).unwrap_or_default();
    let model = cli
        .model
        .clone()
        .or_else(|| config.model.clone())
        .unwrap_or_else(|| provider.default_model().to_string());
    let word_limit = cli.words.or(config.word_limit).unwrap_or(DEFAULT_WORD_LIMIT);
    if !(50..=500).contains(&word_limit) {
        bail!("word limit must be between 50 and 500, got {word_limit}");
    }
    let request = SummaryRequest::new(word_limit, cli.style.or(config.style).unwrap_or_default())?
        .with_instruction(config.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION))
        .with_language(cli.language.or(config.language))
        .with_category(cli.category.or(config.category));
    let output_dir = cli
        .output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    // Fail on a missing key before touching the network
    let api_key = config::api_key(provider)?;
    let client = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
    let llm = LlmClient::new(client.clone(), provider, model, api_key);
    debug!("Using {} model {}", llm.provider(), llm.model());
    if cli.verbose {
        eprintln!("Model: {} ({})", llm.model(), llm.provider());
    }
    let pipeline = Pipeline::new(YouTubeCaptions::new(client), llm).with_timeouts(Timeouts {
        fetch: config.fetch_timeout(),
        summarize: config.summarize_timeout(),
    });

    let lang = request.language.and_then(|l| l.caption_code());

    let pb = spinner("Extracting transcript...")?;
    let transcript = pipeline.fetch_transcript(&cli.url, lang).await;
    pb.finish_and_clear();
    let transcript = transcript?;

    if cli.verbose {
        eprintln!(
            "Video: {} ({})\nThumbnail: {}\nLanguage: {}\nFragments: {}",
            transcript.title,
            transcript.video_id,
            transcript.video_id.thumbnail_url(),
            transcript.language,
            transcript.fragments.len(),
        );
    }

    let pb = spinner("Generating summary...")?;
    let summary = pipeline.summarize(&transcript, &request).await;
    pb.finish_and_clear();
    let report = Report::new(&transcript, summary?);

    let artifacts = output::build_artifacts(&report, cli.save)?;

    match cli.format {
        OutputFormat::Text => println!("{}", output::render_text(&report, cli.show_transcript)),
        OutputFormat::Json => println!("{}", output::render_json(&report)?),
    }

    let written = output::write_artifacts(&output_dir, &artifacts)?;
    for path in &written {
        eprintln!("Saved {}", path.display());
    }

    Ok(())
}
