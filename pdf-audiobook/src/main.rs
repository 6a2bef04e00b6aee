//! pdf-audio - Convert PDF books to audiobooks with remote and voice-cloned TTS

mod audio;
mod cache;
mod config;
mod error;
mod pdf;
mod pipeline;
mod text;
mod tts;

use anyhow::{Context, Result};
use cache::CachePolicy;
use clap::{Parser, Subcommand};
use config::AudiobookConfig;
use pipeline::{BackendOutcome, BackendSelection, DefaultBackends, Pipeline, RunReport, RunRequest};
use speech_client::ProviderKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdf-audio")]
#[command(about = "Convert PDF books to audiobooks with remote and voice-cloned TTS", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the PDF file
    pdf_file: Option<PathBuf>,

    /// Voice sample (WAV or MP3) for voice cloning
    #[arg(long)]
    voice: Option<PathBuf>,

    /// Page range to convert (e.g., "1-10"); all pages if omitted
    #[arg(long)]
    pages: Option<String>,

    /// Deepgram API key (default: speech.toml or DEEPGRAM_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Output directory (default from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Always regenerate, ignoring existing audiobooks
    #[arg(long)]
    no_reuse: bool,

    /// Only run the remote TTS backend
    #[arg(long, conflicts_with = "clone_only")]
    remote_only: bool,

    /// Only run the voice-cloning backend
    #[arg(long)]
    clone_only: bool,

    /// Characters per TTS request (default from config)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Language tag for the voice-cloning model (default from config)
    #[arg(long)]
    language: Option<String>,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default output directory
    SetOutputDir {
        /// Directory for audiobooks and extracted text
        path: PathBuf,
    },
    /// Set default chunk size
    SetChunkSize {
        /// Characters per TTS request
        value: usize,
    },
    /// Set default voice-cloning language
    SetLanguage {
        /// Language tag (e.g., en, fr-fr, pt-br)
        value: String,
    },
    /// Enable or disable reuse of existing audiobooks
    SetReuse {
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
    /// Set the cache lookup policy
    SetCachePolicy {
        /// newest or keyed
        value: CachePolicy,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let pdf_path = args.pdf_file.clone().ok_or_else(|| {
        anyhow::anyhow!("PDF file path is required. Run 'pdf-audio --help' for usage.")
    })?;

    let config = AudiobookConfig::load().context("Failed to load configuration")?;
    let speech = speech_client::Config::load().context("Failed to load speech configuration")?;

    let backends = if args.remote_only {
        BackendSelection::RemoteOnly
    } else if args.clone_only {
        BackendSelection::CloneOnly
    } else {
        BackendSelection::Both
    };

    let api_key = if backends.runs_remote() {
        resolve_api_key(&speech, &config.remote_preset, args.api_key.as_deref())?
    } else {
        None
    };

    let request = RunRequest {
        pdf_path,
        voice_path: args.voice.clone(),
        page_range: args.pages.clone(),
        api_key,
        reuse_existing: config.reuse_existing && !args.no_reuse,
        output_dir: args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone()),
        chunk_size: args.chunk_size.unwrap_or(config.chunk_size),
        language: args.language.clone().unwrap_or_else(|| config.language.clone()),
        backends,
    };

    if args.debug {
        eprintln!("PDF: {}", request.pdf_path.display());
        eprintln!("Voice: {:?}", request.voice_path);
        eprintln!("Pages: {}", request.page_range.as_deref().unwrap_or("all"));
        eprintln!("Output dir: {}", request.output_dir.display());
        eprintln!("Chunk size: {}", request.chunk_size);
        eprintln!("Reuse existing: {}", request.reuse_existing);
        eprintln!("Cache policy: {:?}", config.cache_policy);
    }

    let factory = DefaultBackends::new(&config, speech);
    let pipeline = Pipeline::new(config, factory);
    let report = pipeline.run(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Resolve the remote credential from the flag, speech.toml or the environment.
fn resolve_api_key(
    speech: &speech_client::Config,
    preset_name: &str,
    explicit: Option<&str>,
) -> Result<Option<String>> {
    let preset = speech.get_preset(preset_name)?;
    let kind = ProviderKind::from_str(&preset.provider)?;
    let provider_config = speech.get_provider_config(&preset.provider);
    let key = speech_client::get_api_key(explicit, provider_config, kind);
    Ok(key.ok())
}

fn print_report(report: &RunReport) {
    println!();
    println!(
        "Text: {} characters in {} chunks ({})",
        report.characters,
        report.chunks,
        report.text_path.display()
    );
    print_outcome("Remote TTS", &report.remote);
    print_outcome("Voice clone", &report.cloned);
}

fn print_outcome(label: &str, outcome: &BackendOutcome) {
    match outcome {
        BackendOutcome::Reused(path) => println!("{}: reused {}", label, path.display()),
        BackendOutcome::Generated(path) => println!("{}: {}", label, path.display()),
        BackendOutcome::Failed(message) => println!("{}: failed: {}", label, message),
        BackendOutcome::Skipped => println!("{}: skipped", label),
    }
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = AudiobookConfig::load()?;
            println!("Configuration file: {:?}", AudiobookConfig::config_path()?);
            println!();
            println!("output_dir = \"{}\"", config.output_dir.display());
            println!("chunk_size = {}", config.chunk_size);
            println!("remote_preset = \"{}\"", config.remote_preset);
            println!("clone_model = \"{}\"", config.clone_model);
            println!("language = \"{}\"", config.language);
            println!("voice_sample_rate = {}", config.voice_sample_rate);
            println!("reuse_existing = {}", config.reuse_existing);
            println!("cache_policy = {:?}", config.cache_policy);
            println!("remote_prefix = \"{}\"", config.remote_prefix);
            println!("cloned_prefix = \"{}\"", config.cloned_prefix);
            println!("fold_typography = {}", config.fold_typography);
            match &config.python_site_packages {
                Some(path) => println!("python_site_packages = \"{}\"", path.display()),
                None => println!("python_site_packages = (interpreter default)"),
            }
            match &config.ffmpeg_path {
                Some(path) => println!("ffmpeg_path = \"{}\"", path.display()),
                None => {
                    let found = audio::Ffmpeg::default().is_available();
                    println!(
                        "ffmpeg_path = (PATH{})",
                        if found { "" } else { ", not found" }
                    );
                }
            }
        }
        ConfigAction::SetOutputDir { path } => {
            let mut config = AudiobookConfig::load()?;
            config.output_dir = path.clone();
            config.save()?;
            println!("Default output directory set to: {}", path.display());
        }
        ConfigAction::SetChunkSize { value } => {
            if *value == 0 {
                anyhow::bail!("Chunk size must be at least 1");
            }
            let mut config = AudiobookConfig::load()?;
            config.chunk_size = *value;
            config.save()?;
            println!("Default chunk size set to: {}", config.chunk_size);
        }
        ConfigAction::SetLanguage { value } => {
            let mut config = AudiobookConfig::load()?;
            config.language = value.clone();
            config.save()?;
            println!("Default language set to: {}", config.language);
        }
        ConfigAction::SetReuse { value } => {
            let mut config = AudiobookConfig::load()?;
            config.reuse_existing = *value;
            config.save()?;
            println!("Reuse existing audiobooks: {}", config.reuse_existing);
        }
        ConfigAction::SetCachePolicy { value } => {
            let mut config = AudiobookConfig::load()?;
            config.cache_policy = *value;
            config.save()?;
            println!("Cache policy set to: {:?}", config.cache_policy);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_cache_policy_parses_value() {
        let args =
            Args::try_parse_from(["pdf-audio", "config", "set-cache-policy", "Keyed"]).unwrap();
        match args.command {
            Some(Commands::Config {
                action: ConfigAction::SetCachePolicy { value },
            }) => assert_eq!(value, CachePolicy::Keyed),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Args::try_parse_from(["pdf-audio", "config", "set-cache-policy", "lru"]).is_err());
    }
}
