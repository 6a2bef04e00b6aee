//! End-to-end audiobook run.
//!
//! A run prepares the voice reference, extracts and chunks the text, then
//! drives each selected backend in turn. Each backend either reuses a
//! cached artifact or synthesizes every chunk and exports one file; a
//! failure in one backend never affects the other.

use crate::audio::{self, ExportFormat, Ffmpeg, VoiceReference};
use crate::cache::{self, CachePolicy};
use crate::config::AudiobookConfig;
use crate::error::{InputError, PipelineError, Result};
use crate::pdf::{self, Document, PageRange};
use crate::text::{TextChunk, chunk_text};
use crate::tts::{RemoteBackend, SpeechBackend, VoiceCloneBackend, synthesize_chunks};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const TEXT_FILE_NAME: &str = "book_text.txt";

/// Which synthesis backends a run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    Both,
    RemoteOnly,
    CloneOnly,
}

impl BackendSelection {
    pub fn runs_remote(&self) -> bool {
        matches!(self, BackendSelection::Both | BackendSelection::RemoteOnly)
    }

    pub fn runs_cloner(&self) -> bool {
        matches!(self, BackendSelection::Both | BackendSelection::CloneOnly)
    }
}

/// Everything one run needs, fixed at invocation time.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub pdf_path: PathBuf,
    pub voice_path: Option<PathBuf>,
    pub page_range: Option<String>,
    /// Resolved remote TTS credential
    pub api_key: Option<String>,
    pub reuse_existing: bool,
    pub output_dir: PathBuf,
    pub chunk_size: usize,
    pub language: String,
    pub backends: BackendSelection,
}

impl RunRequest {
    /// Check every input before any file is read or any service is called.
    pub fn validate(&self) -> std::result::Result<(), InputError> {
        if !self.pdf_path.is_file() {
            return Err(InputError::MissingInput(format!(
                "PDF file not found: {}",
                self.pdf_path.display()
            )));
        }

        if self.backends.runs_cloner() {
            match &self.voice_path {
                Some(path) if path.is_file() => {}
                Some(path) => {
                    return Err(InputError::MissingInput(format!(
                        "Voice sample not found: {}",
                        path.display()
                    )));
                }
                None => {
                    return Err(InputError::MissingInput(
                        "voice sample (use --voice)".to_string(),
                    ));
                }
            }
        }

        if self.backends.runs_remote()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(InputError::MissingInput(
                "API key (use --api-key or set DEEPGRAM_API_KEY)".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(InputError::InvalidOption(
                "chunk size must be at least 1".to_string(),
            ));
        }

        PageRange::parse(self.page_range.as_deref())?;
        Ok(())
    }

    fn range_param(&self) -> &str {
        self.page_range.as_deref().map(str::trim).unwrap_or("")
    }
}

/// What happened to one backend during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendOutcome {
    Reused(PathBuf),
    Generated(PathBuf),
    Failed(String),
    Skipped,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub characters: usize,
    pub chunks: usize,
    pub text_path: PathBuf,
    pub remote: BackendOutcome,
    pub cloned: BackendOutcome,
}

/// Builds the synthesis backends for a run.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn remote(&self, request: &RunRequest) -> anyhow::Result<Box<dyn SpeechBackend>>;

    async fn cloner(
        &self,
        request: &RunRequest,
        voice: &VoiceReference,
        work_dir: &Path,
    ) -> anyhow::Result<Box<dyn SpeechBackend>>;
}

/// Deepgram through speech-client, and Coqui YourTTS through Python.
pub struct DefaultBackends {
    speech: speech_client::Config,
    remote_preset: String,
    clone_model: String,
    python_site_packages: Option<PathBuf>,
}

impl DefaultBackends {
    pub fn new(config: &AudiobookConfig, speech: speech_client::Config) -> Self {
        Self {
            speech,
            remote_preset: config.remote_preset.clone(),
            clone_model: config.clone_model.clone(),
            python_site_packages: config.python_site_packages.clone(),
        }
    }
}

#[async_trait]
impl BackendFactory for DefaultBackends {
    async fn remote(&self, request: &RunRequest) -> anyhow::Result<Box<dyn SpeechBackend>> {
        let preset = self.speech.get_preset(&self.remote_preset)?;
        let provider = speech_client::get_provider(
            preset,
            self.speech.get_provider_config(&preset.provider),
            request.api_key.as_deref(),
        )?;
        let backend = RemoteBackend::new(Arc::from(provider), preset.clone())?;
        Ok(Box::new(backend))
    }

    async fn cloner(
        &self,
        request: &RunRequest,
        voice: &VoiceReference,
        work_dir: &Path,
    ) -> anyhow::Result<Box<dyn SpeechBackend>> {
        let backend = VoiceCloneBackend::load(
            &self.clone_model,
            self.python_site_packages.as_deref(),
            voice,
            &request.language,
            work_dir,
        )
        .await?;
        Ok(Box::new(backend))
    }
}

/// Per-backend artifact naming.
struct Stage<'a> {
    prefix: &'a str,
    format: ExportFormat,
    /// Inputs hashed into the keyed-cache name
    key_files: Vec<&'a Path>,
    key_params: Vec<String>,
}

pub struct Pipeline<F: BackendFactory> {
    config: AudiobookConfig,
    factory: F,
    ffmpeg: Ffmpeg,
}

impl<F: BackendFactory> Pipeline<F> {
    pub fn new(config: AudiobookConfig, factory: F) -> Self {
        let ffmpeg = Ffmpeg::from_config(config.ffmpeg_path.as_deref());
        Self {
            config,
            factory,
            ffmpeg,
        }
    }

    /// Run the whole pipeline.
    ///
    /// Returns an error only when nothing can be synthesized at all: bad
    /// input, an unreadable voice sample or an unreadable PDF. Backend
    /// failures are reported in the outcome of that backend.
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport> {
        request.validate()?;

        let work_dir = TempDir::new()?;
        let voice = match (&request.voice_path, request.backends.runs_cloner()) {
            (Some(path), true) => Some(self.prepare_voice(path, work_dir.path())?),
            _ => None,
        };

        eprintln!("Extracting text from {}...", request.pdf_path.display());
        let document = Document::open(&request.pdf_path)?;
        let text = pdf::extract_text(
            &document,
            request.page_range.as_deref(),
            self.config.fold_typography,
        )?;

        fs::create_dir_all(&request.output_dir)?;
        let text_path = request.output_dir.join(TEXT_FILE_NAME);
        fs::write(&text_path, &text)?;

        let characters = text.chars().count();
        let chunks = chunk_text(&text, request.chunk_size);
        eprintln!(
            "Extracted {} characters ({} chunks) to {}",
            characters,
            chunks.len(),
            text_path.display()
        );

        let remote = if request.backends.runs_remote() {
            self.remote_stage(request, &chunks).await
        } else {
            BackendOutcome::Skipped
        };

        let cloned = match &voice {
            Some(voice) => self.clone_stage(request, &chunks, voice, work_dir.path()).await,
            None => BackendOutcome::Skipped,
        };

        Ok(RunReport {
            characters,
            chunks: chunks.len(),
            text_path,
            remote,
            cloned,
        })
    }

    fn prepare_voice(&self, path: &Path, work_dir: &Path) -> Result<VoiceReference> {
        eprintln!("Preparing voice sample {}...", path.display());
        let voice = audio::prepare_voice_reference(
            path,
            work_dir,
            self.config.voice_sample_rate,
            &self.ffmpeg,
        )
        .map_err(|e| PipelineError::Conversion(format!("{:#}", e)))?;

        log::info!(
            "Voice reference: {:.1}s at {} Hz",
            voice.duration_secs(),
            voice.sample_rate
        );
        Ok(voice)
    }

    async fn remote_stage(&self, request: &RunRequest, chunks: &[TextChunk]) -> BackendOutcome {
        let stage = Stage {
            prefix: &self.config.remote_prefix,
            format: ExportFormat::Wav,
            key_files: vec![request.pdf_path.as_path()],
            key_params: vec![
                request.range_param().to_string(),
                request.chunk_size.to_string(),
                self.config.fold_typography.to_string(),
                self.config.remote_preset.clone(),
            ],
        };

        self.drive(request, &stage, chunks, self.factory.remote(request))
            .await
    }

    async fn clone_stage(
        &self,
        request: &RunRequest,
        chunks: &[TextChunk],
        voice: &VoiceReference,
        work_dir: &Path,
    ) -> BackendOutcome {
        let mut key_files = vec![request.pdf_path.as_path()];
        if let Some(path) = &request.voice_path {
            key_files.push(path.as_path());
        }

        let stage = Stage {
            prefix: &self.config.cloned_prefix,
            format: ExportFormat::Mp3,
            key_files,
            key_params: vec![
                request.range_param().to_string(),
                request.chunk_size.to_string(),
                self.config.fold_typography.to_string(),
                self.config.clone_model.clone(),
                request.language.clone(),
            ],
        };

        let build = self.factory.cloner(request, voice, work_dir);
        self.drive(request, &stage, chunks, build).await
    }

    /// Reuse a cached artifact or build the backend and generate a new one.
    ///
    /// `build` is only awaited when there is something to generate.
    async fn drive<B>(
        &self,
        request: &RunRequest,
        stage: &Stage<'_>,
        chunks: &[TextChunk],
        build: B,
    ) -> BackendOutcome
    where
        B: Future<Output = anyhow::Result<Box<dyn SpeechBackend>>>,
    {
        let key = match self.stage_key(stage) {
            Ok(key) => key,
            Err(e) => return failed(stage.prefix, e),
        };

        if request.reuse_existing {
            match cache::find_cached(
                &request.output_dir,
                stage.prefix,
                key.as_deref(),
                stage.format.extension(),
            ) {
                Ok(Some(path)) => {
                    log::info!("Reusing existing audiobook {}", path.display());
                    eprintln!("Reusing existing audiobook: {}", path.display());
                    return BackendOutcome::Reused(path);
                }
                Ok(None) => {}
                Err(e) => log::warn!("Cache lookup failed, regenerating: {:#}", e),
            }
        }

        match self.generate(request, stage, key.as_deref(), chunks, build).await {
            Ok(path) => BackendOutcome::Generated(path),
            Err(e) => failed(stage.prefix, e),
        }
    }

    async fn generate<B>(
        &self,
        request: &RunRequest,
        stage: &Stage<'_>,
        key: Option<&str>,
        chunks: &[TextChunk],
        build: B,
    ) -> anyhow::Result<PathBuf>
    where
        B: Future<Output = anyhow::Result<Box<dyn SpeechBackend>>>,
    {
        if chunks.is_empty() {
            anyhow::bail!("No text to synthesize in the selected pages");
        }

        let backend = build.await?;
        eprintln!(
            "Generating audio with {} ({} chunks)...",
            backend.name(),
            chunks.len()
        );

        let segments = synthesize_chunks(backend.as_ref(), chunks)
            .await
            .into_result()?;

        let assembled = audio::concatenate(&segments)
            .map_err(|e| PipelineError::Assembly(format!("{:#}", e)))?;

        let path = cache::artifact_path(
            &request.output_dir,
            stage.prefix,
            key,
            stage.format.extension(),
            Local::now(),
        );
        audio::export(&assembled, &path, stage.format, &self.ffmpeg)
            .map_err(|e| PipelineError::Assembly(format!("{:#}", e)))?;

        log::info!(
            "Wrote {} ({:.1}s of audio)",
            path.display(),
            assembled.duration_secs()
        );
        Ok(path)
    }

    fn stage_key(&self, stage: &Stage<'_>) -> anyhow::Result<Option<String>> {
        match self.config.cache_policy {
            CachePolicy::Newest => Ok(None),
            CachePolicy::Keyed => {
                let params: Vec<&str> = stage.key_params.iter().map(String::as_str).collect();
                let key = cache::request_key(&stage.key_files, &params)
                    .context("Failed to compute cache key")?;
                Ok(Some(key))
            }
        }
    }
}

fn failed(prefix: &str, err: anyhow::Error) -> BackendOutcome {
    let message = format!("{:#}", err);
    log::error!("{}: {}", prefix, message);
    BackendOutcome::Failed(message)
}
