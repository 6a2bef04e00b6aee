//! Synthesis backends and the sequential chunk driver.

pub mod clone;
pub mod remote;

use crate::audio::AudioSegment;
use crate::error::PipelineError;
use crate::text::TextChunk;
use anyhow::Result;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

pub use clone::VoiceCloneBackend;
pub use remote::RemoteBackend;

/// A text-to-speech engine that turns one chunk into one audio segment.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Name used in progress output and error reports.
    fn name(&self) -> &str;

    /// Synthesize a single chunk.
    async fn synthesize(&self, chunk: &TextChunk) -> Result<AudioSegment>;
}

/// The failing chunk of an aborted run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    pub index: usize,
    pub cause: String,
}

/// Result of driving a backend over a chunk sequence.
///
/// `segments` holds the audio of every chunk completed before `failure`.
#[derive(Debug)]
pub struct SynthesisRun {
    pub backend: String,
    pub segments: Vec<AudioSegment>,
    pub failure: Option<ChunkFailure>,
}

impl SynthesisRun {
    /// All segments, or the chunk failure as a pipeline error.
    pub fn into_result(self) -> std::result::Result<Vec<AudioSegment>, PipelineError> {
        match self.failure {
            None => Ok(self.segments),
            Some(failure) => Err(PipelineError::Synthesis {
                backend: self.backend,
                index: failure.index,
                cause: failure.cause,
            }),
        }
    }
}

/// Synthesize chunks strictly in order, one at a time.
///
/// The first failure stops the run; later chunks are not attempted.
pub async fn synthesize_chunks(
    backend: &dyn SpeechBackend,
    chunks: &[TextChunk],
) -> SynthesisRun {
    let pb = ProgressBar::new(chunks.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(backend.name().to_string());

    let mut segments = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        log::info!(
            "{} chunk {}/{} length: {} characters",
            backend.name(),
            chunk.index + 1,
            chunks.len(),
            chunk.char_len()
        );

        match backend.synthesize(chunk).await {
            Ok(segment) => {
                segments.push(segment);
                pb.inc(1);
            }
            Err(e) => {
                let cause = format!("{:#}", e);
                log::error!(
                    "{} error on chunk {}: {}",
                    backend.name(),
                    chunk.index + 1,
                    cause
                );
                pb.abandon_with_message(format!(
                    "{} failed on chunk {}",
                    backend.name(),
                    chunk.index + 1
                ));
                return SynthesisRun {
                    backend: backend.name().to_string(),
                    segments,
                    failure: Some(ChunkFailure {
                        index: chunk.index,
                        cause,
                    }),
                };
            }
        }
    }

    pb.finish_with_message(format!("{} complete", backend.name()));

    SynthesisRun {
        backend: backend.name().to_string(),
        segments,
        failure: None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a fixed-length segment per chunk, optionally failing on one index.
    pub struct ScriptedBackend {
        pub name: String,
        pub fail_on: Option<usize>,
        pub sample_rate: u32,
        pub calls: AtomicUsize,
        pub seen: Mutex<Vec<usize>>,
    }

    impl ScriptedBackend {
        pub fn new(name: &str, fail_on: Option<usize>) -> Self {
            Self {
                name: name.to_string(),
                fail_on,
                sample_rate: 24000,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechBackend for ScriptedBackend {
        fn name(&self) -> &str {
            &self.name
        }

        async fn synthesize(&self, chunk: &TextChunk) -> Result<AudioSegment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(chunk.index);
            if self.fail_on == Some(chunk.index) {
                anyhow::bail!("scripted failure");
            }
            // Tag each segment with its chunk index so order is observable
            let value = chunk.index as f32 / 100.0;
            Ok(AudioSegment::new(self.sample_rate, 1, vec![value; 10]))
        }
    }
}
