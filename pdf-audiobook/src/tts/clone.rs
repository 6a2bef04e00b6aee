//! Voice-cloning backend using PyO3 to embed Coqui TTS.
//!
//! The model is loaded once per run and conditioned on the prepared voice
//! reference for every chunk. Each chunk is rendered to a scratch WAV file
//! by the model and read back as a segment.

use super::SpeechBackend;
use crate::audio::{AudioSegment, VoiceReference};
use crate::error::PipelineError;
use crate::text::TextChunk;
use anyhow::{Context, Result};
use async_trait::async_trait;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

/// Initialize Python runtime once.
static PYTHON_INIT: Once = Once::new();

/// Coqui voice-cloning backend.
pub struct VoiceCloneBackend {
    model: Arc<Py<PyAny>>,
    model_name: String,
    voice_ref: PathBuf,
    language: String,
    work_dir: PathBuf,
}

impl VoiceCloneBackend {
    /// Load the cloning model.
    ///
    /// `site_packages` is prepended to `sys.path` on first use so a Coqui
    /// install outside the default interpreter paths can be found. The import
    /// and checkpoint download run on the blocking pool.
    pub async fn load(
        model_name: &str,
        site_packages: Option<&Path>,
        voice_ref: &VoiceReference,
        language: &str,
        work_dir: &Path,
    ) -> std::result::Result<Self, PipelineError> {
        let load_error = |cause: String| PipelineError::ModelLoad {
            model: model_name.to_string(),
            cause,
        };

        log::info!("Loading voice-cloning model {}", model_name);
        let name = model_name.to_string();
        let site_packages = site_packages.map(Path::to_path_buf);
        let model = tokio::task::spawn_blocking(move || {
            init_python(site_packages.as_deref());
            load_model(&name)
        })
        .await
        .map_err(|e| load_error(e.to_string()))?
        .map_err(|e| load_error(e.to_string()))?;

        Ok(Self {
            model: Arc::new(model),
            model_name: model_name.to_string(),
            voice_ref: voice_ref.path.clone(),
            language: language.to_string(),
            work_dir: work_dir.to_path_buf(),
        })
    }

    fn render_sync(
        model: &Py<PyAny>,
        text: &str,
        voice_ref: &Path,
        language: &str,
        output_path: &Path,
    ) -> Result<()> {
        Python::with_gil(|py| -> PyResult<()> {
            let kwargs = PyDict::new(py);
            kwargs.set_item("text", text)?;
            kwargs.set_item("file_path", output_path.to_string_lossy().as_ref())?;
            kwargs.set_item("speaker_wav", voice_ref.to_string_lossy().as_ref())?;
            kwargs.set_item("language", language)?;

            model.bind(py).call_method("tts_to_file", (), Some(&kwargs))?;

            // Release tensors held by the previous chunk
            py.import("gc")?.call_method0("collect")?;
            Ok(())
        })
        .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

fn load_model(model_name: &str) -> PyResult<Py<PyAny>> {
    Python::with_gil(|py| {
        let api = py.import("TTS.api")?;
        let tts_class = api.getattr("TTS")?;

        let kwargs = PyDict::new(py);
        kwargs.set_item("model_name", model_name)?;
        kwargs.set_item("progress_bar", false)?;
        let model = tts_class.call((), Some(&kwargs))?;

        Ok(model.unbind())
    })
}

fn init_python(site_packages: Option<&Path>) {
    PYTHON_INIT.call_once(|| {
        pyo3::prepare_freethreaded_python();

        if let Some(site_packages) = site_packages {
            let inserted = Python::with_gil(|py| -> PyResult<()> {
                let sys = py.import("sys")?;
                let path = sys.getattr("path")?;
                path.call_method1("insert", (0, site_packages.to_string_lossy().as_ref()))?;
                Ok(())
            });
            if let Err(e) = inserted {
                log::warn!(
                    "Could not add {} to sys.path: {}",
                    site_packages.display(),
                    e
                );
            }
        }
    });
}

#[async_trait]
impl SpeechBackend for VoiceCloneBackend {
    fn name(&self) -> &str {
        "YourTTS"
    }

    async fn synthesize(&self, chunk: &TextChunk) -> Result<AudioSegment> {
        let model = Arc::clone(&self.model);
        let text = chunk.text.clone();
        let voice_ref = self.voice_ref.clone();
        let language = self.language.clone();
        let output_path = self.work_dir.join(format!("chunk_{}.wav", chunk.index));
        let render_path = output_path.clone();

        log::debug!("Rendering chunk {} with {}", chunk.index + 1, self.model_name);

        // Run in a blocking task to not block the tokio runtime
        tokio::task::spawn_blocking(move || {
            Self::render_sync(&model, &text, &voice_ref, &language, &render_path)
        })
        .await
        .context("Task join error")??;

        let segment = AudioSegment::from_wav_file(&output_path)?;
        std::fs::remove_file(&output_path).ok();
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unknown_model_is_model_load_error() {
        // Fails whether or not Coqui TTS is installed: either the import or
        // the model lookup raises.
        let temp_dir = TempDir::new().unwrap();
        let voice = VoiceReference {
            path: temp_dir.path().join("voice_reference.wav"),
            sample_rate: 22050,
            frames: 0,
        };

        let result = VoiceCloneBackend::load(
            "tts_models/none/no-such-dataset/no_such_model",
            None,
            &voice,
            "en",
            temp_dir.path(),
        )
        .await;
        match result {
            Err(PipelineError::ModelLoad { model, .. }) => {
                assert_eq!(model, "tts_models/none/no-such-dataset/no_such_model");
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("nonexistent model loaded"),
        }
    }
}
