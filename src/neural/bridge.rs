//! Qwen3-TTS inference bridge
//!
//! The speech model itself runs in a separate inference service. This module
//! validates the local snapshot, asks the bridge to load it, and forwards
//! generation calls over HTTP/JSON.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::Settings;
use crate::error::{Result, TtsError};
use crate::neural::model::{
    ModelVariant, Precision, ReferenceAudio, ReferenceInputKind, SpeechModel, Synthesis,
};

/// Builds a ready model handle from a local snapshot directory
pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
        variant: ModelVariant,
        dir: &Path,
        precision: Precision,
    ) -> Result<Arc<dyn SpeechModel>>;
}

/// Summary of a validated local snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDirReport {
    pub weight_files: usize,
    pub total_bytes: u64,
}

/// Check that `dir` looks like a loadable snapshot.
///
/// Requires a top-level `config.json` holding a JSON object and at least one
/// `*.safetensors` file anywhere below `dir`.
pub fn inspect_model_dir(dir: &Path) -> Result<ModelDirReport> {
    if !dir.is_dir() {
        return Err(TtsError::load(dir, "model directory does not exist"));
    }

    let config_path = dir.join("config.json");
    let raw = fs::read_to_string(&config_path)
        .map_err(|e| TtsError::load(dir, format!("cannot read config.json: {}", e)))?;
    let config: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| TtsError::load(dir, format!("config.json is not valid JSON: {}", e)))?;
    if !config.is_object() {
        return Err(TtsError::load(dir, "config.json is not a JSON object"));
    }

    let mut weight_files = 0usize;
    let mut total_bytes = 0u64;
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let is_weights = entry
            .path()
            .extension()
            .map(|ext| ext == "safetensors")
            .unwrap_or(false);
        if is_weights {
            let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if len == 0 {
                return Err(TtsError::load(
                    dir,
                    format!("weight file {} is empty", entry.path().display()),
                ));
            }
            weight_files += 1;
            total_bytes += len;
        }
    }

    if weight_files == 0 {
        return Err(TtsError::load(dir, "no .safetensors weight files found"));
    }

    Ok(ModelDirReport {
        weight_files,
        total_bytes,
    })
}

#[derive(Debug, Serialize)]
struct LoadRequest<'a> {
    model_path: String,
    dtype: &'a str,
    device_map: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    model_id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CustomVoiceRequest<'a> {
    model_id: &'a str,
    text: &'a str,
    language: Option<&'a str>,
    speaker: &'a str,
    instruct: &'a str,
}

#[derive(Debug, Serialize)]
struct VoiceCloneRequest<'a> {
    model_id: &'a str,
    text: &'a str,
    language: Option<&'a str>,
    ref_audio: String,
    ref_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    waveforms: Vec<Vec<f32>>,
    sample_rate: Option<u32>,
    error: Option<String>,
}

impl GenerateResponse {
    fn into_synthesis(self) -> Result<Synthesis> {
        if let Some(error) = self.error {
            return Err(TtsError::inference(error));
        }
        let sample_rate = self
            .sample_rate
            .filter(|sr| *sr > 0)
            .ok_or_else(|| TtsError::inference("bridge response has no sample rate"))?;
        Ok(Synthesis {
            waveforms: self.waveforms,
            sample_rate,
        })
    }
}

fn http_client(timeout_ms: u64) -> std::result::Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
}

/// Loads snapshots into the inference bridge
pub struct BridgeLoader {
    bridge_url: String,
    timeout_ms: u64,
}

impl BridgeLoader {
    pub fn new(settings: &Settings) -> Self {
        Self {
            bridge_url: settings.bridge_url.trim_end_matches('/').to_string(),
            timeout_ms: settings.timeout_ms,
        }
    }
}

impl ModelLoader for BridgeLoader {
    fn load(
        &self,
        variant: ModelVariant,
        dir: &Path,
        precision: Precision,
    ) -> Result<Arc<dyn SpeechModel>> {
        let report = inspect_model_dir(dir)?;
        tracing::info!(
            "Loading {} from {} ({} weight files, {:.2} GB, {})",
            variant,
            dir.display(),
            report.weight_files,
            report.total_bytes as f64 / 1e9,
            precision.dtype()
        );

        let client = http_client(self.timeout_ms)
            .map_err(|e| TtsError::load(dir, format!("cannot build HTTP client: {}", e)))?;

        let absolute = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let request = LoadRequest {
            model_path: absolute.to_string_lossy().to_string(),
            dtype: precision.dtype(),
            device_map: "auto",
        };

        let url = format!("{}/load", self.bridge_url);
        let response = client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| TtsError::load(dir, format!("cannot reach bridge at {}: {}", self.bridge_url, e)))?;

        let status = response.status();
        let body: LoadResponse = response
            .json()
            .map_err(|e| TtsError::load(dir, format!("invalid load response (HTTP {}): {}", status, e)))?;

        if let Some(error) = body.error {
            return Err(TtsError::load(dir, error));
        }
        let model_id = body
            .model_id
            .filter(|_| status.is_success())
            .ok_or_else(|| TtsError::load(dir, format!("bridge returned HTTP {} without a model id", status)))?;

        Ok(Arc::new(BridgeSpeechModel {
            variant,
            model_id,
            bridge_url: self.bridge_url.clone(),
            client,
        }))
    }
}

/// Model handle living inside the inference bridge
pub struct BridgeSpeechModel {
    variant: ModelVariant,
    model_id: String,
    bridge_url: String,
    client: reqwest::blocking::Client,
}

impl BridgeSpeechModel {
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    fn generate<T: Serialize>(&self, endpoint: &str, request: &T) -> Result<Synthesis> {
        let url = format!("{}/generate/{}", self.bridge_url, endpoint);
        let response = self.client.post(&url).json(request).send().map_err(|e| {
            if e.is_timeout() {
                TtsError::inference(format!("bridge timed out on {}", endpoint))
            } else {
                TtsError::inference(format!("cannot reach bridge at {}: {}", self.bridge_url, e))
            }
        })?;

        let status = response.status();
        let body: GenerateResponse = response.json().map_err(|e| {
            TtsError::inference(format!("invalid response from bridge (HTTP {}): {}", status, e))
        })?;
        if !status.is_success() && body.error.is_none() {
            return Err(TtsError::inference(format!("bridge returned HTTP {}", status)));
        }
        body.into_synthesis()
    }
}

impl SpeechModel for BridgeSpeechModel {
    fn variant(&self) -> ModelVariant {
        self.variant
    }

    fn generate_custom_voice(
        &self,
        text: &str,
        language: Option<&str>,
        speaker: &str,
        instruct: &str,
    ) -> Result<Synthesis> {
        self.generate(
            "custom_voice",
            &CustomVoiceRequest {
                model_id: &self.model_id,
                text,
                language,
                speaker,
                instruct,
            },
        )
    }

    fn generate_voice_clone(
        &self,
        text: &str,
        language: Option<&str>,
        reference: ReferenceAudio<'_>,
        ref_text: &str,
    ) -> Result<Synthesis> {
        let ReferenceAudio::Path(path) = reference else {
            return Err(TtsError::inference(
                "bridge only accepts reference audio as a file path",
            ));
        };

        self.generate(
            "voice_clone",
            &VoiceCloneRequest {
                model_id: &self.model_id,
                text,
                language,
                ref_audio: path.to_string_lossy().to_string(),
                ref_text,
            },
        )
    }

    fn reference_input(&self) -> ReferenceInputKind {
        ReferenceInputKind::FilePath
    }
}
