//! Mock collaborators for testing
//!
//! A speech model that records every call and returns a test tone, an
//! artifact source that writes a minimal snapshot to disk, and a loader
//! that hands out mock models. None of them touch the network.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::audio::adapter::is_handoff_file;
use crate::error::{Result, TtsError};
use crate::neural::bridge::ModelLoader;
use crate::neural::hub::ArtifactSource;
use crate::neural::model::{
    ModelVariant, Precision, ReferenceAudio, ReferenceInputKind, SpeechModel, Synthesis,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Generate a mono sine tone
pub fn test_tone(frequency: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// What the mock saw of the reference audio
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedReference {
    File {
        path: PathBuf,
        /// Whether the file existed while the model was running
        existed: bool,
        /// Handoff files present in the same directory during the call
        handoff_files_in_dir: usize,
    },
    Samples {
        len: usize,
        channels: usize,
        sample_rate: u32,
    },
}

/// One call made against a mock model
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CustomVoice {
        text: String,
        language: Option<String>,
        speaker: String,
        instruct: String,
    },
    VoiceClone {
        text: String,
        language: Option<String>,
        reference: RecordedReference,
        ref_text: String,
    },
}

/// How mock models respond
#[derive(Debug, Clone)]
pub struct MockBehavior {
    pub sample_rate: u32,
    pub waveform: Vec<f32>,
    /// When set, every generation fails with this message
    pub fail_with: Option<String>,
    pub reference_input: ReferenceInputKind,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            waveform: test_tone(220.0, 0.1, 24000),
            fail_with: None,
            reference_input: ReferenceInputKind::FilePath,
        }
    }
}

/// Speech model that records calls instead of synthesizing
pub struct MockSpeechModel {
    variant: ModelVariant,
    behavior: MockBehavior,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockSpeechModel {
    pub fn new(variant: ModelVariant) -> Self {
        Self::with_behavior(variant, MockBehavior::default())
    }

    pub fn with_behavior(variant: ModelVariant, behavior: MockBehavior) -> Self {
        Self {
            variant,
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    fn respond(&self) -> Result<Synthesis> {
        if let Some(reason) = &self.behavior.fail_with {
            return Err(TtsError::inference(reason.clone()));
        }
        Ok(Synthesis {
            waveforms: vec![self.behavior.waveform.clone()],
            sample_rate: self.behavior.sample_rate,
        })
    }
}

fn record_reference(reference: ReferenceAudio<'_>) -> RecordedReference {
    match reference {
        ReferenceAudio::Path(path) => {
            let handoff_files_in_dir = path
                .parent()
                .and_then(|dir| fs::read_dir(dir).ok())
                .map(|entries| {
                    entries
                        .filter_map(|e| e.ok())
                        .filter(|e| is_handoff_file(&e.file_name().to_string_lossy()))
                        .count()
                })
                .unwrap_or(0);
            RecordedReference::File {
                path: path.to_path_buf(),
                existed: path.is_file(),
                handoff_files_in_dir,
            }
        }
        ReferenceAudio::Samples {
            interleaved,
            channels,
            sample_rate,
        } => RecordedReference::Samples {
            len: interleaved.len(),
            channels,
            sample_rate,
        },
    }
}

impl SpeechModel for MockSpeechModel {
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
        lock(&self.calls).push(RecordedCall::CustomVoice {
            text: text.to_string(),
            language: language.map(String::from),
            speaker: speaker.to_string(),
            instruct: instruct.to_string(),
        });
        self.respond()
    }

    fn generate_voice_clone(
        &self,
        text: &str,
        language: Option<&str>,
        reference: ReferenceAudio<'_>,
        ref_text: &str,
    ) -> Result<Synthesis> {
        lock(&self.calls).push(RecordedCall::VoiceClone {
            text: text.to_string(),
            language: language.map(String::from),
            reference: record_reference(reference),
            ref_text: ref_text.to_string(),
        });
        self.respond()
    }

    fn reference_input(&self) -> ReferenceInputKind {
        self.behavior.reference_input
    }
}

/// Loader handing out mock models that share one call log
#[derive(Clone, Default)]
pub struct MockLoader {
    behavior: MockBehavior,
    fail: bool,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    loads: Arc<Mutex<Vec<(ModelVariant, PathBuf, Precision)>>>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Loader whose every load fails with a LoadError
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn load_count(&self) -> usize {
        lock(&self.loads).len()
    }

    pub fn loaded_dirs(&self) -> Vec<PathBuf> {
        lock(&self.loads).iter().map(|(_, dir, _)| dir.clone()).collect()
    }

    pub fn precisions(&self) -> Vec<Precision> {
        lock(&self.loads).iter().map(|(_, _, p)| *p).collect()
    }

    /// Calls made against any model this loader produced
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }
}

impl ModelLoader for MockLoader {
    fn load(
        &self,
        variant: ModelVariant,
        dir: &Path,
        precision: Precision,
    ) -> Result<Arc<dyn SpeechModel>> {
        if self.fail {
            return Err(TtsError::load(dir, "mock loader configured to fail"));
        }
        lock(&self.loads).push((variant, dir.to_path_buf(), precision));

        Ok(Arc::new(MockSpeechModel {
            variant,
            behavior: self.behavior.clone(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Artifact source that writes a minimal snapshot instead of downloading
#[derive(Clone, Default)]
pub struct FakeSource {
    requests: Arc<Mutex<Vec<(String, PathBuf)>>>,
    fail_remaining: Arc<AtomicUsize>,
    delay_ms: u64,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` snapshots with a FetchError
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_remaining: Arc::new(AtomicUsize::new(n)),
            ..Self::default()
        }
    }

    /// Sleep inside every snapshot, to widen race windows in tests
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn snapshot_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn requests(&self) -> Vec<(String, PathBuf)> {
        lock(&self.requests).clone()
    }
}

impl ArtifactSource for FakeSource {
    fn snapshot(&self, repo_id: &str, dest: &Path) -> Result<PathBuf> {
        lock(&self.requests).push((repo_id.to_string(), dest.to_path_buf()));
        if self.delay_ms > 0 {
            std::thread::sleep(Duration::from_millis(self.delay_ms));
        }

        let should_fail = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(TtsError::fetch(repo_id, "simulated network failure"));
        }

        let write = |name: &str, contents: &[u8]| -> std::io::Result<()> {
            let path = dest.join(name);
            if !path.exists() {
                fs::write(path, contents)?;
            }
            Ok(())
        };
        fs::create_dir_all(dest)
            .and_then(|_| write("config.json", br#"{"model_type": "qwen3_tts"}"#))
            .and_then(|_| write("model.safetensors", b"mock-weights"))
            .map_err(|e| TtsError::fetch_with(repo_id, "cannot write mock snapshot", e))?;

        Ok(dest.to_path_buf())
    }
}
