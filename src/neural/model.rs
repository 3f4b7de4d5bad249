//! Speech model trait and core types
//!
//! Defines the interface the external Qwen3-TTS runtime must implement and
//! the closed choice sets the nodes expose.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};

/// Publisher namespace on the model hub
pub const MODEL_PUBLISHER: &str = "Qwen";

/// Model family shared by all variants
pub const MODEL_FAMILY: &str = "Qwen3-TTS-12Hz-1.7B";

/// Logical model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelVariant {
    /// Preset speakers steered by a style instruction
    CustomVoice,
    /// Base model used for voice cloning
    Base,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::CustomVoice, ModelVariant::Base];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomVoice => "CustomVoice",
            Self::Base => "Base",
        }
    }

    /// Directory name, also the repository name under the publisher
    pub fn dir_name(&self) -> String {
        format!("{}-{}", MODEL_FAMILY, self.as_str())
    }

    /// Hub repository address, `{publisher}/{family}-{variant}`
    pub fn repo_id(&self) -> String {
        format!("{}/{}", MODEL_PUBLISHER, self.dir_name())
    }

    /// Local snapshot directory under the models base directory
    pub fn local_dir(&self, base: &Path) -> PathBuf {
        base.join(self.dir_name())
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                TtsError::invalid_input("model", format!("unknown model variant '{}'", s))
            })
    }
}

/// Language selector; `Auto` lets the model infer the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    Japanese,
    #[default]
    English,
    Chinese,
    Auto,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Japanese,
        Language::English,
        Language::Chinese,
        Language::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Japanese => "Japanese",
            Self::English => "English",
            Self::Chinese => "Chinese",
            Self::Auto => "Auto",
        }
    }

    /// Language argument for the model; `None` for `Auto`
    pub fn model_arg(&self) -> Option<&'static str> {
        match self {
            Self::Auto => None,
            other => Some(other.as_str()),
        }
    }
}

impl FromStr for Language {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| TtsError::invalid_input("language", format!("unknown choice '{}'", s)))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Preset speakers of the CustomVoice model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    #[default]
    OnoAnna,
    Aiden,
    Dylan,
    Eric,
    Ryan,
    Serena,
    Sohee,
    UncleFu,
    Vivian,
}

impl Speaker {
    pub const ALL: [Speaker; 9] = [
        Speaker::OnoAnna,
        Speaker::Aiden,
        Speaker::Dylan,
        Speaker::Eric,
        Speaker::Ryan,
        Speaker::Serena,
        Speaker::Sohee,
        Speaker::UncleFu,
        Speaker::Vivian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnoAnna => "ono_anna",
            Self::Aiden => "aiden",
            Self::Dylan => "dylan",
            Self::Eric => "eric",
            Self::Ryan => "ryan",
            Self::Serena => "serena",
            Self::Sohee => "sohee",
            Self::UncleFu => "uncle_fu",
            Self::Vivian => "vivian",
        }
    }
}

impl FromStr for Speaker {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|sp| sp.as_str() == s)
            .ok_or_else(|| TtsError::invalid_input("speaker", format!("unknown choice '{}'", s)))
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric precision the model is loaded with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// bfloat16, used when an accelerator is present
    BF16,
    /// float32 CPU fallback
    F32,
}

impl Precision {
    /// dtype name understood by the inference runtime
    pub fn dtype(&self) -> &'static str {
        match self {
            Self::BF16 => "bfloat16",
            Self::F32 => "float32",
        }
    }
}

/// How a model wants clone-mode reference audio handed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferenceInputKind {
    /// Path to a WAV file on local disk
    #[default]
    FilePath,
    /// Interleaved samples in memory
    Samples,
}

/// Reference audio argument for voice cloning
#[derive(Debug, Clone, Copy)]
pub enum ReferenceAudio<'a> {
    Path(&'a Path),
    Samples {
        interleaved: &'a [f32],
        channels: usize,
        sample_rate: u32,
    },
}

/// Raw generation output: one waveform per generated utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Synthesis {
    pub waveforms: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl Synthesis {
    /// Take the first waveform, which is the result the nodes use
    pub fn into_first(self) -> Result<(Vec<f32>, u32)> {
        let sample_rate = self.sample_rate;
        self.waveforms
            .into_iter()
            .next()
            .map(|w| (w, sample_rate))
            .ok_or_else(|| TtsError::inference("model returned no waveforms"))
    }
}

/// Trait the external speech runtime implements
///
/// Implementations are shared across requests through the model cache, so
/// they must be `Send + Sync`.
pub trait SpeechModel: Send + Sync {
    /// Which variant this handle was loaded from
    fn variant(&self) -> ModelVariant;

    /// Synthesize `text` with a preset speaker and a style instruction
    ///
    /// `language` is `None` when the model should infer it.
    fn generate_custom_voice(
        &self,
        text: &str,
        language: Option<&str>,
        speaker: &str,
        instruct: &str,
    ) -> Result<Synthesis>;

    /// Synthesize `text` in the voice of the reference clip
    fn generate_voice_clone(
        &self,
        text: &str,
        language: Option<&str>,
        reference: ReferenceAudio<'_>,
        ref_text: &str,
    ) -> Result<Synthesis>;

    /// Form the model accepts reference audio in
    fn reference_input(&self) -> ReferenceInputKind {
        ReferenceInputKind::FilePath
    }
}
