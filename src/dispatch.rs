//! Generation dispatch
//!
//! Each request is a one-shot blocking round trip: acquire the model for the
//! request's variant, adapt any reference audio, call the model, adapt the
//! first returned waveform back into host audio.

use std::path::{Path, PathBuf};

use crate::audio::{from_model_output, to_model_input, HostAudio, ModelInput};
use crate::config::Settings;
use crate::error::Result;
use crate::neural::{Language, ModelCache, ModelVariant, Speaker};

/// A synthesis request in one of the two supported modes
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    /// Preset speaker steered by a free-form style instruction
    CustomVoice {
        text: String,
        language: Language,
        speaker: Speaker,
        instruct: String,
    },
    /// Clone the voice of a reference clip
    VoiceClone {
        text: String,
        language: Language,
        ref_audio: HostAudio,
        ref_text: String,
    },
}

impl GenerationRequest {
    /// Model variant serving this request
    pub fn variant(&self) -> ModelVariant {
        match self {
            Self::CustomVoice { .. } => ModelVariant::CustomVoice,
            Self::VoiceClone { .. } => ModelVariant::Base,
        }
    }
}

/// Everything a node call needs besides its inputs
pub struct NodeContext {
    pub cache: ModelCache,
    pub scratch_dir: Option<PathBuf>,
}

impl NodeContext {
    pub fn new(cache: ModelCache, scratch_dir: Option<PathBuf>) -> Self {
        Self { cache, scratch_dir }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            ModelCache::from_settings(settings)?,
            settings.scratch_dir.clone(),
        ))
    }

    fn scratch_dir(&self) -> Option<&Path> {
        self.scratch_dir.as_deref()
    }
}

/// Run one request to completion
pub fn dispatch(request: &GenerationRequest, ctx: &NodeContext) -> Result<HostAudio> {
    let model = ctx.cache.acquire(request.variant())?;

    let synthesis = match request {
        GenerationRequest::CustomVoice {
            text,
            language,
            speaker,
            instruct,
        } => {
            tracing::debug!("custom voice: speaker={} language={}", speaker, language);
            model.generate_custom_voice(text, language.model_arg(), speaker.as_str(), instruct)?
        }
        GenerationRequest::VoiceClone {
            text,
            language,
            ref_audio,
            ref_text,
        } => {
            // Dropping `input` removes the handoff file on every path out of this arm
            let input = to_model_input(ref_audio, model.reference_input(), ctx.scratch_dir())?;
            let result = model.generate_voice_clone(
                text,
                language.model_arg(),
                input.as_reference(),
                ref_text,
            );
            release(input);
            result?
        }
    };

    let (samples, sample_rate) = synthesis.into_first()?;
    from_model_output(samples, sample_rate)
}

fn release(input: ModelInput) {
    if let ModelInput::File(file) = input {
        let path = file.path().to_path_buf();
        if let Err(e) = file.close() {
            tracing::warn!("Failed to remove reference file {}: {}", path.display(), e);
        }
    }
}
