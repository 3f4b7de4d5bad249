//! Voice Clone node: synthesis in the voice of a reference clip

use crate::dispatch::GenerationRequest;
use crate::error::Result;
use crate::neural::Language;
use crate::nodes::{InputSlot, Node, NodeDefinition, NodeInputs, AUDIO_TYPE, NODE_CATEGORY};

pub const VOICE_CLONE_NODE: &str = "Qwen3TTSVoiceClone";

/// Synthesis in the voice of a reference clip
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceCloneNode;

impl Node for VoiceCloneNode {
    fn definition(&self) -> NodeDefinition {
        NodeDefinition {
            type_name: VOICE_CLONE_NODE,
            display_name: "Qwen3-TTS Voice Clone",
            category: NODE_CATEGORY,
            function: "generate",
            inputs: vec![
                InputSlot::audio("ref_audio"),
                InputSlot::text("ref_text", true, ""),
                InputSlot::text("text", true, "I am speaking with this voice."),
                InputSlot::choice(
                    "language",
                    Language::ALL.iter().map(|l| l.as_str()).collect(),
                    Language::default().as_str(),
                ),
            ],
            outputs: vec![AUDIO_TYPE],
        }
    }

    fn build_request(&self, inputs: &NodeInputs) -> Result<GenerationRequest> {
        Ok(GenerationRequest::VoiceClone {
            text: inputs.text("text")?.to_string(),
            language: inputs.text("language")?.parse()?,
            ref_audio: inputs.audio("ref_audio")?.clone(),
            ref_text: inputs.text("ref_text")?.to_string(),
        })
    }
}
