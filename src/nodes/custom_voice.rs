//! Custom Voice node: preset speaker steered by a style instruction

use crate::dispatch::GenerationRequest;
use crate::error::Result;
use crate::neural::{Language, Speaker};
use crate::nodes::{InputSlot, Node, NodeDefinition, NodeInputs, AUDIO_TYPE, NODE_CATEGORY};

pub const CUSTOM_VOICE_NODE: &str = "Qwen3TTSCustomVoice";

/// Preset speaker synthesis steered by a style instruction
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomVoiceNode;

impl Node for CustomVoiceNode {
    fn definition(&self) -> NodeDefinition {
        NodeDefinition {
            type_name: CUSTOM_VOICE_NODE,
            display_name: "Qwen3-TTS Custom Voice",
            category: NODE_CATEGORY,
            function: "generate",
            inputs: vec![
                InputSlot::text("text", true, "Hello, how are you today?"),
                InputSlot::choice(
                    "language",
                    Language::ALL.iter().map(|l| l.as_str()).collect(),
                    Language::default().as_str(),
                ),
                InputSlot::choice(
                    "speaker",
                    Speaker::ALL.iter().map(|s| s.as_str()).collect(),
                    Speaker::default().as_str(),
                ),
                InputSlot::text("instruct", false, "Speak in a calm and friendly tone."),
            ],
            outputs: vec![AUDIO_TYPE],
        }
    }

    fn build_request(&self, inputs: &NodeInputs) -> Result<GenerationRequest> {
        Ok(GenerationRequest::CustomVoice {
            text: inputs.text("text")?.to_string(),
            language: inputs.text("language")?.parse()?,
            speaker: inputs.text("speaker")?.parse()?,
            instruct: inputs.text("instruct")?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build_a_request() {
        let node = CustomVoiceNode;
        let request = node.build_request(&node.definition().default_inputs()).unwrap();
        assert_eq!(
            request,
            GenerationRequest::CustomVoice {
                text: "Hello, how are you today?".to_string(),
                language: Language::English,
                speaker: Speaker::OnoAnna,
                instruct: "Speak in a calm and friendly tone.".to_string(),
            }
        );
    }

    #[test]
    fn test_language_choices_end_with_auto() {
        let def = CustomVoiceNode.definition();
        let crate::nodes::SlotKind::Choice { options, .. } = &def.inputs[1].kind else {
            panic!("language should be a choice slot");
        };
        assert_eq!(options, &vec!["Japanese", "English", "Chinese", "Auto"]);
    }
}
