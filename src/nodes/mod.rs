//! Host node contract
//!
//! Each node declares typed input slots and a single `AUDIO` output. The
//! host hands over a bag of named values; the node validates them against
//! its declaration, builds a [`GenerationRequest`] and dispatches it.

mod custom_voice;
mod voice_clone;

use std::collections::HashMap;

use serde::Serialize;

use crate::audio::HostAudio;
use crate::dispatch::{dispatch, GenerationRequest, NodeContext};
use crate::error::{Result, TtsError};

pub use custom_voice::{CustomVoiceNode, CUSTOM_VOICE_NODE};
pub use voice_clone::{VoiceCloneNode, VOICE_CLONE_NODE};

/// Category the nodes are listed under in the host
pub const NODE_CATEGORY: &str = "Qwen3-TTS";

/// Output type of every node
pub const AUDIO_TYPE: &str = "AUDIO";

/// Input slot kinds the host understands
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlotKind {
    Text {
        multiline: bool,
        default: &'static str,
    },
    Choice {
        options: Vec<&'static str>,
        default: &'static str,
    },
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSlot {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: SlotKind,
}

impl InputSlot {
    pub fn text(name: &'static str, multiline: bool, default: &'static str) -> Self {
        Self {
            name,
            kind: SlotKind::Text { multiline, default },
        }
    }

    pub fn choice(name: &'static str, options: Vec<&'static str>, default: &'static str) -> Self {
        Self {
            name,
            kind: SlotKind::Choice { options, default },
        }
    }

    pub fn audio(name: &'static str) -> Self {
        Self {
            name,
            kind: SlotKind::Audio,
        }
    }
}

/// Declaration of a node as the host sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDefinition {
    pub type_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub function: &'static str,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<&'static str>,
}

impl NodeDefinition {
    /// Check that every declared slot has a value of the right kind
    pub fn validate(&self, inputs: &NodeInputs) -> Result<()> {
        for slot in &self.inputs {
            let value = inputs
                .get(slot.name)
                .ok_or_else(|| TtsError::invalid_input(slot.name, "missing required input"))?;

            match (&slot.kind, value) {
                (SlotKind::Text { .. }, NodeValue::Text(_)) => {}
                (SlotKind::Choice { options, .. }, NodeValue::Text(choice)) => {
                    if !options.iter().any(|o| *o == choice.as_str()) {
                        return Err(TtsError::invalid_input(
                            slot.name,
                            format!("'{}' is not one of {}", choice, options.join(", ")),
                        ));
                    }
                }
                (SlotKind::Audio, NodeValue::Audio(_)) => {}
                (_, _) => {
                    return Err(TtsError::invalid_input(
                        slot.name,
                        format!("expected {} value", slot_type_name(&slot.kind)),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Inputs pre-filled with each slot's default (audio slots stay empty)
    pub fn default_inputs(&self) -> NodeInputs {
        let mut inputs = NodeInputs::new();
        for slot in &self.inputs {
            match &slot.kind {
                SlotKind::Text { default, .. } | SlotKind::Choice { default, .. } => {
                    inputs.set(slot.name, NodeValue::Text(default.to_string()));
                }
                SlotKind::Audio => {}
            }
        }
        inputs
    }
}

fn slot_type_name(kind: &SlotKind) -> &'static str {
    match kind {
        SlotKind::Text { .. } => "STRING",
        SlotKind::Choice { .. } => "choice",
        SlotKind::Audio => AUDIO_TYPE,
    }
}

/// A value bound to an input slot
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Text(String),
    Audio(HostAudio),
}

/// Named input values for one node call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInputs {
    values: HashMap<String, NodeValue>,
}

impl NodeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: NodeValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, NodeValue::Text(value.into()));
        self
    }

    pub fn with_audio(mut self, name: &str, audio: HostAudio) -> Self {
        self.set(name, NodeValue::Audio(audio));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NodeValue> {
        self.values.get(name)
    }

    pub(crate) fn text(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(NodeValue::Text(s)) => Ok(s),
            Some(NodeValue::Audio(_)) => Err(TtsError::invalid_input(name, "expected STRING value")),
            None => Err(TtsError::invalid_input(name, "missing required input")),
        }
    }

    pub(crate) fn audio(&self, name: &str) -> Result<&HostAudio> {
        match self.get(name) {
            Some(NodeValue::Audio(a)) => Ok(a),
            Some(NodeValue::Text(_)) => Err(TtsError::invalid_input(name, "expected AUDIO value")),
            None => Err(TtsError::invalid_input(name, "missing required input")),
        }
    }
}

/// A node the host can instantiate and run
pub trait Node {
    fn definition(&self) -> NodeDefinition;

    /// Turn validated inputs into a generation request
    fn build_request(&self, inputs: &NodeInputs) -> Result<GenerationRequest>;

    /// Validate, dispatch and return the node's single output
    fn execute(&self, inputs: &NodeInputs, ctx: &NodeContext) -> Result<HostAudio> {
        self.definition().validate(inputs)?;
        let request = self.build_request(inputs)?;
        dispatch(&request, ctx)
    }
}

/// All nodes this crate registers, keyed by type name
pub fn node_registry() -> Vec<(&'static str, Box<dyn Node>)> {
    vec![
        (CUSTOM_VOICE_NODE, Box::new(CustomVoiceNode) as Box<dyn Node>),
        (VOICE_CLONE_NODE, Box::new(VoiceCloneNode) as Box<dyn Node>),
    ]
}

/// Definitions of every registered node
pub fn node_definitions() -> Vec<NodeDefinition> {
    node_registry().iter().map(|(_, node)| node.definition()).collect()
}

/// Type name to display name
pub fn display_names() -> HashMap<&'static str, &'static str> {
    node_definitions()
        .into_iter()
        .map(|d| (d.type_name, d.display_name))
        .collect()
}

/// Run the node registered as `type_name`
pub fn execute(type_name: &str, inputs: &NodeInputs, ctx: &NodeContext) -> Result<HostAudio> {
    let (_, node) = node_registry()
        .into_iter()
        .find(|(name, _)| *name == type_name)
        .ok_or_else(|| TtsError::invalid_input("node", format!("unknown node type '{}'", type_name)))?;
    node.execute(inputs, ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Waveform;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_registry_lists_both_nodes() {
        let names = display_names();
        assert_eq!(names.get("Qwen3TTSCustomVoice"), Some(&"Qwen3-TTS Custom Voice"));
        assert_eq!(names.get("Qwen3TTSVoiceClone"), Some(&"Qwen3-TTS Voice Clone"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_every_node_has_one_audio_output() {
        for def in node_definitions() {
            assert_eq!(def.outputs, vec![AUDIO_TYPE]);
            assert_eq!(def.category, NODE_CATEGORY);
            assert_eq!(def.function, "generate");
        }
    }

    #[test]
    fn test_definition_serializes_for_host() {
        let def = CustomVoiceNode.definition();
        let json = serde_json::to_value(&def).unwrap();

        assert_eq!(json["type_name"], "Qwen3TTSCustomVoice");
        assert_eq!(json["inputs"][0]["name"], "text");
        assert_eq!(json["inputs"][0]["type"], "text");
        assert_eq!(json["inputs"][0]["multiline"], true);
        assert_eq!(json["inputs"][1]["type"], "choice");
        assert_eq!(json["inputs"][1]["default"], "English");
    }

    #[test]
    fn test_validate_rejects_unknown_choice() {
        let def = CustomVoiceNode.definition();
        let inputs = def.default_inputs().with_text("language", "Klingon");

        let err = def.validate(&inputs).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("Klingon"));
    }

    #[test]
    fn test_validate_rejects_wrong_kind_and_missing() {
        let def = VoiceCloneNode.definition();

        // ref_audio has no default
        let err = def.validate(&def.default_inputs()).unwrap_err();
        assert!(err.to_string().contains("ref_audio"));

        let clip = HostAudio::new(Waveform::mono(vec![0.0; 4]), 16000).unwrap();
        let inputs = def
            .default_inputs()
            .with_audio("ref_audio", clip.clone())
            .with_audio("text", clip);
        let err = def.validate(&inputs).unwrap_err();
        assert!(err.to_string().contains("STRING"));
    }
}
