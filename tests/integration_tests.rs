//! Integration Tests
//!
//! End-to-end node execution against mock collaborators: model acquisition,
//! reference-audio handoff and dispatch.

use std::path::Path;

use qwen3_tts_nodes::audio::adapter::is_handoff_file;
use qwen3_tts_nodes::audio::{from_model_output, read_wav, to_model_input, HostAudio, ModelInput, Waveform};
use qwen3_tts_nodes::neural::mock::{
    test_tone, FakeSource, MockBehavior, MockLoader, RecordedCall, RecordedReference,
};
use qwen3_tts_nodes::neural::{ModelCache, ModelVariant, Precision, ReferenceInputKind};
use qwen3_tts_nodes::nodes::{self, NodeInputs, CUSTOM_VOICE_NODE, VOICE_CLONE_NODE};
use qwen3_tts_nodes::NodeContext;
use tempfile::{tempdir, TempDir};
use test_case::test_case;

struct Harness {
    _models: TempDir,
    scratch: TempDir,
    source: FakeSource,
    loader: MockLoader,
    ctx: NodeContext,
}

fn harness(behavior: MockBehavior) -> Harness {
    let models = tempdir().unwrap();
    let scratch = tempdir().unwrap();
    let source = FakeSource::new();
    let loader = MockLoader::with_behavior(behavior);
    let cache = ModelCache::new(
        models.path().to_path_buf(),
        Box::new(source.clone()),
        Box::new(loader.clone()),
        Precision::BF16,
    );
    let ctx = NodeContext::new(cache, Some(scratch.path().to_path_buf()));
    Harness {
        _models: models,
        scratch,
        source,
        loader,
        ctx,
    }
}

fn handoff_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| is_handoff_file(&e.file_name().to_string_lossy()))
        .count()
}

/// One second of 16 kHz mono audio
fn one_second_reference() -> HostAudio {
    HostAudio::new(Waveform::mono(test_tone(440.0, 1.0, 16000)), 16000).unwrap()
}

fn clone_inputs(language: &str) -> NodeInputs {
    NodeInputs::new()
        .with_audio("ref_audio", one_second_reference())
        .with_text("ref_text", "This is my voice.")
        .with_text("text", "I am speaking with this voice.")
        .with_text("language", language)
}

// === Custom Voice ===

#[test]
fn test_custom_voice_scenario() {
    let h = harness(MockBehavior {
        sample_rate: 22050,
        ..MockBehavior::default()
    });
    let inputs = NodeInputs::new()
        .with_text("text", "Hello")
        .with_text("language", "English")
        .with_text("speaker", "aiden")
        .with_text("instruct", "");

    let audio = nodes::execute(CUSTOM_VOICE_NODE, &inputs, &h.ctx).unwrap();

    assert_eq!(audio.sample_rate, 22050);
    assert_eq!(audio.waveform.batch(), 1);
    assert_eq!(audio.waveform.channels(), 1);
    assert_eq!(
        h.loader.calls(),
        vec![RecordedCall::CustomVoice {
            text: "Hello".to_string(),
            language: Some("English".to_string()),
            speaker: "aiden".to_string(),
            instruct: String::new(),
        }]
    );
}

#[test_case(CUSTOM_VOICE_NODE ; "custom voice")]
#[test_case(VOICE_CLONE_NODE ; "voice clone")]
fn test_auto_language_reaches_model_as_unset(node: &str) {
    let h = harness(MockBehavior::default());
    let inputs = if node == CUSTOM_VOICE_NODE {
        NodeInputs::new()
            .with_text("text", "Hello")
            .with_text("language", "Auto")
            .with_text("speaker", "vivian")
            .with_text("instruct", "Whisper.")
    } else {
        clone_inputs("Auto")
    };

    nodes::execute(node, &inputs, &h.ctx).unwrap();

    let language = match &h.loader.calls()[0] {
        RecordedCall::CustomVoice { language, .. } => language.clone(),
        RecordedCall::VoiceClone { language, .. } => language.clone(),
    };
    assert_eq!(language, None);
}

// === Model Acquisition ===

#[test]
fn test_repeated_requests_reuse_the_model() {
    let h = harness(MockBehavior::default());
    let inputs = nodes::node_definitions()[0].default_inputs();

    for _ in 0..3 {
        nodes::execute(CUSTOM_VOICE_NODE, &inputs, &h.ctx).unwrap();
    }

    assert_eq!(h.source.snapshot_count(), 1);
    assert_eq!(h.loader.load_count(), 1);
    assert_eq!(h.loader.precisions(), vec![Precision::BF16]);
    assert_eq!(h.loader.calls().len(), 3);
}

#[test]
fn test_each_node_loads_its_own_variant() {
    let h = harness(MockBehavior::default());

    nodes::execute(VOICE_CLONE_NODE, &clone_inputs("English"), &h.ctx).unwrap();
    assert_eq!(h.ctx.cache.loaded_variants(), vec![ModelVariant::Base]);

    let inputs = nodes::node_definitions()[0].default_inputs();
    nodes::execute(CUSTOM_VOICE_NODE, &inputs, &h.ctx).unwrap();
    assert_eq!(
        h.ctx.cache.loaded_variants(),
        vec![ModelVariant::CustomVoice, ModelVariant::Base]
    );

    let repos: Vec<String> = h.source.requests().into_iter().map(|(repo, _)| repo).collect();
    assert_eq!(
        repos,
        vec![
            "Qwen/Qwen3-TTS-12Hz-1.7B-Base".to_string(),
            "Qwen/Qwen3-TTS-12Hz-1.7B-CustomVoice".to_string(),
        ]
    );
}

// === Voice Clone Handoff ===

#[test]
fn test_voice_clone_uses_one_temp_file_and_removes_it() {
    let h = harness(MockBehavior::default());

    let audio = nodes::execute(VOICE_CLONE_NODE, &clone_inputs("English"), &h.ctx).unwrap();
    assert_eq!(audio.sample_rate, 24000);

    match &h.loader.calls()[0] {
        RecordedCall::VoiceClone {
            reference:
                RecordedReference::File {
                    path,
                    existed,
                    handoff_files_in_dir,
                },
            ref_text,
            ..
        } => {
            assert!(*existed);
            assert_eq!(*handoff_files_in_dir, 1);
            assert_eq!(ref_text, "This is my voice.");
            assert!(!path.exists());
        }
        other => panic!("unexpected call {:?}", other),
    }
    assert_eq!(handoff_files(h.scratch.path()), 0);
}

#[test]
fn test_voice_clone_cleans_up_when_model_fails() {
    let h = harness(MockBehavior {
        fail_with: Some("generation exploded".to_string()),
        ..MockBehavior::default()
    });

    let err = nodes::execute(VOICE_CLONE_NODE, &clone_inputs("Chinese"), &h.ctx).unwrap_err();
    assert_eq!(err.error_code(), "MODEL_INFERENCE_ERROR");

    match &h.loader.calls()[0] {
        RecordedCall::VoiceClone {
            reference: RecordedReference::File { handoff_files_in_dir, .. },
            ..
        } => assert_eq!(*handoff_files_in_dir, 1),
        other => panic!("unexpected call {:?}", other),
    }
    assert_eq!(handoff_files(h.scratch.path()), 0);
}

#[test]
fn test_invalid_inputs_never_reach_the_model() {
    let h = harness(MockBehavior::default());

    let err = nodes::execute(VOICE_CLONE_NODE, &clone_inputs("Klingon"), &h.ctx).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");

    let err = nodes::execute("Qwen3TTSVoiceDesign", &clone_inputs("English"), &h.ctx).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_INPUT");

    assert_eq!(h.loader.load_count(), 0);
    assert_eq!(handoff_files(h.scratch.path()), 0);
}

// === Audio Round Trip ===

#[test]
fn test_round_trip_preserves_samples_and_rate() {
    let scratch = tempdir().unwrap();
    let left = test_tone(440.0, 0.25, 16000);
    let right: Vec<f32> = left.iter().map(|s| -s * 0.5).collect();
    let mut data = left.clone();
    data.extend_from_slice(&right);
    let clip = HostAudio::new(Waveform::new([1, 2, left.len()], data).unwrap(), 16000).unwrap();

    let input = to_model_input(&clip, ReferenceInputKind::FilePath, Some(scratch.path())).unwrap();
    let ModelInput::File(file) = &input else {
        panic!("expected file handoff");
    };
    let back = read_wav(file.path()).unwrap();
    drop(input);

    assert_eq!(back, clip);
    assert_eq!(handoff_files(scratch.path()), 0);
}

#[test]
fn test_model_output_keeps_values() {
    let samples = test_tone(110.0, 0.05, 24000);
    let audio = from_model_output(samples.clone(), 24000).unwrap();

    assert_eq!(audio.waveform.shape(), [1, 1, samples.len()]);
    for (a, b) in audio.waveform.data().iter().zip(&samples) {
        approx::assert_abs_diff_eq!(*a, *b, epsilon = 0.0);
    }
}
