//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::audio::{read_wav, write_wav, HostAudio};
use crate::config::Settings;
use crate::dispatch::NodeContext;
use crate::error::Result;
use crate::neural::{
    fetch_variant, gpu_status_summary, ArtifactSource, HubSource, Language, ModelVariant, Speaker,
};
use crate::nodes::{self, NodeInputs, CUSTOM_VOICE_NODE, VOICE_CLONE_NODE};

fn save(audio: &HostAudio, output: &Path) -> Result<()> {
    write_wav(audio, output)?;
    println!(
        "Wrote {} ({:.2}s at {} Hz)",
        output.display(),
        audio.duration_secs(),
        audio.sample_rate
    );
    Ok(())
}

/// Run the custom voice node and save its output.
pub fn custom_voice(
    settings: &Settings,
    text: &str,
    language: Language,
    speaker: Speaker,
    instruct: &str,
    output: &Path,
) -> Result<()> {
    info!("Custom voice: speaker={} language={}", speaker, language);

    let ctx = NodeContext::from_settings(settings)?;
    let inputs = NodeInputs::new()
        .with_text("text", text)
        .with_text("language", language.as_str())
        .with_text("speaker", speaker.as_str())
        .with_text("instruct", instruct);

    let audio = nodes::execute(CUSTOM_VOICE_NODE, &inputs, &ctx)?;
    save(&audio, output)
}

/// Run the voice clone node on a reference WAV and save its output.
pub fn voice_clone(
    settings: &Settings,
    ref_audio: &Path,
    ref_text: &str,
    text: &str,
    language: Language,
    output: &Path,
) -> Result<()> {
    info!("Voice clone from reference: {}", ref_audio.display());

    let reference = read_wav(ref_audio)?;
    let ctx = NodeContext::from_settings(settings)?;
    let inputs = NodeInputs::new()
        .with_audio("ref_audio", reference)
        .with_text("ref_text", ref_text)
        .with_text("text", text)
        .with_text("language", language.as_str());

    let audio = nodes::execute(VOICE_CLONE_NODE, &inputs, &ctx)?;
    save(&audio, output)
}

/// Download one or all model variants.
///
/// Only fetches artifacts; nothing is loaded and no GPU probe runs.
pub fn download(settings: &Settings, variant: Option<ModelVariant>) -> Result<()> {
    let source = HubSource::new(settings)?;
    for (variant, dir) in download_variants(&source, &settings.models_dir, variant)? {
        println!("{} -> {}", variant.repo_id(), dir.display());
    }
    Ok(())
}

fn download_variants(
    source: &dyn ArtifactSource,
    models_dir: &Path,
    variant: Option<ModelVariant>,
) -> Result<Vec<(ModelVariant, PathBuf)>> {
    let variants = match variant {
        Some(v) => vec![v],
        None => ModelVariant::ALL.to_vec(),
    };

    variants
        .into_iter()
        .map(|v| fetch_variant(source, models_dir, v).map(|dir| (v, dir)))
        .collect()
}

/// Print the node definitions the host would register.
pub fn print_nodes() -> Result<()> {
    let definitions = nodes::node_definitions();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}

/// Print GPU detection results.
pub fn gpu_status() -> Result<()> {
    println!("{}", gpu_status_summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::mock::FakeSource;
    use tempfile::tempdir;

    #[test]
    fn test_download_all_variants() {
        let dir = tempdir().unwrap();
        let source = FakeSource::new();

        let done = download_variants(&source, dir.path(), None).unwrap();

        assert_eq!(
            done,
            vec![
                (
                    ModelVariant::CustomVoice,
                    dir.path().join("Qwen3-TTS-12Hz-1.7B-CustomVoice")
                ),
                (ModelVariant::Base, dir.path().join("Qwen3-TTS-12Hz-1.7B-Base")),
            ]
        );
        assert_eq!(source.snapshot_count(), 2);
    }

    #[test]
    fn test_download_single_variant_reports_fetch_error() {
        let dir = tempdir().unwrap();
        let source = FakeSource::failing_first(1);

        let err = download_variants(&source, dir.path(), Some(ModelVariant::Base)).unwrap_err();
        assert_eq!(err.error_code(), "FETCH_ERROR");
        assert_eq!(
            source.requests(),
            vec![(
                "Qwen/Qwen3-TTS-12Hz-1.7B-Base".to_string(),
                dir.path().join("Qwen3-TTS-12Hz-1.7B-Base")
            )]
        );
    }
}
