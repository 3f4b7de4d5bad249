//! Conversion between host audio and what the speech model consumes/produces
//!
//! Inbound, a reference clip becomes either a scoped temporary WAV file or an
//! in-memory interleaved buffer, depending on what the model collaborator
//! accepts. Outbound, the model's mono waveform becomes a `[1, 1, T]` tensor.

use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::audio::buffer::{HostAudio, Waveform};
use crate::audio::wav::write_interleaved;
use crate::error::{Result, TtsError};
use crate::neural::{ReferenceAudio, ReferenceInputKind};

const HANDOFF_PREFIX: &str = "qwen3-tts-ref-";
const HANDOFF_SUFFIX: &str = ".wav";

/// Reference audio in the form the model collaborator asked for
#[derive(Debug)]
pub enum ModelInput {
    File(ReferenceFile),
    Samples {
        interleaved: Vec<f32>,
        channels: usize,
        sample_rate: u32,
    },
}

impl ModelInput {
    /// Borrow as the argument passed to the model
    pub fn as_reference(&self) -> ReferenceAudio<'_> {
        match self {
            ModelInput::File(file) => ReferenceAudio::Path(file.path()),
            ModelInput::Samples {
                interleaved,
                channels,
                sample_rate,
            } => ReferenceAudio::Samples {
                interleaved,
                channels: *channels,
                sample_rate: *sample_rate,
            },
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            ModelInput::File(file) => file.sample_rate,
            ModelInput::Samples { sample_rate, .. } => *sample_rate,
        }
    }
}

/// Uniquely named WAV file that is deleted when this value is dropped
#[derive(Debug)]
pub struct ReferenceFile {
    path: TempPath,
    sample_rate: u32,
}

impl ReferenceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete now and report failure instead of ignoring it in `Drop`
    pub fn close(self) -> Result<()> {
        let path: PathBuf = self.path.to_path_buf();
        self.path.close().map_err(|source| TtsError::Write { path, source })
    }
}

/// Convert host audio into model input (inbound direction).
///
/// For [`ReferenceInputKind::FilePath`] the clip is written to a fresh
/// `qwen3-tts-ref-*.wav` file in `scratch_dir` (system temp dir when `None`).
/// If writing fails the partially written file is removed before returning.
pub fn to_model_input(
    audio: &HostAudio,
    kind: ReferenceInputKind,
    scratch_dir: Option<&Path>,
) -> Result<ModelInput> {
    if audio.sample_rate == 0 {
        return Err(TtsError::encoding("sample rate must be positive"));
    }
    let interleaved = audio.waveform.to_interleaved()?;
    let channels = audio.waveform.channels();

    match kind {
        ReferenceInputKind::Samples => Ok(ModelInput::Samples {
            interleaved,
            channels,
            sample_rate: audio.sample_rate,
        }),
        ReferenceInputKind::FilePath => {
            let dir = scratch_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(std::env::temp_dir);

            let named = tempfile::Builder::new()
                .prefix(HANDOFF_PREFIX)
                .suffix(HANDOFF_SUFFIX)
                .tempfile_in(&dir)
                .map_err(|source| TtsError::Write {
                    path: dir.clone(),
                    source,
                })?;
            // Close our handle; the writer reopens by path
            let path = named.into_temp_path();

            write_interleaved(&path, &interleaved, channels, audio.sample_rate)?;
            tracing::debug!(
                "Wrote reference clip ({} ch, {} Hz, {} frames) to {}",
                channels,
                audio.sample_rate,
                audio.waveform.frames(),
                path.display()
            );

            Ok(ModelInput::File(ReferenceFile {
                path,
                sample_rate: audio.sample_rate,
            }))
        }
    }
}

/// Convert a model waveform into host audio (outbound direction)
pub fn from_model_output(samples: Vec<f32>, sample_rate: u32) -> Result<HostAudio> {
    HostAudio::new(Waveform::mono(samples), sample_rate)
}

/// Whether a file name looks like one of our handoff files
pub fn is_handoff_file(name: &str) -> bool {
    name.starts_with(HANDOFF_PREFIX) && name.ends_with(HANDOFF_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::read_wav;
    use tempfile::tempdir;

    fn handoff_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| is_handoff_file(&e.file_name().to_string_lossy()))
            .count()
    }

    fn stereo_clip() -> HostAudio {
        let wf = Waveform::new([1, 2, 4], vec![0.1, 0.2, 0.3, 0.4, -0.1, -0.2, -0.3, -0.4]).unwrap();
        HostAudio::new(wf, 16000).unwrap()
    }

    #[test]
    fn test_file_handoff_round_trip() {
        let dir = tempdir().unwrap();
        let clip = stereo_clip();

        let input = to_model_input(&clip, ReferenceInputKind::FilePath, Some(dir.path())).unwrap();
        let ModelInput::File(file) = &input else {
            panic!("expected file handoff");
        };
        assert!(file.path().exists());
        assert_eq!(handoff_files(dir.path()), 1);

        let back = read_wav(file.path()).unwrap();
        assert_eq!(back, clip);

        drop(input);
        assert_eq!(handoff_files(dir.path()), 0);
    }

    #[test]
    fn test_explicit_close_deletes() {
        let dir = tempdir().unwrap();
        let input = to_model_input(&stereo_clip(), ReferenceInputKind::FilePath, Some(dir.path()))
            .unwrap();
        let ModelInput::File(file) = input else {
            panic!("expected file handoff");
        };
        let path = file.path().to_path_buf();
        file.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_samples_handoff_is_interleaved() {
        let input = to_model_input(&stereo_clip(), ReferenceInputKind::Samples, None).unwrap();
        match input.as_reference() {
            ReferenceAudio::Samples {
                interleaved,
                channels,
                sample_rate,
            } => {
                assert_eq!(channels, 2);
                assert_eq!(sample_rate, 16000);
                assert_eq!(&interleaved[..4], &[0.1f32, -0.1, 0.2, -0.2]);
            }
            ReferenceAudio::Path(_) => panic!("expected samples"),
        }
    }

    #[test]
    fn test_ambiguous_layout_writes_nothing() {
        let dir = tempdir().unwrap();
        let batched = HostAudio::new(Waveform::new([2, 1, 3], vec![0.0; 6]).unwrap(), 16000).unwrap();

        let err = to_model_input(&batched, ReferenceInputKind::FilePath, Some(dir.path())).unwrap_err();
        assert_eq!(err.error_code(), "ENCODING_ERROR");
        assert_eq!(handoff_files(dir.path()), 0);
    }

    #[test]
    fn test_unwritable_scratch_dir() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = to_model_input(&stereo_clip(), ReferenceInputKind::FilePath, Some(&missing))
            .unwrap_err();
        assert_eq!(err.error_code(), "WRITE_ERROR");
    }

    #[test]
    fn test_outbound_shape() {
        let audio = from_model_output(vec![0.5, -0.5, 0.25], 24000).unwrap();
        assert_eq!(audio.waveform.shape(), [1, 1, 3]);
        assert_eq!(audio.waveform.data(), &[0.5f32, -0.5, 0.25]);
        assert_eq!(audio.sample_rate, 24000);

        assert!(from_model_output(vec![0.0], 0).is_err());
    }
}
