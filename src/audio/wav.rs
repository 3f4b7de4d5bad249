//! WAV file I/O
//!
//! Everything is written as 32-bit float so that values cross the file
//! boundary bit-exact: no resampling, no requantization, no clipping.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::audio::buffer::{HostAudio, Waveform};
use crate::error::{Result, TtsError};

/// Write interleaved frames as a 32-bit float WAV file
pub fn write_interleaved(
    path: &Path,
    interleaved: &[f32],
    channels: usize,
    sample_rate: u32,
) -> Result<()> {
    let channels = u16::try_from(channels)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| TtsError::encoding(format!("unsupported channel count {}", channels)))?;
    if sample_rate == 0 {
        return Err(TtsError::encoding("sample rate must be positive"));
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let write_err = |e: hound::Error| TtsError::Write {
        path: path.to_path_buf(),
        source: into_io(e),
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    for sample in interleaved {
        writer.write_sample(*sample).map_err(write_err)?;
    }
    writer.finalize().map_err(write_err)?;

    Ok(())
}

/// Write host audio (single clip) to a WAV file
pub fn write_wav(audio: &HostAudio, path: &Path) -> Result<()> {
    let interleaved = audio.waveform.to_interleaved()?;
    write_interleaved(path, &interleaved, audio.waveform.channels(), audio.sample_rate)
}

/// Read a WAV file into host audio of shape `[1, channels, T]`
///
/// Integer PCM is normalized to `[-1.0, 1.0)`; float PCM is taken as is.
pub fn read_wav(path: &Path) -> Result<HostAudio> {
    if !path.exists() {
        return Err(TtsError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let reader = WavReader::open(path).map_err(|e| {
        TtsError::encoding(format!("failed to open WAV {}: {}", path.display(), e))
    })?;
    let spec = reader.spec();
    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;

    let waveform = Waveform::from_interleaved(&samples, spec.channels as usize)?;
    HostAudio::new(waveform, spec.sample_rate)
}

fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let decode_err = |e: hound::Error| TtsError::encoding(format!("failed to decode samples: {}", e));

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(decode_err),
        SampleFormat::Int => {
            if bits_per_sample == 0 || bits_per_sample > 32 {
                return Err(TtsError::encoding(format!(
                    "unsupported bit depth {}",
                    bits_per_sample
                )));
            }
            let scale = (1u64 << (bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(decode_err)
        }
    }
}

fn into_io(err: hound::Error) -> std::io::Error {
    match err {
        hound::Error::IoError(io) => io,
        other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_float_wav_is_bit_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        // Values outside [-1, 1] must survive too
        let samples = vec![0.0, 1.5, -2.25, 1e-7, -0.333_333_34];
        let audio = HostAudio::new(Waveform::mono(samples.clone()), 24000).unwrap();
        write_wav(&audio, &path).unwrap();

        let back = read_wav(&path).unwrap();
        assert_eq!(back.sample_rate, 24000);
        assert_eq!(back.waveform.data(), &samples[..]);
    }

    #[test]
    fn test_int_wav_is_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pcm16.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(16384i16).unwrap();
        writer.write_sample(-32768i16).unwrap();
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        approx::assert_abs_diff_eq!(audio.waveform.data()[0], 0.5, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(audio.waveform.data()[1], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_write_into_missing_directory_is_write_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("clip.wav");
        let err = write_interleaved(&path, &[0.0], 1, 16000).unwrap_err();
        assert_eq!(err.error_code(), "WRITE_ERROR");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_wav(Path::new("/nonexistent/ref.wav")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
