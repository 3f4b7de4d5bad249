//! Host audio representation
//!
//! The host passes audio around as a `[batch, channels, time]` float tensor
//! paired with an integer sample rate. The model side works with
//! time-major (interleaved) frames, so every crossing between the two goes
//! through an explicit transpose in [`Waveform::to_interleaved`] or
//! [`Waveform::from_interleaved`].

use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};

/// Dense row-major `[batch, channels, time]` sample tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWaveform")]
pub struct Waveform {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl Waveform {
    /// Wrap flat row-major data with an explicit shape
    pub fn new(shape: [usize; 3], data: Vec<f32>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, dim| acc.checked_mul(*dim))
            .ok_or_else(|| TtsError::encoding(format!("shape {:?} is too large", shape)))?;
        if data.len() != expected {
            return Err(TtsError::encoding(format!(
                "shape {:?} needs {} samples, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Single-channel clip of shape `[1, 1, T]`
    pub fn mono(samples: Vec<f32>) -> Self {
        Self {
            shape: [1, 1, samples.len()],
            data: samples,
        }
    }

    /// Build a `[1, channels, T]` tensor from interleaved frames
    pub fn from_interleaved(interleaved: &[f32], channels: usize) -> Result<Self> {
        if channels == 0 {
            return Err(TtsError::encoding("channel count must be at least 1"));
        }
        if interleaved.len() % channels != 0 {
            return Err(TtsError::encoding(format!(
                "sample count {} is not divisible by channel count {}",
                interleaved.len(),
                channels
            )));
        }

        let frames = interleaved.len() / channels;
        let mut data = vec![0.0; interleaved.len()];
        for (i, sample) in interleaved.iter().enumerate() {
            let (frame, ch) = (i / channels, i % channels);
            data[ch * frames + frame] = *sample;
        }

        Ok(Self {
            shape: [1, channels, frames],
            data,
        })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn batch(&self) -> usize {
        self.shape[0]
    }

    pub fn channels(&self) -> usize {
        self.shape[1]
    }

    /// Samples per channel
    pub fn frames(&self) -> usize {
        self.shape[2]
    }

    /// Raw row-major data
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Samples of one channel of the first batch item
    pub fn channel(&self, channel: usize) -> Option<&[f32]> {
        if self.batch() == 0 || channel >= self.channels() {
            return None;
        }
        let frames = self.frames();
        Some(&self.data[channel * frames..(channel + 1) * frames])
    }

    /// Drop the batch axis and transpose `[channels, time]` to interleaved
    /// `[time, channels]` frames.
    ///
    /// Only a single clip can cross this boundary; a batch of several clips
    /// (or none) has no unambiguous interleaved form.
    pub fn to_interleaved(&self) -> Result<Vec<f32>> {
        if self.batch() != 1 {
            return Err(TtsError::encoding(format!(
                "expected exactly one clip in the batch axis, got shape {:?}",
                self.shape
            )));
        }
        let channels = self.channels();
        if channels == 0 {
            return Err(TtsError::encoding(format!(
                "clip has no channels, shape {:?}",
                self.shape
            )));
        }

        let frames = self.frames();
        let mut out = Vec::with_capacity(channels * frames);
        for frame in 0..frames {
            for ch in 0..channels {
                out.push(self.data[ch * frames + frame]);
            }
        }
        Ok(out)
    }
}

#[derive(Deserialize)]
struct RawWaveform {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl TryFrom<RawWaveform> for Waveform {
    type Error = TtsError;

    fn try_from(raw: RawWaveform) -> Result<Self> {
        Self::new(raw.shape, raw.data)
    }
}

/// Audio value exchanged with the host: tensor plus sample rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHostAudio")]
pub struct HostAudio {
    pub waveform: Waveform,
    pub sample_rate: u32,
}

impl HostAudio {
    pub fn new(waveform: Waveform, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(TtsError::encoding("sample rate must be positive"));
        }
        Ok(Self {
            waveform,
            sample_rate,
        })
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.waveform.frames() as f64 / self.sample_rate as f64
    }
}

#[derive(Deserialize)]
struct RawHostAudio {
    waveform: Waveform,
    sample_rate: u32,
}

impl TryFrom<RawHostAudio> for HostAudio {
    type Error = TtsError;

    fn try_from(raw: RawHostAudio) -> Result<Self> {
        Self::new(raw.waveform, raw.sample_rate)
    }
}
