//! Audio interchange
//!
//! - Host audio tensor type
//! - Inbound/outbound adapters between host and model representations
//! - WAV file I/O

pub mod adapter;
pub mod buffer;
pub mod wav;

pub use adapter::{from_model_output, to_model_input, ModelInput, ReferenceFile};
pub use buffer::{HostAudio, Waveform};
pub use wav::{read_wav, write_wav};
