//! Speech model acquisition and interfaces
//!
//! This module provides:
//! - `SpeechModel` trait for the external Qwen3-TTS runtime
//! - Model identity and the closed choice sets (language, speaker)
//! - Hub download, snapshot validation and the inference bridge
//! - The model cache shared by all node calls
//! - Mock implementations for testing

pub mod bridge;
pub mod cache;
pub mod gpu;
pub mod hub;
pub mod mock;
mod model;

pub use bridge::{inspect_model_dir, BridgeLoader, BridgeSpeechModel, ModelLoader};
pub use cache::ModelCache;
pub use gpu::{gpu_status_summary, select_precision, GpuInfo};
pub use hub::{fetch_variant, ArtifactSource, HfFetcher, HubSource, RepoFetcher};
pub use model::{
    Language, ModelVariant, Precision, ReferenceAudio, ReferenceInputKind, Speaker, SpeechModel,
    Synthesis, MODEL_FAMILY, MODEL_PUBLISHER,
};
