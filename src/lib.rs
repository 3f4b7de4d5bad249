//! Qwen3-TTS Nodes - text-to-speech nodes for a node-graph host
//!
//! Two nodes expose a pretrained Qwen3-TTS model:
//! 1. Custom Voice - preset speakers steered by a style instruction
//! 2. Voice Clone - synthesis in the voice of a reference clip
//!
//! # Architecture
//!
//! The crate is glue around an external speech runtime:
//! - `neural`: model identity, hub download, snapshot loading and the
//!   per-variant model cache
//! - `audio`: conversion between the host's `[batch, channels, time]`
//!   tensors and what the model consumes/produces
//! - `dispatch` / `nodes`: the request types and the host node contract

pub mod audio;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod neural;
pub mod nodes;

pub use config::Settings;
pub use dispatch::{dispatch, GenerationRequest, NodeContext};
pub use error::{Result, TtsError};
