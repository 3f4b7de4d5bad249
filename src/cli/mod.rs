//! CLI Module
//!
//! Command-line front end that runs the nodes outside a host application.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::neural::{Language, ModelVariant, Speaker};

/// Qwen3-TTS Nodes - custom voice and voice clone synthesis
#[derive(Parser, Debug)]
#[command(name = "qwen3-tts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base directory for downloaded models
    #[arg(long, global = true, env = "QWEN3_TTS_MODELS_DIR")]
    pub models_dir: Option<PathBuf>,

    /// Inference bridge URL
    #[arg(long, global = true, env = "QWEN3_TTS_BRIDGE_URL")]
    pub bridge_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize speech with a preset speaker
    #[command(name = "custom-voice")]
    CustomVoice {
        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Japanese, English, Chinese or Auto
        #[arg(short, long, default_value = "English", value_parser = parse_language)]
        language: Language,

        /// Preset speaker id
        #[arg(short, long, default_value = "ono_anna", value_parser = parse_speaker)]
        speaker: Speaker,

        /// Style instruction
        #[arg(short, long, default_value = "Speak in a calm and friendly tone.")]
        instruct: String,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Synthesize speech in the voice of a reference recording
    #[command(name = "voice-clone")]
    VoiceClone {
        /// Reference WAV file
        #[arg(short = 'r', long)]
        ref_audio: PathBuf,

        /// Transcript of the reference recording
        #[arg(long, default_value = "")]
        ref_text: String,

        /// Text to speak
        #[arg(short, long)]
        text: String,

        /// Japanese, English, Chinese or Auto
        #[arg(short, long, default_value = "English", value_parser = parse_language)]
        language: Language,

        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Download model artifacts without loading them
    #[command(name = "download")]
    Download {
        /// CustomVoice or Base; all variants when omitted
        #[arg(value_parser = parse_variant)]
        variant: Option<ModelVariant>,
    },

    /// Print node definitions as JSON
    #[command(name = "nodes")]
    Nodes,

    /// Show detected GPU and the precision models would load in
    #[command(name = "gpu-status")]
    GpuStatus,
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse().map_err(|e: crate::TtsError| e.to_string())
}

fn parse_speaker(s: &str) -> Result<Speaker, String> {
    s.parse().map_err(|e: crate::TtsError| e.to_string())
}

fn parse_variant(s: &str) -> Result<ModelVariant, String> {
    s.parse().map_err(|e: crate::TtsError| e.to_string())
}
