//! Qwen3-TTS CLI
//!
//! Command-line interface for the Qwen3-TTS nodes.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qwen3_tts_nodes::cli::{commands, Cli, Commands};
use qwen3_tts_nodes::Settings;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Qwen3-TTS Nodes v{}", env!("CARGO_PKG_VERSION"));

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.models_dir {
        settings.models_dir = dir;
    }
    if let Some(url) = cli.bridge_url {
        settings.bridge_url = url.trim_end_matches('/').to_string();
    }

    match cli.command {
        Some(cmd) => handle_command(cmd, &settings),
        None => {
            println!("Qwen3-TTS Nodes v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, settings: &Settings) -> anyhow::Result<()> {
    let result = match cmd {
        Commands::CustomVoice {
            text,
            language,
            speaker,
            instruct,
            output,
        } => commands::custom_voice(settings, &text, language, speaker, &instruct, &output),
        Commands::VoiceClone {
            ref_audio,
            ref_text,
            text,
            language,
            output,
        } => commands::voice_clone(settings, &ref_audio, &ref_text, &text, language, &output),
        Commands::Download { variant } => commands::download(settings, variant),
        Commands::Nodes => commands::print_nodes(),
        Commands::GpuStatus => commands::gpu_status(),
    };

    if let Err(err) = &result {
        for suggestion in err.recovery_suggestions() {
            eprintln!("  hint: {}", suggestion);
        }
    }
    result.map_err(|e| anyhow::anyhow!("[{}] {}", e.error_code(), e))
}
