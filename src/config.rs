//! Runtime settings
//!
//! Read from the environment once at startup; CLI flags override individual
//! fields afterwards.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8002";
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Settings shared by the model cache, the hub source and the bridge loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Base directory holding one subdirectory per downloaded model
    pub models_dir: PathBuf,
    /// Model hub base URL
    pub hub_endpoint: String,
    /// Bearer token for gated repositories
    pub hub_token: Option<String>,
    /// Inference bridge base URL
    pub bridge_url: String,
    /// Per-request timeout for inference bridge calls
    pub timeout_ms: u64,
    /// Where reference-audio handoff files are created (system temp dir if unset)
    pub scratch_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from("models").join("tts"),
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            hub_token: None,
            bridge_url: DEFAULT_BRIDGE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            scratch_dir: None,
        }
    }
}

impl Settings {
    /// Build settings from `QWEN3_TTS_*` variables and `HF_TOKEN`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            models_dir: non_empty("QWEN3_TTS_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.models_dir),
            hub_endpoint: non_empty("QWEN3_TTS_HUB_ENDPOINT")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.hub_endpoint),
            hub_token: non_empty("HF_TOKEN"),
            bridge_url: non_empty("QWEN3_TTS_BRIDGE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.bridge_url),
            timeout_ms: non_empty("QWEN3_TTS_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            scratch_dir: non_empty("QWEN3_TTS_SCRATCH_DIR").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert!(settings.models_dir.ends_with("models/tts"));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("QWEN3_TTS_MODELS_DIR", "/srv/models"),
            ("QWEN3_TTS_BRIDGE_URL", "http://gpu-box:9000/"),
            ("QWEN3_TTS_TIMEOUT_MS", "1500"),
            ("HF_TOKEN", "hf_abc"),
        ]));
        assert_eq!(settings.models_dir, PathBuf::from("/srv/models"));
        assert_eq!(settings.bridge_url, "http://gpu-box:9000");
        assert_eq!(settings.timeout_ms, 1500);
        assert_eq!(settings.hub_token.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn test_blank_and_malformed_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            ("QWEN3_TTS_MODELS_DIR", "  "),
            ("QWEN3_TTS_TIMEOUT_MS", "soon"),
        ]));
        assert_eq!(settings.models_dir, Settings::default().models_dir);
        assert_eq!(settings.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
