//! GPU detection for precision selection
//!
//! Detects an NVIDIA accelerator through `nvidia-smi`. When one is present
//! the model is loaded in bfloat16, otherwise in float32 on the CPU.

use std::env;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::neural::model::Precision;

/// Set to `1`/`true` to ignore any detected accelerator
pub const FORCE_CPU_ENV: &str = "QWEN3_TTS_FORCE_CPU";

/// Information about detected GPU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuInfo {
    /// GPU name/model
    pub name: String,
    /// Total VRAM in GB
    pub vram_total_gb: f32,
    /// Available/free VRAM in GB
    pub vram_available_gb: f32,
    /// Driver version
    pub driver_version: String,
    /// CUDA version (if available)
    pub cuda_version: Option<String>,
}

impl GpuInfo {
    /// Detect GPU information from the system
    ///
    /// Returns None if no compatible GPU is found.
    pub fn detect() -> Option<Self> {
        let output = Command::new("nvidia-smi")
            .args([
                "--query-gpu=name,memory.total,memory.free,driver_version",
                "--format=csv,noheader,nounits",
            ])
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut info = Self::parse_query_line(stdout.lines().next()?)?;
        info.cuda_version = Self::detect_cuda_version();
        Some(info)
    }

    /// Parse one `name, total MiB, free MiB, driver` CSV line
    fn parse_query_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        if parts.len() < 4 {
            return None;
        }

        let vram_total_mb: f32 = parts[1].parse().ok()?;
        let vram_free_mb: f32 = parts[2].parse().ok()?;

        Some(Self {
            name: parts[0].to_string(),
            vram_total_gb: vram_total_mb / 1024.0,
            vram_available_gb: vram_free_mb / 1024.0,
            driver_version: parts[3].to_string(),
            cuda_version: None,
        })
    }

    /// Parse "CUDA Version: 12.1" from the default nvidia-smi banner
    fn detect_cuda_version() -> Option<String> {
        let output = Command::new("nvidia-smi").output().ok()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_cuda_version(&stdout)
    }
}

fn parse_cuda_version(banner: &str) -> Option<String> {
    banner
        .lines()
        .find_map(|line| line.split("CUDA Version:").nth(1))
        .map(|rest| rest.trim().trim_end_matches('|').trim().to_string())
        .filter(|v| !v.is_empty())
}

fn force_cpu() -> bool {
    env::var(FORCE_CPU_ENV)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Map an optional detected GPU to a load precision
pub fn precision_for(gpu: Option<&GpuInfo>) -> Precision {
    match gpu {
        Some(_) => Precision::BF16,
        None => Precision::F32,
    }
}

/// Pick the load precision for this machine
pub fn select_precision() -> Precision {
    if force_cpu() {
        tracing::info!("{} set, loading models in float32 on CPU", FORCE_CPU_ENV);
        return Precision::F32;
    }

    let gpu = GpuInfo::detect();
    match &gpu {
        Some(info) => tracing::info!(
            "GPU detected: {} with {:.1}GB available VRAM",
            info.name,
            info.vram_available_gb
        ),
        None => tracing::warn!("No compatible GPU detected, falling back to float32 on CPU"),
    }
    precision_for(gpu.as_ref())
}

/// Get a human-readable summary of GPU status
pub fn gpu_status_summary() -> String {
    match GpuInfo::detect() {
        Some(gpu) => {
            let mut summary = format!(
                "GPU: {}\n\
                 VRAM: {:.1}GB total, {:.1}GB available\n\
                 Driver: {}",
                gpu.name, gpu.vram_total_gb, gpu.vram_available_gb, gpu.driver_version
            );

            if let Some(cuda) = &gpu.cuda_version {
                summary.push_str(&format!("\nCUDA: {}", cuda));
            }

            summary.push_str(&format!(
                "\nPrecision: {}",
                precision_for(Some(&gpu)).dtype()
            ));
            summary
        }
        None => format!(
            "No compatible GPU detected. Models will load in {} on CPU.",
            Precision::F32.dtype()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_line() {
        let info = GpuInfo::parse_query_line("NVIDIA GeForce RTX 4090, 24564, 20480, 550.54.14")
            .unwrap();
        assert_eq!(info.name, "NVIDIA GeForce RTX 4090");
        approx::assert_relative_eq!(info.vram_available_gb, 20.0);
        assert_eq!(info.driver_version, "550.54.14");
    }

    #[test]
    fn test_parse_query_line_rejects_garbage() {
        assert!(GpuInfo::parse_query_line("No devices were found").is_none());
        assert!(GpuInfo::parse_query_line("gpu, lots, some, 1.0").is_none());
    }

    #[test]
    fn test_parse_cuda_version() {
        let banner = "| NVIDIA-SMI 550.54.14    Driver Version: 550.54.14    CUDA Version: 12.4     |";
        assert_eq!(parse_cuda_version(banner), Some("12.4".to_string()));
        assert_eq!(parse_cuda_version("nothing here"), None);
    }

    #[test]
    fn test_precision_mapping() {
        assert_eq!(precision_for(None), Precision::F32);

        let gpu = GpuInfo::parse_query_line("A100, 40960, 40000, 535.0").unwrap();
        assert_eq!(precision_for(Some(&gpu)), Precision::BF16);
    }

    #[test]
    fn test_gpu_status_summary_returns_string() {
        // Must not panic with or without a GPU
        let summary = gpu_status_summary();
        assert!(summary.contains("GPU"));
    }
}
