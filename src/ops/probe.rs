use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Result, bail};
use log::debug;
use serde::Deserialize;

/// Subset of `ffprobe -print_format json` output that matters here.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

fn run_ffprobe(path: &Path) -> Result<ProbeOutput> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()?;
    if !output.status.success() {
        bail!("ffprobe exited with {}", output.status);
    }
    Ok(serde_json::from_slice(&output.stdout)?)
}

/// Total duration in seconds, preferring the container duration and falling
/// back to the first audio stream. 0.0 on any failure.
pub fn probe_duration(path: &Path) -> f64 {
    match run_ffprobe(path) {
        Ok(probe) => duration_of(&probe),
        Err(err) => {
            debug!("ffprobe failed for {}: {err}", path.display());
            0.0
        }
    }
}

fn duration_of(probe: &ProbeOutput) -> f64 {
    let format_duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok());
    if let Some(duration) = format_duration {
        return duration;
    }
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| s.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Container-level metadata tags with lowercased keys (ffprobe emits
/// mixed-case keys depending on the container). Empty on any failure.
pub fn probe_tags(path: &Path) -> HashMap<String, String> {
    match run_ffprobe(path) {
        Ok(probe) => probe
            .format
            .map(|f| {
                f.tags
                    .into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect()
            })
            .unwrap_or_default(),
        Err(err) => {
            debug!("ffprobe failed for {}: {err}", path.display());
            HashMap::new()
        }
    }
}
