//! JSON configuration and report helpers for overlay measurement runs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use boxmark_core::Rect;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{OverlayError, OverlayParams, OverlayResult, OverlayStats};

#[derive(thiserror::Error, Debug)]
pub enum OverlayIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, OverlayIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<(), OverlayIoError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Configuration of a measurement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Images to measure.
    pub image_paths: Vec<String>,
    /// Reference image for the coarse template; defaults to the first image.
    #[serde(default)]
    pub template_path: Option<String>,
    /// Region of the reference holding the mark.
    #[serde(default)]
    pub template_roi: Option<Rect>,
    #[serde(default)]
    pub params: OverlayParams,
    #[serde(default)]
    pub output_path: Option<String>,
}

impl OverlayConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayIoError> {
        read_json(path.as_ref())
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayIoError> {
        write_pretty(self, path.as_ref())
    }

    /// Resolve the output report path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("overlay_report.json"))
    }

    /// Reference image path: the explicit template or the first image.
    pub fn reference_path(&self) -> Option<&str> {
        self.template_path
            .as_deref()
            .or_else(|| self.image_paths.first().map(String::as_str))
    }
}

/// Outcome for one image of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageReport {
    pub image_path: String,
    #[serde(default)]
    pub result: Option<OverlayResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ImageReport {
    pub fn new(image_path: impl Into<String>, outcome: &Result<OverlayResult, OverlayError>) -> Self {
        let (result, error) = match outcome {
            Ok(r) => (Some(r.clone()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            image_path: image_path.into(),
            result,
            error,
        }
    }
}

/// JSON report of a measurement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayReport {
    pub config_path: String,
    pub params: OverlayParams,
    pub images: Vec<ImageReport>,
    pub stats: OverlayStats,
    /// Set when the run failed before any image was measured.
    #[serde(default)]
    pub error: Option<String>,
}

impl OverlayReport {
    pub fn new(cfg: &OverlayConfig, config_path: &Path) -> Self {
        Self {
            config_path: config_path.to_string_lossy().into_owned(),
            params: cfg.params,
            images: Vec::new(),
            stats: OverlayStats::default(),
            error: None,
        }
    }

    /// Record per-image outcomes and their summary.
    pub fn set_results(&mut self, paths: &[String], outcomes: &[Result<OverlayResult, OverlayError>]) {
        self.images = paths
            .iter()
            .zip(outcomes)
            .map(|(p, o)| ImageReport::new(p.clone(), o))
            .collect();
        self.stats = OverlayStats::from_results(outcomes);
    }

    pub fn set_error(&mut self, err: impl std::fmt::Display) {
        self.error = Some(err.to_string());
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, OverlayIoError> {
        read_json(path.as_ref())
    }

    /// Write the report as pretty JSON, creating missing parent directories.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OverlayIoError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        write_pretty(self, path)
    }
}
