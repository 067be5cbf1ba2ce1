//! Built-in baseline scoring models.
//!
//! Deterministic stand-ins for the trained models, with the same
//! input/output contract. Coefficients can be loaded from small TOML
//! weight files so startup keeps a real, fallible model-load step;
//! `builtin()` constants back the demo when no file is configured.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{AnomalyModel, MagnitudeModel, ModelLoadError};
use crate::signal::Waveform;

fn read_weights<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ModelLoadError> {
    let text = fs::read_to_string(path).map_err(|err| ModelLoadError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    toml::from_str(&text).map_err(|err| ModelLoadError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })
}

/// Anomaly score from overall signal energy: `bias + gain * rms`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EnergyAnomalyModel {
    gain: f32,
    #[serde(default)]
    bias: f32,
}

impl EnergyAnomalyModel {
    pub fn builtin() -> Self {
        Self {
            gain: 0.45,
            bias: 0.05,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        read_weights(path)
    }
}

impl AnomalyModel for EnergyAnomalyModel {
    fn score(&self, waveform: &Waveform) -> f32 {
        self.bias + self.gain * waveform.rms()
    }
}

/// Magnitude estimate from the largest excursion: `offset + scale * peak`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeakMagnitudeModel {
    scale: f32,
    #[serde(default)]
    offset: f32,
}

impl PeakMagnitudeModel {
    pub fn builtin() -> Self {
        Self {
            scale: 1.6,
            offset: 2.4,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        read_weights(path)
    }
}

impl MagnitudeModel for PeakMagnitudeModel {
    fn estimate(&self, waveform: &Waveform) -> f32 {
        self.offset + self.scale * waveform.peak()
    }
}
