//! Inference gateway over opaque waveform scoring models.
//!
//! The core never looks inside a model: it hands over a waveform of the
//! contracted length (one batch element, `length` time steps, one
//! channel) and gets back scalar scores, clamped into their documented
//! ranges. Model loading is a one-time fallible startup step; serving
//! ticks without a loaded model set is not allowed.

pub mod baseline;

use std::fmt;

use crate::signal::{MAGNITUDE_MAX, MAGNITUDE_MIN, Waveform};

/// Deviation-from-normal scorer. Output is clamped to [0, 1].
pub trait AnomalyModel: Send + Sync {
    fn score(&self, waveform: &Waveform) -> f32;
}

/// Earthquake-strength estimator. Output is clamped to [3.0, 8.0].
pub trait MagnitudeModel: Send + Sync {
    fn estimate(&self, waveform: &Waveform) -> f32;
}

/// Fresh model outputs for one tick; never cached across ticks.
/// `magnitude_estimate` is `None` when only the anomaly model is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub anomaly_score: f32,
    pub magnitude_estimate: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelLoadError {
    Io { path: String, message: String },
    Parse { path: String, message: String },
}

impl fmt::Display for ModelLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelLoadError::Io { path, message } => {
                write!(f, "failed to read model weights {path}: {message}")
            }
            ModelLoadError::Parse { path, message } => {
                write!(f, "failed to parse model weights {path}: {message}")
            }
        }
    }
}

impl std::error::Error for ModelLoadError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceError {
    /// Input length differs from the models' contracted window.
    ShapeMismatch { expected: usize, got: usize },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::ShapeMismatch { expected, got } => {
                write!(f, "waveform has {got} samples, models expect {expected}")
            }
        }
    }
}

impl std::error::Error for InferenceError {}

/// Owns the loaded models and enforces the input contract.
pub struct InferenceGateway {
    anomaly: Box<dyn AnomalyModel>,
    magnitude: Option<Box<dyn MagnitudeModel>>,
    length: usize,
}

impl InferenceGateway {
    pub fn new(
        anomaly: Box<dyn AnomalyModel>,
        magnitude: Option<Box<dyn MagnitudeModel>>,
        length: usize,
    ) -> Self {
        Self {
            anomaly,
            magnitude,
            length,
        }
    }

    pub fn expected_length(&self) -> usize {
        self.length
    }

    pub fn has_magnitude_model(&self) -> bool {
        self.magnitude.is_some()
    }

    /// Score one waveform. Rejects any input whose length is off-contract.
    pub fn infer(&self, waveform: &Waveform) -> Result<Prediction, InferenceError> {
        if waveform.len() != self.length {
            return Err(InferenceError::ShapeMismatch {
                expected: self.length,
                got: waveform.len(),
            });
        }
        let anomaly_score = self.anomaly.score(waveform).clamp(0.0, 1.0);
        let magnitude_estimate = self
            .magnitude
            .as_ref()
            .map(|model| model.estimate(waveform).clamp(MAGNITUDE_MIN, MAGNITUDE_MAX));
        Ok(Prediction {
            anomaly_score,
            magnitude_estimate,
        })
    }
}

impl fmt::Debug for InferenceGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceGateway")
            .field("length", &self.length)
            .field("has_magnitude_model", &self.magnitude.is_some())
            .finish()
    }
}
