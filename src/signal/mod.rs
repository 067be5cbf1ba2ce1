//! Waveform container and generation parameters.

pub mod replay;
pub mod synth;

/// Magnitude bounds accepted by the generator and the magnitude model.
pub const MAGNITUDE_MIN: f32 = 3.0;
pub const MAGNITUDE_MAX: f32 = 8.0;

/// Noise-level bounds accepted by the generator.
pub const NOISE_MIN: f32 = 0.1;
pub const NOISE_MAX: f32 = 2.0;

/// Samples per waveform window.
pub const DEFAULT_LENGTH: usize = 300;

/// Duration of one waveform window in seconds.
pub const WINDOW_SEC: f32 = 2.0;

/// Plot range; display-only, samples themselves are never clipped.
pub const DISPLAY_CLIP: f32 = 5.0;

/// A fixed-length window of ground-motion samples. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
}

impl Waveform {
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest absolute sample value.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Root-mean-square amplitude.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// Copy of the samples clamped to the plot range.
    pub fn display_samples(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|s| s.clamp(-DISPLAY_CLIP, DISPLAY_CLIP))
            .collect()
    }
}

/// Generator inputs. Magnitude and noise level are clamped into their
/// ranges on every write, so a stored value is always valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    magnitude: f32,
    noise_level: f32,
    length: usize,
}

impl GenerationParams {
    pub fn new(magnitude: f32, noise_level: f32, length: usize) -> Self {
        Self {
            magnitude: magnitude.clamp(MAGNITUDE_MIN, MAGNITUDE_MAX),
            noise_level: noise_level.clamp(NOISE_MIN, NOISE_MAX),
            length: length.max(1),
        }
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn noise_level(&self) -> f32 {
        self.noise_level
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn set_magnitude(&mut self, magnitude: f32) {
        self.magnitude = magnitude.clamp(MAGNITUDE_MIN, MAGNITUDE_MAX);
    }

    pub fn set_noise_level(&mut self, noise_level: f32) {
        self.noise_level = noise_level.clamp(NOISE_MIN, NOISE_MAX);
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(5.0, 0.5, DEFAULT_LENGTH)
    }
}
