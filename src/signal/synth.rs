//! Synthetic seismic arrival generator.
//!
//! Builds a deterministic build-up/decay pulse whose peak amplitude grows
//! with magnitude, then adds a uniform perturbation scaled by the noise
//! level. The random source is an explicit argument: pass a seeded rng for
//! reproducible runs, or `rand::rng()` when each call should draw a fresh
//! waveform (the streaming path does exactly that on purpose).

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{GenerationParams, MAGNITUDE_MIN, WINDOW_SEC, Waveform};

/// Arrival begins this far into the window, in seconds.
const ONSET_SEC: f32 = 0.5;
/// Time from onset to envelope peak, in seconds.
const RISE_SEC: f32 = 0.15;
/// Dominant oscillation frequency of the arrival, in Hz.
const CARRIER_HZ: f32 = 12.0;

const AMP_FLOOR: f32 = 0.4;
const AMP_PER_MAGNITUDE: f32 = 0.6;

/// Envelope peak for a given magnitude. Strictly increasing.
pub fn peak_amplitude(magnitude: f32) -> f32 {
    AMP_FLOOR + AMP_PER_MAGNITUDE * (magnitude - MAGNITUDE_MIN)
}

/// Generate one waveform of exactly `params.length()` samples.
pub fn generate<R: Rng + ?Sized>(params: &GenerationParams, rng: &mut R) -> Waveform {
    let n = params.length();
    let dt = WINDOW_SEC / n as f32;
    let amp = peak_amplitude(params.magnitude());
    let noise_level = params.noise_level();

    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        let t = i as f32 * dt;
        let base = if t >= ONSET_SEC {
            // u * e^(1-u) peaks at 1.0 when u == 1, i.e. RISE_SEC after onset.
            let u = (t - ONSET_SEC) / RISE_SEC;
            let envelope = u * (1.0 - u).exp();
            amp * envelope * (TAU * CARRIER_HZ * (t - ONSET_SEC)).sin()
        } else {
            0.0
        };
        let noise = noise_level * rng.random_range(-1.0..1.0);
        samples.push(base + noise);
    }
    Waveform::from_samples(samples)
}

/// Seeded convenience wrapper for reproducible waveforms.
pub fn generate_seeded(params: &GenerationParams, seed: u64) -> Waveform {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(params, &mut rng)
}
