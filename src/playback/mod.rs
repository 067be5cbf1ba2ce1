//! Playback controller: the orchestrating state machine.
//!
//! One controller per session owns the playback state, the rng for
//! synthetic mode, and the single current snapshot. Each tick runs the
//! full pipeline synchronously (acquire waveform, infer, classify,
//! publish) before the next may begin; the external scheduler drives
//! `tick()`, the controller never owns a loop of its own.

pub mod state;

use std::fmt;
use std::sync::Arc;

use rand::{SeedableRng, rngs::SmallRng};
use tracing::{debug, info, warn};

use crate::infer::{InferenceError, InferenceGateway, ModelLoadError, Prediction};
use crate::risk::{RiskLevel, RiskPolicy};
use crate::signal::replay::{DatasetError, ReplayBuffer};
use crate::signal::{GenerationParams, Waveform, synth};
use self::state::{Mode, Phase, PlaybackState, Preset, clamp_interval_ms};

/// The one view the rendering layer reads; fully replaced every tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub waveform: Waveform,
    pub prediction: Prediction,
    pub risk: RiskLevel,
    pub mode: Mode,
    pub running: bool,
    /// Set when a later tick aborted and this snapshot stayed visible.
    pub error: Option<String>,
}

impl Snapshot {
    /// Samples clamped to the plot range; the waveform itself stays unclipped.
    pub fn display_samples(&self) -> Vec<f32> {
        self.waveform.display_samples()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitializationError {
    ModelLoad(ModelLoadError),
    Dataset(DatasetError),
    /// The two-factor policy needs a magnitude model.
    PolicyRequiresMagnitudeModel,
    /// Replay mode was requested without a loaded dataset.
    ReplayUnavailable,
    /// Replay records and the model contract disagree on window length.
    LengthMismatch { expected: usize, got: usize },
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationError::ModelLoad(err) => write!(f, "{err}"),
            InitializationError::Dataset(err) => write!(f, "{err}"),
            InitializationError::PolicyRequiresMagnitudeModel => {
                write!(f, "two-factor risk policy requires a magnitude model")
            }
            InitializationError::ReplayUnavailable => {
                write!(f, "replay mode requires a loaded dataset")
            }
            InitializationError::LengthMismatch { expected, got } => {
                write!(f, "replay records have {got} samples, models expect {expected}")
            }
        }
    }
}

impl std::error::Error for InitializationError {}

impl From<ModelLoadError> for InitializationError {
    fn from(err: ModelLoadError) -> Self {
        InitializationError::ModelLoad(err)
    }
}

impl From<DatasetError> for InitializationError {
    fn from(err: DatasetError) -> Self {
        InitializationError::Dataset(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackError {
    /// A replay command was issued without a loaded dataset.
    NoReplayBuffer,
    /// The tick pipeline aborted inside the inference gateway.
    Inference(InferenceError),
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackError::NoReplayBuffer => write!(f, "no replay dataset is loaded"),
            PlaybackError::Inference(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PlaybackError {}

impl From<InferenceError> for PlaybackError {
    fn from(err: InferenceError) -> Self {
        PlaybackError::Inference(err)
    }
}

/// Construction-time knobs for a controller.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub mode: Mode,
    pub interval_ms: u64,
    pub params: GenerationParams,
    pub policy: RiskPolicy,
    /// Seed for the synthetic stream; `None` draws from OS entropy, so
    /// every unseeded session produces different waveforms by design.
    pub seed: Option<u64>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Synthetic,
            interval_ms: state::INTERVAL_MS_DEFAULT,
            params: GenerationParams::default(),
            policy: RiskPolicy::TwoFactor,
            seed: None,
        }
    }
}

pub struct PlaybackController {
    state: PlaybackState,
    replay: Option<Arc<ReplayBuffer>>,
    gateway: InferenceGateway,
    policy: RiskPolicy,
    rng: SmallRng,
    snapshot: Option<Snapshot>,
}

impl PlaybackController {
    pub fn new(
        gateway: InferenceGateway,
        replay: Option<Arc<ReplayBuffer>>,
        settings: ControllerSettings,
    ) -> Result<Self, InitializationError> {
        if settings.policy == RiskPolicy::TwoFactor && !gateway.has_magnitude_model() {
            return Err(InitializationError::PolicyRequiresMagnitudeModel);
        }
        if settings.mode == Mode::Replay && replay.is_none() {
            return Err(InitializationError::ReplayUnavailable);
        }
        if let Some(buffer) = &replay {
            let got = buffer.get(0).len();
            let expected = gateway.expected_length();
            if got != expected {
                return Err(InitializationError::LengthMismatch { expected, got });
            }
        }
        let rng = match settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Ok(Self {
            state: PlaybackState::new(settings.mode, settings.interval_ms, settings.params),
            replay,
            gateway,
            policy: settings.policy,
            rng,
            snapshot: None,
        })
    }

    /// Read-only view of the playback state.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Latest published snapshot, if any tick has completed yet.
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Idle|Stopped -> Running. No-op when already running.
    pub fn start(&mut self) {
        if self.state.phase != Phase::Running {
            info!("playback started in {:?} mode", self.state.mode);
            self.state.phase = Phase::Running;
        }
    }

    /// Running -> Stopped. No-op otherwise.
    pub fn stop(&mut self) {
        if self.state.phase == Phase::Running {
            info!("playback stopped");
            self.state.phase = Phase::Stopped;
        }
    }

    /// Switch the waveform source. Stops a running stream first; replay
    /// position and generation parameters survive the switch.
    pub fn set_mode(&mut self, mode: Mode) -> Result<(), PlaybackError> {
        if mode == self.state.mode {
            return Ok(());
        }
        if mode == Mode::Replay && self.replay.is_none() {
            return Err(PlaybackError::NoReplayBuffer);
        }
        self.stop();
        info!("mode switched to {mode:?}");
        self.state.mode = mode;
        Ok(())
    }

    /// Manual parameter write. Stops a running stream first and clears
    /// any active preset; out-of-range values are clamped, not rejected.
    pub fn set_parameters(&mut self, magnitude: f32, noise_level: f32) {
        self.stop();
        self.state.params.set_magnitude(magnitude);
        self.state.params.set_noise_level(noise_level);
        self.state.preset = None;
        debug!(
            "parameters set: magnitude={} noise_level={}",
            self.state.params.magnitude(),
            self.state.params.noise_level()
        );
    }

    /// Apply a preset pair. Stops a running stream first; stays active
    /// until the next manual `set_parameters`.
    pub fn select_preset(&mut self, preset: Preset) {
        self.stop();
        let (magnitude, noise_level) = preset.params();
        self.state.params.set_magnitude(magnitude);
        self.state.params.set_noise_level(noise_level);
        self.state.preset = Some(preset);
        info!("preset {preset:?} selected ({magnitude}, {noise_level})");
    }

    /// Update the tick cadence, clamped to the valid range. Takes effect
    /// at the scheduler's next deadline computation; does not stop the stream.
    pub fn set_interval_ms(&mut self, interval_ms: u64) {
        self.state.interval_ms = clamp_interval_ms(interval_ms);
    }

    /// One scheduled tick. Returns `Ok(false)` without touching anything
    /// when the stream is parked, so a stop always wins over a pending tick.
    pub fn tick(&mut self) -> Result<bool, PlaybackError> {
        if !self.state.is_running() {
            return Ok(false);
        }
        self.step()?;
        Ok(true)
    }

    /// Manual single step; runs the same pipeline regardless of phase.
    pub fn advance_once(&mut self) -> Result<(), PlaybackError> {
        self.step()
    }

    fn step(&mut self) -> Result<(), PlaybackError> {
        let waveform = match self.state.mode {
            Mode::Replay => {
                let buffer = self.replay.as_ref().ok_or(PlaybackError::NoReplayBuffer)?;
                let waveform = buffer.get(self.state.frame_index).clone();
                self.state.frame_index = (self.state.frame_index + 1) % buffer.len();
                waveform
            }
            Mode::Synthetic => synth::generate(&self.state.params, &mut self.rng),
        };

        let prediction = match self.gateway.infer(&waveform) {
            Ok(prediction) => prediction,
            Err(err) => {
                // Abort the tick: the previous snapshot stays visible,
                // flagged so the render layer can surface the fault.
                warn!("tick aborted at inference: {err}");
                if let Some(snapshot) = &mut self.snapshot {
                    snapshot.error = Some(err.to_string());
                }
                return Err(err.into());
            }
        };

        let risk = self.policy.classify(&prediction);
        debug!(
            "tick scored: anomaly={:.3} magnitude={:?} risk={risk}",
            prediction.anomaly_score, prediction.magnitude_estimate
        );
        self.snapshot = Some(Snapshot {
            waveform,
            prediction,
            risk,
            mode: self.state.mode,
            running: self.state.is_running(),
            error: None,
        });
        Ok(())
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("has_replay", &self.replay.is_some())
            .field("has_snapshot", &self.snapshot.is_some())
            .finish()
    }
}
