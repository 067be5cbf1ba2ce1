//! Typed playback state, owned by exactly one controller.

use serde::{Deserialize, Serialize};

use crate::signal::GenerationParams;

pub const INTERVAL_MS_MIN: u64 = 10;
pub const INTERVAL_MS_MAX: u64 = 2000;
pub const INTERVAL_MS_DEFAULT: u64 = 150;

/// Where tick waveforms come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Replay,
    #[default]
    Synthetic,
}

/// Stream phase. `Idle` and `Stopped` are both parked; they differ only
/// in whether `start()` has ever been called. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Named shortcut that pins (magnitude, noise_level) until a manual
/// parameter write clears it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Weak,
    Medium,
    Strong,
}

impl Preset {
    pub fn params(self) -> (f32, f32) {
        match self {
            Preset::Weak => (4.0, 0.2),
            Preset::Medium => (5.5, 0.4),
            Preset::Strong => (7.0, 0.7),
        }
    }
}

pub fn clamp_interval_ms(interval_ms: u64) -> u64 {
    interval_ms.clamp(INTERVAL_MS_MIN, INTERVAL_MS_MAX)
}

#[derive(Debug, Clone)]
pub struct PlaybackState {
    pub mode: Mode,
    pub phase: Phase,
    /// Next replay record to play; meaningful only in `Mode::Replay`.
    pub frame_index: usize,
    pub interval_ms: u64,
    pub params: GenerationParams,
    pub preset: Option<Preset>,
}

impl PlaybackState {
    pub fn new(mode: Mode, interval_ms: u64, params: GenerationParams) -> Self {
        Self {
            mode,
            phase: Phase::Idle,
            frame_index: 0,
            interval_ms: clamp_interval_ms(interval_ms),
            params,
            preset: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}
