use clap::{Parser, ValueEnum};

use crate::playback::state::{Mode, Preset};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "quakecast.toml")]
    pub config: String,

    /// Waveform source (overrides config)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Start with a generation preset active
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Magnitude in [3.0, 8.0] (overrides config; out of range is clamped)
    #[arg(long)]
    pub magnitude: Option<f32>,

    /// Noise level in [0.1, 2.0] (overrides config; out of range is clamped)
    #[arg(long)]
    pub noise: Option<f32>,

    /// Tick interval in milliseconds, clamped to [10, 2000]
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Seed for reproducible synthetic waveforms
    #[arg(long)]
    pub seed: Option<u64>,

    /// Take a single static reading and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Replay,
    Synthetic,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Replay => Mode::Replay,
            ModeArg::Synthetic => Mode::Synthetic,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetArg {
    Weak,
    Medium,
    Strong,
}

impl From<PresetArg> for Preset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Weak => Preset::Weak,
            PresetArg::Medium => Preset::Medium,
            PresetArg::Strong => Preset::Strong,
        }
    }
}
