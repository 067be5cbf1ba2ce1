use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::playback::state::{INTERVAL_MS_DEFAULT, Mode};
use crate::risk::RiskPolicy;
use crate::signal::DEFAULT_LENGTH;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "StreamConfig::default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "StreamConfig::default_length")]
    pub length: usize,
    #[serde(default)]
    pub mode: Mode,
}

impl StreamConfig {
    fn default_interval_ms() -> u64 {
        INTERVAL_MS_DEFAULT
    }
    fn default_length() -> usize {
        DEFAULT_LENGTH
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            length: Self::default_length(),
            mode: Mode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    #[serde(default = "SignalConfig::default_magnitude")]
    pub magnitude: f32,
    #[serde(default = "SignalConfig::default_noise_level")]
    pub noise_level: f32,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SignalConfig {
    fn default_magnitude() -> f32 {
        5.0
    }
    fn default_noise_level() -> f32 {
        0.5
    }
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            magnitude: Self::default_magnitude(),
            noise_level: Self::default_noise_level(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    /// TOML weight file for the anomaly model; builtin weights when unset.
    #[serde(default)]
    pub anomaly_weights: Option<String>,
    /// TOML weight file for the magnitude model; builtin weights when unset.
    #[serde(default)]
    pub magnitude_weights: Option<String>,
    /// Load only the anomaly model; requires the single-factor risk policy.
    #[serde(default)]
    pub single_model: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Directory of mono WAV records, one per replay frame.
    #[serde(default)]
    pub dataset_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskConfig {
    #[serde(default)]
    pub policy: RiskPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl AppConfig {
    pub fn load_or_default(path: &str) -> Self {
        let path_obj = Path::new(path);
        if path_obj.exists() {
            match fs::read_to_string(path_obj) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        eprintln!("Failed to parse config {path}: {err}. Using defaults.");
                    }
                },
                Err(err) => {
                    eprintln!("Failed to read config {path}: {err}. Using defaults.");
                }
            }
            return Self::default();
        }

        // File does not exist: write commented defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                let mut commented = String::new();
                for line in text.lines() {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        commented.push('\n');
                    } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                        commented.push_str(line);
                        commented.push('\n');
                    } else {
                        commented.push_str("# ");
                        commented.push_str(line);
                        commented.push('\n');
                    }
                }
                if let Err(err) = fs::write(path_obj, commented) {
                    eprintln!("Failed to write default config to {path}: {err}");
                }
            }
            Err(_) => {
                eprintln!("Failed to serialize default config; continuing with defaults");
            }
        }
        default_cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn unique_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!(
            "quakecast_config_test_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        p
    }

    #[test]
    fn load_or_default_writes_commented_defaults() {
        let path = unique_path("defaults.toml");
        let path_str = path.to_string_lossy().to_string();
        let _ = fs::remove_file(&path);

        let cfg = AppConfig::load_or_default(&path_str);
        assert!(path.exists(), "config file should be created");
        assert_eq!(cfg.stream.interval_ms, 150);
        assert_eq!(cfg.stream.length, 300);
        assert_eq!(cfg.stream.mode, Mode::Synthetic);
        assert_eq!(cfg.signal.magnitude, 5.0);
        assert_eq!(cfg.signal.noise_level, 0.5);
        assert_eq!(cfg.risk.policy, RiskPolicy::TwoFactor);
        assert!(!cfg.models.single_model);

        let contents = fs::read_to_string(&path).expect("read written config");
        assert!(contents.contains("[stream]"));
        assert!(contents.contains("# interval_ms = 150"));
        assert!(contents.contains("# magnitude = 5.0"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn load_or_default_reads_existing() {
        let path = unique_path("custom.toml");
        let path_str = path.to_string_lossy().to_string();
        let text = "\
[stream]
interval_ms = 40
length = 200
mode = \"replay\"

[signal]
magnitude = 6.5
noise_level = 1.2
seed = 9

[replay]
dataset_dir = \"data/records\"

[risk]
policy = \"single-factor\"
";
        fs::write(&path, text).unwrap();

        let cfg = AppConfig::load_or_default(&path_str);
        assert_eq!(cfg.stream.interval_ms, 40);
        assert_eq!(cfg.stream.length, 200);
        assert_eq!(cfg.stream.mode, Mode::Replay);
        assert_eq!(cfg.signal.magnitude, 6.5);
        assert_eq!(cfg.signal.noise_level, 1.2);
        assert_eq!(cfg.signal.seed, Some(9));
        assert_eq!(cfg.replay.dataset_dir.as_deref(), Some("data/records"));
        assert_eq!(cfg.risk.policy, RiskPolicy::SingleFactor);

        let _ = fs::remove_file(&path);
    }
}
