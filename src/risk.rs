//! Rule-based risk classification.
//!
//! Two fixed-threshold policies over the model outputs; the variant is
//! picked once at construction and never changes at runtime. Both are
//! pure and total, and the level never decreases when either input grows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infer::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

const TWO_FACTOR_MAG_HIGH: f32 = 7.0;
const TWO_FACTOR_ANOMALY_HIGH: f32 = 0.75;
const TWO_FACTOR_MAG_MEDIUM: f32 = 5.0;
const TWO_FACTOR_ANOMALY_MEDIUM: f32 = 0.45;

const SINGLE_FACTOR_ANOMALY_HIGH: f32 = 0.65;
const SINGLE_FACTOR_ANOMALY_MEDIUM: f32 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskPolicy {
    /// Combines magnitude estimate and anomaly score.
    #[default]
    TwoFactor,
    /// Anomaly score only, with tighter thresholds.
    SingleFactor,
}

impl RiskPolicy {
    /// Map one prediction to a risk level.
    ///
    /// A two-factor classification of a prediction without a magnitude
    /// estimate falls back to the anomaly arms of its thresholds.
    pub fn classify(&self, prediction: &Prediction) -> RiskLevel {
        let anomaly = prediction.anomaly_score;
        match self {
            RiskPolicy::TwoFactor => {
                let mag = prediction.magnitude_estimate;
                if mag.is_some_and(|m| m > TWO_FACTOR_MAG_HIGH) || anomaly > TWO_FACTOR_ANOMALY_HIGH
                {
                    RiskLevel::High
                } else if mag.is_some_and(|m| m > TWO_FACTOR_MAG_MEDIUM)
                    || anomaly > TWO_FACTOR_ANOMALY_MEDIUM
                {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
            RiskPolicy::SingleFactor => {
                if anomaly > SINGLE_FACTOR_ANOMALY_HIGH {
                    RiskLevel::High
                } else if anomaly > SINGLE_FACTOR_ANOMALY_MEDIUM {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
        }
    }
}
