//! Detector configuration.
//!
//! All fields carry `#[serde(default)]`, so an empty table deserialises to
//! [`DetectorConfig::default`] and hosts can embed this struct in their own
//! settings file.

use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};
use crate::joint::Handedness;

/// Default maximum cumulative joint distance for a match, in metres.
///
/// Tuned against hand skeletons reported in metres; rescale it for trackers
/// that report other units.
pub const DEFAULT_RECOGNITION_THRESHOLD: f32 = 0.25;

/// What capture does when the palm joint is not tracked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapturePolicy {
    /// Store a template with no joints. It is kept, but can never match.
    #[default]
    LegacyEmpty,
    /// Fail with [`GestureError::ReferenceUnavailable`] and store nothing.
    RequirePalm,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Templates whose distance exceeds this are never reported.
    pub recognition_threshold: f32,
    /// Hand used by [`GestureDetector::capture_default`](crate::GestureDetector::capture_default).
    pub default_handedness:    Handedness,
    pub capture_policy:        CapturePolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            recognition_threshold: DEFAULT_RECOGNITION_THRESHOLD,
            default_handedness:    Handedness::Any,
            capture_policy:        CapturePolicy::LegacyEmpty,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        validate_threshold(self.recognition_threshold)
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<()> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(())
    } else {
        Err(GestureError::InvalidThreshold(threshold))
    }
}
