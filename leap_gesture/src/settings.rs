//! Runtime settings, read from TOML.
//!
//! Load with [`AppSettings::load`], which searches:
//! 1. `$LEAP_GESTURE_CONFIG`
//! 2. `./leap_gesture.toml`
//! 3. Built-in defaults
//!
//! Every table is optional; missing keys keep their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hand_pose::DetectorConfig;

pub const CONFIG_ENV: &str = "LEAP_GESTURE_CONFIG";
pub const LOCAL_CONFIG: &str = "leap_gesture.toml";

// ════════════════════════════════════════════════════════════════════════════
// AppSettings
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub detector:     DetectorConfig,
    /// Recognition ticks per second.
    pub tick_hz:      f32,
    /// Template library file. Created on first save.
    pub library_path: PathBuf,
    /// Ask on stdin for a name after each capture.
    pub name_prompt:  bool,
    pub sim:          SimSettings,
    pub view:         ViewSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            detector:     DetectorConfig::default(),
            tick_hz:      50.0,
            library_path: PathBuf::from("gestures.toml"),
            name_prompt:  false,
            sim:          SimSettings::default(),
            view:         ViewSettings::default(),
        }
    }
}

/// Simulated hands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Peak per-axis joint jitter, metres.
    pub tremor_m:  f32,
    /// Frames published per second.
    pub frame_hz:  f32,
    /// Distance one movement key press moves the hand, metres.
    pub step_m:    f32,
    /// Angle one twist key press turns the hand, radians.
    pub twist_rad: f32,
    /// Fixed RNG seed; random when absent.
    pub seed:      Option<u64>,
}

impl Default for SimSettings {
    fn default() -> Self {
        SimSettings {
            tremor_m:  0.001,
            frame_hz:  60.0,
            step_m:    0.01,
            twist_rad: 0.1,
            seed:      None,
        }
    }
}

/// Window geometry and world-to-screen mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub width:            usize,
    pub height:           usize,
    /// World point (x, y) drawn at the centre of the hand area.
    pub centre:           [f32; 2],
    pub pixels_per_metre: f32,
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            width:            960,
            height:           600,
            centre:           [0.0, 1.2],
            pixels_per_metre: 1200.0,
        }
    }
}

impl AppSettings {
    /// Load settings using the standard search order. Never fails: an
    /// unreadable or invalid file is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(settings) => {
                        info!(path = %p.display(), "loaded settings from {}", CONFIG_ENV);
                        return settings;
                    }
                    Err(e) => warn!(path = %p.display(), error = %e, "bad settings file, falling back"),
                }
            } else {
                warn!(path = %path, "{} points to a missing file, falling back", CONFIG_ENV);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(settings) => {
                    info!("loaded settings from ./{}", LOCAL_CONFIG);
                    return settings;
                }
                Err(e) => warn!(error = %e, "bad ./{}, using defaults", LOCAL_CONFIG),
            }
        }

        info!("no settings file found, using defaults");
        Self::default()
    }

    /// Parse and validate one TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;
        let settings: Self = toml::from_str(&contents)
            .map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every rate, length and threshold, collecting all problems.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let mut errors = Vec::new();

        if let Err(e) = self.detector.validate() {
            errors.push(format!("detector: {}", e));
        }
        rate(self.tick_hz,                "tick_hz",               &mut errors);
        rate(self.sim.frame_hz,           "sim.frame_hz",          &mut errors);
        positive(self.sim.step_m,         "sim.step_m",            &mut errors);
        positive(self.sim.twist_rad,      "sim.twist_rad",         &mut errors);
        positive(self.view.pixels_per_metre, "view.pixels_per_metre", &mut errors);
        if !self.sim.tremor_m.is_finite() || self.sim.tremor_m < 0.0 {
            errors.push(format!("sim.tremor_m: must be finite and >= 0 (got {})", self.sim.tremor_m));
        }
        if self.view.width < 320 || self.view.height < 240 {
            errors.push(format!("view: window must be at least 320x240 (got {}x{})",
                self.view.width, self.view.height));
        }
        if self.library_path.as_os_str().is_empty() {
            errors.push("library_path: must not be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(SettingsError::Invalid(errors)) }
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Accepted range for `tick_hz` and `sim.frame_hz`.
pub const MIN_RATE_HZ: f32 = 0.1;
pub const MAX_RATE_HZ: f32 = 10_000.0;

/// Loop period for `hz`, clamped into the accepted range. Non-finite rates
/// map to the slowest loop.
pub fn period_for(hz: f32) -> Duration {
    let hz = if hz.is_finite() { hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ) } else { MIN_RATE_HZ };
    Duration::from_secs_f32(1.0 / hz)
}

fn rate(value: f32, name: &str, errors: &mut Vec<String>) {
    if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&value) {
        errors.push(format!("{name}: must be between {MIN_RATE_HZ} and {MAX_RATE_HZ} Hz (got {value})"));
    }
}

fn positive(value: f32, name: &str, errors: &mut Vec<String>) {
    if !value.is_finite() || value <= 0.0 {
        errors.push(format!("{name}: must be finite and > 0 (got {value})"));
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SettingsError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("settings parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid settings: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::{CapturePolicy, Handedness};
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(AppSettings::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_is_defaults() {
        let s: AppSettings = toml::from_str("").unwrap();
        assert_eq!(s, AppSettings::default());
        assert_eq!(s.detector.recognition_threshold, 0.25);
        assert_eq!(s.tick_hz, 50.0);
    }

    #[test]
    fn partial_override() {
        let s: AppSettings = toml::from_str(r#"
tick_hz = 30.0

[detector]
recognition_threshold = 0.1
default_handedness = "left"
capture_policy = "require-palm"

[sim]
seed = 42
"#).unwrap();
        assert_eq!(s.tick_hz, 30.0);
        assert_eq!(s.detector.recognition_threshold, 0.1);
        assert_eq!(s.detector.default_handedness, Handedness::Left);
        assert_eq!(s.detector.capture_policy, CapturePolicy::RequirePalm);
        assert_eq!(s.sim.seed, Some(42));
        assert_eq!(s.sim.tremor_m, SimSettings::default().tremor_m);
        assert_eq!(s.view, ViewSettings::default());
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut s = AppSettings::default();
        s.tick_hz = 0.0;
        s.sim.tremor_m = -1.0;
        s.detector.recognition_threshold = f32::NAN;
        match s.validate() {
            Err(SettingsError::Invalid(errors)) => {
                assert_eq!(errors.len(), 3, "{:?}", errors);
                assert!(errors.iter().any(|e| e.starts_with("tick_hz")));
                assert!(errors.iter().any(|e| e.starts_with("detector")));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn loop_rates_are_bounded() {
        let mut s = AppSettings::default();
        s.tick_hz = 1e-20;
        s.sim.frame_hz = 1e9;
        match s.validate() {
            Err(SettingsError::Invalid(errors)) => {
                assert_eq!(errors.len(), 2, "{:?}", errors);
                assert!(errors.iter().any(|e| e.starts_with("tick_hz")));
                assert!(errors.iter().any(|e| e.starts_with("sim.frame_hz")));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }

        s.tick_hz = MIN_RATE_HZ;
        s.sim.frame_hz = MAX_RATE_HZ;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn period_never_panics() {
        let ms = |hz: f32| period_for(hz).as_secs_f64() * 1000.0;
        assert!((ms(50.0) - 20.0).abs() < 0.01);
        for slowest in [1e-20, 0.0, -5.0, f32::NAN, f32::INFINITY] {
            assert!((ms(slowest) - 10_000.0).abs() < 1.0, "{slowest}");
        }
        assert!((ms(1e12) - 0.1).abs() < 0.001);
    }

    #[test]
    fn tiny_rate_file_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"tick_hz = 1e-20\n").unwrap();
        assert!(matches!(
            AppSettings::load_from_file(f.path()),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn load_from_file_reports_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "tick_hz = \"fast\"").unwrap();
        let err = AppSettings::load_from_file(f.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(ref p, _) if p == f.path()));

        let missing = f.path().with_extension("nope");
        assert!(matches!(AppSettings::load_from_file(&missing), Err(SettingsError::Io(..))));
    }

    #[test]
    fn file_round_trip() {
        let mut original = AppSettings::default();
        original.tick_hz = 25.0;
        original.sim.seed = Some(3);
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(original.to_toml().unwrap().as_bytes()).unwrap();
        assert_eq!(AppSettings::load_from_file(f.path()).unwrap(), original);
    }
}
