//! Template library on disk.
//!
//! One TOML file, one `[[gesture]]` table per template, in store order:
//!
//! ```toml
//! [[gesture]]
//! name = "point"
//! hand = "right"
//! threshold = 0.15          # optional
//!
//! [gesture.joints]
//! wrist     = [0.0, -0.06, 0.0]
//! index-tip = [0.0, 0.09, 0.0]
//! ```
//!
//! Joint offsets are palm-local, in metres.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hand_pose::{GestureTemplate, Handedness, JointId};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("library parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("library serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("gesture {name:?}: {reason}")]
    Template { name: String, reason: String },
}

// ════════════════════════════════════════════════════════════════════════════
// File format
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default, rename = "gesture")]
    gestures: Vec<GestureRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GestureRecord {
    name:      String,
    hand:      Handedness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold: Option<f32>,
    #[serde(default)]
    joints:    BTreeMap<String, [f32; 3]>,
}

impl From<&GestureTemplate> for GestureRecord {
    fn from(t: &GestureTemplate) -> Self {
        GestureRecord {
            name:      t.name.clone(),
            hand:      t.handedness,
            threshold: t.threshold(),
            joints:    t.offsets().map(|(j, o)| (j.name().to_string(), [o.x, o.y, o.z])).collect(),
        }
    }
}

impl TryFrom<GestureRecord> for GestureTemplate {
    type Error = LibraryError;

    fn try_from(r: GestureRecord) -> Result<Self, LibraryError> {
        let invalid = |reason: String| LibraryError::Template { name: r.name.clone(), reason };
        if !r.hand.is_concrete() {
            return Err(invalid("hand must be \"left\" or \"right\"".to_string()));
        }
        let mut offsets = Vec::with_capacity(r.joints.len());
        for (joint, [x, y, z]) in &r.joints {
            let id = JointId::from_name(joint)
                .ok_or_else(|| invalid(format!("unknown joint {:?}", joint)))?;
            offsets.push((id, Vector3::new(*x, *y, *z)));
        }
        if let Some(t) = r.threshold {
            if !t.is_finite() || t <= 0.0 {
                return Err(invalid(format!("threshold must be finite and > 0 (got {})", t)));
            }
        }
        let template = GestureTemplate::from_offsets(r.name.as_str(), r.hand, offsets);
        Ok(match r.threshold {
            Some(t) => template.with_threshold(t),
            None    => template,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Library
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Library {
    path: PathBuf,
}

impl Library {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Library { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every template. A missing file is an empty library; entries that
    /// do not describe a usable template are skipped with a warning.
    pub fn load(&self) -> Result<Vec<GestureTemplate>, LibraryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| LibraryError::Io(self.path.clone(), e))?;
        let file: LibraryFile = toml::from_str(&contents)
            .map_err(|e| LibraryError::Parse(self.path.clone(), e))?;
        let mut templates = Vec::with_capacity(file.gestures.len());
        for record in file.gestures {
            match GestureTemplate::try_from(record) {
                Ok(t)  => templates.push(t),
                Err(e) => warn!(path = %self.path.display(), error = %e, "skipping library entry"),
            }
        }
        info!(path = %self.path.display(), count = templates.len(), "template library loaded");
        Ok(templates)
    }

    /// Replace the file with `templates`, in the order given.
    pub fn save<'a, I>(&self, templates: I) -> Result<(), LibraryError>
    where
        I: IntoIterator<Item = &'a GestureTemplate>,
    {
        let file = LibraryFile {
            gestures: templates.into_iter().map(GestureRecord::from).collect(),
        };
        let contents = toml::to_string_pretty(&file)?;
        std::fs::write(&self.path, contents)
            .map_err(|e| LibraryError::Io(self.path.clone(), e))?;
        info!(path = %self.path.display(), count = file.gestures.len(), "template library saved");
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> GestureTemplate {
        GestureTemplate::from_offsets(
            "point",
            Handedness::Right,
            [
                (JointId::Wrist,    Vector3::new(0.0, -0.06, 0.0)),
                (JointId::IndexTip, Vector3::new(0.0, 0.09, 0.01)),
            ],
        )
    }

    fn library_in(dir: &tempfile::TempDir) -> Library {
        Library::new(dir.path().join("gestures.toml"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(library_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_keeps_order_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_in(&dir);
        let fist = GestureTemplate::from_offsets("fist", Handedness::Left, [(JointId::ThumbTip, Vector3::new(0.01, 0.0, 0.02))])
            .with_threshold(0.1);
        lib.save([&point(), &fist]).unwrap();

        let loaded = lib.load().unwrap();
        assert_eq!(loaded, vec![point(), fist]);
    }

    #[test]
    fn empty_template_survives() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_in(&dir);
        let empty = GestureTemplate::new(hand_pose::DEFAULT_TEMPLATE_NAME, Handedness::Right, hand_pose::OffsetTable::default());
        lib.save([&empty]).unwrap();
        let loaded = lib.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].is_empty());
    }

    #[test]
    fn hand_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_in(&dir);
        std::fs::write(lib.path(), r#"
[[gesture]]
name = "point"
hand = "right"

[gesture.joints]
wrist = [0.0, -0.06, 0.0]
index-tip = [0.0, 0.09, 0.01]
"#).unwrap();
        assert_eq!(lib.load().unwrap(), vec![point()]);
    }

    #[test]
    fn bad_records_name_the_gesture() {
        let record = |hand, threshold, joint: &str| GestureRecord {
            name:      "x".to_string(),
            hand,
            threshold,
            joints:    BTreeMap::from([(joint.to_string(), [0.0, 0.0, 0.0])]),
        };

        match GestureTemplate::try_from(record(Handedness::Any, None, "wrist")) {
            Err(LibraryError::Template { name, .. }) => assert_eq!(name, "x"),
            other => panic!("expected Template error, got {:?}", other),
        }
        let err = GestureTemplate::try_from(record(Handedness::Left, None, "elbow")).unwrap_err();
        assert!(err.to_string().contains("elbow"), "{}", err);
        let err = GestureTemplate::try_from(record(Handedness::Left, Some(-0.5), "wrist")).unwrap_err();
        assert!(err.to_string().contains("threshold"), "{}", err);
    }

    #[test]
    fn bad_records_are_skipped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library_in(&dir);
        std::fs::write(lib.path(), r#"
[[gesture]]
name = "anyhand"
hand = "any"

[[gesture]]
name = "elbow"
hand = "left"
joints = { elbow = [0.0, 0.0, 0.0] }

[[gesture]]
name = "loose"
hand = "left"
threshold = -1.0

[[gesture]]
name = "point"
hand = "right"

[gesture.joints]
wrist = [0.0, -0.06, 0.0]
index-tip = [0.0, 0.09, 0.01]
"#).unwrap();
        assert_eq!(lib.load().unwrap(), vec![point()]);

        std::fs::write(lib.path(), "[[gesture]]\nhand = 3\n").unwrap();
        assert!(matches!(lib.load(), Err(LibraryError::Parse(..))));
    }
}
