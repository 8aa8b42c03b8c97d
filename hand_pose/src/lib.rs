//! # hand_pose
//!
//! Recognises user-recorded static hand poses from per-joint 3D tracking
//! data, and reports when the live hand starts or stops matching one.
//!
//! ## Pipeline
//!
//! | Stage | Module | Does |
//! |---|---|---|
//! | Capture | [`capture`] | snapshot one hand, every joint relative to its palm |
//! | Store | [`template`] | ordered, append-only list of templates |
//! | Match | [`matcher`] | summed joint distance; nearest template under threshold |
//! | Track | [`tracker`] | `Idle` / `Holding(id)`; fires on change only |
//!
//! [`GestureDetector`] bundles the four behind `capture_*` and `tick`.
//! Tracking data comes in through the [`JointProvider`] trait.
//!
//! ## Quick start
//!
//! ```rust
//! use hand_pose::{DetectorConfig, GestureDetector, HandSnapshot, Handedness, JointId};
//!
//! let pose = HandSnapshot::new()
//!     .with(Handedness::Right, JointId::Palm,     0.0, 0.0,  0.0)
//!     .with(Handedness::Right, JointId::IndexTip, 0.0, 0.09, 0.0);
//!
//! let mut detector = GestureDetector::new(DetectorConfig::default()).unwrap();
//! let point = detector.capture_named(&pose, Handedness::Right, "point").unwrap();
//!
//! let live = HandSnapshot::new()
//!     .with(Handedness::Right, JointId::Palm,     0.0, 0.0,  0.0)
//!     .with(Handedness::Right, JointId::IndexTip, 0.0, 0.08, 0.0);
//!
//! let fired = detector.tick(&live);
//! assert_eq!(fired.recognised, Some(point));
//! assert!(detector.tick(&live).is_empty());
//! ```

pub mod capture;
pub mod config;
pub mod detector;
pub mod error;
pub mod frame;
pub mod joint;
pub mod listener;
pub mod matcher;
pub mod provider;
pub mod template;
pub mod tracker;

pub use capture::capture;
pub use config::{CapturePolicy, DetectorConfig, DEFAULT_RECOGNITION_THRESHOLD};
pub use detector::{describe_pose, GestureDetector};
pub use error::{GestureError, Result};
pub use frame::{forward, normalize, PalmFrame};
pub use joint::{Handedness, JointId, Pose3D, JOINT_COUNT};
pub use listener::ListenerRegistry;
pub use matcher::{full_distance, GestureMatch, MatchResult, Matcher};
pub use provider::{HandSnapshot, JointProvider, JointTable};
pub use template::{GestureTemplate, OffsetTable, TemplateId, TemplateStore, DEFAULT_TEMPLATE_NAME};
pub use tracker::{TrackerState, Transition, TransitionEvent, TransitionTracker};
