//! Joint identifiers, handedness and per-joint poses.

use enum_map::Enum;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

// ════════════════════════════════════════════════════════════════════════════
// JointId
// ════════════════════════════════════════════════════════════════════════════

/// One tracked joint of a hand skeleton.
///
/// Declaration order is the canonical order: capture and matching both walk
/// the joints through [`JointId::all`], so the early-exit point of a distance
/// sum is reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Enum, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JointId {
    Palm,
    Wrist,
    ThumbMetacarpal,
    ThumbProximal,
    ThumbDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexKnuckle,
    IndexMiddle,
    IndexDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddleKnuckle,
    MiddleMiddle,
    MiddleDistal,
    MiddleTip,
    RingMetacarpal,
    RingKnuckle,
    RingMiddle,
    RingDistal,
    RingTip,
    PinkyMetacarpal,
    PinkyKnuckle,
    PinkyMiddle,
    PinkyDistal,
    PinkyTip,
}

/// Number of joints per hand.
pub const JOINT_COUNT: usize = 26;

impl JointId {
    /// Every joint, in canonical order.
    pub fn all() -> JointIdIter {
        JointId::iter()
    }

    /// Position of this joint in the canonical order (0–25).
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Kebab-case name, as used in template files and pose dumps.
    pub fn name(self) -> &'static str {
        match self {
            JointId::Palm             => "palm",
            JointId::Wrist            => "wrist",
            JointId::ThumbMetacarpal  => "thumb-metacarpal",
            JointId::ThumbProximal    => "thumb-proximal",
            JointId::ThumbDistal      => "thumb-distal",
            JointId::ThumbTip         => "thumb-tip",
            JointId::IndexMetacarpal  => "index-metacarpal",
            JointId::IndexKnuckle     => "index-knuckle",
            JointId::IndexMiddle      => "index-middle",
            JointId::IndexDistal      => "index-distal",
            JointId::IndexTip         => "index-tip",
            JointId::MiddleMetacarpal => "middle-metacarpal",
            JointId::MiddleKnuckle    => "middle-knuckle",
            JointId::MiddleMiddle     => "middle-middle",
            JointId::MiddleDistal     => "middle-distal",
            JointId::MiddleTip        => "middle-tip",
            JointId::RingMetacarpal   => "ring-metacarpal",
            JointId::RingKnuckle      => "ring-knuckle",
            JointId::RingMiddle       => "ring-middle",
            JointId::RingDistal       => "ring-distal",
            JointId::RingTip          => "ring-tip",
            JointId::PinkyMetacarpal  => "pinky-metacarpal",
            JointId::PinkyKnuckle     => "pinky-knuckle",
            JointId::PinkyMiddle      => "pinky-middle",
            JointId::PinkyDistal      => "pinky-distal",
            JointId::PinkyTip         => "pinky-tip",
        }
    }

    /// Inverse of [`JointId::name`].
    pub fn from_name(name: &str) -> Option<JointId> {
        JointId::all().find(|j| j.name() == name)
    }

    /// The five fingertips, thumb first.
    pub fn fingertips() -> [JointId; 5] {
        [
            JointId::ThumbTip,
            JointId::IndexTip,
            JointId::MiddleTip,
            JointId::RingTip,
            JointId::PinkyTip,
        ]
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness
// ════════════════════════════════════════════════════════════════════════════

/// Which hand a pose or template refers to.
///
/// `Any` is only ever a request ("whichever hand is tracked"); templates are
/// always recorded against `Left` or `Right`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Any,
}

impl Handedness {
    /// Both concrete hands, in the order `Any` requests probe them.
    pub const CONCRETE: [Handedness; 2] = [Handedness::Right, Handedness::Left];

    pub fn is_concrete(self) -> bool {
        self != Handedness::Any
    }

    pub fn name(self) -> &'static str {
        match self {
            Handedness::Left  => "left",
            Handedness::Right => "right",
            Handedness::Any   => "any",
        }
    }
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pose3D
// ════════════════════════════════════════════════════════════════════════════

/// Position and orientation of one joint in the tracker's reference space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose3D {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl Pose3D {
    pub fn new(position: Point3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Pose3D { position, rotation }
    }

    /// A pose at `position` with identity orientation.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Pose3D {
            position: Point3::new(x, y, z),
            rotation: UnitQuaternion::identity(),
        }
    }

    pub fn position_vector(&self) -> Vector3<f32> {
        self.position.coords
    }
}

impl Default for Pose3D {
    fn default() -> Self {
        Pose3D::at(0.0, 0.0, 0.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
