//! The hand-tracking seam.
//!
//! [`JointProvider`] is the only thing the core asks of a tracking runtime.
//! [`HandSnapshot`] is a plain in-memory implementation, used by hosts that
//! receive whole frames at once and by the tests.

use enum_map::EnumMap;
use nalgebra::{Point3, UnitQuaternion};

use crate::joint::{Handedness, JointId, Pose3D};

/// Anything that can report the current pose of a joint.
///
/// `None` means "not tracked right now" and is routine: the hand may be out
/// of view, or a single finger occluded. Callers skip such joints.
pub trait JointProvider {
    /// Pose of `joint` on a concrete hand.
    fn joint_pose(&self, joint: JointId, hand: Handedness) -> Option<Pose3D>;

    /// Pose of `joint` on `hand`, where `Any` means whichever concrete hand
    /// reports it first (right, then left).
    fn try_get_joint_pose(&self, joint: JointId, hand: Handedness) -> Option<Pose3D> {
        match hand {
            Handedness::Any => Handedness::CONCRETE
                .iter()
                .find_map(|h| self.joint_pose(joint, *h)),
            concrete => self.joint_pose(joint, concrete),
        }
    }

    /// Concrete hand an `Any` request would read from: the first hand with a
    /// tracked palm. Concrete requests are returned unchanged.
    fn resolve_hand(&self, hand: Handedness) -> Option<Handedness> {
        match hand {
            Handedness::Any => Handedness::CONCRETE
                .iter()
                .copied()
                .find(|h| self.joint_pose(JointId::Palm, *h).is_some()),
            concrete => Some(concrete),
        }
    }
}

impl<P: JointProvider + ?Sized> JointProvider for &P {
    fn joint_pose(&self, joint: JointId, hand: Handedness) -> Option<Pose3D> {
        (**self).joint_pose(joint, hand)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandSnapshot
// ════════════════════════════════════════════════════════════════════════════

/// Joint poses for one hand, one slot per joint.
pub type JointTable = EnumMap<JointId, Option<Pose3D>>;

/// Joint poses for both hands at one instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandSnapshot {
    pub left:  JointTable,
    pub right: JointTable,
}

impl HandSnapshot {
    pub fn new() -> Self {
        HandSnapshot::default()
    }

    pub fn hand(&self, hand: Handedness) -> Option<&JointTable> {
        match hand {
            Handedness::Left  => Some(&self.left),
            Handedness::Right => Some(&self.right),
            Handedness::Any   => None,
        }
    }

    pub fn hand_mut(&mut self, hand: Handedness) -> Option<&mut JointTable> {
        match hand {
            Handedness::Left  => Some(&mut self.left),
            Handedness::Right => Some(&mut self.right),
            Handedness::Any   => None,
        }
    }

    /// Record `pose` for `joint`. Ignored for `Any`.
    pub fn set(&mut self, hand: Handedness, joint: JointId, pose: Pose3D) {
        if let Some(table) = self.hand_mut(hand) {
            table[joint] = Some(pose);
        }
    }

    /// Builder form of [`HandSnapshot::set`] for an identity-oriented joint.
    pub fn with(mut self, hand: Handedness, joint: JointId, x: f32, y: f32, z: f32) -> Self {
        self.set(hand, joint, Pose3D::at(x, y, z));
        self
    }

    /// Record every joint of `hand` from palm-local offsets under `palm`.
    ///
    /// The palm itself is recorded at `palm`. Offsets for `Palm` are ignored.
    pub fn set_hand_from_palm(
        &mut self,
        hand:    Handedness,
        palm:    Pose3D,
        offsets: impl IntoIterator<Item = (JointId, nalgebra::Vector3<f32>)>,
    ) {
        self.set(hand, JointId::Palm, palm);
        for (joint, offset) in offsets {
            if joint == JointId::Palm { continue; }
            let world: Point3<f32> = palm.position + palm.rotation.transform_vector(&offset);
            self.set(hand, joint, Pose3D::new(world, palm.rotation));
        }
    }

    /// Forget one joint (e.g. it left the camera's view).
    pub fn clear_joint(&mut self, hand: Handedness, joint: JointId) {
        if let Some(table) = self.hand_mut(hand) {
            table[joint] = None;
        }
    }

    /// Forget every joint of one hand.
    pub fn clear_hand(&mut self, hand: Handedness) {
        if let Some(table) = self.hand_mut(hand) {
            *table = JointTable::default();
        }
    }

    pub fn is_tracked(&self, hand: Handedness) -> bool {
        self.hand(hand).is_some_and(|t| t.values().any(Option::is_some))
    }

    pub fn tracked_count(&self, hand: Handedness) -> usize {
        self.hand(hand).map_or(0, |t| t.values().filter(|p| p.is_some()).count())
    }

    /// Rigidly move every tracked joint of `hand` by `rotation` about the
    /// origin, then by `translation`.
    pub fn transform_hand(
        &mut self,
        hand:        Handedness,
        rotation:    UnitQuaternion<f32>,
        translation: nalgebra::Vector3<f32>,
    ) {
        if let Some(table) = self.hand_mut(hand) {
            for pose in table.values_mut().flatten() {
                pose.position = rotation * pose.position + translation;
                pose.rotation = rotation * pose.rotation;
            }
        }
    }
}

impl JointProvider for HandSnapshot {
    fn joint_pose(&self, joint: JointId, hand: Handedness) -> Option<Pose3D> {
        self.hand(hand).and_then(|t| t[joint])
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn empty_snapshot_reports_nothing() {
        let snap = HandSnapshot::new();
        for joint in JointId::all() {
            assert!(snap.try_get_joint_pose(joint, Handedness::Left).is_none());
            assert!(snap.try_get_joint_pose(joint, Handedness::Right).is_none());
            assert!(snap.try_get_joint_pose(joint, Handedness::Any).is_none());
        }
    }

    #[test]
    fn any_prefers_right_then_left() {
        let snap = HandSnapshot::new()
            .with(Handedness::Left,  JointId::Palm, 1.0, 0.0, 0.0)
            .with(Handedness::Right, JointId::Palm, 2.0, 0.0, 0.0);
        let pose = snap.try_get_joint_pose(JointId::Palm, Handedness::Any).unwrap();
        assert_eq!(pose.position.x, 2.0);

        let left_only = HandSnapshot::new().with(Handedness::Left, JointId::Palm, 1.0, 0.0, 0.0);
        assert_eq!(left_only.resolve_hand(Handedness::Any), Some(Handedness::Left));
        assert_eq!(HandSnapshot::new().resolve_hand(Handedness::Any), None);
        assert_eq!(HandSnapshot::new().resolve_hand(Handedness::Left), Some(Handedness::Left));
    }

    #[test]
    fn set_hand_from_palm_places_offsets_in_world() {
        let palm = Pose3D::new(
            Point3::new(1.0, 1.0, 1.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f32::consts::FRAC_PI_2),
        );
        let mut snap = HandSnapshot::new();
        snap.set_hand_from_palm(Handedness::Right, palm, [(JointId::IndexTip, Vector3::new(1.0, 0.0, 0.0))]);
        let tip = snap.joint_pose(JointId::IndexTip, Handedness::Right).unwrap();
        // +X rotated 90° about Z is +Y.
        assert!((tip.position - Point3::new(1.0, 2.0, 1.0)).norm() < 1e-5);
        assert_eq!(snap.tracked_count(Handedness::Right), 2);
    }

    #[test]
    fn clearing_joints_and_hands() {
        let mut snap = HandSnapshot::new()
            .with(Handedness::Left, JointId::Palm, 0.0, 0.0, 0.0)
            .with(Handedness::Left, JointId::Wrist, 0.0, -0.05, 0.0);
        snap.clear_joint(Handedness::Left, JointId::Wrist);
        assert_eq!(snap.tracked_count(Handedness::Left), 1);
        snap.clear_hand(Handedness::Left);
        assert!(!snap.is_tracked(Handedness::Left));
    }
}
