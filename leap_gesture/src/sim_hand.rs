//! A synthetic hand skeleton for simulation mode.
//!
//! Each [`PosePreset`] is a set of per-finger curl amounts; [`SimHand`]
//! turns the curls into 26 palm-local joint positions, then places them in
//! the world under its palm transform. A small random tremor keeps the live
//! pose from ever being bit-identical to a capture of itself, the way real
//! tracking data never is.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use rand::Rng;

use hand_pose::{HandSnapshot, Handedness, JointId, Pose3D};

// ════════════════════════════════════════════════════════════════════════════
// PosePreset
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PosePreset {
    Open,
    Fist,
    Point,
    Victory,
    ThumbsUp,
}

impl PosePreset {
    pub const ALL: [PosePreset; 5] = [
        PosePreset::Open,
        PosePreset::Fist,
        PosePreset::Point,
        PosePreset::Victory,
        PosePreset::ThumbsUp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PosePreset::Open     => "open",
            PosePreset::Fist     => "fist",
            PosePreset::Point    => "point",
            PosePreset::Victory  => "victory",
            PosePreset::ThumbsUp => "thumbs-up",
        }
    }

    /// Curl per finger, thumb first. 0 = straight.
    fn curls(self) -> [f32; 5] {
        const C: f32 = 1.3;
        match self {
            PosePreset::Open     => [0.0, 0.0, 0.0, 0.0, 0.0],
            PosePreset::Fist     => [1.0, C,   C,   C,   C  ],
            PosePreset::Point    => [1.0, 0.0, C,   C,   C  ],
            PosePreset::Victory  => [1.0, 0.0, 0.0, C,   C  ],
            PosePreset::ThumbsUp => [0.0, C,   C,   C,   C  ],
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Skeleton geometry (right hand, metres, palm-local: +Y fingers, +X thumb
// side, +Z palm normal)
// ════════════════════════════════════════════════════════════════════════════

struct Finger {
    joints:  [JointId; 5],
    base_x:  f32,
    lengths: [f32; 3],
}

const FINGERS: [Finger; 4] = [
    Finger {
        joints:  [JointId::IndexMetacarpal, JointId::IndexKnuckle, JointId::IndexMiddle,
                  JointId::IndexDistal, JointId::IndexTip],
        base_x:  0.022,
        lengths: [0.040, 0.024, 0.020],
    },
    Finger {
        joints:  [JointId::MiddleMetacarpal, JointId::MiddleKnuckle, JointId::MiddleMiddle,
                  JointId::MiddleDistal, JointId::MiddleTip],
        base_x:  0.002,
        lengths: [0.045, 0.028, 0.022],
    },
    Finger {
        joints:  [JointId::RingMetacarpal, JointId::RingKnuckle, JointId::RingMiddle,
                  JointId::RingDistal, JointId::RingTip],
        base_x:  -0.018,
        lengths: [0.042, 0.026, 0.021],
    },
    Finger {
        joints:  [JointId::PinkyMetacarpal, JointId::PinkyKnuckle, JointId::PinkyMiddle,
                  JointId::PinkyDistal, JointId::PinkyTip],
        base_x:  -0.036,
        lengths: [0.032, 0.020, 0.018],
    },
];

const THUMB: [JointId; 4] = [
    JointId::ThumbMetacarpal,
    JointId::ThumbProximal,
    JointId::ThumbDistal,
    JointId::ThumbTip,
];
const THUMB_LENGTHS: [f32; 3] = [0.035, 0.030, 0.025];
const THUMB_SPREAD:  f32 = 0.9;

/// Unit direction `phi` from +Y toward +X, tilted `psi` toward +Z.
fn direction(phi: f32, psi: f32) -> Vector3<f32> {
    Vector3::new(phi.sin() * psi.cos(), phi.cos() * psi.cos(), psi.sin())
}

/// Palm-local joint offsets for a right hand in `preset`.
pub fn right_hand_offsets(preset: PosePreset) -> Vec<(JointId, Vector3<f32>)> {
    let curls = preset.curls();
    let mut out = Vec::with_capacity(hand_pose::JOINT_COUNT - 1);

    out.push((JointId::Wrist, Vector3::new(0.0, -0.06, 0.0)));

    // Thumb: fans out from the palm edge and folds across it when curled.
    let mut p = Vector3::new(0.02, -0.035, 0.005);
    out.push((THUMB[0], p));
    for (k, len) in THUMB_LENGTHS.iter().enumerate() {
        let bend = curls[0] * (k + 1) as f32;
        p += direction(THUMB_SPREAD - 0.7 * bend, 0.5 * bend) * *len;
        out.push((THUMB[k + 1], p));
    }

    // Fingers: straight along +Y, each joint bending further toward the palm.
    for (finger, curl) in FINGERS.iter().zip(&curls[1..]) {
        out.push((finger.joints[0], Vector3::new(finger.base_x * 0.5, -0.035, 0.0)));
        let mut p = Vector3::new(finger.base_x, 0.04 - finger.base_x.abs() * 0.3, 0.0);
        out.push((finger.joints[1], p));
        for (k, len) in finger.lengths.iter().enumerate() {
            p += direction(0.0, curl * (k + 1) as f32) * *len;
            out.push((finger.joints[k + 2], p));
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// SimHand
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct SimHand {
    pub side:         Handedness,
    pub preset:       PosePreset,
    pub position:     Point3<f32>,
    /// Roll, pitch, yaw in radians.
    pub angles:       [f32; 3],
    /// Whole hand in view.
    pub visible:      bool,
    /// Palm joint reported; off simulates a lost reference joint.
    pub palm_visible: bool,
    /// Peak per-axis jitter per joint, metres.
    pub tremor:       f32,
}

impl SimHand {
    pub fn new(side: Handedness, position: Point3<f32>, tremor: f32) -> Self {
        SimHand {
            side,
            preset: PosePreset::Open,
            position,
            angles: [0.0; 3],
            visible: true,
            palm_visible: true,
            tremor,
        }
    }

    pub fn rotation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_euler_angles(self.angles[0], self.angles[1], self.angles[2])
    }

    pub fn palm_pose(&self) -> Pose3D {
        Pose3D::new(self.position, self.rotation())
    }

    /// Palm-local offsets, mirrored across X for the left hand.
    pub fn local_offsets(&self) -> Vec<(JointId, Vector3<f32>)> {
        let mut offsets = right_hand_offsets(self.preset);
        if self.side == Handedness::Left {
            for (_, o) in offsets.iter_mut() {
                o.x = -o.x;
            }
        }
        offsets
    }

    /// Write this hand's joints into `snap`, replacing whatever it held.
    pub fn write_into<R: Rng + ?Sized>(&self, snap: &mut HandSnapshot, rng: &mut R) {
        snap.clear_hand(self.side);
        if !self.visible {
            return;
        }
        let jitter = |rng: &mut R| -> Vector3<f32> {
            if self.tremor <= 0.0 {
                return Vector3::zeros();
            }
            Vector3::new(
                rng.gen_range(-self.tremor..self.tremor),
                rng.gen_range(-self.tremor..self.tremor),
                rng.gen_range(-self.tremor..self.tremor),
            )
        };
        let offsets: Vec<_> = self
            .local_offsets()
            .into_iter()
            .map(|(j, o)| (j, o + jitter(rng)))
            .collect();
        snap.set_hand_from_palm(self.side, self.palm_pose(), offsets);
        if !self.palm_visible {
            snap.clear_joint(self.side, JointId::Palm);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use hand_pose::{full_distance, GestureTemplate, JointProvider};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snapshot(hand: &SimHand, seed: u64) -> HandSnapshot {
        let mut snap = HandSnapshot::new();
        hand.write_into(&mut snap, &mut StdRng::seed_from_u64(seed));
        snap
    }

    fn template_of(preset: PosePreset) -> GestureTemplate {
        GestureTemplate::from_offsets(preset.name(), Handedness::Right, right_hand_offsets(preset))
    }

    #[test]
    fn every_joint_is_generated_once() {
        for preset in PosePreset::ALL {
            let mut joints: Vec<_> = right_hand_offsets(preset).into_iter().map(|(j, _)| j).collect();
            joints.sort();
            joints.dedup();
            assert_eq!(joints.len(), hand_pose::JOINT_COUNT - 1, "{:?}", preset);
            assert!(!joints.contains(&JointId::Palm));
        }
    }

    #[test]
    fn presets_are_far_apart() {
        let mut open = SimHand::new(Handedness::Right, Point3::origin(), 0.0);
        open.preset = PosePreset::Open;
        let snap = snapshot(&open, 1);
        let d = full_distance(&template_of(PosePreset::Fist), &snap).unwrap();
        assert!(d > 0.25, "open vs fist only {}", d);
    }

    #[test]
    fn tremor_stays_inside_default_threshold() {
        let mut hand = SimHand::new(Handedness::Right, Point3::new(0.1, 1.2, 0.4), 0.001);
        hand.preset = PosePreset::Point;
        hand.angles = [0.3, -0.2, 0.5];
        for seed in 0..20 {
            let d = full_distance(&template_of(PosePreset::Point), &snapshot(&hand, seed)).unwrap();
            assert!(d > 0.0 && d < 0.25, "seed {}: {}", seed, d);
        }
    }

    #[test]
    fn hidden_hand_and_palm() {
        let mut hand = SimHand::new(Handedness::Left, Point3::origin(), 0.0);
        hand.palm_visible = false;
        let snap = snapshot(&hand, 0);
        assert!(snap.joint_pose(JointId::Palm, Handedness::Left).is_none());
        assert!(snap.joint_pose(JointId::IndexTip, Handedness::Left).is_some());

        hand.visible = false;
        assert!(!snapshot(&hand, 0).is_tracked(Handedness::Left));
    }

    #[test]
    fn left_hand_is_mirrored() {
        let right = SimHand::new(Handedness::Right, Point3::origin(), 0.0);
        let left  = SimHand::new(Handedness::Left,  Point3::origin(), 0.0);
        let r = snapshot(&right, 0).joint_pose(JointId::ThumbTip, Handedness::Right).unwrap();
        let l = snapshot(&left, 0).joint_pose(JointId::ThumbTip, Handedness::Left).unwrap();
        assert!(r.position.x > 0.0);
        assert!((l.position.x + r.position.x).abs() < 1e-6);
    }
}
