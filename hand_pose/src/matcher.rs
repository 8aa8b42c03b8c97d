//! Nearest-template matching.
//!
//! The distance between a live hand and a template is the sum, over joints
//! tracked in both, of the Euclidean distance between palm-local positions.
//! The nearest template within the recognition threshold wins.

use tracing::trace;

use crate::config::validate_threshold;
use crate::error::Result;
use crate::frame::PalmFrame;
use crate::joint::JointId;
use crate::provider::JointProvider;
use crate::template::{GestureTemplate, TemplateId, TemplateStore};

/// The template recognised in one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureMatch {
    pub template: TemplateId,
    pub distance: f32,
}

/// `None` is "no template within threshold".
pub type MatchResult = Option<GestureMatch>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matcher {
    threshold: f32,
}

impl Matcher {
    pub fn new(threshold: f32) -> Result<Self> {
        validate_threshold(threshold)?;
        Ok(Matcher { threshold })
    }

    /// The detector-wide threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Threshold that applies to `template`: its own override, if any.
    pub fn threshold_for(&self, template: &GestureTemplate) -> f32 {
        template.threshold().unwrap_or(self.threshold)
    }

    /// Distance from the live hand to `template`, or `f32::INFINITY` when the
    /// template cannot match.
    ///
    /// Infinity is returned when the palm is untracked, as soon as the running
    /// sum passes the threshold, and when no joint contributed at all (a sum
    /// of exactly zero).
    pub fn distance_to<P>(&self, template: &GestureTemplate, provider: &P) -> f32
    where
        P: JointProvider + ?Sized,
    {
        let threshold = self.threshold_for(template);
        let hand = template.handedness;

        let Some(palm) = provider.try_get_joint_pose(JointId::Palm, hand) else {
            return f32::INFINITY;
        };
        let frame = PalmFrame::new(palm);

        let mut sum = 0.0f32;
        for joint in JointId::all() {
            let Some(live) = provider.try_get_joint_pose(joint, hand) else { continue };
            let Some(recorded) = template.offset(joint) else { continue };

            sum += (frame.local(&live.position) - recorded).norm();
            if sum > threshold {
                trace!(name = %template.name, joint = joint.name(), sum, "distance over threshold");
                return f32::INFINITY;
            }
        }

        if sum == 0.0 { f32::INFINITY } else { sum }
    }

    /// Best template in `store` for the live pose; earliest wins on ties.
    pub fn recognize_current<P>(&self, store: &TemplateStore, provider: &P) -> MatchResult
    where
        P: JointProvider + ?Sized,
    {
        let mut best: MatchResult = None;
        let mut best_distance = f32::INFINITY;

        for (id, template) in store.iter() {
            let distance = self.distance_to(template, provider);
            if distance > self.threshold_for(template) {
                continue;
            }
            if distance < best_distance {
                best_distance = distance;
                best = Some(GestureMatch { template: id, distance });
            }
        }
        best
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Matcher { threshold: crate::config::DEFAULT_RECOGNITION_THRESHOLD }
    }
}

/// Full joint-distance sum with no threshold and no zero guard.
///
/// `None` when the palm is untracked. Intended for diagnostics (showing how
/// far a pose is from every template), not for recognition.
pub fn full_distance<P>(template: &GestureTemplate, provider: &P) -> Option<f32>
where
    P: JointProvider + ?Sized,
{
    let palm = provider.try_get_joint_pose(JointId::Palm, template.handedness)?;
    let frame = PalmFrame::new(palm);
    let sum = template
        .offsets()
        .filter_map(|(joint, recorded)| {
            provider
                .try_get_joint_pose(joint, template.handedness)
                .map(|live| (frame.local(&live.position) - recorded).norm())
        })
        .sum();
    Some(sum)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{Handedness, Pose3D};
    use crate::provider::HandSnapshot;
    use crate::template::OffsetTable;
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    const R: Handedness = Handedness::Right;

    fn template(offsets: &[(JointId, [f32; 3])]) -> GestureTemplate {
        GestureTemplate::from_offsets(
            "t",
            R,
            offsets.iter().map(|(j, o)| (*j, Vector3::from(*o))),
        )
    }

    fn live(offsets: &[(JointId, [f32; 3])]) -> HandSnapshot {
        let mut snap = HandSnapshot::new();
        snap.set_hand_from_palm(
            R,
            Pose3D::default(),
            offsets.iter().map(|(j, o)| (*j, Vector3::from(*o))),
        );
        snap
    }

    #[test]
    fn sums_euclidean_distances() {
        let t = template(&[(JointId::Wrist, [0.0, 0.0, 0.0]), (JointId::IndexTip, [0.0, 0.05, 0.0])]);
        let snap = live(&[(JointId::Wrist, [0.03, 0.0, 0.04]), (JointId::IndexTip, [0.0, 0.04, 0.0])]);
        let d = Matcher::default().distance_to(&t, &snap);
        assert!((d - 0.06).abs() < 1e-5, "d = {}", d);
    }

    #[test]
    fn distance_is_rotation_invariant() {
        let t = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0]), (JointId::ThumbTip, [0.04, 0.01, 0.0])]);
        let mut snap = live(&[(JointId::IndexTip, [0.0, 0.06, 0.0]), (JointId::ThumbTip, [0.04, 0.01, 0.0])]);
        let before = Matcher::default().distance_to(&t, &snap);
        snap.transform_hand(
            R,
            UnitQuaternion::from_euler_angles(0.4, 1.2, -0.3),
            Vector3::new(0.5, 1.0, -2.0),
        );
        let after = Matcher::default().distance_to(&t, &snap);
        assert!((before - after).abs() < 1e-5, "{} vs {}", before, after);
    }

    #[test]
    fn untracked_palm_is_infinite() {
        let t = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]);
        let mut snap = live(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]);
        snap.clear_joint(R, JointId::Palm);
        assert_eq!(Matcher::default().distance_to(&t, &snap), f32::INFINITY);
    }

    #[test]
    fn missing_joints_are_not_penalised() {
        let t = template(&[(JointId::Wrist, [0.0, -0.05, 0.0]), (JointId::IndexTip, [0.0, 0.05, 0.0])]);
        // Live hand lacks the wrist, and reports a thumb the template never saw.
        let snap = live(&[(JointId::IndexTip, [0.0, 0.06, 0.0]), (JointId::ThumbTip, [0.5, 0.5, 0.5])]);
        let d = Matcher::default().distance_to(&t, &snap);
        assert!((d - 0.01).abs() < 1e-5, "d = {}", d);
    }

    #[test]
    fn exact_match_is_rejected_as_zero_sum() {
        let t = template(&[(JointId::Wrist, [0.0, -0.05, 0.0]), (JointId::IndexTip, [0.0, 0.05, 0.0])]);
        let snap = live(&[(JointId::Wrist, [0.0, -0.05, 0.0]), (JointId::IndexTip, [0.0, 0.05, 0.0])]);
        assert_eq!(full_distance(&t, &snap), Some(0.0));
        assert_eq!(Matcher::default().distance_to(&t, &snap), f32::INFINITY);
        assert_eq!(Matcher::default().recognize_current(&[t].into_iter().collect(), &snap), None);
    }

    #[test]
    fn empty_template_never_matches() {
        let t = GestureTemplate::new("empty", R, OffsetTable::default());
        let snap = live(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]);
        assert_eq!(Matcher::default().distance_to(&t, &snap), f32::INFINITY);
    }

    #[test]
    fn early_exit_agrees_with_post_hoc_comparison() {
        let m = Matcher::new(0.1).unwrap();
        let t = template(&[
            (JointId::Wrist,     [0.0, -0.05, 0.0]),
            (JointId::ThumbTip,  [0.04, 0.02, 0.0]),
            (JointId::IndexTip,  [0.0, 0.05, 0.0]),
            (JointId::PinkyTip,  [-0.03, 0.04, 0.0]),
        ]);
        // Each live joint is displaced by `step`; sweep across the threshold.
        for i in 0..40 {
            let step = i as f32 * 0.002;
            let snap = live(&[
                (JointId::Wrist,    [step, -0.05, 0.0]),
                (JointId::ThumbTip, [0.04 + step, 0.02, 0.0]),
                (JointId::IndexTip, [step, 0.05, 0.0]),
                (JointId::PinkyTip, [-0.03 + step, 0.04, 0.0]),
            ]);
            let full = full_distance(&t, &snap).unwrap();
            let expected = if full > m.threshold() || full == 0.0 { f32::INFINITY } else { full };
            let got = m.distance_to(&t, &snap);
            if expected.is_infinite() {
                assert_eq!(got, f32::INFINITY, "step {}", step);
            } else {
                assert!((got - expected).abs() < 1e-5, "step {}: {} vs {}", step, got, expected);
            }
        }
    }

    #[test]
    fn nearest_template_wins() {
        let near = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]).with_name("near");
        let far  = template(&[(JointId::IndexTip, [0.0, 0.15, 0.0])]).with_name("far");
        let store: TemplateStore = [far, near].into_iter().collect();
        let snap = live(&[(JointId::IndexTip, [0.0, 0.06, 0.0])]);
        let m = Matcher::default().recognize_current(&store, &snap).unwrap();
        assert_eq!(store.get(m.template).unwrap().name, "near");
        assert!((m.distance - 0.01).abs() < 1e-5);
    }

    #[test]
    fn ties_go_to_the_first_template() {
        let a = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]).with_name("a");
        let b = a.clone().with_name("b");
        let store: TemplateStore = [a, b].into_iter().collect();
        let first = store.iter().next().unwrap().0;
        let snap = live(&[(JointId::IndexTip, [0.0, 0.07, 0.0])]);
        for _ in 0..10 {
            let m = Matcher::default().recognize_current(&store, &snap).unwrap();
            assert_eq!(m.template, first);
        }
    }

    #[test]
    fn templates_are_matched_against_their_own_hand() {
        let left = GestureTemplate::from_offsets("l", Handedness::Left, [(JointId::IndexTip, Vector3::new(0.0, 0.05, 0.0))]);
        let store: TemplateStore = [left].into_iter().collect();
        // Only the right hand is in view.
        let snap = live(&[(JointId::IndexTip, [0.0, 0.06, 0.0])]);
        assert_eq!(Matcher::default().recognize_current(&store, &snap), None);
    }

    #[test]
    fn per_template_threshold_overrides_global() {
        let loose = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]).with_threshold(1.0);
        let strict = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]);
        let snap = live(&[(JointId::IndexTip, [0.0, 0.45, 0.0])]);
        let m = Matcher::default();
        assert_eq!(m.distance_to(&strict, &snap), f32::INFINITY);
        assert!((m.distance_to(&loose, &snap) - 0.4).abs() < 1e-5);
    }

    #[test]
    fn palm_translation_does_not_matter() {
        let t = template(&[(JointId::IndexTip, [0.0, 0.05, 0.0])]);
        let mut snap = HandSnapshot::new();
        snap.set_hand_from_palm(
            R,
            Pose3D::new(Point3::new(3.0, -1.0, 7.0), UnitQuaternion::identity()),
            [(JointId::IndexTip, Vector3::new(0.0, 0.06, 0.0))],
        );
        let d = Matcher::default().distance_to(&t, &snap);
        assert!((d - 0.01).abs() < 1e-5, "d = {}", d);
    }

    #[test]
    fn invalid_threshold_is_refused() {
        assert!(Matcher::new(0.0).is_err());
        assert!(Matcher::new(-1.0).is_err());
        assert!(Matcher::new(0.25).is_ok());
    }
}
