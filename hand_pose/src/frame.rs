//! Palm-relative coordinates.
//!
//! Capture and matching both express joint positions in the local frame of
//! the palm joint, through the same [`normalize`] call, so a recorded offset
//! and a live offset are directly comparable.

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::error::{GestureError, Result};
use crate::joint::Pose3D;

/// Map `point` from reference space into the local frame described by
/// `(position, rotation, scale)`.
///
/// This is the inverse of [`forward`]: `S⁻¹ · R⁻¹ · (point − position)`.
/// A zero scale component makes the frame non-invertible and is reported as
/// [`GestureError::DegenerateTransform`].
pub fn normalize(
    position: &Point3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale:    &Vector3<f32>,
    point:    &Point3<f32>,
) -> Result<Vector3<f32>> {
    if scale.iter().any(|s| *s == 0.0) {
        return Err(GestureError::DegenerateTransform { scale: *scale });
    }
    Ok(unrotate(position, rotation, point).component_div(scale))
}

/// `R⁻¹ · (point − position)`, the rigid part of [`normalize`].
fn unrotate(position: &Point3<f32>, rotation: &UnitQuaternion<f32>, point: &Point3<f32>) -> Vector3<f32> {
    rotation.inverse_transform_vector(&(point - position))
}

/// Map a local-frame `offset` back into reference space: `position + R · (S · offset)`.
pub fn forward(
    position: &Point3<f32>,
    rotation: &UnitQuaternion<f32>,
    scale:    &Vector3<f32>,
    offset:   &Vector3<f32>,
) -> Point3<f32> {
    position + rotation.transform_vector(&offset.component_mul(scale))
}

// ════════════════════════════════════════════════════════════════════════════
// PalmFrame
// ════════════════════════════════════════════════════════════════════════════

/// The unit-scale local frame of a palm pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PalmFrame {
    pose: Pose3D,
}

impl PalmFrame {
    pub fn new(palm: Pose3D) -> Self {
        PalmFrame { pose: palm }
    }

    pub fn pose(&self) -> &Pose3D {
        &self.pose
    }

    /// Offset of `point` from the palm, in palm-local axes.
    pub fn local(&self, point: &Point3<f32>) -> Vector3<f32> {
        // Unit scale: `normalize` without the degenerate-scale check.
        unrotate(&self.pose.position, &self.pose.rotation, point)
    }

    /// Inverse of [`PalmFrame::local`].
    pub fn world(&self, offset: &Vector3<f32>) -> Point3<f32> {
        forward(&self.pose.position, &self.pose.rotation, &Vector3::repeat(1.0), offset)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const EPS: f32 = 1e-4;

    fn close(a: &Vector3<f32>, b: &Vector3<f32>) -> bool {
        (a - b).norm() < EPS
    }

    fn sample_frames() -> Vec<(Point3<f32>, UnitQuaternion<f32>, Vector3<f32>)> {
        vec![
            (Point3::origin(), UnitQuaternion::identity(), Vector3::repeat(1.0)),
            (
                Point3::new(0.3, 1.2, -0.4),
                UnitQuaternion::from_euler_angles(0.3, -1.1, 2.0),
                Vector3::repeat(1.0),
            ),
            (
                Point3::new(-2.0, 0.5, 0.25),
                UnitQuaternion::from_euler_angles(FRAC_PI_2, 0.0, 0.7),
                Vector3::new(2.0, 0.5, -1.5),
            ),
        ]
    }

    #[test]
    fn reference_position_maps_to_origin() {
        for (pos, rot, scale) in sample_frames() {
            let local = normalize(&pos, &rot, &scale, &pos).unwrap();
            assert!(close(&local, &Vector3::zeros()), "got {:?}", local);
        }
    }

    #[test]
    fn forward_inverts_normalize() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(0.01, 0.05, -0.02),
            Point3::new(-3.5, 4.0, 10.0),
        ];
        for (pos, rot, scale) in sample_frames() {
            for p in &points {
                let local = normalize(&pos, &rot, &scale, p).unwrap();
                let back  = forward(&pos, &rot, &scale, &local);
                assert!(close(&back.coords, &p.coords), "{:?} -> {:?}", p, back);
            }
        }
    }

    #[test]
    fn rotation_is_undone() {
        // Palm turned 90° about +Y: its local +X points along world −Z.
        let rot   = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let local = normalize(
            &Point3::origin(), &rot, &Vector3::repeat(1.0), &Point3::new(0.0, 0.0, -1.0),
        ).unwrap();
        assert!(close(&local, &Vector3::new(1.0, 0.0, 0.0)), "got {:?}", local);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let err = normalize(
            &Point3::origin(),
            &UnitQuaternion::identity(),
            &Vector3::new(1.0, 0.0, 1.0),
            &Point3::new(1.0, 1.0, 1.0),
        ).unwrap_err();
        assert!(matches!(err, GestureError::DegenerateTransform { .. }));
    }

    #[test]
    fn palm_frame_agrees_with_unit_scale_normalize() {
        for (pos, rot, _) in sample_frames() {
            let frame = PalmFrame::new(Pose3D::new(pos, rot));
            let p = Point3::new(0.4, -0.1, 0.9);
            let expected = normalize(&pos, &rot, &Vector3::repeat(1.0), &p).unwrap();
            assert!(close(&frame.local(&p), &expected));
            assert!(close(&frame.world(&expected).coords, &p.coords));
        }
    }
}
