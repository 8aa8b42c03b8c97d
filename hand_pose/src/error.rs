//! Error type shared by the capture, matching and configuration paths.

use nalgebra::Vector3;
use thiserror::Error;

use crate::joint::Handedness;
use crate::template::TemplateId;

/// Failures surfaced by `hand_pose`.
///
/// Missing live joints and "no template matched" are not errors; they are
/// routine outcomes and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    /// The reference frame has a zero scale component and cannot be inverted.
    #[error("reference transform is not invertible (scale = {scale:?})")]
    DegenerateTransform { scale: Vector3<f32> },

    /// Capture under [`CapturePolicy::RequirePalm`](crate::CapturePolicy)
    /// found no palm joint for the requested hand.
    #[error("palm joint unavailable for {hand} hand")]
    ReferenceUnavailable { hand: Handedness },

    /// A concrete hand was required but `Any` was passed.
    #[error("handedness must be left or right")]
    UnresolvedHandedness,

    #[error("recognition threshold must be a positive finite number, got {0}")]
    InvalidThreshold(f32),

    #[error("no template with id {0}")]
    UnknownTemplate(TemplateId),
}

pub type Result<T> = std::result::Result<T, GestureError>;
