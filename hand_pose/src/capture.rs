//! Recording a live hand pose as a [`GestureTemplate`].

use tracing::{debug, warn};

use crate::config::CapturePolicy;
use crate::error::{GestureError, Result};
use crate::frame::PalmFrame;
use crate::joint::{Handedness, JointId};
use crate::provider::JointProvider;
use crate::template::{GestureTemplate, OffsetTable, DEFAULT_TEMPLATE_NAME};

/// Snapshot every tracked joint of `hand`, relative to that hand's palm.
///
/// `hand` must be concrete. When the palm is not tracked the outcome depends
/// on `policy`: an empty template (which can never match) or
/// [`GestureError::ReferenceUnavailable`]. Untracked non-palm joints are
/// simply left out of the template.
pub fn capture<P>(provider: &P, hand: Handedness, policy: CapturePolicy) -> Result<GestureTemplate>
where
    P: JointProvider + ?Sized,
{
    if !hand.is_concrete() {
        return Err(GestureError::UnresolvedHandedness);
    }

    let mut offsets = OffsetTable::default();

    let Some(palm) = provider.try_get_joint_pose(JointId::Palm, hand) else {
        return match policy {
            CapturePolicy::LegacyEmpty => {
                warn!(hand = %hand, "palm not tracked; captured template has no joints");
                Ok(GestureTemplate::new(DEFAULT_TEMPLATE_NAME, hand, offsets))
            }
            CapturePolicy::RequirePalm => Err(GestureError::ReferenceUnavailable { hand }),
        };
    };

    let frame = PalmFrame::new(palm);
    for joint in JointId::all() {
        if let Some(pose) = provider.try_get_joint_pose(joint, hand) {
            offsets[joint] = Some(frame.local(&pose.position));
        }
    }

    let template = GestureTemplate::new(DEFAULT_TEMPLATE_NAME, hand, offsets);
    debug!(hand = %hand, joints = template.joint_count(), "captured hand pose");
    Ok(template)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
