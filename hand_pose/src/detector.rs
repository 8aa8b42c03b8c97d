//! [`GestureDetector`] — store, matcher and tracker behind one tick.
//!
//! The host owns one detector and calls [`GestureDetector::tick`] once per
//! fixed step. Capture also takes `&mut self`, so recording a template and
//! running a recognition pass can never overlap.

use std::fmt::Write as _;

use tracing::debug;

use crate::capture::capture;
use crate::config::{validate_threshold, CapturePolicy, DetectorConfig};
use crate::error::{GestureError, Result};
use crate::joint::{Handedness, JointId};
use crate::matcher::{full_distance, MatchResult, Matcher};
use crate::provider::JointProvider;
use crate::template::{GestureTemplate, TemplateId, TemplateStore};
use crate::tracker::{TrackerState, Transition, TransitionTracker};

#[derive(Debug)]
pub struct GestureDetector {
    config:     DetectorConfig,
    store:      TemplateStore,
    matcher:    Matcher,
    tracker:    TransitionTracker,
    last_match: MatchResult,
}

impl GestureDetector {
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(GestureDetector {
            matcher:    Matcher::new(config.recognition_threshold)?,
            config,
            store:      TemplateStore::new(),
            tracker:    TransitionTracker::new(),
            last_match: None,
        })
    }

    pub fn config(&self)     -> &DetectorConfig { &self.config }
    pub fn store(&self)      -> &TemplateStore  { &self.store }
    pub fn matcher(&self)    -> &Matcher        { &self.matcher }
    pub fn state(&self)      -> TrackerState    { self.tracker.state() }
    pub fn last_match(&self) -> MatchResult     { self.last_match }

    pub fn template(&self, id: TemplateId) -> Result<&GestureTemplate> {
        self.store.get(id).ok_or(GestureError::UnknownTemplate(id))
    }

    // ── authoring ─────────────────────────────────────────────────────────

    /// Record the live pose of `hand` as a new template named "New Gesture".
    ///
    /// `Any` reads whichever hand has a tracked palm. With no palm at all the
    /// configured [`CapturePolicy`] decides between storing an empty template
    /// (on the right hand) and failing.
    pub fn capture_gesture<P>(&mut self, provider: &P, hand: Handedness) -> Result<TemplateId>
    where
        P: JointProvider + ?Sized,
    {
        let template = self.capture_resolved(provider, hand)?;
        Ok(self.store.push(template))
    }

    /// [`capture_gesture`](Self::capture_gesture) with a caller-chosen name.
    pub fn capture_named<P>(&mut self, provider: &P, hand: Handedness, name: &str) -> Result<TemplateId>
    where
        P: JointProvider + ?Sized,
    {
        let template = self.capture_resolved(provider, hand)?.with_name(name);
        Ok(self.store.push(template))
    }

    /// Capture from the configured default hand.
    pub fn capture_default<P>(&mut self, provider: &P) -> Result<TemplateId>
    where
        P: JointProvider + ?Sized,
    {
        self.capture_gesture(provider, self.config.default_handedness)
    }

    /// Append an already-built template, e.g. one loaded from disk.
    pub fn add_template(&mut self, template: GestureTemplate) -> Result<TemplateId> {
        if !template.handedness.is_concrete() {
            return Err(GestureError::UnresolvedHandedness);
        }
        if let Some(t) = template.threshold() {
            validate_threshold(t)?;
        }
        Ok(self.store.push(template))
    }

    fn capture_resolved<P>(&self, provider: &P, hand: Handedness) -> Result<GestureTemplate>
    where
        P: JointProvider + ?Sized,
    {
        let policy = self.config.capture_policy;
        let resolved = match provider.resolve_hand(hand) {
            Some(h) => h,
            None if policy == CapturePolicy::RequirePalm => {
                return Err(GestureError::ReferenceUnavailable { hand });
            }
            None => Handedness::Right,
        };
        capture(provider, resolved, policy)
    }

    /// Remove every template. A held template is derecognised first; the
    /// returned transition carries that event.
    pub fn clear_templates(&mut self) -> Transition {
        let released = self.tracker.reset();
        self.last_match = None;
        self.store.clear();
        released
    }

    // ── recognition ───────────────────────────────────────────────────────

    /// One recognition step: match the live pose, then advance the tracker.
    pub fn tick<P>(&mut self, provider: &P) -> Transition
    where
        P: JointProvider + ?Sized,
    {
        let current = self.matcher.recognize_current(&self.store, provider);
        self.last_match = current;
        let transition = self.tracker.advance(&current);
        if !transition.is_empty() {
            debug!(?transition, distance = current.map(|m| m.distance), "recognition changed");
        }
        transition
    }

    /// Raw distance of the live pose to every template, in store order.
    /// `None` where that template's hand has no tracked palm.
    pub fn distances<P>(&self, provider: &P) -> Vec<(TemplateId, Option<f32>)>
    where
        P: JointProvider + ?Sized,
    {
        self.store
            .iter()
            .map(|(id, t)| (id, full_distance(t, provider)))
            .collect()
    }
}

/// One line per tracked joint of each hand: `hand joint (x, y, z)`.
pub fn describe_pose<P>(provider: &P) -> String
where
    P: JointProvider + ?Sized,
{
    let mut out = String::new();
    for joint in JointId::all() {
        for hand in [Handedness::Right, Handedness::Left] {
            if let Some(pose) = provider.try_get_joint_pose(joint, hand) {
                let p = pose.position;
                let _ = writeln!(out, "{:<5} {:<18} ({:.3}, {:.3}, {:.3})", hand.name(), joint.name(), p.x, p.y, p.z);
            }
        }
    }
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
