//! Gesture templates and the store that holds them.

use enum_map::EnumMap;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::joint::{Handedness, JointId};

/// Palm-local offset per joint; `None` for joints not seen at capture time.
pub type OffsetTable = EnumMap<JointId, Option<Vector3<f32>>>;

/// Placeholder label given to freshly captured templates.
pub const DEFAULT_TEMPLATE_NAME: &str = "New Gesture";

// ════════════════════════════════════════════════════════════════════════════
// TemplateId
// ════════════════════════════════════════════════════════════════════════════

/// Identity of one stored template.
///
/// Two templates with identical offsets are still different gestures; the
/// recognition state machine compares ids, never offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(u32);

impl TemplateId {
    pub fn raw(self) -> u32 { self.0 }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureTemplate
// ════════════════════════════════════════════════════════════════════════════

/// One recorded static hand pose.
#[derive(Clone, Debug, PartialEq)]
pub struct GestureTemplate {
    pub name:       String,
    /// Always `Left` or `Right`.
    pub handedness: Handedness,
    offsets:        OffsetTable,
    /// Overrides the detector-wide recognition threshold for this template.
    threshold:      Option<f32>,
}

impl GestureTemplate {
    pub fn new(name: impl Into<String>, handedness: Handedness, offsets: OffsetTable) -> Self {
        GestureTemplate {
            name: name.into(),
            handedness,
            offsets,
            threshold: None,
        }
    }

    /// Build from `(joint, offset)` pairs. Later pairs win on duplicates.
    pub fn from_offsets(
        name:       impl Into<String>,
        handedness: Handedness,
        offsets:    impl IntoIterator<Item = (JointId, Vector3<f32>)>,
    ) -> Self {
        let mut table = OffsetTable::default();
        for (joint, offset) in offsets {
            table[joint] = Some(offset);
        }
        GestureTemplate::new(name, handedness, table)
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn offset(&self, joint: JointId) -> Option<&Vector3<f32>> {
        self.offsets[joint].as_ref()
    }

    /// Recorded `(joint, offset)` pairs in canonical joint order.
    pub fn offsets(&self) -> impl Iterator<Item = (JointId, &Vector3<f32>)> + '_ {
        self.offsets.iter().filter_map(|(j, o)| o.as_ref().map(|o| (j, o)))
    }

    pub fn joint_count(&self) -> usize {
        self.offsets.values().filter(|o| o.is_some()).count()
    }

    /// True when capture saw no joints at all; such a template never matches.
    pub fn is_empty(&self) -> bool {
        self.joint_count() == 0
    }

    pub fn threshold(&self) -> Option<f32> {
        self.threshold
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TemplateStore
// ════════════════════════════════════════════════════════════════════════════

/// Ordered, append-only collection of templates.
///
/// Store order is significant: on equal distances the earlier template wins.
#[derive(Clone, Debug, Default)]
pub struct TemplateStore {
    entries: Vec<(TemplateId, GestureTemplate)>,
    next_id: u32,
}

impl TemplateStore {
    pub fn new() -> Self {
        TemplateStore::default()
    }

    /// Append a template and return its identity.
    pub fn push(&mut self, template: GestureTemplate) -> TemplateId {
        let id = TemplateId(self.next_id);
        self.next_id += 1;
        tracing::debug!(
            id = %id,
            name = %template.name,
            hand = %template.handedness,
            joints = template.joint_count(),
            "template stored"
        );
        self.entries.push((id, template));
        id
    }

    pub fn get(&self, id: TemplateId) -> Option<&GestureTemplate> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, t)| t)
    }

    /// Templates in store order.
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &GestureTemplate)> + '_ {
        self.entries.iter().map(|(id, t)| (*id, t))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Drop every template. Ids are not reused afterwards.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Extend<GestureTemplate> for TemplateStore {
    fn extend<I: IntoIterator<Item = GestureTemplate>>(&mut self, iter: I) {
        for t in iter {
            self.push(t);
        }
    }
}

impl FromIterator<GestureTemplate> for TemplateStore {
    fn from_iter<I: IntoIterator<Item = GestureTemplate>>(iter: I) -> Self {
        let mut store = TemplateStore::new();
        store.extend(iter);
        store
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn fist() -> GestureTemplate {
        GestureTemplate::from_offsets(
            "fist",
            Handedness::Right,
            [
                (JointId::IndexTip, Vector3::new(0.0, 0.02, 0.03)),
                (JointId::Wrist,    Vector3::new(0.0, -0.06, 0.0)),
            ],
        )
    }

    #[test]
    fn partial_coverage_is_preserved() {
        let t = fist();
        assert_eq!(t.joint_count(), 2);
        assert!(t.offset(JointId::ThumbTip).is_none());
        // Canonical order, not insertion order.
        let joints: Vec<_> = t.offsets().map(|(j, _)| j).collect();
        assert_eq!(joints, vec![JointId::Wrist, JointId::IndexTip]);
    }

    #[test]
    fn empty_template_is_flagged() {
        let t = GestureTemplate::new(DEFAULT_TEMPLATE_NAME, Handedness::Left, OffsetTable::default());
        assert!(t.is_empty());
        assert!(!fist().is_empty());
    }

    #[test]
    fn ids_are_distinct_for_identical_templates() {
        let mut store = TemplateStore::new();
        let a = store.push(fist());
        let b = store.push(fist());
        assert_ne!(a, b);
        assert_eq!(store.get(a), store.get(b));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let store: TemplateStore = ["a", "b", "c"]
            .into_iter()
            .map(|n| fist().with_name(n))
            .collect();
        let names: Vec<_> = store.iter().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn ids_survive_clear() {
        let mut store = TemplateStore::new();
        let a = store.push(fist());
        store.clear();
        assert!(store.get(a).is_none());
        let b = store.push(fist());
        assert_ne!(a, b);
    }
}
