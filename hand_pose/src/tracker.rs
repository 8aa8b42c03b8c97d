//! Frame-to-frame recognition state.
//!
//! The tracker remembers which template (if any) was recognised on the
//! previous tick and turns each new [`MatchResult`] into recognise and
//! derecognise events. There is no debounce: a pose hovering on the
//! threshold fires on every crossing.

use crate::matcher::MatchResult;
use crate::template::TemplateId;

/// Recognition state between ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackerState {
    #[default]
    Idle,
    Holding(TemplateId),
}

/// One fired transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    Recognised(TemplateId),
    Derecognised(TemplateId),
}

impl TransitionEvent {
    pub fn template(&self) -> TemplateId {
        match *self {
            TransitionEvent::Recognised(id) | TransitionEvent::Derecognised(id) => id,
        }
    }
}

/// Events fired by one tick: at most one derecognise followed by at most one
/// recognise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    pub derecognised: Option<TemplateId>,
    pub recognised:   Option<TemplateId>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.derecognised.is_none() && self.recognised.is_none()
    }

    pub fn len(&self) -> usize {
        usize::from(self.derecognised.is_some()) + usize::from(self.recognised.is_some())
    }

    /// Events in firing order: derecognise, then recognise.
    pub fn events(&self) -> impl Iterator<Item = TransitionEvent> {
        self.derecognised
            .map(TransitionEvent::Derecognised)
            .into_iter()
            .chain(self.recognised.map(TransitionEvent::Recognised))
    }
}

#[derive(Clone, Debug, Default)]
pub struct TransitionTracker {
    state: TrackerState,
}

impl TransitionTracker {
    pub fn new() -> Self {
        TransitionTracker::default()
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn holding(&self) -> Option<TemplateId> {
        match self.state {
            TrackerState::Idle        => None,
            TrackerState::Holding(id) => Some(id),
        }
    }

    /// Feed this frame's match and return what fired.
    pub fn advance(&mut self, current: &MatchResult) -> Transition {
        let current = current.map(|m| m.template);
        let previous = self.holding();
        if current == previous {
            return Transition::default();
        }

        self.state = match current {
            Some(id) => TrackerState::Holding(id),
            None     => TrackerState::Idle,
        };
        Transition { derecognised: previous, recognised: current }
    }

    /// Back to `Idle`, returning the derecognise owed for a held template.
    pub fn reset(&mut self) -> Transition {
        self.advance(&None)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
