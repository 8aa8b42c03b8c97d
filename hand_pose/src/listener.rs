//! Recognise/derecognise callbacks keyed by template identity.

use std::collections::HashMap;

use crate::template::{GestureTemplate, TemplateId, TemplateStore};
use crate::tracker::{Transition, TransitionEvent};

type Callback = Box<dyn FnMut(TemplateId, &GestureTemplate) + Send>;

#[derive(Default)]
struct Listeners {
    on_recognise:   Vec<Callback>,
    on_derecognise: Vec<Callback>,
}

/// Callbacks attached to templates from outside the template data.
///
/// Templates stay plain values; whoever owns the UI registers here and the
/// registry fires the callbacks for each [`Transition`].
#[derive(Default)]
pub struct ListenerRegistry {
    by_template: HashMap<TemplateId, Listeners>,
    any:         Listeners,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        ListenerRegistry::default()
    }

    pub fn on_recognise<F>(&mut self, id: TemplateId, f: F)
    where
        F: FnMut(TemplateId, &GestureTemplate) + Send + 'static,
    {
        self.by_template.entry(id).or_default().on_recognise.push(Box::new(f));
    }

    pub fn on_derecognise<F>(&mut self, id: TemplateId, f: F)
    where
        F: FnMut(TemplateId, &GestureTemplate) + Send + 'static,
    {
        self.by_template.entry(id).or_default().on_derecognise.push(Box::new(f));
    }

    /// Called for every template that gets recognised.
    pub fn on_any_recognise<F>(&mut self, f: F)
    where
        F: FnMut(TemplateId, &GestureTemplate) + Send + 'static,
    {
        self.any.on_recognise.push(Box::new(f));
    }

    /// Called for every template that gets derecognised.
    pub fn on_any_derecognise<F>(&mut self, f: F)
    where
        F: FnMut(TemplateId, &GestureTemplate) + Send + 'static,
    {
        self.any.on_derecognise.push(Box::new(f));
    }

    /// Drop every callback attached to `id`.
    pub fn remove(&mut self, id: TemplateId) {
        self.by_template.remove(&id);
    }

    /// Fire the callbacks for `transition`, derecognise first.
    ///
    /// Events for ids no longer in `store` are skipped.
    pub fn dispatch(&mut self, transition: &Transition, store: &TemplateStore) {
        for event in transition.events() {
            let id = event.template();
            let Some(template) = store.get(id) else { continue };
            let specific = self.by_template.get_mut(&id);
            match event {
                TransitionEvent::Recognised(_) => {
                    if let Some(l) = specific {
                        l.on_recognise.iter_mut().for_each(|f| f(id, template));
                    }
                    self.any.on_recognise.iter_mut().for_each(|f| f(id, template));
                }
                TransitionEvent::Derecognised(_) => {
                    if let Some(l) = specific {
                        l.on_derecognise.iter_mut().for_each(|f| f(id, template));
                    }
                    self.any.on_derecognise.iter_mut().for_each(|f| f(id, template));
                }
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("templates", &self.by_template.len())
            .finish()
    }
}
