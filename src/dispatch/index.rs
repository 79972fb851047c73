//! Typed lookup tables derived from the binding tables
//!
//! The index is rebuilt in full, and only when the combined mutation counts
//! of the trigger table and the behaviour table differ from the ones seen at
//! the previous refresh. It must only be refreshed from the dispatch thread.

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::bindings::{Behaviour, BindingSource, ClickBehaviour, DragBehaviour, ScrollBehaviour};
use crate::trigger::Trigger;

/// A behaviour together with the trigger that selects it
pub struct Bound<B: ?Sized> {
    pub trigger: Trigger,
    pub behaviour: Arc<B>,
}

impl<B: ?Sized> Bound<B> {
    fn new(trigger: Trigger, behaviour: Arc<B>) -> Self {
        Self { trigger, behaviour }
    }

    /// Same trigger and same behaviour instance
    pub fn same_binding(&self, other: &Self) -> bool {
        self.trigger == other.trigger && Arc::ptr_eq(&self.behaviour, &other.behaviour)
    }
}

impl<B: ?Sized> Clone for Bound<B> {
    fn clone(&self) -> Self {
        Self::new(self.trigger.clone(), self.behaviour.clone())
    }
}

#[derive(Default)]
struct Bins {
    button_drags: Vec<Bound<dyn DragBehaviour>>,
    key_drags: Vec<Bound<dyn DragBehaviour>>,
    button_clicks: Vec<Bound<dyn ClickBehaviour>>,
    key_clicks: Vec<Bound<dyn ClickBehaviour>>,
    scrolls: Vec<Bound<dyn ScrollBehaviour>>,
}

/// Five dispatch bins keyed by trigger origin and behaviour kind
#[derive(Default)]
pub struct DispatchIndex {
    bins: Bins,
    observed: Option<(u64, u64)>,
    rebuilds: u64,
}

impl DispatchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the bins if either table changed since the last refresh
    ///
    /// Returns true when a rebuild happened.
    pub fn refresh(
        &mut self,
        triggers: &dyn BindingSource<Trigger, IndexSet<String>>,
        behaviours: &dyn BindingSource<String, Behaviour>,
    ) -> bool {
        let counts = (triggers.mutation_count(), behaviours.mutation_count());
        if self.observed == Some(counts) {
            return false;
        }

        let mut bins = Bins::default();
        for (trigger, names) in triggers.all_bindings() {
            if trigger.is_not_mapped() {
                continue;
            }
            for name in &names {
                let Some(behaviour) = behaviours.get(name) else {
                    continue;
                };
                let key = trigger.is_key_triggered();
                let trigger = trigger.clone();
                match behaviour {
                    Behaviour::Drag(drag) if key => bins.key_drags.push(Bound::new(trigger, drag)),
                    Behaviour::Drag(drag) => bins.button_drags.push(Bound::new(trigger, drag)),
                    Behaviour::Click(click) if key => {
                        bins.key_clicks.push(Bound::new(trigger, click))
                    }
                    Behaviour::Click(click) => bins.button_clicks.push(Bound::new(trigger, click)),
                    Behaviour::Scroll(scroll) => bins.scrolls.push(Bound::new(trigger, scroll)),
                }
            }
        }

        self.bins = bins;
        self.observed = Some(counts);
        self.rebuilds += 1;
        debug!(
            button_drags = self.bins.button_drags.len(),
            key_drags = self.bins.key_drags.len(),
            button_clicks = self.bins.button_clicks.len(),
            key_clicks = self.bins.key_clicks.len(),
            scrolls = self.bins.scrolls.len(),
            "Rebuilt dispatch index"
        );
        true
    }

    /// Empties the bins and forgets the observed counts
    pub fn clear(&mut self) {
        self.bins = Bins::default();
        self.observed = None;
    }

    pub fn button_drags(&self) -> &[Bound<dyn DragBehaviour>] {
        &self.bins.button_drags
    }

    pub fn key_drags(&self) -> &[Bound<dyn DragBehaviour>] {
        &self.bins.key_drags
    }

    pub fn button_clicks(&self) -> &[Bound<dyn ClickBehaviour>] {
        &self.bins.button_clicks
    }

    pub fn key_clicks(&self) -> &[Bound<dyn ClickBehaviour>] {
        &self.bins.key_clicks
    }

    pub fn scrolls(&self) -> &[Bound<dyn ScrollBehaviour>] {
        &self.bins.scrolls
    }

    /// Number of full rebuilds performed so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
