//! Named, ordered layers of trigger and behaviour maps
//!
//! Components contribute their own maps under a name. Each contributed map is
//! wrapped read-only and chained onto the previous layer, so the
//! contributor keeps ownership of its map while the last layer sees
//! everything below it. Dispatchers observe the fixed head tables returned by
//! [`TriggerBehaviourBindings::input_trigger_map`] and
//! [`TriggerBehaviourBindings::behaviour_map`], which are re-parented onto
//! the top layer whenever the layers change.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::behaviour::{Behaviour, BehaviourMap};
use super::table::{ChainValue, ChainedTable, ReadOnlyTable, SharedSource};
use super::trigger_map::InputTriggerMap;
use crate::trigger::Trigger;

struct Layers<K, V> {
    head: Arc<ChainedTable<K, V>>,
    layers: IndexMap<String, Arc<ReadOnlyTable<K, V>>>,
}

impl<K, V> Layers<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: ChainValue<K> + 'static,
{
    fn new() -> Self {
        Self {
            head: Arc::new(ChainedTable::new()),
            layers: IndexMap::new(),
        }
    }

    fn add(&mut self, name: &str, map: Arc<ChainedTable<K, V>>) {
        let wrapped: SharedSource<K, V> = map;
        self.layers
            .insert(name.to_string(), Arc::new(ReadOnlyTable::new(wrapped)));
        self.relink();
    }

    fn remove(&mut self, name: &str) -> bool {
        let removed = self.layers.shift_remove(name).is_some();
        if removed {
            self.relink();
        }
        removed
    }

    fn clear(&mut self) {
        self.layers.clear();
        self.relink();
    }

    fn relink(&self) {
        let mut below: Option<SharedSource<K, V>> = None;
        for layer in self.layers.values() {
            layer.set_parent(below.take());
            below = Some(layer.clone() as SharedSource<K, V>);
        }
        self.head.set_parent(below);
    }
}

/// Ordered named layers of binding maps
pub struct TriggerBehaviourBindings {
    triggers: Layers<Trigger, IndexSet<String>>,
    behaviours: Layers<String, Behaviour>,
}

impl TriggerBehaviourBindings {
    pub fn new() -> Self {
        Self {
            triggers: Layers::new(),
            behaviours: Layers::new(),
        }
    }

    /// Adds (or replaces, keeping its position) the trigger map layer `name`
    pub fn add_input_trigger_map(&mut self, name: &str, map: Arc<InputTriggerMap>) {
        debug!(layer = name, "Adding input trigger map");
        self.triggers.add(name, map);
    }

    pub fn remove_input_trigger_map(&mut self, name: &str) -> bool {
        self.triggers.remove(name)
    }

    /// Adds (or replaces, keeping its position) the behaviour map layer `name`
    pub fn add_behaviour_map(&mut self, name: &str, map: Arc<BehaviourMap>) {
        debug!(layer = name, "Adding behaviour map");
        self.behaviours.add(name, map);
    }

    pub fn remove_behaviour_map(&mut self, name: &str) -> bool {
        self.behaviours.remove(name)
    }

    /// Removes every layer of both kinds
    pub fn clear(&mut self) {
        self.triggers.clear();
        self.behaviours.clear();
    }

    /// Head table seeing all trigger layers
    pub fn input_trigger_map(&self) -> Arc<InputTriggerMap> {
        self.triggers.head.clone()
    }

    /// Head table seeing all behaviour layers
    pub fn behaviour_map(&self) -> Arc<BehaviourMap> {
        self.behaviours.head.clone()
    }

    pub fn input_trigger_layers(&self) -> impl Iterator<Item = &str> {
        self.triggers.layers.keys().map(String::as_str)
    }

    pub fn behaviour_layers(&self) -> impl Iterator<Item = &str> {
        self.behaviours.layers.keys().map(String::as_str)
    }
}

impl Default for TriggerBehaviourBindings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::behaviour::ClickBehaviour;
    use crate::bindings::table::BindingSource;

    struct Noop;

    impl ClickBehaviour for Noop {
        fn click(&self, _x: i32, _y: i32) {}
    }

    fn trigger(descriptor: &str) -> Trigger {
        Trigger::parse(descriptor).unwrap()
    }

    #[test]
    fn test_head_sees_all_layers() {
        let mut bindings = TriggerBehaviourBindings::new();
        let navigation = Arc::new(InputTriggerMap::new());
        navigation.bind(trigger("button1"), "pan");
        let editing = Arc::new(InputTriggerMap::new());
        editing.bind(trigger("ctrl Z"), "undo");

        bindings.add_input_trigger_map("navigation", navigation);
        bindings.add_input_trigger_map("editing", editing.clone());

        let head = bindings.input_trigger_map();
        assert_eq!(head.all_bindings().len(), 2);

        let before = head.mutation_count();
        editing.bind(trigger("ctrl Y"), "redo");
        assert_ne!(head.mutation_count(), before, "layer edits reach the head");
        assert_eq!(head.all_bindings().len(), 3);
    }

    #[test]
    fn test_removing_a_layer_relinks_the_head() {
        let mut bindings = TriggerBehaviourBindings::new();
        let navigation = Arc::new(InputTriggerMap::new());
        navigation.bind(trigger("button1"), "pan");
        bindings.add_input_trigger_map("navigation", navigation.clone());

        let head = bindings.input_trigger_map();
        let before = head.mutation_count();
        assert!(bindings.remove_input_trigger_map("navigation"));
        assert!(!bindings.remove_input_trigger_map("navigation"));
        assert_ne!(head.mutation_count(), before);
        assert!(head.all_bindings().is_empty());

        // the contributor's own map is untouched
        assert_eq!(navigation.all_bindings().len(), 1);
    }

    #[test]
    fn test_later_behaviour_layers_override_earlier() {
        let mut bindings = TriggerBehaviourBindings::new();
        let base = Arc::new(BehaviourMap::new());
        base.register_click("select", Noop);
        let tool = Arc::new(BehaviourMap::new());
        tool.register_click("select", Noop);

        bindings.add_behaviour_map("base", base);
        bindings.add_behaviour_map("tool", tool);
        assert_eq!(bindings.behaviour_layers().collect::<Vec<_>>(), vec!["base", "tool"]);
        assert!(bindings.behaviour_map().get(&"select".to_string()).is_some());
        assert_eq!(bindings.behaviour_map().all_bindings().len(), 1);
    }
}
