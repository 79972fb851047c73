//! Trigger → behaviour-name table

use indexmap::IndexSet;

use super::table::{BindingSource, ChainedTable};
use crate::trigger::Trigger;

/// Trigger → names of the behaviours it starts
pub type InputTriggerMap = ChainedTable<Trigger, IndexSet<String>>;

impl InputTriggerMap {
    /// Adds `behaviour` to the names bound locally to `trigger`
    pub fn bind(&self, trigger: Trigger, behaviour: impl Into<String>) {
        let behaviour = behaviour.into();
        self.update(trigger, |names| {
            names.insert(behaviour);
        });
    }

    /// Removes `behaviour` from the names bound locally to `trigger`
    pub fn unbind(&self, trigger: &Trigger, behaviour: &str) {
        let Some(mut names) = self.get_local(trigger) else {
            return;
        };
        names.shift_remove(behaviour);
        if names.is_empty() {
            self.remove(trigger);
        } else {
            self.put(trigger.clone(), names);
        }
    }

    /// Every trigger bound to `behaviour` anywhere in the chain
    pub fn triggers_for(&self, behaviour: &str) -> Vec<Trigger> {
        self.all_bindings()
            .into_iter()
            .filter(|(_, names)| names.contains(behaviour))
            .map(|(trigger, _)| trigger)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_bind_and_unbind() {
        let map = InputTriggerMap::new();
        let t = Trigger::parse("ctrl Z").unwrap();
        map.bind(t.clone(), "undo");
        map.bind(t.clone(), "log");
        assert_eq!(map.get(&t).map(|n| n.len()), Some(2));

        map.unbind(&t, "undo");
        assert!(map.triggers_for("undo").is_empty());
        assert_eq!(map.triggers_for("log"), vec![t.clone()]);

        map.unbind(&t, "log");
        assert_eq!(map.local_len(), 0);
    }

    #[test]
    fn test_triggers_for_spans_parents() {
        let parent = Arc::new(InputTriggerMap::new());
        parent.bind(Trigger::parse("button1").unwrap(), "pan");
        let child = InputTriggerMap::with_parent(Some(parent));
        child.bind(Trigger::parse("SPACE").unwrap(), "pan");
        assert_eq!(child.triggers_for("pan").len(), 2);
    }
}
