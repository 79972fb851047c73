//! Context-tagged binding configuration
//!
//! [`InputTriggerConfig`] collects (trigger, behaviour, contexts) entries as
//! they come from persistence or an editor and installs the ones active in
//! a given context set into an [`InputTriggerMap`] through an
//! [`InputTriggerAdder`].

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::trigger_map::InputTriggerMap;
use crate::error::BindingError;
use crate::trigger::Trigger;

/// Context that makes an entry active everywhere
pub const ALL_CONTEXTS: &str = "all";

/// One trigger bound to one behaviour in a set of contexts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingEntry {
    pub trigger: Trigger,
    pub behaviour: String,
    pub contexts: BTreeSet<String>,
}

impl BindingEntry {
    /// Whether the entry applies to any of `contexts`
    pub fn is_active_in(&self, contexts: &BTreeSet<String>) -> bool {
        self.contexts.contains(ALL_CONTEXTS) || !self.contexts.is_disjoint(contexts)
    }
}

/// Persistable form: every trigger of one behaviour sharing one context set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub triggers: Vec<String>,
    pub behaviour: String,
    pub contexts: BTreeSet<String>,
}

/// Configured bindings, keyed by (trigger, behaviour) with merged contexts
#[derive(Debug, Clone, Default)]
pub struct InputTriggerConfig {
    entries: IndexMap<(Trigger, String), BTreeSet<String>>,
}

impl InputTriggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding; contexts of an existing (trigger, behaviour) pair are merged
    pub fn add<I, S>(&mut self, trigger: Trigger, behaviour: impl Into<String>, contexts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries
            .entry((trigger, behaviour.into()))
            .or_default()
            .extend(contexts.into_iter().map(Into::into));
    }

    /// Parses `descriptor` and adds the binding
    pub fn add_descriptor<I, S>(
        &mut self,
        descriptor: &str,
        behaviour: impl Into<String>,
        contexts: I,
    ) -> Result<(), BindingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let trigger = Trigger::parse(descriptor)?;
        self.add(trigger, behaviour, contexts);
        Ok(())
    }

    pub fn entries(&self) -> impl Iterator<Item = BindingEntry> + '_ {
        self.entries
            .iter()
            .map(|((trigger, behaviour), contexts)| BindingEntry {
                trigger: trigger.clone(),
                behaviour: behaviour.clone(),
                contexts: contexts.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Triggers configured for `behaviour` in any of `contexts`
    pub fn inputs(&self, behaviour: &str, contexts: &BTreeSet<String>) -> Vec<Trigger> {
        self.entries()
            .filter(|entry| entry.behaviour == behaviour && entry.is_active_in(contexts))
            .map(|entry| entry.trigger)
            .collect()
    }

    /// Snapshot grouped by (behaviour, contexts)
    ///
    /// Groups and their trigger lists are sorted, so equal configurations
    /// produce equal snapshots regardless of insertion order.
    pub fn descriptors(&self) -> Vec<InputDescriptor> {
        let mut grouped: IndexMap<(String, BTreeSet<String>), BTreeSet<String>> = IndexMap::new();
        for entry in self.entries() {
            grouped
                .entry((entry.behaviour, entry.contexts))
                .or_default()
                .insert(entry.trigger.format());
        }

        let mut descriptors: Vec<InputDescriptor> = grouped
            .into_iter()
            .map(|((behaviour, contexts), triggers)| InputDescriptor {
                triggers: triggers.into_iter().collect(),
                behaviour,
                contexts,
            })
            .collect();
        descriptors.sort_by(|a, b| {
            (&a.behaviour, &a.contexts, &a.triggers).cmp(&(&b.behaviour, &b.contexts, &b.triggers))
        });
        descriptors
    }

    /// Rebuilds a configuration from a snapshot
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = InputDescriptor>,
    ) -> Result<Self, BindingError> {
        let mut config = Self::new();
        for descriptor in descriptors {
            for trigger in &descriptor.triggers {
                config.add_descriptor(
                    trigger,
                    descriptor.behaviour.clone(),
                    descriptor.contexts.iter().cloned(),
                )?;
            }
        }
        Ok(config)
    }

    /// Adder installing this configuration's `contexts` bindings into `map`
    pub fn adder<'a, I, S>(&'a self, map: &'a InputTriggerMap, contexts: I) -> InputTriggerAdder<'a>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InputTriggerAdder {
            config: self,
            map,
            contexts: contexts.into_iter().map(Into::into).collect(),
            warnings: Vec::new(),
        }
    }
}

/// Binds behaviours into a trigger map, preferring configured triggers over defaults
pub struct InputTriggerAdder<'a> {
    config: &'a InputTriggerConfig,
    map: &'a InputTriggerMap,
    contexts: BTreeSet<String>,
    warnings: Vec<BindingError>,
}

impl InputTriggerAdder<'_> {
    /// Binds `behaviour` to its configured triggers, or to `defaults` if none are configured
    ///
    /// A behaviour with neither is left unbound and a
    /// [`BindingError::MissingDefaultTrigger`] is recorded as a warning.
    ///
    /// # Errors
    /// `InvalidTriggerSyntax` if a default descriptor does not parse.
    pub fn put(&mut self, behaviour: &str, defaults: &[&str]) -> Result<(), BindingError> {
        let mut triggers = self.config.inputs(behaviour, &self.contexts);
        if triggers.is_empty() {
            triggers = defaults
                .iter()
                .map(|descriptor| Trigger::parse(descriptor))
                .collect::<Result<_, _>>()?;
        }

        if triggers.is_empty() {
            warn!(behaviour, "No trigger configured and no default supplied");
            self.warnings.push(BindingError::MissingDefaultTrigger {
                behaviour: behaviour.to_string(),
            });
            return Ok(());
        }

        // `not mapped` is bound too: it never fires but hides inherited triggers
        for trigger in triggers {
            debug!(behaviour, %trigger, "Binding");
            self.map.bind(trigger, behaviour);
        }
        Ok(())
    }

    /// Non-fatal problems found so far
    pub fn warnings(&self) -> &[BindingError] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::table::BindingSource;

    fn contexts(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_contexts_merge_for_same_pair() {
        let mut config = InputTriggerConfig::new();
        config.add_descriptor("shift A", "tag", ["viewer"]).unwrap();
        config.add_descriptor("A shift", "tag", ["editor"]).unwrap();
        assert_eq!(config.len(), 1);

        let entry = config.entries().next().unwrap();
        assert_eq!(entry.contexts, contexts(&["editor", "viewer"]));
    }

    #[test]
    fn test_all_context_matches_everything() {
        let mut config = InputTriggerConfig::new();
        config.add_descriptor("shift A", "tag", [ALL_CONTEXTS]).unwrap();
        config.add_descriptor("B", "tag", ["editor"]).unwrap();

        assert_eq!(config.inputs("tag", &contexts(&["viewer"])).len(), 1);
        assert_eq!(config.inputs("tag", &contexts(&["editor"])).len(), 2);
        assert!(config.inputs("other", &contexts(&["editor"])).is_empty());
    }

    #[test]
    fn test_descriptor_snapshot_round_trips() {
        let mut config = InputTriggerConfig::new();
        config.add_descriptor("button1", "pan", ["viewer"]).unwrap();
        config.add_descriptor("SPACE", "pan", ["viewer"]).unwrap();
        config.add_descriptor("scroll", "zoom", ["viewer", "editor"]).unwrap();

        let snapshot = config.descriptors();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].behaviour, "pan");
        assert_eq!(snapshot[0].triggers, vec!["SPACE".to_string(), "button1".to_string()]);

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: Vec<InputDescriptor> = serde_json::from_str(&json).unwrap();
        let rebuilt = InputTriggerConfig::from_descriptors(restored).unwrap();
        assert_eq!(rebuilt.descriptors(), snapshot);
    }

    #[test]
    fn test_from_descriptors_rejects_bad_syntax() {
        let bad = InputDescriptor {
            triggers: vec!["shift ???".into()],
            behaviour: "x".into(),
            contexts: contexts(&["all"]),
        };
        assert!(matches!(
            InputTriggerConfig::from_descriptors([bad]),
            Err(BindingError::InvalidTriggerSyntax { .. })
        ));
    }

    #[test]
    fn test_adder_prefers_configuration_over_defaults() {
        let mut config = InputTriggerConfig::new();
        config.add_descriptor("ctrl Z", "undo", ["editor"]).unwrap();
        let map = InputTriggerMap::new();

        let mut adder = config.adder(&map, ["editor"]);
        adder.put("undo", &["meta Z"]).unwrap();
        adder.put("redo", &["ctrl Y"]).unwrap();
        assert!(adder.warnings().is_empty());

        assert_eq!(map.triggers_for("undo"), vec![Trigger::parse("ctrl Z").unwrap()]);
        assert_eq!(map.triggers_for("redo"), vec![Trigger::parse("ctrl Y").unwrap()]);
    }

    #[test]
    fn test_adder_warns_on_missing_default() {
        let config = InputTriggerConfig::new();
        let map = InputTriggerMap::new();
        let mut adder = config.adder(&map, ["editor"]);

        adder.put("orphan", &[]).unwrap();
        assert_eq!(
            adder.warnings(),
            &[BindingError::MissingDefaultTrigger { behaviour: "orphan".into() }]
        );
        assert!(map.all_bindings().is_empty());
    }

    #[test]
    fn test_adder_not_mapped_hides_inherited_triggers() {
        let mut config = InputTriggerConfig::new();
        config.add_descriptor("not mapped", "close", ["all"]).unwrap();
        let parent = std::sync::Arc::new(InputTriggerMap::new());
        parent.bind(Trigger::parse("ctrl W").unwrap(), "close");
        let map = InputTriggerMap::with_parent(Some(parent.clone()));
        let mut adder = config.adder(&map, ["viewer"]);

        adder.put("close", &["ctrl W"]).unwrap();
        assert!(adder.warnings().is_empty());
        assert_eq!(map.triggers_for("close"), vec![Trigger::not_mapped()]);
        assert_eq!(parent.triggers_for("close").len(), 1);
    }

    #[test]
    fn test_adder_propagates_bad_defaults() {
        let config = InputTriggerConfig::new();
        let map = InputTriggerMap::new();
        let mut adder = config.adder(&map, ["viewer"]);
        assert!(adder.put("broken", &["hyper Q"]).is_err());
    }
}
