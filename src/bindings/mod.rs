//! Binding tables: trigger → behaviour names, and name → behaviour
//!
//! Both tables are [`ChainedTable`]s: mutable from any thread, chained onto
//! optional parents, and observed through mutation counters that change
//! whenever anything along the chain changes.

mod behaviour;
mod config;
mod layers;
mod table;
mod trigger_map;

pub use behaviour::{
    Behaviour, BehaviourKind, BehaviourMap, ClickBehaviour, DragBehaviour, ScrollBehaviour,
};
pub use config::{
    ALL_CONTEXTS, BindingEntry, InputDescriptor, InputTriggerAdder, InputTriggerConfig,
};
pub use layers::TriggerBehaviourBindings;
pub use table::{BindingSource, ChainValue, ChainedTable, ReadOnlyTable, SharedSource};
pub use trigger_map::InputTriggerMap;
