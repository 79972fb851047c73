//! Parent-chained binding tables with pull-based change detection
//!
//! A [`ChainedTable`] owns its local entries and holds a shared reference to
//! an optional parent. Lookups fall through to the parent; changes upstream
//! are noticed lazily by [`BindingSource::mutation_count`], which bumps the
//! local counter once for every parent count change it observes.

use std::hash::Hash;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use tracing::warn;

use crate::error::BindingError;
use crate::trigger::Trigger;

/// How a child entry combines with the entry its parent chain provides
pub trait ChainValue<K>: Clone + Send + Sync {
    /// Combines a local entry with the inherited one for the same key
    fn inherit(self, parent: Self) -> Self;

    /// Adjusts the flattened inherited bindings before local entries are applied
    fn mask_inherited(_local: &IndexMap<K, Self>, _inherited: &mut IndexMap<K, Self>) {}
}

/// Trigger → behaviour names; child and parent names merge, and a name
/// bound locally to `not mapped` hides that name's inherited triggers.
impl ChainValue<Trigger> for IndexSet<String> {
    fn inherit(self, parent: Self) -> Self {
        let mut merged = parent;
        merged.extend(self);
        merged
    }

    fn mask_inherited(
        local: &IndexMap<Trigger, Self>,
        inherited: &mut IndexMap<Trigger, Self>,
    ) {
        let Some(hidden) = local.get(&Trigger::not_mapped()) else {
            return;
        };
        for names in inherited.values_mut() {
            names.retain(|name| !hidden.contains(name));
        }
        inherited.retain(|_, names| !names.is_empty());
    }
}

/// Read access shared by every table flavour
pub trait BindingSource<K, V>: Send + Sync {
    /// Looks up a key through the whole chain
    fn get(&self, key: &K) -> Option<V>;

    /// Flattened snapshot of the whole chain
    fn all_bindings(&self) -> IndexMap<K, V>;

    /// Counter that changes whenever this table or any ancestor changes
    fn mutation_count(&self) -> u64;
}

/// Parent reference shared by tables
pub type SharedSource<K, V> = Arc<dyn BindingSource<K, V>>;

/// Tracks the parent's counter as last seen by the child
struct ParentLink<K, V> {
    source: Option<SharedSource<K, V>>,
    expected_count: Option<u64>,
    stale: bool,
}

impl<K, V> ParentLink<K, V> {
    fn new(source: Option<SharedSource<K, V>>) -> Self {
        Self {
            source,
            expected_count: None,
            stale: true,
        }
    }

    fn get(&self) -> Option<SharedSource<K, V>> {
        self.source.clone()
    }

    /// Returns true once per observed change of the parent counter
    fn observe(&mut self, current: Option<u64>) -> bool {
        if self.stale || current != self.expected_count {
            self.stale = false;
            self.expected_count = current;
            true
        } else {
            false
        }
    }
}

struct Local<K, V> {
    entries: IndexMap<K, V>,
    count: u64,
    parent: ParentLink<K, V>,
}

/// Mutable local map chained onto an optional parent
pub struct ChainedTable<K, V> {
    local: Mutex<Local<K, V>>,
}

impl<K, V> ChainedTable<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: ChainValue<K>,
{
    /// Creates an empty table without a parent
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    /// Creates an empty table chained onto `parent`
    pub fn with_parent(parent: Option<SharedSource<K, V>>) -> Self {
        Self {
            local: Mutex::new(Local {
                entries: IndexMap::new(),
                count: 0,
                parent: ParentLink::new(parent),
            }),
        }
    }

    /// Sets the local entry for `key`
    pub fn put(&self, key: K, value: V) {
        let mut local = self.local.lock();
        local.entries.insert(key, value);
        local.count += 1;
    }

    /// Edits the local entry for `key` in place, creating it from `V::default()`
    pub fn update(&self, key: K, edit: impl FnOnce(&mut V))
    where
        V: Default,
    {
        let mut local = self.local.lock();
        edit(local.entries.entry(key).or_default());
        local.count += 1;
    }

    /// Removes the local entry for `key`; inherited entries are unaffected
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut local = self.local.lock();
        let removed = local.entries.shift_remove(key);
        local.count += 1;
        removed
    }

    /// Removes all local entries
    pub fn clear(&self) {
        let mut local = self.local.lock();
        local.entries.clear();
        local.count += 1;
    }

    /// Re-parents this table; the next `mutation_count` reports a change
    pub fn set_parent(&self, parent: Option<SharedSource<K, V>>) {
        self.local.lock().parent = ParentLink::new(parent);
    }

    /// Local entry only, ignoring the parent chain
    pub fn get_local(&self, key: &K) -> Option<V> {
        self.local.lock().entries.get(key).cloned()
    }

    pub fn local_len(&self) -> usize {
        self.local.lock().entries.len()
    }
}

impl<K, V> Default for ChainedTable<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: ChainValue<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Layers `local` onto an inherited snapshot
fn overlay<K, V>(local: &IndexMap<K, V>, mut inherited: IndexMap<K, V>) -> IndexMap<K, V>
where
    K: Clone + Eq + Hash,
    V: ChainValue<K>,
{
    V::mask_inherited(local, &mut inherited);
    for (key, value) in local {
        let merged = match inherited.shift_remove(key) {
            Some(parent) => value.clone().inherit(parent),
            None => value.clone(),
        };
        inherited.insert(key.clone(), merged);
    }
    inherited
}

fn chain_lookup<K, V>(local: Option<V>, parent: Option<&SharedSource<K, V>>, key: &K) -> Option<V>
where
    V: ChainValue<K>,
{
    let inherited = parent.and_then(|parent| parent.get(key));
    match (local, inherited) {
        (Some(local), Some(inherited)) => Some(local.inherit(inherited)),
        (local, inherited) => local.or(inherited),
    }
}

impl<K, V> BindingSource<K, V> for ChainedTable<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: ChainValue<K>,
{
    fn get(&self, key: &K) -> Option<V> {
        // Never hold our lock while the parent takes its own
        let (local, parent) = {
            let local = self.local.lock();
            (local.entries.get(key).cloned(), local.parent.get())
        };
        chain_lookup(local, parent.as_ref(), key)
    }

    fn all_bindings(&self) -> IndexMap<K, V> {
        let parent = self.local.lock().parent.get();
        let inherited = parent.map(|p| p.all_bindings()).unwrap_or_default();
        let local = self.local.lock();
        overlay(&local.entries, inherited)
    }

    fn mutation_count(&self) -> u64 {
        let parent = self.local.lock().parent.get();
        let parent_count = parent.map(|p| p.mutation_count());

        let mut local = self.local.lock();
        if local.parent.observe(parent_count) {
            local.count += 1;
        }
        local.count
    }
}

/// Read-only view of a shared table that can still be re-parented
///
/// Lookups consult the wrapped table first and then this view's own parent.
/// Every write fails with [`BindingError::ImmutableTableMutation`].
pub struct ReadOnlyTable<K, V> {
    wrapped: SharedSource<K, V>,
    state: Mutex<ReadOnlyState<K, V>>,
}

struct ReadOnlyState<K, V> {
    count: u64,
    wrapped_link: ParentLink<K, V>,
    parent: ParentLink<K, V>,
}

impl<K, V> ReadOnlyTable<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: ChainValue<K>,
{
    pub fn new(wrapped: SharedSource<K, V>) -> Self {
        Self {
            wrapped,
            state: Mutex::new(ReadOnlyState {
                count: 0,
                wrapped_link: ParentLink::new(None),
                parent: ParentLink::new(None),
            }),
        }
    }

    pub fn set_parent(&self, parent: Option<SharedSource<K, V>>) {
        self.state.lock().parent = ParentLink::new(parent);
    }

    pub fn put(&self, _key: K, _value: V) -> Result<(), BindingError> {
        Self::reject("put")
    }

    pub fn remove(&self, _key: &K) -> Result<(), BindingError> {
        Self::reject("remove")
    }

    pub fn clear(&self) -> Result<(), BindingError> {
        Self::reject("clear")
    }

    fn reject(operation: &'static str) -> Result<(), BindingError> {
        warn!(operation, "Write rejected by read-only binding table");
        Err(BindingError::ImmutableTableMutation { operation })
    }
}

impl<K, V> BindingSource<K, V> for ReadOnlyTable<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: ChainValue<K>,
{
    fn get(&self, key: &K) -> Option<V> {
        let parent = self.state.lock().parent.get();
        chain_lookup(self.wrapped.get(key), parent.as_ref(), key)
    }

    fn all_bindings(&self) -> IndexMap<K, V> {
        let parent = self.state.lock().parent.get();
        let inherited = parent.map(|p| p.all_bindings()).unwrap_or_default();
        overlay(&self.wrapped.all_bindings(), inherited)
    }

    fn mutation_count(&self) -> u64 {
        let wrapped_count = Some(self.wrapped.mutation_count());
        let parent = self.state.lock().parent.get();
        let parent_count = parent.map(|p| p.mutation_count());

        let mut state = self.state.lock();
        // Both links must be observed so neither change is reported twice
        let wrapped_changed = state.wrapped_link.observe(wrapped_count);
        let parent_changed = state.parent.observe(parent_count);
        if wrapped_changed || parent_changed {
            state.count += 1;
        }
        state.count
    }
}
