//! Modifier state and key-press routing shared between windows
//!
//! Every window's [`EventDispatcher`](super::EventDispatcher) feeds key
//! presses and releases into one [`SharedModifierState`], so releasing shift
//! in one window is seen by all of them. A [`CrossWindowCoordinator`] also
//! remembers which window the pointer is over and routes key presses there:
//! a keyboard-initiated drag bound the same way in several windows acts on
//! the window under the pointer, not the one that has OS keyboard focus.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::trigger::{KeyCode, KeySet, Mask};

/// Outcome of recording a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key was already recorded as down; its release happened while no
    /// window of ours had focus
    pub stale: bool,
    /// The previous press of the same key was within the double-tap interval
    pub double_tap: bool,
}

#[derive(Debug, Default)]
struct KeyState {
    /// Every key currently down, modifiers included
    down: BTreeSet<KeyCode>,
    last_press: HashMap<KeyCode, u64>,
}

/// Physically-held modifiers and keys, shared by all windows of a coordinator
#[derive(Debug, Default)]
pub struct SharedModifierState {
    keys: Mutex<KeyState>,
}

impl SharedModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh (non-repeat) key press at `when` (ms)
    pub fn key_pressed(&self, key: KeyCode, when: u64, double_tap_interval: u64) -> KeyPress {
        let mut keys = self.keys.lock();
        let stale = !keys.down.insert(key);
        let double_tap = keys
            .last_press
            .insert(key, when)
            .is_some_and(|last| when.saturating_sub(last) < double_tap_interval);
        KeyPress { stale, double_tap }
    }

    pub fn key_released(&self, key: KeyCode) {
        self.keys.lock().down.remove(&key);
    }

    /// Non-modifier keys currently held
    pub fn held_keys(&self) -> KeySet {
        self.keys
            .lock()
            .down
            .iter()
            .copied()
            .filter(|key| !key.is_modifier())
            .collect()
    }

    pub fn shift_pressed(&self) -> bool {
        self.is_down(KeyCode::Shift)
    }

    pub fn meta_pressed(&self) -> bool {
        self.is_down(KeyCode::Meta)
    }

    pub fn win_pressed(&self) -> bool {
        self.is_down(KeyCode::Windows)
    }

    /// Shift/meta/win bits as physically held
    pub fn physical_mask(&self) -> Mask {
        let keys = self.keys.lock();
        let mut mask = Mask::empty();
        mask.set(Mask::SHIFT, keys.down.contains(&KeyCode::Shift));
        mask.set(Mask::META, keys.down.contains(&KeyCode::Meta));
        mask.set(Mask::WIN, keys.down.contains(&KeyCode::Windows));
        mask
    }

    /// Forgets held keys and press history
    pub fn reset(&self) {
        *self.keys.lock() = KeyState::default();
    }

    fn is_down(&self, key: KeyCode) -> bool {
        self.keys.lock().down.contains(&key)
    }
}

/// Identity of a key-press receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

impl ReceiverId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A window-local key-press handler the coordinator can route to
pub trait KeyPressReceiver: Send + Sync {
    fn receiver_id(&self) -> ReceiverId;

    /// Handles a normalized key press
    ///
    /// With `dry_run` set nothing is invoked; the return value tells whether
    /// any binding would have been triggered.
    fn handle_key_pressed(
        &self,
        mask: Mask,
        double_tap: bool,
        held: &KeySet,
        dry_run: bool,
    ) -> bool;

    /// Asks the host to give this window keyboard focus
    fn request_focus(&self);
}

/// Shared modifier state plus routing of key presses to the window under the pointer
#[derive(Default)]
pub struct CrossWindowCoordinator {
    modifiers: Arc<SharedModifierState>,
    active: Mutex<Option<(ReceiverId, Weak<dyn KeyPressReceiver>)>>,
}

impl CrossWindowCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> &Arc<SharedModifierState> {
        &self.modifiers
    }

    /// Marks `receiver` as the window under the pointer
    pub fn activate(&self, receiver: &Arc<dyn KeyPressReceiver>) {
        debug!(receiver = ?receiver.receiver_id(), "Activating key-press receiver");
        *self.active.lock() = Some((receiver.receiver_id(), Arc::downgrade(receiver)));
    }

    /// Clears the active window if it is `receiver`
    pub fn deactivate(&self, receiver: &dyn KeyPressReceiver) {
        let mut active = self.active.lock();
        if active
            .as_ref()
            .is_some_and(|(id, _)| *id == receiver.receiver_id())
        {
            debug!(receiver = ?receiver.receiver_id(), "Deactivating key-press receiver");
            *active = None;
        }
    }

    pub fn active_receiver(&self) -> Option<ReceiverId> {
        self.active.lock().as_ref().map(|(id, _)| *id)
    }

    /// Routes a key press that arrived at `origin`
    ///
    /// If another window is active and a dry run there reports a binding
    /// would trigger, that window is focused and handles the press.
    /// Otherwise `origin` handles it. Returns whether anything was triggered.
    pub fn dispatch_key_pressed(
        &self,
        origin: &dyn KeyPressReceiver,
        mask: Mask,
        double_tap: bool,
        held: &KeySet,
    ) -> bool {
        // Upgrade outside the receiver calls; they take their own locks
        let target = self
            .active
            .lock()
            .as_ref()
            .and_then(|(_, receiver)| receiver.upgrade());

        if let Some(target) = target
            && target.receiver_id() != origin.receiver_id()
            && target.handle_key_pressed(mask, double_tap, held, true)
        {
            info!(
                from = ?origin.receiver_id(),
                to = ?target.receiver_id(),
                "Routing key press to window under pointer"
            );
            target.request_focus();
            return target.handle_key_pressed(mask, double_tap, held, false);
        }

        origin.handle_key_pressed(mask, double_tap, held, false)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn test_double_tap_interval() {
        let state = SharedModifierState::new();
        let first = state.key_pressed(KeyCode::A, 1_000, 200);
        assert_eq!(first, KeyPress { stale: false, double_tap: false });

        state.key_released(KeyCode::A);
        let second = state.key_pressed(KeyCode::A, 1_150, 200);
        assert!(second.double_tap, "150ms after the first press");

        state.key_released(KeyCode::A);
        let late = state.key_pressed(KeyCode::A, 1_500, 200);
        assert!(!late.double_tap);
    }

    #[test]
    fn test_press_of_key_still_marked_down_is_stale() {
        let state = SharedModifierState::new();
        state.key_pressed(KeyCode::R, 0, 200);

        // released while unfocused; the next press still counts
        let again = state.key_pressed(KeyCode::R, 5_000, 200);
        assert!(again.stale);
        assert!(!again.double_tap);
        assert_eq!(state.held_keys(), KeySet::from([KeyCode::R]));
    }

    #[test]
    fn test_double_tap_is_per_key() {
        let state = SharedModifierState::new();
        state.key_pressed(KeyCode::A, 0, 200);
        let other = state.key_pressed(KeyCode::B, 10, 200);
        assert!(!other.double_tap);
    }

    #[test]
    fn test_modifiers_are_not_held_keys() {
        let state = SharedModifierState::new();
        state.key_pressed(KeyCode::Shift, 0, 200);
        state.key_pressed(KeyCode::Windows, 0, 200);
        state.key_pressed(KeyCode::Q, 0, 200);

        assert!(state.shift_pressed());
        assert!(state.win_pressed());
        assert!(!state.meta_pressed());
        assert_eq!(state.physical_mask(), Mask::SHIFT | Mask::WIN);
        assert_eq!(state.held_keys(), KeySet::from([KeyCode::Q]));

        state.key_released(KeyCode::Shift);
        assert_eq!(state.physical_mask(), Mask::WIN);
        state.reset();
        assert!(state.held_keys().is_empty());
    }

    struct Window {
        id: ReceiverId,
        triggers: bool,
        dry_runs: AtomicUsize,
        handled: AtomicUsize,
        focused: AtomicUsize,
    }

    impl Window {
        fn new(triggers: bool) -> Arc<Self> {
            Arc::new(Self {
                id: ReceiverId::next(),
                triggers,
                dry_runs: AtomicUsize::new(0),
                handled: AtomicUsize::new(0),
                focused: AtomicUsize::new(0),
            })
        }
    }

    impl KeyPressReceiver for Window {
        fn receiver_id(&self) -> ReceiverId {
            self.id
        }

        fn handle_key_pressed(
            &self,
            _mask: Mask,
            _double_tap: bool,
            _held: &KeySet,
            dry_run: bool,
        ) -> bool {
            if dry_run {
                self.dry_runs.fetch_add(1, Ordering::SeqCst);
            } else {
                self.handled.fetch_add(1, Ordering::SeqCst);
            }
            self.triggers
        }

        fn request_focus(&self) {
            self.focused.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_press_goes_to_origin_without_active_window() {
        let coordinator = CrossWindowCoordinator::new();
        let origin = Window::new(true);
        coordinator.dispatch_key_pressed(origin.as_ref(), Mask::empty(), false, &KeySet::new());
        assert_eq!(origin.handled.load(Ordering::SeqCst), 1);
        assert_eq!(origin.dry_runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_press_routes_to_active_window_after_dry_run() {
        let coordinator = CrossWindowCoordinator::new();
        let origin = Window::new(true);
        let under_pointer = Window::new(true);
        let receiver: Arc<dyn KeyPressReceiver> = under_pointer.clone();
        coordinator.activate(&receiver);

        let triggered =
            coordinator.dispatch_key_pressed(origin.as_ref(), Mask::empty(), false, &KeySet::new());
        assert!(triggered);
        assert_eq!(under_pointer.dry_runs.load(Ordering::SeqCst), 1);
        assert_eq!(under_pointer.focused.load(Ordering::SeqCst), 1);
        assert_eq!(under_pointer.handled.load(Ordering::SeqCst), 1);
        assert_eq!(origin.handled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_declined_dry_run_falls_back_to_origin() {
        let coordinator = CrossWindowCoordinator::new();
        let origin = Window::new(true);
        let under_pointer = Window::new(false);
        let receiver: Arc<dyn KeyPressReceiver> = under_pointer.clone();
        coordinator.activate(&receiver);

        coordinator.dispatch_key_pressed(origin.as_ref(), Mask::empty(), false, &KeySet::new());
        assert_eq!(under_pointer.handled.load(Ordering::SeqCst), 0);
        assert_eq!(under_pointer.focused.load(Ordering::SeqCst), 0);
        assert_eq!(origin.handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deactivate_only_clears_matching_receiver() {
        let coordinator = CrossWindowCoordinator::new();
        let a = Window::new(true);
        let b = Window::new(true);
        let receiver: Arc<dyn KeyPressReceiver> = a.clone();
        coordinator.activate(&receiver);

        coordinator.deactivate(b.as_ref());
        assert_eq!(coordinator.active_receiver(), Some(a.id));
        coordinator.deactivate(a.as_ref());
        assert_eq!(coordinator.active_receiver(), None);
    }
}
