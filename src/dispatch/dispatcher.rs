//! Event → behaviour state machine for one window

use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::coordinator::{
    CrossWindowCoordinator, KeyPressReceiver, ReceiverId, SharedModifierState,
};
use super::events::{HostEvent, MouseButton, Point};
use super::index::{Bound, DispatchIndex};
use crate::bindings::{Behaviour, BehaviourMap, DragBehaviour, InputTriggerMap, SharedSource};
use crate::config::DispatchConfig;
use crate::trigger::{KeyCode, KeySet, Mask, Trigger};

/// Host hook asking for keyboard focus on this dispatcher's window
pub type FocusRequest = Box<dyn Fn() + Send + Sync>;

/// Drags between `init` and `end`, split by how they were started
#[derive(Default)]
pub struct ActiveDragSet {
    button: Vec<Bound<dyn DragBehaviour>>,
    key: Vec<Bound<dyn DragBehaviour>>,
}

impl ActiveDragSet {
    pub fn button_drags(&self) -> usize {
        self.button.len()
    }

    pub fn key_drags(&self) -> usize {
        self.key.len()
    }

    fn contains(list: &[Bound<dyn DragBehaviour>], drag: &Bound<dyn DragBehaviour>) -> bool {
        list.iter().any(|active| active.same_binding(drag))
    }

    /// Removes and returns the drags whose trigger no longer holds
    fn terminate(
        list: &mut Vec<Bound<dyn DragBehaviour>>,
        mask: Mask,
        held: &KeySet,
    ) -> Vec<Bound<dyn DragBehaviour>> {
        let (alive, ended) = std::mem::take(list)
            .into_iter()
            .partition(|drag| drag.trigger.matches_for_termination(mask, held));
        *list = alive;
        ended
    }

    fn take_all(&mut self) -> Vec<Bound<dyn DragBehaviour>> {
        let mut all = std::mem::take(&mut self.button);
        all.append(&mut self.key);
        all
    }
}

/// Which event a mask is computed for
#[derive(Debug, Clone, Copy)]
enum MaskSource {
    /// Press or click: the button counts as down
    ButtonDown(MouseButton),
    /// Release: the button no longer counts, so drags can end
    ButtonUp(MouseButton),
    Wheel,
    Key,
}

struct DispatchState {
    triggers: SharedSource<Trigger, IndexSet<String>>,
    behaviours: SharedSource<String, Behaviour>,
    index: DispatchIndex,
    held_keys: KeySet,
    pointer: Point,
    active: ActiveDragSet,
}

impl DispatchState {
    fn refresh(&mut self) {
        self.index
            .refresh(self.triggers.as_ref(), self.behaviours.as_ref());
    }
}

/// Resolves one window's raw input into behaviour callbacks
///
/// Behaviour callbacks are invoked after the dispatcher's own lock is
/// released, so a behaviour may query the dispatcher, but callbacks still
/// run synchronously inside [`EventDispatcher::handle`].
pub struct EventDispatcher {
    id: ReceiverId,
    this: Weak<EventDispatcher>,
    settings: DispatchConfig,
    modifiers: Arc<SharedModifierState>,
    coordinator: Option<Arc<CrossWindowCoordinator>>,
    focus_request: Mutex<Option<FocusRequest>>,
    state: Mutex<DispatchState>,
}

impl EventDispatcher {
    /// Dispatcher with its own private modifier state
    pub fn new(settings: DispatchConfig) -> Arc<Self> {
        Self::build(settings, Arc::new(SharedModifierState::new()), None)
    }

    /// Dispatcher sharing modifier state and key-press routing with other windows
    pub fn with_coordinator(
        settings: DispatchConfig,
        coordinator: Arc<CrossWindowCoordinator>,
    ) -> Arc<Self> {
        let modifiers = coordinator.modifiers().clone();
        Self::build(settings, modifiers, Some(coordinator))
    }

    fn build(
        settings: DispatchConfig,
        modifiers: Arc<SharedModifierState>,
        coordinator: Option<Arc<CrossWindowCoordinator>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: ReceiverId::next(),
            this: this.clone(),
            settings,
            modifiers,
            coordinator,
            focus_request: Mutex::new(None),
            state: Mutex::new(DispatchState {
                triggers: Arc::new(InputTriggerMap::new()),
                behaviours: Arc::new(BehaviourMap::new()),
                index: DispatchIndex::new(),
                held_keys: KeySet::new(),
                pointer: Point::default(),
                active: ActiveDragSet::default(),
            }),
        })
    }

    /// Replaces the tables this dispatcher resolves input against
    pub fn set_input_maps(
        &self,
        triggers: SharedSource<Trigger, IndexSet<String>>,
        behaviours: SharedSource<String, Behaviour>,
    ) {
        let mut state = self.state.lock();
        state.triggers = triggers;
        state.behaviours = behaviours;
        state.index.clear();
    }

    /// Installs the host hook used when a routed key press needs focus here
    pub fn set_focus_request(&self, request: impl Fn() + Send + Sync + 'static) {
        *self.focus_request.lock() = Some(Box::new(request));
    }

    pub fn id(&self) -> ReceiverId {
        self.id
    }

    pub fn modifiers(&self) -> &Arc<SharedModifierState> {
        &self.modifiers
    }

    /// Non-modifier keys this window believes are held
    pub fn held_keys(&self) -> KeySet {
        self.state.lock().held_keys.clone()
    }

    /// (button-initiated, key-initiated) active drag counts
    pub fn active_drags(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.active.button_drags(), state.active.key_drags())
    }

    /// Number of dispatch index rebuilds so far
    pub fn index_rebuilds(&self) -> u64 {
        self.state.lock().index.rebuilds()
    }

    /// Handles one host event
    pub fn handle(&self, event: &HostEvent) {
        trace!(?event, "Dispatching");
        match *event {
            HostEvent::PointerPressed {
                button,
                pos,
                modifiers,
                click_count,
                ..
            } => self.pointer_pressed(button, pos, modifiers, click_count),
            HostEvent::PointerReleased {
                button,
                pos,
                modifiers,
                click_count,
                ..
            } => self.pointer_released(button, pos, modifiers, click_count),
            HostEvent::PointerDragged { pos, .. } => self.pointer_dragged(pos),
            HostEvent::PointerMoved { pos, .. } => self.pointer_moved(pos),
            HostEvent::PointerClicked {
                button,
                pos,
                modifiers,
                click_count,
                ..
            } => self.pointer_clicked(button, pos, modifiers, click_count),
            HostEvent::Wheel {
                pos,
                modifiers,
                rotation,
                shift_down,
                ..
            } => self.wheel(pos, modifiers, rotation, shift_down),
            HostEvent::KeyPressed {
                key,
                modifiers,
                repeat,
                when,
            } => self.key_pressed(key, modifiers, repeat, when),
            HostEvent::KeyReleased { key, modifiers, .. } => self.key_released(key, modifiers),
            HostEvent::FocusGained => self.focus_gained(),
            HostEvent::FocusLost => self.focus_lost(),
            HostEvent::PointerEntered { pos } => self.pointer_entered(pos),
            HostEvent::PointerExited { pos } => self.pointer_exited(pos),
        }
    }

    /// Ends every active drag at the last pointer position and forgets held keys
    pub fn reset(&self) {
        let (ended, pointer) = {
            let mut state = self.state.lock();
            state.held_keys.clear();
            (state.active.take_all(), state.pointer)
        };
        end_drags(ended, pointer);
    }

    /// Canonical mask for an event
    ///
    /// Shift, meta and win come from the physically-held state because the
    /// host sets them for unrelated reasons (horizontal wheel, emulated
    /// secondary click). The event's own button counts as down for presses
    /// and clicks but not for releases, and wheel events carry no buttons.
    fn normalize(&self, raw: Mask, source: MaskSource, click_count: u32) -> Mask {
        let foreign = Mask::PHYSICAL | Mask::DOUBLE_CLICK | Mask::SCROLL | Mask::NOT_MAPPED;
        let mut mask = (raw - foreign) | self.modifiers.physical_mask();

        match source {
            MaskSource::ButtonDown(button) => mask |= button.mask(),
            MaskSource::ButtonUp(button) => mask -= button.mask(),
            MaskSource::Wheel => {
                mask -= Mask::BUTTONS;
                mask |= Mask::SCROLL;
            }
            MaskSource::Key => {}
        }

        if click_count > 1 {
            mask |= Mask::DOUBLE_CLICK;
        }
        mask
    }

    fn pointer_pressed(&self, button: MouseButton, pos: Point, raw: Mask, click_count: u32) {
        let mask = self.normalize(raw, MaskSource::ButtonDown(button), click_count);
        let started = {
            let mut state = self.state.lock();
            state.refresh();
            state.pointer = pos;

            let started: Vec<_> = state
                .index
                .button_drags()
                .iter()
                .filter(|drag| drag.trigger.matches(mask, &state.held_keys))
                .filter(|drag| !ActiveDragSet::contains(&state.active.button, drag))
                .cloned()
                .collect();
            state.active.button.extend(started.iter().cloned());
            started
        };

        for drag in started {
            debug!(trigger = %drag.trigger, x = pos.x, y = pos.y, "Button drag started");
            drag.behaviour.init(pos.x, pos.y);
        }
    }

    fn pointer_dragged(&self, pos: Point) {
        let active = {
            let mut state = self.state.lock();
            state.pointer = pos;
            state.active.button.clone()
        };
        for drag in active {
            drag.behaviour.drag(pos.x, pos.y);
        }
    }

    fn pointer_moved(&self, pos: Point) {
        let active = {
            let mut state = self.state.lock();
            state.pointer = pos;
            state.active.key.clone()
        };
        for drag in active {
            drag.behaviour.drag(pos.x, pos.y);
        }
    }

    fn pointer_released(&self, button: MouseButton, pos: Point, raw: Mask, click_count: u32) {
        let mask = self.normalize(raw, MaskSource::ButtonUp(button), click_count);
        let ended = {
            let mut state = self.state.lock();
            state.pointer = pos;
            let held = state.held_keys.clone();
            ActiveDragSet::terminate(&mut state.active.button, mask, &held)
        };
        end_drags(ended, pos);
    }

    fn pointer_clicked(&self, button: MouseButton, pos: Point, raw: Mask, click_count: u32) {
        let mask = self.normalize(raw, MaskSource::ButtonDown(button), click_count);
        let single = mask - Mask::DOUBLE_CLICK;
        let clicked: Vec<_> = {
            let mut state = self.state.lock();
            state.refresh();
            state.pointer = pos;
            let held = &state.held_keys;
            state
                .index
                .button_clicks()
                .iter()
                .filter(|click| {
                    click.trigger.matches(mask, held)
                        || (single != mask && click.trigger.matches(single, held))
                })
                .cloned()
                .collect()
        };

        for click in clicked {
            trace!(trigger = %click.trigger, "Click");
            click.behaviour.click(pos.x, pos.y);
        }
    }

    fn wheel(&self, pos: Point, raw: Mask, rotation: f64, shift_down: bool) {
        let mask = self.normalize(raw, MaskSource::Wheel, 0);
        // The host reports horizontal scrolling as shift-down
        let is_horizontal = shift_down && !self.modifiers.shift_pressed();
        let scrolled: Vec<_> = {
            let mut state = self.state.lock();
            state.refresh();
            state.pointer = pos;
            let held = &state.held_keys;
            state
                .index
                .scrolls()
                .iter()
                .filter(|scroll| scroll.trigger.matches(mask, held))
                .cloned()
                .collect()
        };

        for scroll in scrolled {
            trace!(trigger = %scroll.trigger, rotation, is_horizontal, "Scroll");
            scroll
                .behaviour
                .scroll(rotation, is_horizontal, pos.x, pos.y);
        }
    }

    fn key_pressed(&self, key: KeyCode, raw: Mask, repeat: bool, when: u64) {
        if repeat {
            trace!(?key, "Ignoring key repeat");
            return;
        }
        let press = self
            .modifiers
            .key_pressed(key, when, self.settings.double_tap_interval_ms);
        if press.stale {
            debug!(?key, "Key was still marked down; its release was missed");
        }

        let (mask, held) = {
            let mut state = self.state.lock();
            if !key.is_modifier() {
                state.held_keys.insert(key);
            }
            (self.normalize(raw, MaskSource::Key, 0), state.held_keys.clone())
        };

        match &self.coordinator {
            Some(coordinator) => {
                coordinator.dispatch_key_pressed(self, mask, press.double_tap, &held);
            }
            None => {
                self.handle_key_pressed(mask, press.double_tap, &held, false);
            }
        }
    }

    fn key_released(&self, key: KeyCode, raw: Mask) {
        self.modifiers.key_released(key);
        let mask = self.normalize(raw, MaskSource::Key, 0);
        let (ended, pointer) = {
            let mut state = self.state.lock();
            state.held_keys.remove(&key);
            let held = state.held_keys.clone();
            let ended = ActiveDragSet::terminate(&mut state.active.key, mask, &held);
            (ended, state.pointer)
        };
        end_drags(ended, pointer);
    }

    fn focus_gained(&self) {
        let held = self.modifiers.held_keys();
        debug!(?held, "Focus gained");
        self.state.lock().held_keys = held;
    }

    fn focus_lost(&self) {
        debug!("Focus lost");
        // Releases are not reported while unfocused; coordinator state is
        // shared with other windows and left alone
        if self.coordinator.is_none() {
            self.modifiers.reset();
        }
        self.reset();
    }

    fn pointer_entered(&self, pos: Point) {
        self.state.lock().pointer = pos;
        if let Some(coordinator) = &self.coordinator
            && let Some(this) = self.this.upgrade()
        {
            let receiver: Arc<dyn KeyPressReceiver> = this;
            coordinator.activate(&receiver);
        }
    }

    fn pointer_exited(&self, pos: Point) {
        self.state.lock().pointer = pos;
        if let Some(coordinator) = &self.coordinator {
            coordinator.deactivate(self);
        }
    }
}

impl KeyPressReceiver for EventDispatcher {
    fn receiver_id(&self) -> ReceiverId {
        self.id
    }

    fn handle_key_pressed(
        &self,
        mask: Mask,
        double_tap: bool,
        held: &KeySet,
        dry_run: bool,
    ) -> bool {
        let double_mask = mask | Mask::DOUBLE_CLICK;
        let matches = |trigger: &Trigger| {
            trigger.matches(mask, held) || (double_tap && trigger.matches(double_mask, held))
        };

        let (started, clicked, pointer) = {
            let mut state = self.state.lock();
            state.refresh();

            let started: Vec<_> = state
                .index
                .key_drags()
                .iter()
                .filter(|drag| matches(&drag.trigger))
                .filter(|drag| !ActiveDragSet::contains(&state.active.key, drag))
                .cloned()
                .collect();
            let clicked: Vec<_> = state
                .index
                .key_clicks()
                .iter()
                .filter(|click| matches(&click.trigger))
                .cloned()
                .collect();

            let triggered = !started.is_empty() || !clicked.is_empty();
            if dry_run {
                return triggered;
            }

            // Presses routed here from another window carry keys we never saw
            state.held_keys.extend(held.iter().copied());
            state.active.key.extend(started.iter().cloned());
            (started, clicked, state.pointer)
        };

        let triggered = !started.is_empty() || !clicked.is_empty();
        for drag in started {
            debug!(trigger = %drag.trigger, "Key drag started");
            drag.behaviour.init(pointer.x, pointer.y);
        }
        for click in clicked {
            trace!(trigger = %click.trigger, "Key click");
            click.behaviour.click(pointer.x, pointer.y);
        }
        triggered
    }

    fn request_focus(&self) {
        if let Some(request) = self.focus_request.lock().as_ref() {
            request();
        }
    }
}

fn end_drags(ended: Vec<Bound<dyn DragBehaviour>>, pos: Point) {
    for drag in ended {
        debug!(trigger = %drag.trigger, x = pos.x, y = pos.y, "Drag ended");
        drag.behaviour.end(pos.x, pos.y);
    }
}
