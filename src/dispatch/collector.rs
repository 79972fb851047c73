//! Translation of winit window events into host events

use std::time::Instant;

use tracing::trace;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

use super::events::{HostEvent, MouseButton, Point};
use crate::config::DispatchConfig;
use crate::trigger::{KeyCode, Mask};

/// Pixels per wheel click for pixel-precise scroll devices
const PIXELS_PER_LINE: f64 = 20.0;

#[derive(Debug, Clone, Copy)]
struct PendingClick {
    button: MouseButton,
    pos: Point,
    click_count: u32,
}

#[derive(Debug, Clone, Copy)]
struct LastPress {
    button: MouseButton,
    when: u64,
    click_count: u32,
}

/// Collects raw winit input for one window and produces [`HostEvent`]s
///
/// winit reports no clicks, click counts or timestamps, so they are
/// synthesized here: a release close enough to its press becomes a click,
/// and presses of the same button within the double-tap interval count up.
pub struct InputCollector {
    settings: DispatchConfig,
    scale_factor: f64,
    start: Instant,
    modifiers: Mask,
    buttons: Mask,
    pos: Point,
    pending_click: Option<PendingClick>,
    last_press: Option<LastPress>,
}

impl InputCollector {
    /// Creates a new input collector
    pub fn new(settings: DispatchConfig) -> Self {
        Self {
            settings,
            scale_factor: 1.0,
            start: Instant::now(),
            modifiers: Mask::empty(),
            buttons: Mask::empty(),
            pos: Point::default(),
            pending_click: None,
            last_press: None,
        }
    }

    /// Update scale factor (DPI scaling)
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        self.scale_factor = scale_factor;
    }

    /// Handle a winit window event
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> Vec<HostEvent> {
        let when = self.start.elapsed().as_millis() as u64;
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                vec![self.cursor_moved(position.x, position.y, when)]
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    _ => return Vec::new(),
                };
                match state {
                    ElementState::Pressed => vec![self.button_pressed(button, when)],
                    ElementState::Released => self.button_released(button, when),
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (*x as f64, *y as f64),
                    MouseScrollDelta::PixelDelta(pos) => {
                        (pos.x / PIXELS_PER_LINE, pos.y / PIXELS_PER_LINE)
                    }
                };
                self.wheel(x, y, when).into_iter().collect()
            }

            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                let mut mask = Mask::empty();
                mask.set(Mask::SHIFT, state.shift_key());
                mask.set(Mask::CTRL, state.control_key());
                mask.set(Mask::ALT, state.alt_key());
                let super_bit = if cfg!(target_os = "macos") {
                    Mask::META
                } else {
                    Mask::WIN
                };
                mask.set(super_bit, state.super_key());
                self.modifiers_changed(mask);
                Vec::new()
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return Vec::new();
                };
                let Some(key) = KeyCode::from_winit(code) else {
                    trace!(?code, "Unmapped key");
                    return Vec::new();
                };
                let pressed = event.state == ElementState::Pressed;
                vec![self.key(key, pressed, event.repeat, when)]
            }

            WindowEvent::Focused(true) => vec![HostEvent::FocusGained],
            WindowEvent::Focused(false) => {
                self.buttons = Mask::empty();
                self.pending_click = None;
                vec![HostEvent::FocusLost]
            }

            WindowEvent::CursorEntered { .. } => vec![HostEvent::PointerEntered { pos: self.pos }],
            WindowEvent::CursorLeft { .. } => vec![HostEvent::PointerExited { pos: self.pos }],

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.set_scale_factor(*scale_factor);
                Vec::new()
            }

            _ => Vec::new(),
        }
    }

    /// Raw host flags: keyboard modifiers plus held buttons
    fn raw(&self) -> Mask {
        self.modifiers | self.buttons
    }

    /// Cursor moved to a position given in physical pixels
    pub fn cursor_moved(&mut self, x: f64, y: f64, when: u64) -> HostEvent {
        self.pos = Point::new(
            (x / self.scale_factor).round() as i32,
            (y / self.scale_factor).round() as i32,
        );

        if let Some(pending) = self.pending_click {
            let dx = (self.pos.x - pending.pos.x) as f64;
            let dy = (self.pos.y - pending.pos.y) as f64;
            if dx.hypot(dy) > self.settings.click_slop_px {
                self.pending_click = None;
            }
        }

        if self.buttons.is_empty() {
            HostEvent::PointerMoved {
                pos: self.pos,
                modifiers: self.raw(),
                when,
            }
        } else {
            HostEvent::PointerDragged {
                pos: self.pos,
                modifiers: self.raw(),
                when,
            }
        }
    }

    pub fn button_pressed(&mut self, button: MouseButton, when: u64) -> HostEvent {
        let click_count = match self.last_press {
            Some(last)
                if last.button == button
                    && when.saturating_sub(last.when) < self.settings.double_tap_interval_ms =>
            {
                last.click_count + 1
            }
            _ => 1,
        };
        self.last_press = Some(LastPress {
            button,
            when,
            click_count,
        });
        self.pending_click = Some(PendingClick {
            button,
            pos: self.pos,
            click_count,
        });

        let event = HostEvent::PointerPressed {
            button,
            pos: self.pos,
            modifiers: self.raw(),
            click_count,
            when,
        };
        self.buttons |= button.mask();
        event
    }

    /// Release, followed by a click if the pointer stayed put
    pub fn button_released(&mut self, button: MouseButton, when: u64) -> Vec<HostEvent> {
        self.buttons -= button.mask();
        let click_count = self.last_press.map_or(1, |last| last.click_count);

        let mut events = vec![HostEvent::PointerReleased {
            button,
            pos: self.pos,
            modifiers: self.raw(),
            click_count,
            when,
        }];
        if let Some(pending) = self.pending_click.take()
            && pending.button == button
        {
            events.push(HostEvent::PointerClicked {
                button,
                pos: self.pos,
                modifiers: self.raw(),
                click_count: pending.click_count,
                when,
            });
        }
        events
    }

    /// Wheel movement in lines; winit reports positive values for up/left
    pub fn wheel(&mut self, x: f64, y: f64, when: u64) -> Option<HostEvent> {
        let horizontal = y == 0.0 && x != 0.0;
        let rotation = if horizontal { -x } else { -y };
        if rotation == 0.0 {
            return None;
        }
        let mut modifiers = self.raw();
        if horizontal {
            modifiers |= Mask::SHIFT;
        }
        Some(HostEvent::Wheel {
            pos: self.pos,
            modifiers,
            rotation,
            shift_down: modifiers.contains(Mask::SHIFT),
            when,
        })
    }

    pub fn modifiers_changed(&mut self, modifiers: Mask) {
        self.modifiers = modifiers;
    }

    pub fn key(&mut self, key: KeyCode, pressed: bool, repeat: bool, when: u64) -> HostEvent {
        if pressed {
            HostEvent::KeyPressed {
                key,
                modifiers: self.raw(),
                repeat,
                when,
            }
        } else {
            HostEvent::KeyReleased {
                key,
                modifiers: self.raw(),
                when,
            }
        }
    }

    /// Last known pointer position in logical pixels
    pub fn pos(&self) -> Point {
        self.pos
    }
}

impl Default for InputCollector {
    fn default() -> Self {
        Self::new(DispatchConfig::default())
    }
}
