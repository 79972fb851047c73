//! Raw input events as delivered by the host windowing system

use crate::trigger::{KeyCode, Mask};

/// Pointer button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Trigger bit of this button (`button1`, `button2`, `button3`)
    pub fn mask(self) -> Mask {
        match self {
            Self::Left => Mask::BUTTON1,
            Self::Middle => Mask::BUTTON2,
            Self::Right => Mask::BUTTON3,
        }
    }
}

/// Position in window coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A discrete input event
///
/// `modifiers` are the host's raw flags: modifier bits plus the bits of
/// buttons held at the time of the event. Shift, meta and win bits are not
/// trusted; the dispatcher replaces them with the physically-held state.
/// `when` is a monotonically increasing timestamp in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Pointer button went down
    PointerPressed {
        button: MouseButton,
        pos: Point,
        modifiers: Mask,
        click_count: u32,
        when: u64,
    },

    /// Pointer button went up
    PointerReleased {
        button: MouseButton,
        pos: Point,
        modifiers: Mask,
        click_count: u32,
        when: u64,
    },

    /// Pointer moved with at least one button down
    PointerDragged {
        pos: Point,
        modifiers: Mask,
        when: u64,
    },

    /// Pointer moved with no button down
    PointerMoved {
        pos: Point,
        modifiers: Mask,
        when: u64,
    },

    /// Press and release without movement
    PointerClicked {
        button: MouseButton,
        pos: Point,
        modifiers: Mask,
        click_count: u32,
        when: u64,
    },

    /// Mouse wheel; `shift_down` is also how the host reports horizontal scrolling
    Wheel {
        pos: Point,
        modifiers: Mask,
        rotation: f64,
        shift_down: bool,
        when: u64,
    },

    KeyPressed {
        key: KeyCode,
        modifiers: Mask,
        /// Host-reported auto-repeat
        repeat: bool,
        when: u64,
    },

    KeyReleased {
        key: KeyCode,
        modifiers: Mask,
        when: u64,
    },

    FocusGained,
    FocusLost,

    /// Pointer entered the window
    PointerEntered { pos: Point },

    /// Pointer left the window
    PointerExited { pos: Point },
}
