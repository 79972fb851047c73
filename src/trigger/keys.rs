//! Physical key codes and the key-name table used by trigger descriptors

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;

/// Set of non-modifier keys held at the same time
pub type KeySet = BTreeSet<KeyCode>;

/// Physical key identifier
///
/// Ordering follows declaration order and is what gives formatted
/// descriptors a stable key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    // Letters
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    // Numbers
    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    // Arrows and navigation
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Space,
    Enter,
    Escape,
    Backspace,
    Tab,
    Insert,
    Delete,

    // Punctuation
    Comma,
    Period,
    Slash,
    Semicolon,
    Quote,
    Minus,
    Equals,
    OpenBracket,
    CloseBracket,
    BackSlash,
    BackQuote,

    // Numpad
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    Add,
    Subtract,
    Multiply,
    Divide,
    Decimal,

    // Modifier keys (tracked through modifier state, never held-key sets)
    Shift,
    Control,
    Alt,
    AltGraph,
    Meta,
    Windows,
}

/// Descriptor names, in declaration order
const KEY_NAMES: &[(KeyCode, &str)] = &[
    (KeyCode::A, "A"),
    (KeyCode::B, "B"),
    (KeyCode::C, "C"),
    (KeyCode::D, "D"),
    (KeyCode::E, "E"),
    (KeyCode::F, "F"),
    (KeyCode::G, "G"),
    (KeyCode::H, "H"),
    (KeyCode::I, "I"),
    (KeyCode::J, "J"),
    (KeyCode::K, "K"),
    (KeyCode::L, "L"),
    (KeyCode::M, "M"),
    (KeyCode::N, "N"),
    (KeyCode::O, "O"),
    (KeyCode::P, "P"),
    (KeyCode::Q, "Q"),
    (KeyCode::R, "R"),
    (KeyCode::S, "S"),
    (KeyCode::T, "T"),
    (KeyCode::U, "U"),
    (KeyCode::V, "V"),
    (KeyCode::W, "W"),
    (KeyCode::X, "X"),
    (KeyCode::Y, "Y"),
    (KeyCode::Z, "Z"),
    (KeyCode::Num0, "0"),
    (KeyCode::Num1, "1"),
    (KeyCode::Num2, "2"),
    (KeyCode::Num3, "3"),
    (KeyCode::Num4, "4"),
    (KeyCode::Num5, "5"),
    (KeyCode::Num6, "6"),
    (KeyCode::Num7, "7"),
    (KeyCode::Num8, "8"),
    (KeyCode::Num9, "9"),
    (KeyCode::F1, "F1"),
    (KeyCode::F2, "F2"),
    (KeyCode::F3, "F3"),
    (KeyCode::F4, "F4"),
    (KeyCode::F5, "F5"),
    (KeyCode::F6, "F6"),
    (KeyCode::F7, "F7"),
    (KeyCode::F8, "F8"),
    (KeyCode::F9, "F9"),
    (KeyCode::F10, "F10"),
    (KeyCode::F11, "F11"),
    (KeyCode::F12, "F12"),
    (KeyCode::Left, "LEFT"),
    (KeyCode::Right, "RIGHT"),
    (KeyCode::Up, "UP"),
    (KeyCode::Down, "DOWN"),
    (KeyCode::Home, "HOME"),
    (KeyCode::End, "END"),
    (KeyCode::PageUp, "PAGE_UP"),
    (KeyCode::PageDown, "PAGE_DOWN"),
    (KeyCode::Space, "SPACE"),
    (KeyCode::Enter, "ENTER"),
    (KeyCode::Escape, "ESCAPE"),
    (KeyCode::Backspace, "BACK_SPACE"),
    (KeyCode::Tab, "TAB"),
    (KeyCode::Insert, "INSERT"),
    (KeyCode::Delete, "DELETE"),
    (KeyCode::Comma, "COMMA"),
    (KeyCode::Period, "PERIOD"),
    (KeyCode::Slash, "SLASH"),
    (KeyCode::Semicolon, "SEMICOLON"),
    (KeyCode::Quote, "QUOTE"),
    (KeyCode::Minus, "MINUS"),
    (KeyCode::Equals, "EQUALS"),
    (KeyCode::OpenBracket, "OPEN_BRACKET"),
    (KeyCode::CloseBracket, "CLOSE_BRACKET"),
    (KeyCode::BackSlash, "BACK_SLASH"),
    (KeyCode::BackQuote, "BACK_QUOTE"),
    (KeyCode::Numpad0, "NUMPAD0"),
    (KeyCode::Numpad1, "NUMPAD1"),
    (KeyCode::Numpad2, "NUMPAD2"),
    (KeyCode::Numpad3, "NUMPAD3"),
    (KeyCode::Numpad4, "NUMPAD4"),
    (KeyCode::Numpad5, "NUMPAD5"),
    (KeyCode::Numpad6, "NUMPAD6"),
    (KeyCode::Numpad7, "NUMPAD7"),
    (KeyCode::Numpad8, "NUMPAD8"),
    (KeyCode::Numpad9, "NUMPAD9"),
    (KeyCode::Add, "ADD"),
    (KeyCode::Subtract, "SUBTRACT"),
    (KeyCode::Multiply, "MULTIPLY"),
    (KeyCode::Divide, "DIVIDE"),
    (KeyCode::Decimal, "DECIMAL"),
];

/// Upper-cased name → key code
static BY_NAME: Lazy<HashMap<&'static str, KeyCode>> =
    Lazy::new(|| KEY_NAMES.iter().map(|&(code, name)| (name, code)).collect());

impl KeyCode {
    /// Resolves a descriptor token (case-insensitive) to a key code
    ///
    /// Modifier keys are not resolvable by name; descriptors use the
    /// modifier keywords for them instead.
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name.to_ascii_uppercase().as_str()).copied()
    }

    /// Canonical descriptor name, `None` for modifier keys
    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(code, _)| *code == self)
            .map(|&(_, name)| name)
    }

    /// Returns true for keys reported through modifier state
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::Shift | Self::Control | Self::Alt | Self::AltGraph | Self::Meta | Self::Windows
        )
    }

    /// Converts a winit physical key code, `None` for keys without a mapping
    pub fn from_winit(key: winit::keyboard::KeyCode) -> Option<Self> {
        use winit::keyboard::KeyCode as WK;
        let code = match key {
            WK::KeyA => Self::A,
            WK::KeyB => Self::B,
            WK::KeyC => Self::C,
            WK::KeyD => Self::D,
            WK::KeyE => Self::E,
            WK::KeyF => Self::F,
            WK::KeyG => Self::G,
            WK::KeyH => Self::H,
            WK::KeyI => Self::I,
            WK::KeyJ => Self::J,
            WK::KeyK => Self::K,
            WK::KeyL => Self::L,
            WK::KeyM => Self::M,
            WK::KeyN => Self::N,
            WK::KeyO => Self::O,
            WK::KeyP => Self::P,
            WK::KeyQ => Self::Q,
            WK::KeyR => Self::R,
            WK::KeyS => Self::S,
            WK::KeyT => Self::T,
            WK::KeyU => Self::U,
            WK::KeyV => Self::V,
            WK::KeyW => Self::W,
            WK::KeyX => Self::X,
            WK::KeyY => Self::Y,
            WK::KeyZ => Self::Z,

            WK::Digit0 => Self::Num0,
            WK::Digit1 => Self::Num1,
            WK::Digit2 => Self::Num2,
            WK::Digit3 => Self::Num3,
            WK::Digit4 => Self::Num4,
            WK::Digit5 => Self::Num5,
            WK::Digit6 => Self::Num6,
            WK::Digit7 => Self::Num7,
            WK::Digit8 => Self::Num8,
            WK::Digit9 => Self::Num9,

            WK::F1 => Self::F1,
            WK::F2 => Self::F2,
            WK::F3 => Self::F3,
            WK::F4 => Self::F4,
            WK::F5 => Self::F5,
            WK::F6 => Self::F6,
            WK::F7 => Self::F7,
            WK::F8 => Self::F8,
            WK::F9 => Self::F9,
            WK::F10 => Self::F10,
            WK::F11 => Self::F11,
            WK::F12 => Self::F12,

            WK::ArrowLeft => Self::Left,
            WK::ArrowRight => Self::Right,
            WK::ArrowUp => Self::Up,
            WK::ArrowDown => Self::Down,
            WK::Home => Self::Home,
            WK::End => Self::End,
            WK::PageUp => Self::PageUp,
            WK::PageDown => Self::PageDown,

            WK::Space => Self::Space,
            WK::Enter | WK::NumpadEnter => Self::Enter,
            WK::Escape => Self::Escape,
            WK::Backspace => Self::Backspace,
            WK::Tab => Self::Tab,
            WK::Insert => Self::Insert,
            WK::Delete => Self::Delete,

            WK::Comma => Self::Comma,
            WK::Period => Self::Period,
            WK::Slash => Self::Slash,
            WK::Semicolon => Self::Semicolon,
            WK::Quote => Self::Quote,
            WK::Minus => Self::Minus,
            WK::Equal => Self::Equals,
            WK::BracketLeft => Self::OpenBracket,
            WK::BracketRight => Self::CloseBracket,
            WK::Backslash => Self::BackSlash,
            WK::Backquote => Self::BackQuote,

            WK::Numpad0 => Self::Numpad0,
            WK::Numpad1 => Self::Numpad1,
            WK::Numpad2 => Self::Numpad2,
            WK::Numpad3 => Self::Numpad3,
            WK::Numpad4 => Self::Numpad4,
            WK::Numpad5 => Self::Numpad5,
            WK::Numpad6 => Self::Numpad6,
            WK::Numpad7 => Self::Numpad7,
            WK::Numpad8 => Self::Numpad8,
            WK::Numpad9 => Self::Numpad9,
            WK::NumpadAdd => Self::Add,
            WK::NumpadSubtract => Self::Subtract,
            WK::NumpadMultiply => Self::Multiply,
            WK::NumpadDivide => Self::Divide,
            WK::NumpadDecimal => Self::Decimal,

            WK::ShiftLeft | WK::ShiftRight => Self::Shift,
            WK::ControlLeft | WK::ControlRight => Self::Control,
            WK::AltLeft => Self::Alt,
            WK::AltRight => Self::AltGraph,
            WK::SuperLeft | WK::SuperRight => Self::Windows,
            WK::Meta => Self::Meta,

            _ => return None,
        };
        Some(code)
    }
}
