//! Behaviour Bindings
//!
//! Maps pointer, wheel and keyboard input onto named interaction
//! behaviours (drags, clicks, scrolls) through layered, observable binding
//! tables, with modifier state and key routing shared across windows.
//!
//! ```
//! use behaviour_bindings::bindings::{BehaviourMap, ClickBehaviour, InputTriggerMap};
//! use behaviour_bindings::trigger::Trigger;
//!
//! struct Select;
//! impl ClickBehaviour for Select {
//!     fn click(&self, _x: i32, _y: i32) {}
//! }
//!
//! let triggers = InputTriggerMap::new();
//! triggers.bind(Trigger::parse("ctrl button1").unwrap(), "select");
//! let behaviours = BehaviourMap::new();
//! behaviours.register_click("select", Select);
//! assert_eq!(triggers.triggers_for("select").len(), 1);
//! ```

/// Layered trigger → name → behaviour tables
pub mod bindings;

/// Build-time information (git SHA, timestamp, target, etc.)
pub mod build_info;

/// Profile-based configuration
pub mod config;

/// Event dispatch: index, per-window dispatcher and cross-window coordination
pub mod dispatch;

pub mod error;

pub mod logging;

/// Trigger encoding, parsing and matching
pub mod trigger;

pub use error::BindingError;
