//! Turning raw window input into behaviour callbacks
//!
//! - [`InputCollector`]: winit window events → [`HostEvent`]s
//! - [`DispatchIndex`]: binding tables → five typed lookup bins
//! - [`EventDispatcher`]: per-window state machine driving the behaviours
//! - [`CrossWindowCoordinator`]: modifier state and key routing across windows

mod collector;
mod coordinator;
mod dispatcher;
mod events;
mod index;

pub use collector::InputCollector;
pub use coordinator::{
    CrossWindowCoordinator, KeyPress, KeyPressReceiver, ReceiverId, SharedModifierState,
};
pub use dispatcher::{ActiveDragSet, EventDispatcher, FocusRequest};
pub use events::{HostEvent, MouseButton, Point};
pub use index::{Bound, DispatchIndex};
