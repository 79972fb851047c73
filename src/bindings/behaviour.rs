//! Behaviour traits and the name → behaviour table

use std::fmt;
use std::sync::Arc;

use super::table::{ChainValue, ChainedTable};

/// Behaviour with a press-move-release lifecycle
///
/// Callbacks run synchronously on the dispatch thread and must not block.
pub trait DragBehaviour: Send + Sync {
    /// Called once when the trigger starts matching
    fn init(&self, x: i32, y: i32);

    /// Called for every pointer movement while active
    fn drag(&self, x: i32, y: i32);

    /// Called once when the trigger stops matching
    fn end(&self, x: i32, y: i32);
}

/// Behaviour fired once per matching click or key press
pub trait ClickBehaviour: Send + Sync {
    fn click(&self, x: i32, y: i32);
}

/// Behaviour fired for matching wheel events
pub trait ScrollBehaviour: Send + Sync {
    /// `rotation` is in (possibly fractional) wheel clicks: negative means
    /// up (or left), positive down (or right).
    fn scroll(&self, rotation: f64, is_horizontal: bool, x: i32, y: i32);
}

/// Runtime tag of a behaviour, used to pick dispatch bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviourKind {
    Drag,
    Click,
    Scroll,
}

/// A registered behaviour
#[derive(Clone)]
pub enum Behaviour {
    Drag(Arc<dyn DragBehaviour>),
    Click(Arc<dyn ClickBehaviour>),
    Scroll(Arc<dyn ScrollBehaviour>),
}

impl Behaviour {
    pub fn drag(behaviour: impl DragBehaviour + 'static) -> Self {
        Self::Drag(Arc::new(behaviour))
    }

    pub fn click(behaviour: impl ClickBehaviour + 'static) -> Self {
        Self::Click(Arc::new(behaviour))
    }

    pub fn scroll(behaviour: impl ScrollBehaviour + 'static) -> Self {
        Self::Scroll(Arc::new(behaviour))
    }

    pub fn kind(&self) -> BehaviourKind {
        match self {
            Self::Drag(_) => BehaviourKind::Drag,
            Self::Click(_) => BehaviourKind::Click,
            Self::Scroll(_) => BehaviourKind::Scroll,
        }
    }
}

impl fmt::Debug for Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Behaviour::{:?}", self.kind())
    }
}

/// A local behaviour replaces whatever the parent registered under the same name
impl ChainValue<String> for Behaviour {
    fn inherit(self, _parent: Self) -> Self {
        self
    }
}

/// Behaviour name → behaviour
pub type BehaviourMap = ChainedTable<String, Behaviour>;

impl BehaviourMap {
    /// Registers `behaviour` under `name`, replacing a previous local entry
    pub fn register(&self, name: impl Into<String>, behaviour: Behaviour) {
        self.put(name.into(), behaviour);
    }

    pub fn register_drag(
        &self,
        name: impl Into<String>,
        behaviour: impl DragBehaviour + 'static,
    ) {
        self.register(name, Behaviour::drag(behaviour));
    }

    pub fn register_click(
        &self,
        name: impl Into<String>,
        behaviour: impl ClickBehaviour + 'static,
    ) {
        self.register(name, Behaviour::click(behaviour));
    }

    pub fn register_scroll(
        &self,
        name: impl Into<String>,
        behaviour: impl ScrollBehaviour + 'static,
    ) {
        self.register(name, Behaviour::scroll(behaviour));
    }
}
