pub mod dispatcher;
pub mod types;

use std::any::Any;
use std::fmt;

/// Type for listener identifiers
pub type EventId = u64;

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Get the name of this event
    fn name(&self) -> &'static str;

    /// Narrower channel this event is also delivered on.
    ///
    /// Listeners registered with [`EventDispatcher::listen_scoped`] only see
    /// events whose scope equals theirs.
    fn scope(&self) -> Option<&str> {
        None
    }

    /// Clone this event
    fn clone_event(&self) -> Box<dyn Event>;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Synchronous event listener
pub type EventHandler = Box<dyn Fn(&dyn Event) + Send + Sync>;

/// Re-export important types
pub use dispatcher::{EventDispatcher, SharedEventDispatcher};
pub use types::{CatalogEvent, ExtensionEvent, LifecycleStage};
