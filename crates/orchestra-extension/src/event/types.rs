use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::event::Event;
use crate::plugin_system::manifest::PluginDescriptor;

/// Lifecycle transition an extension goes through after registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    /// Autoload entries and bootstrap ran
    Started,
    /// The batch containing the extension was booted
    Booted,
    /// The extension was finished at shutdown
    Done,
}

impl LifecycleStage {
    /// Event name dispatched for this stage
    pub fn event_name(&self) -> &'static str {
        match self {
            LifecycleStage::Started => "extension.started",
            LifecycleStage::Booted => "extension.booted",
            LifecycleStage::Done => "extension.done",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleStage::Started => write!(f, "started"),
            LifecycleStage::Booted => write!(f, "booted"),
            LifecycleStage::Done => write!(f, "done"),
        }
    }
}

/// Lifecycle notification for a single extension.
///
/// Delivered once per transition: to listeners of the stage's event name, then
/// to listeners scoped to the extension name.
#[derive(Debug, Clone)]
pub struct ExtensionEvent {
    pub stage: LifecycleStage,
    pub name: String,
    pub descriptor: Arc<PluginDescriptor>,
}

impl ExtensionEvent {
    pub fn new(stage: LifecycleStage, descriptor: Arc<PluginDescriptor>) -> Self {
        Self {
            stage,
            name: descriptor.name.clone(),
            descriptor,
        }
    }
}

impl Event for ExtensionEvent {
    fn name(&self) -> &'static str {
        self.stage.event_name()
    }

    fn scope(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Events fired by the catalog itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// Discovery is about to scan the search roots
    Detecting,
    /// Active extensions are about to be registered
    Attaching,
    /// The registered batch was booted
    Booted,
    /// Assets and migrations of an extension were published
    Publishing { name: String },
}

impl Event for CatalogEvent {
    fn name(&self) -> &'static str {
        match self {
            CatalogEvent::Detecting => "orchestra.extension.detecting",
            CatalogEvent::Attaching => "orchestra.extension.attaching",
            CatalogEvent::Booted => "orchestra.extension.booted",
            CatalogEvent::Publishing { .. } => "orchestra.publishing",
        }
    }

    fn scope(&self) -> Option<&str> {
        match self {
            CatalogEvent::Publishing { name } => Some(name),
            _ => None,
        }
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct TestEvent {
    pub name: &'static str,
    pub scope: Option<String>,
}

#[cfg(test)]
impl TestEvent {
    pub fn new(name: &'static str) -> Self {
        TestEvent { name, scope: None }
    }

    pub fn scoped(name: &'static str, scope: &str) -> Self {
        TestEvent { name, scope: Some(scope.to_string()) }
    }
}

#[cfg(test)]
impl Event for TestEvent {
    fn name(&self) -> &'static str {
        self.name
    }

    fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    fn clone_event(&self) -> Box<dyn Event> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
