use std::collections::HashMap;
use std::sync::Arc;

use crate::plugin_system::manifest::PluginDescriptor;

/// Ordered collection of extension descriptors keyed by name.
///
/// Iteration follows first-insertion order. Inserting an existing name
/// replaces the descriptor but keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct Extensions {
    entries: Vec<Arc<PluginDescriptor>>,
    index: HashMap<String, usize>,
}

impl Extensions {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor. Returns the descriptor it replaced, if any.
    pub fn insert(&mut self, descriptor: Arc<PluginDescriptor>) -> Option<Arc<PluginDescriptor>> {
        match self.index.get(&descriptor.name) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position], descriptor)),
            None => {
                self.index.insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
                None
            }
        }
    }

    /// Get a descriptor by name
    pub fn get(&self, name: &str) -> Option<&Arc<PluginDescriptor>> {
        self.index.get(name).map(|&position| &self.entries[position])
    }

    /// Check if a name is present
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Remove a descriptor, preserving the order of the others
    pub fn remove(&mut self, name: &str) -> Option<Arc<PluginDescriptor>> {
        let position = self.index.remove(name)?;
        let removed = self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Iterate descriptors in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginDescriptor>> {
        self.entries.iter()
    }

    /// Names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|descriptor| descriptor.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every descriptor
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = &'a Arc<PluginDescriptor>;
    type IntoIter = std::slice::Iter<'a, Arc<PluginDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<PluginDescriptor> for Extensions {
    fn from_iter<I: IntoIterator<Item = PluginDescriptor>>(iter: I) -> Self {
        let mut extensions = Extensions::new();
        for descriptor in iter {
            extensions.insert(Arc::new(descriptor));
        }
        extensions
    }
}
